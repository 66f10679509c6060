//! # Annotation transforms
//!
//! Create, expand, truncate and fuse annotations against a selection.
//! Property annotations compare plain offsets; container annotations
//! compare `(path, offset)` coordinates through the container's Address
//! order. All preconditions are validated before anything mutates, so a
//! failed transform aborts the enclosing transaction without partial
//! effects.

use crate::transaction::container_of;
use crate::{EditorError, Selection, Transaction};
use quire_annotations::props;
use quire_model::{ContainerIndex, Document, NodeSpec, Path};
use std::cmp::Ordering;

/// Create one annotation covering the selection.
///
/// Container-scoped types accept property or container selections and
/// record anchors plus the container id; other types require a property
/// selection. The selection must not be collapsed.
pub fn create_annotation(
    tx: &mut Transaction,
    selection: &Selection,
    spec: NodeSpec,
) -> Result<String, EditorError> {
    if selection.is_collapsed() {
        return Err(EditorError::SelectionRequired);
    }
    let behavior = tx
        .doc()
        .schema()
        .annotation_behavior(&spec.node_type)
        .ok_or_else(|| EditorError::NotAnAnnotation(spec.node_type.clone()))?;

    let spec = if behavior.container_scoped {
        let (container_id, start, end) = match selection {
            Selection::Property(s) => {
                let (container_id, _) =
                    container_of(tx.doc(), &s.path.node_id).ok_or_else(|| {
                        EditorError::InvalidSelection(format!(
                            "node {} is not shown in any container",
                            s.path.node_id
                        ))
                    })?;
                (
                    container_id,
                    (s.path.clone(), s.start_offset),
                    (s.path.clone(), s.end_offset),
                )
            }
            Selection::Container(s) => (
                s.container_id.clone(),
                (s.start_path.clone(), s.start_offset),
                (s.end_path.clone(), s.end_offset),
            ),
            _ => return Err(EditorError::SelectionRequired),
        };
        spec.prop(props::START_PATH, start.0)
            .prop(props::START_OFFSET, start.1)
            .prop(props::END_PATH, end.0)
            .prop(props::END_OFFSET, end.1)
            .prop(props::CONTAINER_ID, container_id.as_str())
    } else {
        let Selection::Property(s) = selection else {
            return Err(EditorError::AnnotationMismatch(format!(
                "{} overlays a single property and needs a property selection",
                spec.node_type
            )));
        };
        spec.prop(props::PATH, s.path.clone())
            .prop(props::START_OFFSET, s.start_offset)
            .prop(props::END_OFFSET, s.end_offset)
    };
    tx.create(spec)
}

/// Explode a container selection into one property annotation per spanned
/// text property (skipping empty parts) instead of one container
/// annotation.
pub fn create_property_annotations(
    tx: &mut Transaction,
    selection: &Selection,
    spec: NodeSpec,
) -> Result<Vec<String>, EditorError> {
    let parts = selection.split_into_property_selections(tx.doc())?;
    let mut ids = Vec::new();
    for part in parts {
        if part.start_offset == part.end_offset {
            continue;
        }
        let part_spec = spec
            .clone()
            .prop(props::PATH, part.path.clone())
            .prop(props::START_OFFSET, part.start_offset)
            .prop(props::END_OFFSET, part.end_offset);
        ids.push(tx.create(part_spec)?);
    }
    Ok(ids)
}

/// Grow the annotation to the union of its span and the selection's span.
pub fn expand_annotation(
    tx: &mut Transaction,
    annotation_id: &str,
    selection: &Selection,
) -> Result<(), EditorError> {
    let anno = Anno::load(tx.doc(), annotation_id)?;
    let (sel_start, sel_end) = selection_coords(selection)?;

    if anno.container_scoped {
        let container_id = anno.container_id.clone();
        let new_start = if cmp(tx.doc(), &container_id, coord(&sel_start), anno.start())?
            == Ordering::Less
        {
            Some(sel_start)
        } else {
            None
        };
        let new_end = if cmp(tx.doc(), &container_id, coord(&sel_end), anno.end())?
            == Ordering::Greater
        {
            Some(sel_end)
        } else {
            None
        };
        if let Some((path, offset)) = new_start {
            tx.set(&prop_path(annotation_id, props::START_PATH), path)?;
            tx.set(&prop_path(annotation_id, props::START_OFFSET), offset)?;
        }
        if let Some((path, offset)) = new_end {
            tx.set(&prop_path(annotation_id, props::END_PATH), path)?;
            tx.set(&prop_path(annotation_id, props::END_OFFSET), offset)?;
        }
        Ok(())
    } else {
        anno.require_same_path(&sel_start.0)?;
        if sel_start.1 < anno.start_offset {
            tx.set(&prop_path(annotation_id, props::START_OFFSET), sel_start.1)?;
        }
        if sel_end.1 > anno.end_offset {
            tx.set(&prop_path(annotation_id, props::END_OFFSET), sel_end.1)?;
        }
        Ok(())
    }
}

/// Shrink the annotation to exclude its overlap with the selection; if
/// that collapses it, delete it. A selection strictly inside keeps the
/// left part.
pub fn truncate_annotation(
    tx: &mut Transaction,
    annotation_id: &str,
    selection: &Selection,
) -> Result<(), EditorError> {
    let anno = Anno::load(tx.doc(), annotation_id)?;
    let (sel_start, sel_end) = selection_coords(selection)?;

    if anno.container_scoped {
        let container_id = anno.container_id.clone();
        let covers_start =
            cmp(tx.doc(), &container_id, coord(&sel_start), anno.start())? != Ordering::Greater;
        let covers_end =
            cmp(tx.doc(), &container_id, coord(&sel_end), anno.end())? != Ordering::Less;
        let starts_inside =
            cmp(tx.doc(), &container_id, coord(&sel_start), anno.end())? == Ordering::Less;
        let ends_inside =
            cmp(tx.doc(), &container_id, coord(&sel_end), anno.start())? == Ordering::Greater;
        if !starts_inside || !ends_inside {
            return Ok(()); // no overlap
        }
        if covers_start && covers_end {
            tx.delete_node(annotation_id)?;
            return Ok(());
        }
        if covers_start {
            tx.set(&prop_path(annotation_id, props::START_PATH), sel_end.0)?;
            tx.set(&prop_path(annotation_id, props::START_OFFSET), sel_end.1)?;
        } else {
            // Right overlap or interior: keep the left part.
            tx.set(&prop_path(annotation_id, props::END_PATH), sel_start.0)?;
            tx.set(&prop_path(annotation_id, props::END_OFFSET), sel_start.1)?;
        }
        Ok(())
    } else {
        anno.require_same_path(&sel_start.0)?;
        let (a, b) = (sel_start.1, sel_end.1);
        let (s, e) = (anno.start_offset, anno.end_offset);
        if b <= s || a >= e {
            return Ok(()); // no overlap
        }
        if a <= s && b >= e {
            tx.delete_node(annotation_id)?;
            return Ok(());
        }
        if a <= s {
            tx.set(&prop_path(annotation_id, props::START_OFFSET), b)?;
        } else {
            tx.set(&prop_path(annotation_id, props::END_OFFSET), a)?;
        }
        Ok(())
    }
}

/// Merge two or more annotations of one type into the first: the survivor
/// expands to the union span, the rest are deleted.
pub fn fuse_annotations(
    tx: &mut Transaction,
    annotation_ids: &[String],
) -> Result<String, EditorError> {
    if annotation_ids.len() < 2 {
        return Err(EditorError::AnnotationMismatch(
            "fusing requires at least two annotations".to_string(),
        ));
    }
    let survivor = Anno::load(tx.doc(), &annotation_ids[0])?;
    for id in &annotation_ids[1..] {
        let other = Anno::load(tx.doc(), id)?;
        if other.node_type != survivor.node_type {
            return Err(EditorError::AnnotationMismatch(format!(
                "cannot fuse {} into {}",
                other.node_type, survivor.node_type
            )));
        }
    }

    if survivor.container_scoped {
        let container_id = survivor.container_id.clone();
        let mut start = (survivor.start_path.clone(), survivor.start_offset);
        let mut end = (survivor.end_path.clone(), survivor.end_offset);
        for id in &annotation_ids[1..] {
            let other = Anno::load(tx.doc(), id)?;
            if cmp(tx.doc(), &container_id, other.start(), coord(&start))? == Ordering::Less {
                start = (other.start_path.clone(), other.start_offset);
            }
            if cmp(tx.doc(), &container_id, other.end(), coord(&end))? == Ordering::Greater {
                end = (other.end_path.clone(), other.end_offset);
            }
        }
        for id in &annotation_ids[1..] {
            tx.delete_node(id)?;
        }
        let id = &annotation_ids[0];
        tx.set(&prop_path(id, props::START_PATH), start.0)?;
        tx.set(&prop_path(id, props::START_OFFSET), start.1)?;
        tx.set(&prop_path(id, props::END_PATH), end.0)?;
        tx.set(&prop_path(id, props::END_OFFSET), end.1)?;
        Ok(id.clone())
    } else {
        let mut start = survivor.start_offset;
        let mut end = survivor.end_offset;
        for id in &annotation_ids[1..] {
            let other = Anno::load(tx.doc(), id)?;
            other.require_same_path(&survivor.path)?;
            start = start.min(other.start_offset);
            end = end.max(other.end_offset);
        }
        for id in &annotation_ids[1..] {
            tx.delete_node(id)?;
        }
        let id = &annotation_ids[0];
        tx.set(&prop_path(id, props::START_OFFSET), start)?;
        tx.set(&prop_path(id, props::END_OFFSET), end)?;
        Ok(id.clone())
    }
}

// --- internals ---------------------------------------------------------

/// Snapshot of an annotation node's addressing state.
struct Anno {
    node_type: String,
    container_scoped: bool,
    path: Path,
    start_path: Path,
    end_path: Path,
    start_offset: usize,
    end_offset: usize,
    container_id: String,
}

impl Anno {
    fn load(doc: &Document, id: &str) -> Result<Self, EditorError> {
        let node = doc.node(id)?;
        let behavior = doc
            .schema()
            .annotation_behavior(&node.node_type)
            .ok_or_else(|| EditorError::NotAnAnnotation(id.to_string()))?;
        let missing = || EditorError::NotAnAnnotation(id.to_string());

        if behavior.container_scoped {
            Ok(Self {
                node_type: node.node_type.clone(),
                container_scoped: true,
                path: Path::new("", ""),
                start_path: node.path(props::START_PATH).ok_or_else(missing)?.clone(),
                end_path: node.path(props::END_PATH).ok_or_else(missing)?.clone(),
                start_offset: node.offset(props::START_OFFSET).ok_or_else(missing)?,
                end_offset: node.offset(props::END_OFFSET).ok_or_else(missing)?,
                container_id: node.text(props::CONTAINER_ID).ok_or_else(missing)?.to_string(),
            })
        } else {
            let path = node.path(props::PATH).ok_or_else(missing)?.clone();
            Ok(Self {
                node_type: node.node_type.clone(),
                container_scoped: false,
                start_path: path.clone(),
                end_path: path.clone(),
                path,
                start_offset: node.offset(props::START_OFFSET).ok_or_else(missing)?,
                end_offset: node.offset(props::END_OFFSET).ok_or_else(missing)?,
                container_id: String::new(),
            })
        }
    }

    fn start(&self) -> (&Path, usize) {
        (&self.start_path, self.start_offset)
    }

    fn end(&self) -> (&Path, usize) {
        (&self.end_path, self.end_offset)
    }

    fn require_same_path(&self, other: &Path) -> Result<(), EditorError> {
        if &self.path == other {
            Ok(())
        } else {
            Err(EditorError::AnnotationMismatch(format!(
                "annotation overlays {}, selection targets {}",
                self.path, other
            )))
        }
    }
}

fn selection_coords(
    selection: &Selection,
) -> Result<((Path, usize), (Path, usize)), EditorError> {
    match selection {
        Selection::Property(s) => Ok((
            (s.path.clone(), s.start_offset),
            (s.path.clone(), s.end_offset),
        )),
        Selection::Container(s) => Ok((
            (s.start_path.clone(), s.start_offset),
            (s.end_path.clone(), s.end_offset),
        )),
        _ => Err(EditorError::SelectionRequired),
    }
}

fn coord(c: &(Path, usize)) -> (&Path, usize) {
    (&c.0, c.1)
}

fn cmp(
    doc: &Document,
    container_id: &str,
    a: (&Path, usize),
    b: (&Path, usize),
) -> Result<Ordering, EditorError> {
    ContainerIndex::new(doc, container_id)?
        .compare_coordinates(a, b)
        .ok_or_else(|| {
            EditorError::InvalidSelection(format!(
                "coordinates are not addressable in container {}",
                container_id
            ))
        })
}

fn prop_path(node_id: &str, property: &str) -> Path {
    Path::new(node_id, property)
}
