//! # Selection model
//!
//! A selection is an immutable description of a cursor or range; it never
//! mutates the document. Constructors validate eagerly: a selection that
//! exists is a selection the transforms can act on. Container selections
//! given with reversed endpoints are normalized into reading order with a
//! `reverse` flag instead of being rejected.

use crate::EditorError;
use quire_model::{ContainerIndex, Document, Path};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Range within a single text property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySelection {
    pub path: Path,
    pub start_offset: usize,
    pub end_offset: usize,
    pub reverse: bool,
}

/// Range from one text property to another within a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSelection {
    pub container_id: String,
    pub start_path: Path,
    pub start_offset: usize,
    pub end_path: Path,
    pub end_offset: usize,
    pub reverse: bool,
}

/// Whole-node selection (e.g. a figure or image card).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSelection {
    pub container_id: String,
    pub node_id: String,
    pub mode: NodeSelectionMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeSelectionMode {
    Full,
    Before,
    After,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Selection {
    Null,
    Property(PropertySelection),
    Container(ContainerSelection),
    Node(NodeSelection),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Null
    }
}

impl Selection {
    pub fn null() -> Self {
        Selection::Null
    }

    /// Collapsed cursor inside one text property.
    pub fn collapsed(doc: &Document, path: Path, offset: usize) -> Result<Self, EditorError> {
        Self::property(doc, path, offset, offset)
    }

    /// Range within one text property. Reversed offsets normalize with the
    /// `reverse` flag set.
    pub fn property(
        doc: &Document,
        path: Path,
        start_offset: usize,
        end_offset: usize,
    ) -> Result<Self, EditorError> {
        let len = doc.text_len(&path)?;
        let (start_offset, end_offset, reverse) = if end_offset < start_offset {
            (end_offset, start_offset, true)
        } else {
            (start_offset, end_offset, false)
        };
        if end_offset > len {
            return Err(EditorError::InvalidSelection(format!(
                "offset {} past end of {} (length {})",
                end_offset, path, len
            )));
        }
        Ok(Selection::Property(PropertySelection {
            path,
            start_offset,
            end_offset,
            reverse,
        }))
    }

    /// Range across text properties of a container. Endpoints must be
    /// addressable; if they are given against reading order they are
    /// swapped and `reverse` is set.
    pub fn container(
        doc: &Document,
        container_id: impl Into<String>,
        start_path: Path,
        start_offset: usize,
        end_path: Path,
        end_offset: usize,
    ) -> Result<Self, EditorError> {
        let container_id = container_id.into();
        let index = ContainerIndex::new(doc, &container_id)?;
        let ordering = index
            .compare_coordinates((&start_path, start_offset), (&end_path, end_offset))
            .ok_or_else(|| {
                EditorError::InvalidSelection(format!(
                    "endpoints {} / {} are not addressable in container {}",
                    start_path, end_path, container_id
                ))
            })?;

        for (path, offset) in [(&start_path, start_offset), (&end_path, end_offset)] {
            let len = doc.text_len(path)?;
            if offset > len {
                return Err(EditorError::InvalidSelection(format!(
                    "offset {} past end of {} (length {})",
                    offset, path, len
                )));
            }
        }

        let selection = match ordering {
            Ordering::Greater => ContainerSelection {
                container_id,
                start_path: end_path,
                start_offset: end_offset,
                end_path: start_path,
                end_offset: start_offset,
                reverse: true,
            },
            _ => ContainerSelection {
                container_id,
                start_path,
                start_offset,
                end_path,
                end_offset,
                reverse: false,
            },
        };
        Ok(Selection::Container(selection))
    }

    /// Whole-node selection; the node must be listed in the container.
    pub fn node(
        doc: &Document,
        container_id: impl Into<String>,
        node_id: impl Into<String>,
        mode: NodeSelectionMode,
    ) -> Result<Self, EditorError> {
        let container_id = container_id.into();
        let node_id = node_id.into();
        if !doc.container_ids(&container_id)?.iter().any(|id| id == &node_id) {
            return Err(EditorError::InvalidSelection(format!(
                "node {} is not shown in container {}",
                node_id, container_id
            )));
        }
        Ok(Selection::Node(NodeSelection {
            container_id,
            node_id,
            mode,
        }))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Selection::Null)
    }

    pub fn is_collapsed(&self) -> bool {
        match self {
            Selection::Null => true,
            Selection::Property(s) => s.start_offset == s.end_offset,
            Selection::Container(s) => {
                s.start_path == s.end_path && s.start_offset == s.end_offset
            }
            Selection::Node(_) => false,
        }
    }

    /// Explode a container selection into one property selection per
    /// spanned text property, in reading order.
    pub fn split_into_property_selections(
        &self,
        doc: &Document,
    ) -> Result<Vec<PropertySelection>, EditorError> {
        let Selection::Container(s) = self else {
            return Err(EditorError::InvalidSelection(
                "only container selections can be split per property".to_string(),
            ));
        };
        let index = ContainerIndex::new(doc, &s.container_id)?;
        let paths = index.path_range(&s.start_path, &s.end_path);
        let last = paths.len().saturating_sub(1);
        let mut selections = Vec::with_capacity(paths.len());
        for (i, path) in paths.into_iter().enumerate() {
            let len = doc.text_len(&path)?;
            let start = if i == 0 { s.start_offset } else { 0 };
            let end = if i == last { s.end_offset } else { len };
            selections.push(PropertySelection {
                path,
                start_offset: start,
                end_offset: end,
                reverse: false,
            });
        }
        Ok(selections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_model::{NodeSpec, Schema};

    fn fixture() -> Document {
        let schema = Schema::builder("article")
            .text("paragraph", &["content"])
            .container("body", "nodes")
            .build();
        let mut doc = Document::new(schema, "/sel.qd");
        doc.create(NodeSpec::new("paragraph").with_id("p1").prop("content", "first text"))
            .unwrap();
        doc.create(NodeSpec::new("paragraph").with_id("p2").prop("content", "second text"))
            .unwrap();
        doc.create(NodeSpec::new("body").with_id("body1").prop(
            "nodes",
            vec!["p1".to_string(), "p2".to_string()],
        ))
        .unwrap();
        doc
    }

    #[test]
    fn property_selection_normalizes_reversed_offsets() {
        let doc = fixture();
        let sel = Selection::property(&doc, Path::new("p1", "content"), 7, 2).unwrap();
        match sel {
            Selection::Property(s) => {
                assert_eq!((s.start_offset, s.end_offset), (2, 7));
                assert!(s.reverse);
            }
            _ => panic!("expected property selection"),
        }
    }

    #[test]
    fn property_selection_validates_path_and_bounds() {
        let doc = fixture();
        assert!(Selection::property(&doc, Path::new("ghost", "content"), 0, 1).is_err());
        assert!(Selection::property(&doc, Path::new("p1", "content"), 0, 99).is_err());
    }

    #[test]
    fn container_selection_normalizes_reversed_endpoints() {
        let doc = fixture();
        let sel = Selection::container(
            &doc,
            "body1",
            Path::new("p2", "content"),
            3,
            Path::new("p1", "content"),
            5,
        )
        .unwrap();
        match sel {
            Selection::Container(s) => {
                assert_eq!(s.start_path, Path::new("p1", "content"));
                assert_eq!(s.start_offset, 5);
                assert_eq!(s.end_path, Path::new("p2", "content"));
                assert_eq!(s.end_offset, 3);
                assert!(s.reverse);
            }
            _ => panic!("expected container selection"),
        }
    }

    #[test]
    fn container_selection_rejects_unaddressable_endpoints() {
        let doc = fixture();
        let err = Selection::container(
            &doc,
            "body1",
            Path::new("ghost", "content"),
            0,
            Path::new("p2", "content"),
            1,
        );
        assert!(matches!(err, Err(EditorError::InvalidSelection(_))));
    }

    #[test]
    fn split_into_property_selections_covers_the_span() {
        let doc = fixture();
        let sel = Selection::container(
            &doc,
            "body1",
            Path::new("p1", "content"),
            4,
            Path::new("p2", "content"),
            6,
        )
        .unwrap();
        let parts = sel.split_into_property_selections(&doc).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!((parts[0].start_offset, parts[0].end_offset), (4, 10));
        assert_eq!((parts[1].start_offset, parts[1].end_offset), (0, 6));
    }

    #[test]
    fn node_selection_requires_membership() {
        let doc = fixture();
        assert!(Selection::node(&doc, "body1", "p1", NodeSelectionMode::Full).is_ok());
        assert!(Selection::node(&doc, "body1", "ghost", NodeSelectionMode::Full).is_err());
    }
}
