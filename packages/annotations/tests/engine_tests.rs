//! Engine-level tests: offset maintenance under insert, delete and
//! transfer, plus anchor handling for container annotations.

use quire_annotations::{props, AnnotationIndex, AnnotationUpdater};
use quire_model::{AnnotationBehavior, Document, DocumentOp, NodeSpec, Path, Schema, TextDiff};

fn schema() -> Schema {
    Schema::builder("article")
        .text("paragraph", &["content"])
        .text("heading", &["content"])
        .container("body", "nodes")
        .annotation("emphasis", AnnotationBehavior::default())
        .annotation(
            "link",
            AnnotationBehavior {
                extends_right_edge: false,
                ..Default::default()
            },
        )
        .annotation(
            "marker",
            AnnotationBehavior {
                splittable: false,
                ..Default::default()
            },
        )
        .annotation(
            "comment",
            AnnotationBehavior {
                container_scoped: true,
                ..Default::default()
            },
        )
        .build()
}

struct Fixture {
    doc: Document,
    index: AnnotationIndex,
    ops: Vec<DocumentOp>,
}

impl Fixture {
    fn new() -> Self {
        let mut doc = Document::new(schema(), "/engine.qd");
        doc.create(
            NodeSpec::new("paragraph")
                .with_id("p2")
                .prop("content", "Paragraph with some emphasized text here."),
        )
        .unwrap();
        Self {
            doc,
            index: AnnotationIndex::new(),
            ops: Vec::new(),
        }
    }

    fn annotate(&mut self, node_type: &str, id: &str, start: usize, end: usize) {
        self.doc
            .create(
                NodeSpec::new(node_type)
                    .with_id(id)
                    .prop(props::PATH, Path::new("p2", "content"))
                    .prop(props::START_OFFSET, start)
                    .prop(props::END_OFFSET, end),
            )
            .unwrap();
        self.index.rebuild(&self.doc);
    }

    fn insert(&mut self, offset: usize, text: &str) {
        let path = Path::new("p2", "content");
        let diff = TextDiff::Insert {
            offset,
            text: text.to_string(),
        };
        self.doc.update_text(&path, &diff).unwrap();
        let len = diff.len();
        AnnotationUpdater::new(&mut self.doc, &mut self.index, &mut self.ops)
            .inserted_text(&path, offset, false, len);
    }

    fn delete(&mut self, start: usize, end: usize) {
        let path = Path::new("p2", "content");
        let removed: String = self
            .doc
            .get_text(&path)
            .unwrap()
            .chars()
            .skip(start)
            .take(end - start)
            .collect();
        self.doc
            .update_text(&path, &TextDiff::Delete {
                offset: start,
                text: removed,
            })
            .unwrap();
        AnnotationUpdater::new(&mut self.doc, &mut self.index, &mut self.ops)
            .deleted_text(&path, start, end);
    }

    fn span(&self, id: &str) -> (usize, usize) {
        let node = self.doc.get_node(id).unwrap();
        (
            node.offset(props::START_OFFSET).unwrap(),
            node.offset(props::END_OFFSET).unwrap(),
        )
    }
}

#[test]
fn insertion_inside_grows_the_annotation() {
    let mut f = Fixture::new();
    f.annotate("emphasis", "em1", 15, 25);
    f.insert(20, "xx");
    assert_eq!(f.span("em1"), (15, 27));
}

#[test]
fn insertion_at_right_boundary_expands_extending_types() {
    let mut f = Fixture::new();
    f.annotate("emphasis", "em1", 15, 25);
    f.insert(25, "test");
    assert_eq!(f.span("em1"), (15, 29));
}

#[test]
fn insertion_at_left_boundary_shifts_without_expansion() {
    let mut f = Fixture::new();
    f.annotate("emphasis", "em1", 15, 25);
    f.insert(15, "test");
    assert_eq!(f.span("em1"), (19, 29));
}

#[test]
fn insertion_at_right_boundary_does_not_expand_external_types() {
    let mut f = Fixture::new();
    f.annotate("link", "l1", 15, 25);
    f.insert(25, "test");
    assert_eq!(f.span("l1"), (15, 25));
}

#[test]
fn insertion_before_shifts_both_offsets() {
    let mut f = Fixture::new();
    f.annotate("emphasis", "em1", 15, 25);
    f.insert(3, "abcd");
    assert_eq!(f.span("em1"), (19, 29));
}

#[test]
fn insertion_after_leaves_the_annotation_alone() {
    let mut f = Fixture::new();
    f.annotate("emphasis", "em1", 15, 25);
    f.insert(30, "abcd");
    assert_eq!(f.span("em1"), (15, 25));
}

#[test]
fn length_changes_only_for_interior_insertions() {
    // §8 property: length changes iff the insertion fell strictly inside
    // [start, end).
    for (at, expected_len) in [(14, 10), (15, 10), (16, 14), (24, 14), (25, 14), (26, 10)] {
        let mut f = Fixture::new();
        f.annotate("emphasis", "em1", 15, 25);
        f.insert(at, "test");
        let (s, e) = f.span("em1");
        assert_eq!(e - s, expected_len, "insert at {}", at);
    }
}

#[test]
fn deletion_before_shifts_left() {
    let mut f = Fixture::new();
    f.annotate("emphasis", "em1", 15, 25);
    f.delete(0, 5);
    assert_eq!(f.span("em1"), (10, 20));
}

#[test]
fn deletion_overlapping_clamps_each_boundary() {
    let mut f = Fixture::new();
    f.annotate("emphasis", "em1", 15, 25);
    // Range [10, 20) covers the start but not the end.
    f.delete(10, 20);
    assert_eq!(f.span("em1"), (10, 15));
}

#[test]
fn deletion_round_trips_with_inverse_insertion() {
    // Range strictly inside the annotation.
    let mut f = Fixture::new();
    f.annotate("emphasis", "em1", 15, 25);
    f.delete(17, 20);
    assert_eq!(f.span("em1"), (15, 22));
    f.insert(17, "abc");
    assert_eq!(f.span("em1"), (15, 25));

    // Range entirely before the annotation.
    let mut f = Fixture::new();
    f.annotate("emphasis", "em1", 15, 25);
    f.delete(0, 6);
    assert_eq!(f.span("em1"), (9, 19));
    f.insert(0, "abcdef");
    assert_eq!(f.span("em1"), (15, 25));
}

#[test]
fn deletion_covering_the_annotation_removes_it() {
    let mut f = Fixture::new();
    f.annotate("emphasis", "em1", 15, 25);
    f.delete(10, 30);
    assert!(!f.doc.contains("em1"));
    // The deletion op was recorded so the Change can restore it on undo.
    assert!(f
        .ops
        .iter()
        .any(|op| matches!(op, DocumentOp::Delete { node } if node.id == "em1")));
}

#[test]
fn non_collapsible_annotations_survive_collapse() -> anyhow::Result<()> {
    let mut f = Fixture::new();
    f.doc.create(
        NodeSpec::new("emphasis")
            .with_id("em1")
            .prop(props::PATH, Path::new("p2", "content"))
            .prop(props::START_OFFSET, 15usize)
            .prop(props::END_OFFSET, 25usize)
            .prop(props::COLLAPSIBLE, false),
    )?;
    f.index.rebuild(&f.doc);
    f.delete(15, 25);
    assert!(f.doc.contains("em1"));
    assert_eq!(f.span("em1"), (15, 15));
    Ok(())
}

#[test]
fn engine_is_a_silent_noop_on_unindexed_paths() {
    let mut f = Fixture::new();
    let ghost = Path::new("ghost", "content");
    let mut updater = AnnotationUpdater::new(&mut f.doc, &mut f.index, &mut f.ops);
    updater.inserted_text(&ghost, 0, false, 4);
    assert!(updater.deleted_text(&ghost, 0, 4).is_empty());
    updater.transfer_annotations(&ghost, 2, &Path::new("other", "content"), 0);
    assert!(f.ops.is_empty());
}

#[test]
fn transfer_moves_annotations_at_or_after_the_split() {
    let mut f = Fixture::new();
    f.doc
        .create(NodeSpec::new("paragraph").with_id("p3").prop("content", "tail"))
        .unwrap();
    f.annotate("emphasis", "em1", 15, 25);
    let old = Path::new("p2", "content");
    let new = Path::new("p3", "content");
    AnnotationUpdater::new(&mut f.doc, &mut f.index, &mut f.ops)
        .transfer_annotations(&old, 10, &new, 0);

    let node = f.doc.get_node("em1").unwrap();
    assert_eq!(node.path(props::PATH), Some(&new));
    assert_eq!(f.span("em1"), (5, 15));
    assert!(f.index.annotations_on(&old).is_empty());
    assert_eq!(f.index.annotations_on(&new), vec!["em1".to_string()]);
}

#[test]
fn transfer_splits_a_straddling_splittable_annotation() {
    let mut f = Fixture::new();
    f.doc
        .create(NodeSpec::new("paragraph").with_id("p3").prop("content", "tail text"))
        .unwrap();
    f.annotate("emphasis", "em1", 15, 25);
    let old = Path::new("p2", "content");
    let new = Path::new("p3", "content");
    AnnotationUpdater::new(&mut f.doc, &mut f.index, &mut f.ops)
        .transfer_annotations(&old, 20, &new, 0);

    // Head truncated in place.
    assert_eq!(f.span("em1"), (15, 20));
    // Tail sibling created on the new path.
    let tail_ids = f.index.annotations_on(&new);
    assert_eq!(tail_ids.len(), 1);
    let tail = f.doc.get_node(&tail_ids[0]).unwrap();
    assert_eq!(tail.node_type, "emphasis");
    assert_eq!(tail.offset(props::START_OFFSET), Some(0));
    assert_eq!(tail.offset(props::END_OFFSET), Some(5));
}

#[test]
fn transfer_truncates_a_straddling_non_splittable_annotation() {
    let mut f = Fixture::new();
    f.doc
        .create(NodeSpec::new("paragraph").with_id("p3").prop("content", "tail text"))
        .unwrap();
    f.annotate("marker", "m1", 15, 25);
    let old = Path::new("p2", "content");
    let new = Path::new("p3", "content");
    AnnotationUpdater::new(&mut f.doc, &mut f.index, &mut f.ops)
        .transfer_annotations(&old, 20, &new, 0);

    assert_eq!(f.span("m1"), (15, 20));
    assert!(f.index.annotations_on(&new).is_empty());
}

mod container_annotations {
    use super::*;

    /// body1: [p1, p2, p3], comment c1 spanning p1[2] .. p3[4].
    fn container_fixture() -> Fixture {
        let mut f = Fixture::new();
        f.doc
            .create(NodeSpec::new("paragraph").with_id("p1").prop("content", "first paragraph"))
            .unwrap();
        f.doc
            .create(NodeSpec::new("paragraph").with_id("p3").prop("content", "third paragraph"))
            .unwrap();
        f.doc
            .create(NodeSpec::new("body").with_id("body1").prop(
                "nodes",
                vec!["p1".to_string(), "p2".to_string(), "p3".to_string()],
            ))
            .unwrap();
        f.doc
            .create(
                NodeSpec::new("comment")
                    .with_id("c1")
                    .prop(props::START_PATH, Path::new("p1", "content"))
                    .prop(props::START_OFFSET, 2usize)
                    .prop(props::END_PATH, Path::new("p3", "content"))
                    .prop(props::END_OFFSET, 4usize)
                    .prop(props::CONTAINER_ID, "body1"),
            )
            .unwrap();
        f.index.rebuild(&f.doc);
        f
    }

    fn anchor(f: &Fixture, prop_path: &str, prop_off: &str) -> (Path, usize) {
        let node = f.doc.get_node("c1").unwrap();
        (
            node.path(prop_path).unwrap().clone(),
            node.offset(prop_off).unwrap(),
        )
    }

    #[test]
    fn anchors_shift_with_insertions() {
        let mut f = container_fixture();
        let path = Path::new("p1", "content");
        f.doc
            .update_text(&path, &TextDiff::Insert {
                offset: 1,
                text: "ab".to_string(),
            })
            .unwrap();
        AnnotationUpdater::new(&mut f.doc, &mut f.index, &mut f.ops)
            .inserted_text(&path, 1, false, 2);
        assert_eq!(
            anchor(&f, props::START_PATH, props::START_OFFSET),
            (Path::new("p1", "content"), 4)
        );
    }

    #[test]
    fn insertion_exactly_at_anchor_honors_the_after_flag() {
        let mut f = container_fixture();
        let path = Path::new("p1", "content");

        AnnotationUpdater::new(&mut f.doc, &mut f.index, &mut f.ops)
            .inserted_text(&path, 2, true, 3);
        assert_eq!(anchor(&f, props::START_PATH, props::START_OFFSET).1, 2);

        AnnotationUpdater::new(&mut f.doc, &mut f.index, &mut f.ops)
            .inserted_text(&path, 2, false, 3);
        assert_eq!(anchor(&f, props::START_PATH, props::START_OFFSET).1, 5);
    }

    #[test]
    fn anchors_clamp_on_deletion() {
        let mut f = container_fixture();
        let path = Path::new("p3", "content");
        AnnotationUpdater::new(&mut f.doc, &mut f.index, &mut f.ops)
            .deleted_text(&path, 1, 10);
        assert_eq!(
            anchor(&f, props::END_PATH, props::END_OFFSET),
            (Path::new("p3", "content"), 1)
        );
    }

    #[test]
    fn deleting_the_start_node_transfers_to_the_next_sibling() {
        let mut f = container_fixture();
        AnnotationUpdater::new(&mut f.doc, &mut f.index, &mut f.ops).node_deleted("p1");
        assert_eq!(
            anchor(&f, props::START_PATH, props::START_OFFSET),
            (Path::new("p2", "content"), 0)
        );
    }

    #[test]
    fn deleting_the_end_node_transfers_to_the_previous_sibling() {
        let mut f = container_fixture();
        let p2_len = f.doc.text_len(&Path::new("p2", "content")).unwrap();
        AnnotationUpdater::new(&mut f.doc, &mut f.index, &mut f.ops).node_deleted("p3");
        assert_eq!(
            anchor(&f, props::END_PATH, props::END_OFFSET),
            (Path::new("p2", "content"), p2_len)
        );
    }

    #[test]
    fn property_annotations_die_with_their_node() {
        let mut f = container_fixture();
        f.annotate("emphasis", "em1", 2, 6);
        AnnotationUpdater::new(&mut f.doc, &mut f.index, &mut f.ops).node_deleted("p2");
        assert!(!f.doc.contains("em1"));
    }
}
