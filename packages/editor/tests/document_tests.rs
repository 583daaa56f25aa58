//! Integration tests for the document tree and its mutation protocol

use mosaic_common::{expression, NodeSchema, TransformStage};
use mosaic_editor::{
    ChangeKind, ComponentMeta, ComponentMetaRegistry, Document, DocumentError, EventBus,
    HistoryConfig, NodeId,
};
use serde_json::json;

fn document(root: NodeSchema) -> Document {
    document_with(root, ComponentMetaRegistry::with_builtins())
}

fn document_with(root: NodeSchema, metas: ComponentMetaRegistry) -> Document {
    Document::new("doc", &root, metas, EventBus::new(), HistoryConfig::default()).unwrap()
}

fn id(s: &str) -> NodeId {
    NodeId::new(s)
}

fn child_ids(doc: &Document, parent: &str) -> Vec<String> {
    doc.children_of(parent).iter().map(|c| c.to_string()).collect()
}

#[test]
fn test_insert_at_front() {
    let mut doc = document(
        NodeSchema::new("Page")
            .with_id("P")
            .with_child(NodeSchema::new("Leaf").with_id("A")),
    );
    let b = doc.create_node(&NodeSchema::new("Leaf").with_id("B")).unwrap();

    doc.insert_node(&id("P"), &b, Some(0)).unwrap();

    assert_eq!(child_ids(&doc, "P"), vec!["B", "A"]);
    assert_eq!(doc.parent_of("B"), Some(&id("P")));
    assert!(doc.check_integrity().is_empty());
}

#[test]
fn test_insert_index_is_clamped() {
    let mut doc = document(NodeSchema::new("Page").with_id("P"));
    let a = doc.create_node(&NodeSchema::new("Leaf")).unwrap();

    doc.insert_node(&id("P"), &a, Some(42)).unwrap();
    assert_eq!(doc.index_of(a.as_str()), Some(0));
}

#[test]
fn test_insert_into_leaf_fails_untouched() {
    let mut doc = document(
        NodeSchema::new("Page")
            .with_id("P")
            .with_child(NodeSchema::new("Leaf").with_id("A")),
    );
    let b = doc.create_node(&NodeSchema::new("Leaf")).unwrap();
    let before = doc.export(TransformStage::Save);

    let err = doc.insert_node(&id("A"), &b, None).unwrap_err();

    assert!(matches!(err, DocumentError::NotContainer { .. }));
    assert_eq!(doc.export(TransformStage::Save), before);
    assert!(!doc.is_attached(b.as_str()));
}

#[test]
fn test_cycle_is_rejected() {
    let mut doc = document(
        NodeSchema::new("Page").with_id("P").with_child(
            NodeSchema::new("Block")
                .with_id("outer")
                .with_child(NodeSchema::new("Block").with_id("inner")),
        ),
    );

    let err = doc.insert_node(&id("inner"), &id("outer"), None).unwrap_err();
    assert_eq!(
        err,
        DocumentError::CycleDetected {
            node: id("outer"),
            parent: id("inner")
        }
    );

    let err = doc.insert_node(&id("outer"), &id("outer"), None).unwrap_err();
    assert!(matches!(err, DocumentError::CycleDetected { .. }));
}

#[test]
fn test_unknown_ids() {
    let mut doc = document(NodeSchema::new("Page").with_id("P"));
    let err = doc.insert_node(&id("P"), &id("ghost"), None).unwrap_err();
    assert_eq!(err, DocumentError::NodeNotFound(id("ghost")));

    // Removing something that is not there is not an error
    doc.remove_node(&id("ghost")).unwrap();
    assert_eq!(doc.remove_node(&id("P")), Err(DocumentError::RootImmutable));
}

#[test]
fn test_reparent_emits_single_move() {
    let mut doc = document(NodeSchema::new("Page").with_id("P").with_children([
        NodeSchema::new("Leaf").with_id("A"),
        NodeSchema::new("Block").with_id("box"),
    ]));
    let log = doc.bus().record();

    doc.insert_node(&id("box"), &id("A"), None).unwrap();

    let changes = log.node_changes();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].kind, ChangeKind::Move);
    assert_eq!(changes[0].parent, Some(id("box")));
    assert_eq!(changes[0].index, Some(0));
    assert_eq!(child_ids(&doc, "P"), vec!["box"]);
    assert_eq!(child_ids(&doc, "box"), vec!["A"]);
}

#[test]
fn test_events_follow_completed_mutation() {
    let mut doc = document(NodeSchema::new("Page").with_id("P"));
    let observed = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = observed.clone();
    doc.bus().on("node:changed", move |event| {
        if let mosaic_editor::EditorEvent::NodeChanged(change) = event {
            sink.borrow_mut().push((change.kind, change.index));
        }
        Ok(())
    });

    let a = doc.create_node(&NodeSchema::new("Leaf")).unwrap();
    doc.insert_node(&id("P"), &a, None).unwrap();
    doc.remove_node(&a).unwrap();

    assert_eq!(
        *observed.borrow(),
        vec![(ChangeKind::Add, Some(0)), (ChangeKind::Remove, Some(0))]
    );
}

#[test]
fn test_remove_drops_subtree_from_index() {
    let mut doc = document(
        NodeSchema::new("Page").with_id("P").with_child(
            NodeSchema::new("Block").with_id("box").with_children([
                NodeSchema::new("Leaf").with_id("x"),
                NodeSchema::new("Leaf").with_id("y"),
            ]),
        ),
    );

    doc.remove_node(&id("box")).unwrap();

    assert_eq!(doc.node_count(), 1);
    assert!(doc.get_node("x").is_none());
    assert!(doc.check_integrity().is_empty());
}

#[test]
fn test_clone_export_round_trip() {
    let mut doc = document(
        NodeSchema::new("Page").with_id("P").with_child(
            NodeSchema::new("Block")
                .with_id("card")
                .with_prop("title", json!("Hello"))
                .with_prop("onClick", expression("this.save()"))
                .with_child(NodeSchema::new("Leaf").with_id("label")),
        ),
    );
    doc.set_condition(&id("card"), Some(expression("state.visible"))).unwrap();

    let exported = doc.export_node("card", TransformStage::Clone).unwrap();
    assert!(exported.id.is_none());

    let copy = doc.create_node(&exported).unwrap();
    let original = doc.export_node("card", TransformStage::Save).unwrap();
    let recreated = doc.export_node(copy.as_str(), TransformStage::Save).unwrap();

    assert_ne!(copy, id("card"));
    assert!(original.structurally_eq(&recreated));
}

#[test]
fn test_duplicate_node_lands_after_original() {
    let mut doc = document(NodeSchema::new("Page").with_id("P").with_children([
        NodeSchema::new("Leaf").with_id("A").with_prop("text", json!("a")),
        NodeSchema::new("Leaf").with_id("B"),
    ]));

    let copy = doc.duplicate_node(&id("A")).unwrap();

    assert_eq!(doc.index_of(copy.as_str()), Some(1));
    assert_eq!(doc.get_node(copy.as_str()).unwrap().prop("text"), Some(&json!("a")));
    assert_eq!(doc.history().undo_levels(), 1);
}

#[test]
fn test_create_node_validates_whole_subtree() {
    let mut doc = document(NodeSchema::new("Page").with_id("P"));
    let count = doc.node_count();

    let bad = NodeSchema::new("Block")
        .with_child(NodeSchema::new("Leaf").with_child(NodeSchema::default()));
    let err = doc.create_node(&bad).unwrap_err();

    assert!(matches!(err, DocumentError::InvalidSchema(_)));
    assert_eq!(doc.node_count(), count);
}

#[test]
fn test_created_nodes_get_default_props_and_fresh_ids() {
    let metas = ComponentMetaRegistry::with_builtins();
    metas
        .register(ComponentMeta::new("Button").with_default_prop("size", json!("md")), false)
        .unwrap();
    let mut doc = document_with(
        NodeSchema::new("Page")
            .with_id("P")
            .with_child(NodeSchema::new("Leaf").with_id("taken")),
        metas,
    );

    let button = doc
        .create_node(&NodeSchema::new("Button").with_id("taken"))
        .unwrap();

    assert_ne!(button, id("taken"));
    assert_eq!(doc.get_node(button.as_str()).unwrap().prop("size"), Some(&json!("md")));

    let explicit = doc
        .create_node(&NodeSchema::new("Button").with_prop("size", json!("lg")))
        .unwrap();
    assert_eq!(doc.get_node(explicit.as_str()).unwrap().prop("size"), Some(&json!("lg")));
}

#[test]
fn test_late_meta_makes_placeholder_a_container() {
    let metas = ComponentMetaRegistry::with_builtins();
    let mut doc = document_with(
        NodeSchema::new("Page")
            .with_id("P")
            .with_child(NodeSchema::new("Card").with_id("card")),
        metas.clone(),
    );
    let leaf = doc.create_node(&NodeSchema::new("Leaf")).unwrap();

    // Unknown components start out as non-container placeholders
    assert!(doc.insert_node(&id("card"), &leaf, None).is_err());

    metas.register(ComponentMeta::container("Card"), false).unwrap();
    doc.insert_node(&id("card"), &leaf, None).unwrap();
    assert_eq!(doc.children_of("card"), &[leaf]);
}

#[test]
fn test_transact_rolls_back_on_error() {
    let mut doc = document(NodeSchema::new("Page").with_id("P").with_children([
        NodeSchema::new("Leaf").with_id("A"),
        NodeSchema::new("Leaf").with_id("B"),
    ]));
    let before = doc.export(TransformStage::Save);

    let result = doc.transact(Some("broken"), |doc| {
        doc.set_prop(&id("A"), "text", json!("changed"))?;
        doc.remove_node(&id("B"))?;
        doc.insert_node(&id("A"), &id("P"), None)
    });

    assert!(result.is_err());
    assert_eq!(doc.export(TransformStage::Save), before);
    assert!(!doc.history().is_undoable());
    assert!(!doc.history().in_transaction());
}

#[test]
fn test_index_consistent_after_mixed_operations() {
    let mut doc = document(NodeSchema::new("Page").with_id("P"));
    let mut created = Vec::new();

    for i in 0..12 {
        let schema = if i % 3 == 0 {
            NodeSchema::new("Block")
        } else {
            NodeSchema::new("Leaf")
        };
        let node = doc.create_node(&schema).unwrap();
        let parent = created
            .iter()
            .rev()
            .find(|c: &&NodeId| {
                doc.get_node(c.as_str()).map_or(false, |n| n.component_name() == "Block")
            })
            .cloned()
            .unwrap_or_else(|| id("P"));
        doc.insert_node(&parent, &node, Some(i % 2)).unwrap();
        created.push(node);
    }

    doc.insert_node(&id("P"), &created[3], Some(0)).unwrap();
    doc.remove_node(&created[0]).unwrap();
    doc.insert_node(&id("P"), &created[9], None).unwrap();

    assert!(doc.check_integrity().is_empty(), "{:?}", doc.check_integrity());
    for node_id in doc.node_ids() {
        assert!(doc.is_attached(node_id.as_str()));
    }
    let exported = doc.export(TransformStage::Save);
    assert_eq!(exported.node_count(), doc.node_count());
}

#[test]
fn test_closed_document_rejects_mutation() {
    let mut doc = document(NodeSchema::new("Page").with_id("P"));
    let log = doc.bus().record();
    doc.close();

    assert_eq!(
        doc.set_hidden(&id("P"), true),
        Err(DocumentError::DocumentClosed("doc".into()))
    );
    assert_eq!(log.types(), vec!["document:closed"]);
}
