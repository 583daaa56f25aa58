//! # Document
//!
//! Core tree abstraction for Mosaic editing.
//!
//! A Document owns one root node, an arena/index from id to node record, and
//! one `History`. Nodes created with `create_node` live in the arena as
//! detached subtrees until they are inserted.
//!
//! ## Mutation protocol
//!
//! ```text
//! validate ──► apply to arena ──► notify History ──► emit NodeChanged
//! ```
//!
//! Every mutation validates before touching the arena, so a failed call
//! leaves the tree exactly as it was. Events are emitted only after the
//! mutation is complete; observers never see a half-applied tree.

use crate::event_bus::{ChangeKind, EditorEvent, EventBus, NodeChange};
use crate::history::{History, HistoryConfig};
use crate::meta::ComponentMetaRegistry;
use crate::node::{Node, NodeId};
use mosaic_common::{IdGenerator, MissingNameFinder, NodeSchema, TransformStage};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DocumentError {
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Node {parent} ({component}) cannot contain children")]
    NotContainer { parent: NodeId, component: String },

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Moving {node} into {parent} would create a cycle")]
    CycleDetected { node: NodeId, parent: NodeId },

    #[error("The root node cannot be removed or moved")]
    RootImmutable,

    #[error("Document {0} is closed")]
    DocumentClosed(String),
}

/// Lifecycle of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Open,
    Closed,
}

/// Per-component export customization
///
/// Receives the schema a node would emit for `stage` (children already
/// exported) and returns what should be emitted instead.
pub trait ExportHook {
    fn export(&self, schema: NodeSchema, stage: TransformStage) -> NodeSchema;
}

impl<F> ExportHook for F
where
    F: Fn(NodeSchema, TransformStage) -> NodeSchema,
{
    fn export(&self, schema: NodeSchema, stage: TransformStage) -> NodeSchema {
        self(schema, stage)
    }
}

/// Editable component tree
pub struct Document {
    id: String,
    state: DocumentState,
    root: NodeId,
    nodes: HashMap<NodeId, Node>,
    ids: IdGenerator,
    history: History,
    metas: ComponentMetaRegistry,
    bus: EventBus,
    export_hooks: HashMap<String, Rc<dyn ExportHook>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("root", &self.root)
            .field("nodes", &self.nodes.len())
            .field("history", &self.history)
            .finish()
    }
}

impl Document {
    /// Create an open document from a root schema
    pub fn new(
        id: impl Into<String>,
        root: &NodeSchema,
        metas: ComponentMetaRegistry,
        bus: EventBus,
        history: HistoryConfig,
    ) -> Result<Self, DocumentError> {
        validate_schema(root)?;

        let id = id.into();
        let mut doc = Self {
            ids: IdGenerator::new(&id),
            id,
            state: DocumentState::Open,
            root: NodeId::new(""),
            nodes: HashMap::new(),
            history: History::new(NodeSchema::default(), history),
            metas,
            bus,
            export_hooks: HashMap::new(),
        };

        doc.root = doc.build(root, None, false);
        let snapshot = doc.snapshot();
        doc.history.reset(snapshot);

        tracing::debug!("[Document] {} created with {} nodes", doc.id, doc.nodes.len());
        doc.bus.emit(EditorEvent::DocumentOpened {
            document_id: doc.id.clone(),
        });
        Ok(doc)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == DocumentState::Open
    }

    pub fn open(&mut self) {
        if self.state == DocumentState::Closed {
            self.state = DocumentState::Open;
            self.bus.emit(EditorEvent::DocumentOpened {
                document_id: self.id.clone(),
            });
        }
    }

    pub fn close(&mut self) {
        if self.state == DocumentState::Open {
            self.state = DocumentState::Closed;
            self.bus.emit(EditorEvent::DocumentClosed {
                document_id: self.id.clone(),
            });
        }
    }

    pub fn root_id(&self) -> &NodeId {
        &self.root
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.get(&self.root)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn metas(&self) -> &ComponentMetaRegistry {
        &self.metas
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// O(1) lookup (attached or detached)
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of indexed nodes (including detached subtrees)
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.keys()
    }

    pub fn parent_of(&self, id: &str) -> Option<&NodeId> {
        self.nodes.get(id).and_then(|node| node.parent.as_ref())
    }

    pub fn children_of(&self, id: &str) -> &[NodeId] {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or(&[])
    }

    /// Position of a node within its parent's children
    pub fn index_of(&self, id: &str) -> Option<usize> {
        let parent = self.parent_of(id)?;
        self.children_of(parent.as_str()).iter().position(|c| c.as_str() == id)
    }

    /// Ancestors from nearest to farthest
    pub fn ancestors(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut cursor = self.parent_of(id);
        while let Some(parent) = cursor {
            out.push(parent.clone());
            cursor = self.parent_of(parent.as_str());
        }
        out
    }

    /// True if `ancestor` is a strict ancestor of `node`
    pub fn is_ancestor_of(&self, ancestor: &str, node: &str) -> bool {
        let mut cursor = self.parent_of(node);
        while let Some(parent) = cursor {
            if parent.as_str() == ancestor {
                return true;
            }
            cursor = self.parent_of(parent.as_str());
        }
        false
    }

    /// All descendants in pre-order (excluding the node itself)
    pub fn descendants(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<&NodeId> = self.children_of(id).iter().rev().collect();
        while let Some(next) = stack.pop() {
            out.push(next.clone());
            stack.extend(self.children_of(next.as_str()).iter().rev());
        }
        out
    }

    /// Whether the node is reachable from the root
    pub fn is_attached(&self, id: &str) -> bool {
        if !self.nodes.contains_key(id) {
            return false;
        }
        id == self.root.as_str() || self.is_ancestor_of(self.root.as_str(), id)
    }

    /// Register a custom export hook for a component type
    pub fn register_export_hook(
        &mut self,
        component_name: impl Into<String>,
        hook: Rc<dyn ExportHook>,
    ) {
        self.export_hooks.insert(component_name.into(), hook);
    }

    /// Construct a detached node (and its subtree) from a schema
    pub fn create_node(&mut self, schema: &NodeSchema) -> Result<NodeId, DocumentError> {
        self.ensure_open()?;
        validate_schema(schema)?;

        let id = self.build(schema, None, true);
        tracing::debug!("[Document] created {} ({})", id, schema.component_name);
        Ok(id)
    }

    /// Insert (or re-parent) `node` under `parent` at `index` (default: end)
    ///
    /// For a node already under `parent`, `index` is its final position.
    pub fn insert_node(
        &mut self,
        parent: &NodeId,
        node: &NodeId,
        index: Option<usize>,
    ) -> Result<NodeId, DocumentError> {
        self.ensure_open()?;

        let parent_node = self
            .nodes
            .get(parent)
            .ok_or_else(|| DocumentError::NodeNotFound(parent.clone()))?;
        let child = self
            .nodes
            .get(node)
            .ok_or_else(|| DocumentError::NodeNotFound(node.clone()))?;

        if *node == self.root {
            return Err(DocumentError::RootImmutable);
        }
        if node == parent || self.is_ancestor_of(node.as_str(), parent.as_str()) {
            return Err(DocumentError::CycleDetected {
                node: node.clone(),
                parent: parent.clone(),
            });
        }
        if !self.metas.is_container(&parent_node.component_name) {
            return Err(DocumentError::NotContainer {
                parent: parent.clone(),
                component: parent_node.component_name.clone(),
            });
        }

        let old_parent = child.parent.clone();
        let missing_parent = || DocumentError::NodeNotFound(parent.clone());
        let kind;
        let position;

        if old_parent.as_ref() == Some(parent) {
            let siblings = self.children_mut(parent).ok_or_else(missing_parent)?;
            let current = siblings.iter().position(|c| c == node).unwrap_or(0);
            let last = siblings.len().saturating_sub(1);
            let target = index.unwrap_or(last).min(last);
            if current == target {
                return Ok(node.clone());
            }

            siblings.remove(current);
            siblings.insert(target, node.clone());
            kind = ChangeKind::Move;
            position = target;
        } else {
            if let Some(old) = &old_parent {
                if let Some(siblings) = self.children_mut(old) {
                    siblings.retain(|c| c != node);
                }
            }

            let siblings = self.children_mut(parent).ok_or_else(missing_parent)?;
            let target = index.unwrap_or(siblings.len()).min(siblings.len());
            siblings.insert(target, node.clone());
            if let Some(record) = self.nodes.get_mut(node) {
                record.parent = Some(parent.clone());
            }

            kind = if old_parent.is_some() {
                ChangeKind::Move
            } else {
                ChangeKind::Add
            };
            position = target;
        }

        self.changed(NodeChange {
            document_id: self.id.clone(),
            node_id: node.clone(),
            kind,
            parent: Some(parent.clone()),
            index: Some(position),
            prop: None,
        });
        Ok(node.clone())
    }

    /// Detach a node and its subtree from the tree and the index
    ///
    /// No-op for unknown or detached nodes.
    pub fn remove_node(&mut self, node: &NodeId) -> Result<(), DocumentError> {
        self.ensure_open()?;

        if *node == self.root {
            return Err(DocumentError::RootImmutable);
        }

        let Some(parent) = self.parent_of(node.as_str()).cloned() else {
            return Ok(());
        };
        let index = self.index_of(node.as_str());

        let subtree = self.descendants(node.as_str());
        if let Some(siblings) = self.children_mut(&parent) {
            siblings.retain(|c| c != node);
        }
        self.nodes.remove(node);
        for id in &subtree {
            self.nodes.remove(id);
        }

        tracing::debug!("[Document] removed {} (+{} descendants)", node, subtree.len());
        self.changed(NodeChange {
            document_id: self.id.clone(),
            node_id: node.clone(),
            kind: ChangeKind::Remove,
            parent: Some(parent),
            index,
            prop: None,
        });
        Ok(())
    }

    /// Drop every detached subtree from the index. Returns how many nodes went.
    pub fn purge_detached(&mut self) -> usize {
        let detached: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|(id, node)| node.parent.is_none() && **id != self.root)
            .map(|(id, _)| id.clone())
            .collect();

        let mut purged = 0;
        for id in detached {
            for descendant in self.descendants(id.as_str()) {
                self.nodes.remove(&descendant);
                purged += 1;
            }
            self.nodes.remove(&id);
            purged += 1;
        }
        purged
    }

    /// Set (or replace) a prop value
    pub fn set_prop(
        &mut self,
        node: &NodeId,
        key: &str,
        value: Value,
    ) -> Result<(), DocumentError> {
        self.update(node, Some(key), |record| {
            if record.props.get(key) == Some(&value) {
                return false;
            }
            record.props.insert(key.to_string(), value);
            true
        })
    }

    pub fn remove_prop(&mut self, node: &NodeId, key: &str) -> Result<(), DocumentError> {
        self.update(node, Some(key), |record| record.props.remove(key).is_some())
    }

    pub fn set_hidden(&mut self, node: &NodeId, hidden: bool) -> Result<(), DocumentError> {
        self.update(node, Some("isHidden"), |record| {
            std::mem::replace(&mut record.is_hidden, hidden) != hidden
        })
    }

    pub fn set_locked(&mut self, node: &NodeId, locked: bool) -> Result<(), DocumentError> {
        self.update(node, Some("isLocked"), |record| {
            std::mem::replace(&mut record.is_locked, locked) != locked
        })
    }

    pub fn set_condition(
        &mut self,
        node: &NodeId,
        condition: Option<Value>,
    ) -> Result<(), DocumentError> {
        self.update(node, Some("condition"), |record| {
            std::mem::replace(&mut record.condition, condition.clone()) != condition
        })
    }

    pub fn set_loop(&mut self, node: &NodeId, loop_: Option<Value>) -> Result<(), DocumentError> {
        self.update(node, Some("loop"), |record| {
            std::mem::replace(&mut record.loop_, loop_.clone()) != loop_
        })
    }

    /// Copy a node (fresh ids) and insert the copy right after the original
    pub fn duplicate_node(&mut self, node: &NodeId) -> Result<NodeId, DocumentError> {
        self.ensure_open()?;
        if *node == self.root {
            return Err(DocumentError::RootImmutable);
        }

        let schema = self.export_node(node.as_str(), TransformStage::Clone)?;
        let parent = self
            .parent_of(node.as_str())
            .cloned()
            .ok_or_else(|| DocumentError::NodeNotFound(node.clone()))?;
        let index = self.index_of(node.as_str()).map(|i| i + 1);

        self.transact(Some("duplicate"), |doc| {
            let copy = doc.create_node(&schema)?;
            doc.insert_node(&parent, &copy, index)
        })
    }

    /// Serialize the whole tree for a target stage
    pub fn export(&self, stage: TransformStage) -> NodeSchema {
        self.root()
            .map(|root| self.export_subtree(root, stage, true))
            .unwrap_or_default()
    }

    /// Serialize one subtree for a target stage
    pub fn export_node(
        &self,
        id: &str,
        stage: TransformStage,
    ) -> Result<NodeSchema, DocumentError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| DocumentError::NodeNotFound(NodeId::new(id)))?;
        Ok(self.export_subtree(node, stage, true))
    }

    /// Raw tree state for history and rollback; export hooks never run here.
    fn snapshot(&self) -> NodeSchema {
        self.root()
            .map(|root| self.export_subtree(root, TransformStage::Save, false))
            .unwrap_or_default()
    }

    fn export_subtree(&self, node: &Node, stage: TransformStage, hooks: bool) -> NodeSchema {
        let mut schema = node.to_schema(stage.keeps_ids());
        if stage == TransformStage::Render {
            schema.is_locked = false;
        }

        schema.children = node
            .children
            .iter()
            .filter_map(|child| self.nodes.get(child))
            .map(|child| self.export_subtree(child, stage, hooks))
            .collect();

        match self.export_hooks.get(&node.component_name) {
            Some(hook) if hooks => hook.export(schema, stage),
            _ => schema,
        }
    }

    /// Replace the whole tree with a schema, as one undoable step
    pub fn import(&mut self, schema: &NodeSchema) -> Result<(), DocumentError> {
        self.ensure_open()?;
        validate_schema(schema)?;

        self.replace_tree(schema);
        self.history.mark_dirty();
        if !self.history.in_transaction() {
            self.record_history();
        }
        Ok(())
    }

    pub fn start_transaction(&mut self, label: Option<&str>) {
        self.history.start_transaction(label.map(str::to_string));
    }

    pub fn commit_transaction(&mut self) {
        if self.history.commit_transaction() {
            self.record_history();
        }
    }

    /// Run `f` as one undo step; on error the tree is restored to how it
    /// looked before `f` ran and nothing is recorded.
    pub fn transact<T>(
        &mut self,
        label: Option<&str>,
        f: impl FnOnce(&mut Self) -> Result<T, DocumentError>,
    ) -> Result<T, DocumentError> {
        self.ensure_open()?;

        let before = self.snapshot();
        self.start_transaction(label);

        match f(self) {
            Ok(value) => {
                self.commit_transaction();
                Ok(value)
            }
            Err(e) => {
                if self.snapshot() != before {
                    tracing::debug!("[Document] rolling back failed transaction: {}", e);
                    self.replace_tree(&before);
                }
                self.history.abort_transaction();
                Err(e)
            }
        }
    }

    /// Undo the last step. Returns false when there was nothing to undo.
    pub fn undo(&mut self) -> Result<bool, DocumentError> {
        self.ensure_open()?;
        let Some(snapshot) = self.history.back() else {
            return Ok(false);
        };

        self.replace_tree(&snapshot);
        self.emit_history_state();
        Ok(true)
    }

    /// Redo the last undone step. Returns false when there was nothing to redo.
    pub fn redo(&mut self) -> Result<bool, DocumentError> {
        self.ensure_open()?;
        let Some(snapshot) = self.history.forward() else {
            return Ok(false);
        };

        self.replace_tree(&snapshot);
        self.emit_history_state();
        Ok(true)
    }

    /// Mark the current state as saved
    pub fn save_point(&mut self) {
        self.history.save_point();
        self.emit_history_state();
    }

    /// Verify the arena against the tree. Returns every problem found.
    pub fn check_integrity(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let mut seen: HashSet<&NodeId> = HashSet::new();

        let detached = self
            .nodes
            .iter()
            .filter(|(id, node)| node.parent.is_none() && **id != self.root)
            .map(|(id, _)| id);

        for top in std::iter::once(&self.root).chain(detached) {
            let mut stack = vec![top];
            while let Some(id) = stack.pop() {
                let Some(node) = self.nodes.get(id) else {
                    problems.push(format!("{} is linked but not indexed", id));
                    continue;
                };
                if !seen.insert(id) {
                    problems.push(format!("{} is reachable more than once", id));
                    continue;
                }
                for child in &node.children {
                    match self.nodes.get(child) {
                        Some(record) if record.parent.as_ref() != Some(id) => {
                            problems.push(format!(
                                "{} lists {} but its parent is {:?}",
                                id, child, record.parent
                            ));
                        }
                        _ => {}
                    }
                    stack.push(child);
                }
            }
        }

        for id in self.nodes.keys() {
            if !seen.contains(id) {
                problems.push(format!("{} is indexed but unreachable", id));
            }
        }
        problems
    }

    fn ensure_open(&self) -> Result<(), DocumentError> {
        match self.state {
            DocumentState::Open => Ok(()),
            DocumentState::Closed => Err(DocumentError::DocumentClosed(self.id.clone())),
        }
    }

    fn children_mut(&mut self, id: &NodeId) -> Option<&mut Vec<NodeId>> {
        self.nodes.get_mut(id).map(|node| &mut node.children)
    }

    /// Instantiate a validated schema into the arena
    fn build(
        &mut self,
        schema: &NodeSchema,
        parent: Option<NodeId>,
        apply_defaults: bool,
    ) -> NodeId {
        let id = match &schema.id {
            Some(id) if !id.is_empty() && !self.nodes.contains_key(id.as_str()) => {
                NodeId::new(id.clone())
            }
            _ => {
                let nodes = &self.nodes;
                NodeId::new(self.ids.next_free(|candidate| nodes.contains_key(candidate)))
            }
        };

        let mut node = Node::from_schema(id.clone(), schema, parent);
        if apply_defaults {
            for (key, value) in self.metas.default_props(&schema.component_name) {
                if !node.props.contains_key(&key) {
                    node.props.insert(key, value);
                }
            }
        }
        self.nodes.insert(id.clone(), node);

        let children: Vec<NodeId> = schema
            .children
            .iter()
            .map(|child| self.build(child, Some(id.clone()), apply_defaults))
            .collect();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.children = children;
        }
        id
    }

    /// Rebuild the arena from a snapshot without touching history
    fn replace_tree(&mut self, schema: &NodeSchema) {
        self.nodes.clear();
        self.root = self.build(schema, None, false);
        self.bus.emit(EditorEvent::TreeReplaced {
            document_id: self.id.clone(),
        });
    }

    fn update(
        &mut self,
        node: &NodeId,
        prop: Option<&str>,
        apply: impl FnOnce(&mut Node) -> bool,
    ) -> Result<(), DocumentError> {
        self.ensure_open()?;

        let record = self
            .nodes
            .get_mut(node)
            .ok_or_else(|| DocumentError::NodeNotFound(node.clone()))?;
        if !apply(record) {
            return Ok(());
        }

        let parent = record.parent.clone();
        let index = self.index_of(node.as_str());
        self.changed(NodeChange {
            document_id: self.id.clone(),
            node_id: node.clone(),
            kind: ChangeKind::PropChange,
            parent,
            index,
            prop: prop.map(str::to_string),
        });
        Ok(())
    }

    fn changed(&mut self, change: NodeChange) {
        self.history.mark_dirty();
        self.bus.emit(EditorEvent::NodeChanged(change));
        if !self.history.in_transaction() {
            self.record_history();
        }
    }

    fn record_history(&mut self) {
        let snapshot = self.snapshot();
        if self.history.record(snapshot) {
            self.emit_history_state();
        }
    }

    fn emit_history_state(&self) {
        let state = self.history.state();
        self.bus.emit(EditorEvent::HistoryChanged {
            document_id: self.id.clone(),
            undoable: state.undoable,
            redoable: state.redoable,
            modified: state.modified,
        });
    }
}

fn validate_schema(schema: &NodeSchema) -> Result<(), DocumentError> {
    match MissingNameFinder::check(schema) {
        None => Ok(()),
        Some(path) if path.is_empty() => Err(DocumentError::InvalidSchema(
            "componentName is required".to_string(),
        )),
        Some(path) => Err(DocumentError::InvalidSchema(format!(
            "componentName is required (child path {:?})",
            path
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(root: NodeSchema) -> Document {
        Document::new(
            "test",
            &root,
            ComponentMetaRegistry::with_builtins(),
            EventBus::new(),
            HistoryConfig::default(),
        )
        .unwrap()
    }

    fn page() -> NodeSchema {
        NodeSchema::new("Page").with_id("root").with_children([
            NodeSchema::new("Leaf").with_id("a"),
            NodeSchema::new("Leaf").with_id("b"),
        ])
    }

    #[test]
    fn test_create_document() {
        let doc = document(page());
        assert_eq!(doc.root_id().as_str(), "root");
        assert_eq!(doc.node_count(), 3);
        assert_eq!(doc.children_of("root"), &[NodeId::new("a"), NodeId::new("b")]);
        assert!(doc.check_integrity().is_empty());
        assert!(!doc.history().is_undoable());
    }

    #[test]
    fn test_invalid_root_schema() {
        let result = Document::new(
            "bad",
            &NodeSchema::default(),
            ComponentMetaRegistry::new(),
            EventBus::new(),
            HistoryConfig::default(),
        );
        assert!(matches!(result, Err(DocumentError::InvalidSchema(_))));
    }

    #[test]
    fn test_duplicate_ids_are_replaced() {
        let doc = document(
            NodeSchema::new("Page").with_id("root").with_children([
                NodeSchema::new("Leaf").with_id("x"),
                NodeSchema::new("Leaf").with_id("x"),
            ]),
        );
        let children = doc.children_of("root");
        assert_eq!(children.len(), 2);
        assert_ne!(children[0], children[1]);
        assert!(doc.check_integrity().is_empty());
    }

    #[test]
    fn test_set_prop_emits_and_records() {
        let mut doc = document(page());
        let log = doc.bus().record();

        doc.set_prop(&NodeId::new("a"), "text", json!("hi")).unwrap();
        assert_eq!(doc.get_node("a").unwrap().prop("text"), Some(&json!("hi")));
        assert!(doc.history().is_undoable());

        // Same value again is not a change
        doc.set_prop(&NodeId::new("a"), "text", json!("hi")).unwrap();
        assert_eq!(doc.history().undo_levels(), 1);

        let changes = log.node_changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::PropChange);
        assert_eq!(changes[0].prop.as_deref(), Some("text"));
    }

    #[test]
    fn test_closed_document_rejects_mutation() {
        let mut doc = document(page());
        doc.close();
        assert!(!doc.is_open());

        let err = doc.remove_node(&NodeId::new("a")).unwrap_err();
        assert_eq!(err, DocumentError::DocumentClosed("test".into()));
        assert!(doc.create_node(&NodeSchema::new("Leaf")).is_err());

        doc.open();
        doc.remove_node(&NodeId::new("a")).unwrap();
        assert!(!doc.contains("a"));
    }

    #[test]
    fn test_export_hook_customizes_stage() {
        let mut doc = document(page());
        doc.register_export_hook(
            "Leaf",
            Rc::new(|mut schema: NodeSchema, stage: TransformStage| {
                if stage == TransformStage::Save {
                    schema.props.insert("saved".into(), json!(true));
                }
                schema
            }),
        );

        let saved = doc.export(TransformStage::Save);
        assert_eq!(saved.children[0].props.get("saved"), Some(&json!(true)));

        let rendered = doc.export(TransformStage::Render);
        assert!(rendered.children[0].props.get("saved").is_none());
    }

    #[test]
    fn test_render_stage_drops_lock_flag() {
        let mut doc = document(page());
        doc.set_locked(&NodeId::new("a"), true).unwrap();

        assert!(doc.export(TransformStage::Save).children[0].is_locked);
        assert!(!doc.export(TransformStage::Render).children[0].is_locked);
    }

    #[test]
    fn test_purge_detached() {
        let mut doc = document(page());
        doc.create_node(&NodeSchema::new("Block").with_child(NodeSchema::new("Leaf")))
            .unwrap();
        assert_eq!(doc.node_count(), 5);
        assert!(doc.check_integrity().is_empty());

        assert_eq!(doc.purge_detached(), 2);
        assert_eq!(doc.node_count(), 3);
    }
}
