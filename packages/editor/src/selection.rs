//! # Selection
//!
//! Tracks which nodes are selected. Membership is advisory metadata held
//! outside the tree: a node does not know it is selected, and ids that no
//! longer resolve are simply skipped when queried against a document.

use crate::document::Document;
use crate::event_bus::{EditorEvent, EventBus};
use crate::node::NodeId;

#[derive(Debug)]
pub struct Selection {
    selected: Vec<NodeId>,
    bus: EventBus,
}

impl Selection {
    pub fn new(bus: EventBus) -> Self {
        Self {
            selected: Vec::new(),
            bus,
        }
    }

    /// Select exactly one node
    pub fn select(&mut self, id: NodeId) {
        if self.selected.len() == 1 && self.selected[0] == id {
            return;
        }
        self.selected = vec![id];
        self.notify();
    }

    /// Add a node to the selection
    pub fn add(&mut self, id: NodeId) {
        if self.has(id.as_str()) {
            return;
        }
        self.selected.push(id);
        self.notify();
    }

    /// Remove a node from the selection
    pub fn remove(&mut self, id: &str) {
        let before = self.selected.len();
        self.selected.retain(|s| s.as_str() != id);
        if self.selected.len() != before {
            self.notify();
        }
    }

    pub fn has(&self, id: &str) -> bool {
        self.selected.iter().any(|s| s.as_str() == id)
    }

    /// Replace the whole selection
    pub fn select_all(&mut self, ids: impl IntoIterator<Item = NodeId>) {
        let mut next: Vec<NodeId> = Vec::new();
        for id in ids {
            if !next.contains(&id) {
                next.push(id);
            }
        }
        if next == self.selected {
            return;
        }
        self.selected = next;
        self.notify();
    }

    pub fn clear(&mut self) {
        if self.selected.is_empty() {
            return;
        }
        self.selected.clear();
        self.notify();
    }

    pub fn selected(&self) -> &[NodeId] {
        &self.selected
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Drop ids that no longer exist in the document's tree
    pub fn prune(&mut self, doc: &Document) {
        let before = self.selected.len();
        self.selected.retain(|id| doc.is_attached(id.as_str()));
        if self.selected.len() != before {
            self.notify();
        }
    }

    /// Selected nodes that are not nested inside another selected node
    ///
    /// Nodes under a locked ancestor are not selectable on the canvas; they
    /// are only returned when `include_non_selectable_descendants` is set.
    pub fn get_top_nodes(
        &self,
        doc: &Document,
        include_non_selectable_descendants: bool,
    ) -> Vec<NodeId> {
        self.selected
            .iter()
            .filter(|id| doc.is_attached(id.as_str()))
            .filter(|id| {
                let ancestors = doc.ancestors(id.as_str());
                let covered = ancestors.iter().any(|ancestor| self.has(ancestor.as_str()));
                let locked_in = ancestors.iter().any(|ancestor| {
                    doc.get_node(ancestor.as_str()).map_or(false, |n| n.is_locked())
                });
                !covered && (include_non_selectable_descendants || !locked_in)
            })
            .cloned()
            .collect()
    }

    fn notify(&self) {
        self.bus.emit(EditorEvent::SelectionChanged {
            selected: self.selected.clone(),
        });
    }
}
