//! # Undo/Redo History
//!
//! Tracks whole-tree snapshots and enables undo/redo.
//!
//! ## Design
//!
//! - `current` is the snapshot of the tree as of the last commit
//! - Committing a changed snapshot pushes `current` to the undo stack
//! - Undo moves `current` to the redo stack and pops the undo stack
//! - New commits clear the redo stack (linear history)
//! - Transactions nest; only the outermost commit records a snapshot
//! - The oldest entries are evicted once `max_depth` is exceeded
//!
//! The history never touches the tree itself: the owning `Document` hands it
//! snapshots and restores whatever `back`/`forward` return.

use chrono::{DateTime, Utc};
use mosaic_common::NodeSchema;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// History settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Maximum number of undo levels (0 = unlimited)
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    100
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

/// One recorded tree state
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub transaction_id: u64,
    pub snapshot: Rc<NodeSchema>,
    pub label: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    fn new(transaction_id: u64, snapshot: NodeSchema, label: Option<String>) -> Self {
        Self {
            transaction_id,
            snapshot: Rc::new(snapshot),
            label,
            recorded_at: Utc::now(),
        }
    }
}

/// Summary used for UI gating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryState {
    pub undoable: bool,
    pub redoable: bool,
    pub modified: bool,
}

#[derive(Debug)]
pub struct History {
    /// Previous states (most recent last)
    undo_stack: Vec<HistoryEntry>,

    /// Undone states (most recent last)
    redo_stack: Vec<HistoryEntry>,

    current: HistoryEntry,

    max_depth: usize,

    /// Transaction nesting level
    depth: usize,

    /// A mutation happened inside the open transaction
    dirty: bool,

    pending_label: Option<String>,

    next_transaction: u64,

    save_point: Option<u64>,
}

impl History {
    pub fn new(initial: NodeSchema, config: HistoryConfig) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            current: HistoryEntry::new(0, initial, None),
            max_depth: config.max_depth,
            depth: 0,
            dirty: false,
            pending_label: None,
            next_transaction: 1,
            save_point: Some(0),
        }
    }

    /// Open a transaction (nestable)
    pub fn start_transaction(&mut self, label: Option<String>) {
        self.depth += 1;
        if self.depth == 1 {
            self.dirty = false;
            self.pending_label = label;
        }
    }

    /// Close a transaction. Returns true when the outermost transaction
    /// closed with changes, i.e. the caller must `record` a snapshot.
    pub fn commit_transaction(&mut self) -> bool {
        if self.depth == 0 {
            tracing::warn!("[History] commit without an open transaction");
            return false;
        }

        self.depth -= 1;
        self.depth == 0 && std::mem::take(&mut self.dirty)
    }

    /// Close a transaction without recording. Returns true for the outermost one.
    pub fn abort_transaction(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }

        self.depth -= 1;
        if self.depth == 0 {
            self.dirty = false;
            self.pending_label = None;
            true
        } else {
            false
        }
    }

    pub fn in_transaction(&self) -> bool {
        self.depth > 0
    }

    /// Note that the tree changed inside the open transaction
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Record a new tree state. Returns false if nothing changed.
    pub fn record(&mut self, snapshot: NodeSchema) -> bool {
        let label = self.pending_label.take();

        if *self.current.snapshot == snapshot {
            return false;
        }

        let entry = HistoryEntry::new(self.next_transaction, snapshot, label);
        self.next_transaction += 1;

        let previous = std::mem::replace(&mut self.current, entry);
        self.undo_stack.push(previous);

        // Trim if exceeded max depth
        if self.max_depth > 0 && self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }

        // New action invalidates the future
        self.redo_stack.clear();

        tracing::debug!(
            "[History] recorded transaction {} ({} undo levels)",
            self.current.transaction_id,
            self.undo_stack.len()
        );
        true
    }

    /// Step back. Returns the snapshot to restore, or None if nothing to undo.
    pub fn back(&mut self) -> Option<Rc<NodeSchema>> {
        if self.in_transaction() {
            tracing::warn!("[History] undo ignored while a transaction is open");
            return None;
        }

        let previous = self.undo_stack.pop()?;
        let undone = std::mem::replace(&mut self.current, previous);
        self.redo_stack.push(undone);
        Some(self.current.snapshot.clone())
    }

    /// Step forward. Returns the snapshot to restore, or None if nothing to redo.
    pub fn forward(&mut self) -> Option<Rc<NodeSchema>> {
        if self.in_transaction() {
            tracing::warn!("[History] redo ignored while a transaction is open");
            return None;
        }

        let next = self.redo_stack.pop()?;
        let redone = std::mem::replace(&mut self.current, next);
        self.undo_stack.push(redone);
        Some(self.current.snapshot.clone())
    }

    pub fn is_undoable(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn is_redoable(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Label of the step `back` would undo
    pub fn undo_label(&self) -> Option<&str> {
        if self.undo_stack.is_empty() {
            return None;
        }
        self.current.label.as_deref()
    }

    /// Label of the step `forward` would redo
    pub fn redo_label(&self) -> Option<&str> {
        self.redo_stack.last().and_then(|entry| entry.label.as_deref())
    }

    /// Snapshot of the last committed state
    pub fn current(&self) -> &HistoryEntry {
        &self.current
    }

    /// Mark the current state as saved
    pub fn save_point(&mut self) {
        self.save_point = Some(self.current.transaction_id);
    }

    /// Whether the tree differs from the last save point
    pub fn is_modified(&self) -> bool {
        self.save_point != Some(self.current.transaction_id)
    }

    pub fn state(&self) -> HistoryState {
        HistoryState {
            undoable: self.is_undoable(),
            redoable: self.is_redoable(),
            modified: self.is_modified(),
        }
    }

    /// Drop all undo/redo levels, keeping the current state
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Forget everything and start over from `snapshot`
    pub(crate) fn reset(&mut self, snapshot: NodeSchema) {
        self.clear();
        self.current = HistoryEntry::new(self.next_transaction, snapshot, None);
        self.next_transaction += 1;
        self.save_point = Some(self.current.transaction_id);
        self.depth = 0;
        self.dirty = false;
        self.pending_label = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree(label: &str) -> NodeSchema {
        NodeSchema::new("Page").with_prop("label", json!(label))
    }

    #[test]
    fn test_history_creation() {
        let history = History::new(tree("a"), HistoryConfig::default());
        assert_eq!(history.undo_levels(), 0);
        assert_eq!(history.redo_levels(), 0);
        assert!(!history.is_undoable());
        assert!(!history.is_redoable());
        assert!(!history.is_modified());
    }

    #[test]
    fn test_record_and_undo_redo() {
        let mut history = History::new(tree("a"), HistoryConfig::default());

        assert!(history.record(tree("b")));
        assert!(history.is_undoable());
        assert!(history.is_modified());

        let restored = history.back().unwrap();
        assert_eq!(*restored, tree("a"));
        assert!(history.is_redoable());
        assert!(!history.is_modified());

        let restored = history.forward().unwrap();
        assert_eq!(*restored, tree("b"));
        assert_eq!(history.undo_levels(), 1);
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_back_on_empty_stack_is_noop() {
        let mut history = History::new(tree("a"), HistoryConfig::default());
        assert!(history.back().is_none());
        assert!(history.forward().is_none());
        assert_eq!(*history.current().snapshot, tree("a"));
    }

    #[test]
    fn test_unchanged_snapshot_is_not_recorded() {
        let mut history = History::new(tree("a"), HistoryConfig::default());
        assert!(!history.record(tree("a")));
        assert!(!history.is_undoable());
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut history = History::new(tree("a"), HistoryConfig::default());
        history.record(tree("b"));
        history.back();
        assert_eq!(history.redo_levels(), 1);

        history.record(tree("c"));
        assert_eq!(history.redo_levels(), 0);
    }

    #[test]
    fn test_max_depth_enforced() {
        let mut history = History::new(tree("0"), HistoryConfig { max_depth: 2 });
        for i in 1..=3 {
            history.record(tree(&i.to_string()));
        }

        assert_eq!(history.undo_levels(), 2);
        history.back();
        let oldest = history.back().unwrap();
        assert_eq!(*oldest, tree("1"));
        assert!(history.back().is_none());
    }

    #[test]
    fn test_nested_transactions_record_once() {
        let mut history = History::new(tree("a"), HistoryConfig::default());

        history.start_transaction(Some("move".into()));
        history.start_transaction(None);
        history.mark_dirty();
        assert!(!history.commit_transaction());
        assert!(history.in_transaction());
        assert!(history.commit_transaction());
        assert!(!history.in_transaction());

        history.record(tree("b"));
        assert_eq!(history.undo_label(), Some("move"));
    }

    #[test]
    fn test_clean_transaction_needs_no_record() {
        let mut history = History::new(tree("a"), HistoryConfig::default());
        history.start_transaction(None);
        assert!(!history.commit_transaction());
        assert!(!history.commit_transaction());
    }

    #[test]
    fn test_undo_blocked_inside_transaction() {
        let mut history = History::new(tree("a"), HistoryConfig::default());
        history.record(tree("b"));
        history.start_transaction(None);
        assert!(history.back().is_none());
        assert!(history.abort_transaction());
        assert!(history.back().is_some());
    }

    #[test]
    fn test_save_point_tracks_modification() {
        let mut history = History::new(tree("a"), HistoryConfig::default());
        history.record(tree("b"));
        history.save_point();
        assert!(!history.is_modified());

        history.back();
        assert!(history.is_modified());
        history.forward();
        assert_eq!(
            history.state(),
            HistoryState {
                undoable: true,
                redoable: false,
                modified: false
            }
        );
    }
}
