//! # Mosaic Editor
//!
//! Design-time editing engine for Mosaic component trees.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ gestures / hotkeys / plugins                │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ Dragon · Selection · Clipboard · Keymap     │
//! │  - Resolve drop targets via LayoutSensor    │
//! │  - Turn gestures into tree mutations        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ Document: node arena + mutation primitives  │
//! │  - Validate, apply, then notify             │
//! │  - History snapshots per transaction        │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ EventBus: NodeChanged, HistoryChanged, ...  │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **The tree is the source of truth**: history entries and exports are
//!    derived snapshots of it
//! 2. **Explicit events**: every change is announced on the bus after it is
//!    complete; nothing observes fields directly
//! 3. **All-or-nothing edits**: a failed mutation or transaction leaves the
//!    tree as it was
//! 4. **Single-threaded**: shared handles are `Rc<RefCell<..>>` and `!Send`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mosaic_editor::{Editor, HistoryConfig, NodeId};
//! use mosaic_common::NodeSchema;
//!
//! let mut editor = Editor::new(HistoryConfig::default());
//! editor.open_document(&NodeSchema::new("Page").with_id("root"))?;
//!
//! let doc = editor.document_mut().unwrap();
//! let button = doc.create_node(&NodeSchema::new("Button"))?;
//! doc.insert_node(&NodeId::new("root"), &button, None)?;
//!
//! editor.handle_hotkey("mod+z")?;
//! ```

mod clipboard;
mod document;
mod dragon;
mod editor;
mod errors;
mod event_bus;
mod history;
mod hotkeys;
mod layout;
mod meta;
mod node;
mod project;
mod selection;
mod setters;

pub use clipboard::{paste, Clipboard};
pub use document::{Document, DocumentError, DocumentState, ExportHook};
pub use dragon::{
    DragEvent, DragObject, DragOutcome, DragPointer, DragRejection, DragState, Dragon, DropLocation,
};
pub use editor::Editor;
pub use errors::{EditorError, RegistryError};
pub use event_bus::{ChangeKind, EditorEvent, EventBus, EventLog, NodeChange, SubscriptionId};
pub use history::{History, HistoryConfig, HistoryEntry, HistoryState};
pub use hotkeys::{normalize as normalize_hotkey, HotkeyAction, Keymap};
pub use layout::{Axis, LayoutSensor, Point, Rect, StaticLayout};
pub use meta::{
    ComponentMeta, ComponentMetaRegistry, MetaHandle, MetaSlot, NestingRule, Snippet,
    BUILTIN_CONTAINERS,
};
pub use node::{Node, NodeId};
pub use project::Project;
pub use selection::Selection;
pub use setters::{Setter, SetterRegistry};
