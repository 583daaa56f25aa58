//! # Editor
//!
//! Facade owning every editor component for one editing session.
//!
//! ```text
//! Editor
//!  ├─ EventBus ◄──────────── everything publishes here
//!  ├─ ComponentMetaRegistry / SetterRegistry
//!  ├─ Project ── Document* ── History
//!  ├─ Selection
//!  ├─ Dragon
//!  ├─ Clipboard
//!  └─ Keymap ── handle_hotkey() ──► execute(action)
//! ```

use crate::clipboard::{self, Clipboard};
use crate::document::Document;
use crate::dragon::{DragObject, DragOutcome, DragPointer, Dragon, DropLocation};
use crate::errors::EditorError;
use crate::event_bus::EventBus;
use crate::history::HistoryConfig;
use crate::hotkeys::{HotkeyAction, Keymap};
use crate::layout::LayoutSensor;
use crate::meta::ComponentMetaRegistry;
use crate::node::NodeId;
use crate::project::Project;
use crate::selection::Selection;
use crate::setters::SetterRegistry;
use mosaic_common::{NodeSchema, ProjectSchema};

#[derive(Debug)]
pub struct Editor {
    bus: EventBus,
    metas: ComponentMetaRegistry,
    setters: SetterRegistry,
    project: Project,
    selection: Selection,
    dragon: Dragon,
    clipboard: Clipboard,
    keymap: Keymap,
    history: HistoryConfig,
}

impl Editor {
    /// Editor with built-in metas and an empty project
    pub fn new(history: HistoryConfig) -> Self {
        let bus = EventBus::new();
        let metas = ComponentMetaRegistry::with_builtins();
        metas.set_event_bus(bus.clone());

        Self {
            project: Project::new(metas.clone(), bus.clone(), history),
            selection: Selection::new(bus.clone()),
            dragon: Dragon::new(bus.clone()),
            setters: SetterRegistry::new(),
            clipboard: Clipboard::new(),
            keymap: Keymap::new(),
            history,
            metas,
            bus,
        }
    }

    /// Editor with one document per tree of `schema`
    pub fn with_project(
        schema: &ProjectSchema,
        history: HistoryConfig,
    ) -> Result<Self, EditorError> {
        let mut editor = Self::new(history);
        editor.load_project(schema)?;
        Ok(editor)
    }

    /// Replace the open project with one document per tree of `schema`
    ///
    /// Metas registered so far are kept, so callers can load component
    /// metadata first.
    pub fn load_project(&mut self, schema: &ProjectSchema) -> Result<(), EditorError> {
        let project =
            Project::from_schema(schema, self.metas.clone(), self.bus.clone(), self.history)?;
        self.dragon.cancel();
        self.selection.clear();
        self.project = project;
        Ok(())
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn metas(&self) -> &ComponentMetaRegistry {
        &self.metas
    }

    pub fn setters(&self) -> &SetterRegistry {
        &self.setters
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn selection_mut(&mut self) -> &mut Selection {
        &mut self.selection
    }

    pub fn dragon(&self) -> &Dragon {
        &self.dragon
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn clipboard_mut(&mut self) -> &mut Clipboard {
        &mut self.clipboard
    }

    pub fn keymap(&self) -> &Keymap {
        &self.keymap
    }

    pub fn keymap_mut(&mut self) -> &mut Keymap {
        &mut self.keymap
    }

    /// Open a document and make it current. Returns its id.
    pub fn open_document(&mut self, root: &NodeSchema) -> Result<String, EditorError> {
        self.dragon.cancel();
        self.selection.clear();
        let doc = self.project.open_document(root)?;
        Ok(doc.id().to_string())
    }

    pub fn document(&self) -> Option<&Document> {
        self.project.current()
    }

    pub fn document_mut(&mut self) -> Option<&mut Document> {
        self.project.current_mut()
    }

    /// Run the action bound to a key combination
    ///
    /// Returns the action that ran, or `None` for an unbound combination.
    pub fn handle_hotkey(&mut self, combo: &str) -> Result<Option<HotkeyAction>, EditorError> {
        let Some(action) = self.keymap.resolve(combo) else {
            return Ok(None);
        };

        tracing::debug!("[Editor] hotkey {} -> {}", combo, action);
        self.execute(action)?;
        Ok(Some(action))
    }

    /// Apply an action to the current document and selection
    ///
    /// Returns false when the action had nothing to act on.
    pub fn execute(&mut self, action: HotkeyAction) -> Result<bool, EditorError> {
        if action == HotkeyAction::ClearSelection {
            let cancelled = self.dragon.cancel();
            let had_selection = !self.selection.is_empty();
            self.selection.clear();
            return Ok(cancelled || had_selection);
        }

        let doc = self.project.current_mut().ok_or(EditorError::NoActiveDocument)?;
        let targets = self.selection.get_top_nodes(doc, false);

        let acted = match action {
            HotkeyAction::Undo => doc.undo()?,
            HotkeyAction::Redo => doc.redo()?,
            HotkeyAction::Lock => {
                set_flag(doc, &targets, "lock", |doc, id| doc.set_locked(id, true))?
            }
            HotkeyAction::Unlock => {
                // Locked descendants cannot be selected on the canvas; still unlock them
                let targets = self.selection.get_top_nodes(doc, true);
                set_flag(doc, &targets, "unlock", |doc, id| doc.set_locked(id, false))?
            }
            HotkeyAction::Hide => {
                set_flag(doc, &targets, "hide", |doc, id| doc.set_hidden(id, true))?
            }
            HotkeyAction::Show => {
                set_flag(doc, &targets, "show", |doc, id| doc.set_hidden(id, false))?
            }
            HotkeyAction::Copy => {
                if targets.is_empty() {
                    false
                } else {
                    self.clipboard.copy(doc, &targets)?;
                    true
                }
            }
            HotkeyAction::Cut => {
                if targets.is_empty() {
                    false
                } else {
                    self.clipboard.copy(doc, &targets)?;
                    remove_all(doc, &targets)?
                }
            }
            HotkeyAction::Delete => remove_all(doc, &targets)?,
            HotkeyAction::Paste => match self.clipboard.payload() {
                Some(payload) if !payload.components_tree.is_empty() => {
                    let pasted = clipboard::paste(doc, &payload, targets.first())?;
                    self.selection.select_all(pasted);
                    true
                }
                _ => false,
            },
            HotkeyAction::ClearSelection => false,
        };

        // Undo/redo rebuild the tree; deletes drop nodes
        self.selection.prune(doc);
        Ok(acted)
    }

    /// Begin dragging in the current document
    pub fn start_drag(&mut self, object: DragObject, pointer: DragPointer) -> bool {
        match self.project.current() {
            Some(doc) => self.dragon.boost(object, pointer, doc),
            None => false,
        }
    }

    /// Drag the current top-level selection
    pub fn start_drag_selection(&mut self, pointer: DragPointer) -> bool {
        let Some(doc) = self.project.current() else {
            return false;
        };
        let object = DragObject::from_selection(&self.selection, doc);
        self.dragon.boost(object, pointer, doc)
    }

    pub fn drag_to(
        &mut self,
        pointer: DragPointer,
        sensor: &dyn LayoutSensor,
    ) -> Option<DropLocation> {
        let doc = self.project.current()?;
        self.dragon.drag(pointer, doc, sensor)
    }

    pub fn end_drag(&mut self) -> DragOutcome {
        match self.project.current_mut() {
            Some(doc) => self.dragon.drop(doc, &mut self.selection),
            None => {
                self.dragon.cancel();
                DragOutcome::Cancelled
            }
        }
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.dragon.cancel()
    }
}

fn set_flag(
    doc: &mut Document,
    targets: &[NodeId],
    label: &str,
    apply: impl Fn(&mut Document, &NodeId) -> Result<(), crate::document::DocumentError>,
) -> Result<bool, EditorError> {
    if targets.is_empty() {
        return Ok(false);
    }
    doc.transact(Some(label), |doc| targets.iter().try_for_each(|id| apply(doc, id)))?;
    Ok(true)
}

fn remove_all(doc: &mut Document, targets: &[NodeId]) -> Result<bool, EditorError> {
    let removable: Vec<&NodeId> = targets.iter().filter(|id| *id != doc.root_id()).collect();
    if removable.is_empty() {
        return Ok(false);
    }
    doc.transact(Some("delete"), |doc| removable.iter().try_for_each(|id| doc.remove_node(id)))?;
    Ok(true)
}
