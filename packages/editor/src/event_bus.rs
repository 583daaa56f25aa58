//! # Event Bus
//!
//! Synchronous publish/subscribe channel shared by every editor component.
//!
//! ## Delivery rules
//!
//! - Subscribers run in registration order
//! - A failing subscriber (error or panic) is logged and skipped; the rest
//!   still receive the event
//! - Events emitted from inside a handler are queued and delivered after the
//!   current event has reached every subscriber

use crate::dragon::DragEvent;
use crate::node::NodeId;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

/// Kind of structural or property change applied to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Remove,
    Move,
    PropChange,
}

/// Payload of a node change notification
#[derive(Debug, Clone, PartialEq)]
pub struct NodeChange {
    pub document_id: String,
    pub node_id: NodeId,
    pub kind: ChangeKind,
    /// Parent after the change (before it, for removals)
    pub parent: Option<NodeId>,
    /// Position within `parent`
    pub index: Option<usize>,
    /// Prop key for `PropChange`
    pub prop: Option<String>,
}

/// Everything that travels over the bus
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    NodeChanged(NodeChange),

    /// The whole tree was rebuilt from a snapshot (undo/redo/import)
    TreeReplaced { document_id: String },

    HistoryChanged {
        document_id: String,
        undoable: bool,
        redoable: bool,
        modified: bool,
    },

    SelectionChanged { selected: Vec<NodeId> },

    DragStart(DragEvent),
    Drag(DragEvent),
    DragEnd(DragEvent),

    DocumentOpened { document_id: String },
    DocumentClosed { document_id: String },

    MetaRegistered { component_name: String },

    PluginReady { name: String },
    PluginDestroyed { name: String },
}

impl EditorEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &'static str {
        match self {
            EditorEvent::NodeChanged(_) => "node:changed",
            EditorEvent::TreeReplaced { .. } => "document:replaced",
            EditorEvent::HistoryChanged { .. } => "history:changed",
            EditorEvent::SelectionChanged { .. } => "selection:changed",
            EditorEvent::DragStart(_) => "dragon:dragstart",
            EditorEvent::Drag(_) => "dragon:drag",
            EditorEvent::DragEnd(_) => "dragon:dragend",
            EditorEvent::DocumentOpened { .. } => "document:opened",
            EditorEvent::DocumentClosed { .. } => "document:closed",
            EditorEvent::MetaRegistered { .. } => "meta:registered",
            EditorEvent::PluginReady { .. } => "plugin:ready",
            EditorEvent::PluginDestroyed { .. } => "plugin:destroyed",
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&EditorEvent) -> anyhow::Result<()>>;

struct Subscriber {
    id: SubscriptionId,
    handler: Rc<RefCell<Handler>>,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: Vec<Subscriber>,
    queue: VecDeque<EditorEvent>,
    dispatching: bool,
}

/// Cheaply clonable handle to a shared event bus
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Rc<RefCell<BusInner>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("EventBus")
            .field("subscribers", &inner.subscribers.len())
            .field("queued", &inner.queue.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every event
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) -> anyhow::Result<()> + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = SubscriptionId(inner.next_id);
        inner.subscribers.push(Subscriber {
            id,
            handler: Rc::new(RefCell::new(Box::new(handler))),
        });
        id
    }

    /// Subscribe to events of one type (see `EditorEvent::event_type`)
    pub fn on<F>(&self, event_type: &'static str, mut handler: F) -> SubscriptionId
    where
        F: FnMut(&EditorEvent) -> anyhow::Result<()> + 'static,
    {
        self.subscribe(move |event| {
            if event.event_type() == event_type {
                handler(event)
            } else {
                Ok(())
            }
        })
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.subscribers.len();
        inner.subscribers.retain(|s| s.id != id);
        inner.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Publish an event to all current subscribers
    pub fn emit(&self, event: EditorEvent) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.queue.push_back(event);
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
        }

        loop {
            let next = {
                let mut inner = self.inner.borrow_mut();
                match inner.queue.pop_front() {
                    Some(event) => {
                        let handlers: Vec<_> = inner
                            .subscribers
                            .iter()
                            .map(|s| (s.id, s.handler.clone()))
                            .collect();
                        Some((event, handlers))
                    }
                    None => {
                        inner.dispatching = false;
                        None
                    }
                }
            };

            let Some((event, handlers)) = next else {
                break;
            };

            for (id, handler) in handlers {
                dispatch_one(id, &handler, &event);
            }
        }
    }

    /// Record every event into a shared log (handy for observers and tests)
    pub fn record(&self) -> EventLog {
        let log = EventLog::default();
        let sink = log.clone();
        self.subscribe(move |event| {
            sink.events.borrow_mut().push(event.clone());
            Ok(())
        });
        log
    }
}

fn dispatch_one(id: SubscriptionId, handler: &Rc<RefCell<Handler>>, event: &EditorEvent) {
    let Ok(mut handler) = handler.try_borrow_mut() else {
        // The handler is already running further up the stack
        tracing::warn!("[EventBus] skipping re-entrant subscriber {:?}", id);
        return;
    };

    match catch_unwind(AssertUnwindSafe(|| (&mut **handler)(event))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(
                "[EventBus] subscriber {:?} failed on {}: {:#}",
                id,
                event.event_type(),
                e
            );
        }
        Err(_) => {
            tracing::error!("[EventBus] subscriber {:?} panicked on {}", id, event.event_type());
        }
    }
}

/// Shared, append-only list of observed events
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<EditorEvent>>>,
}

impl EventLog {
    pub fn events(&self) -> Vec<EditorEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    /// Event types in arrival order
    pub fn types(&self) -> Vec<&'static str> {
        self.events.borrow().iter().map(EditorEvent::event_type).collect()
    }

    /// Node changes in arrival order
    pub fn node_changes(&self) -> Vec<NodeChange> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                EditorEvent::NodeChanged(change) => Some(change.clone()),
                _ => None,
            })
            .collect()
    }
}
