//! # Dragon
//!
//! Drag-and-drop gesture engine. Turns pointer movement into either a move of
//! existing nodes or an insertion of new schema data.
//!
//! ```text
//!          boost()              drop() / cancel()
//!   Idle ──────────► Dragging ─────────────────► Idle
//!                     │    ▲
//!                     └────┘ drag(): resolve target, emit Drag
//! ```
//!
//! Target resolution never fails loudly: a pointer that cannot be placed
//! yields a `DragRejection`, which is logged and kept for inspection, and the
//! candidate target becomes `None`. Dropping on a `None` target is a
//! cancellation.

use crate::document::Document;
use crate::event_bus::{EditorEvent, EventBus};
use crate::layout::{Axis, LayoutSensor, Point};
use crate::node::NodeId;
use crate::selection::Selection;
use mosaic_common::{NodeSchema, TransformStage};
use std::collections::HashSet;
use thiserror::Error;

/// What is being dragged
#[derive(Debug, Clone, PartialEq)]
pub enum DragObject {
    /// Existing nodes of the document
    Node { nodes: Vec<NodeId> },
    /// New content, e.g. a snippet from the component panel
    NodeData { data: Vec<NodeSchema> },
}

impl DragObject {
    /// Drag the top-level selected nodes
    pub fn from_selection(selection: &Selection, doc: &Document) -> Self {
        DragObject::Node {
            nodes: selection.get_top_nodes(doc, false),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DragObject::Node { nodes } => nodes.is_empty(),
            DragObject::NodeData { data } => data.is_empty(),
        }
    }
}

/// Pointer position for one drag event
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DragPointer {
    /// Screen coordinates
    pub global: Point,
    /// Canvas coordinates, used for hit-testing
    pub canvas: Point,
    /// Duplicate instead of move
    pub copy: bool,
}

impl DragPointer {
    pub fn at(x: f64, y: f64) -> Self {
        let point = Point::new(x, y);
        Self {
            global: point,
            canvas: point,
            copy: false,
        }
    }

    pub fn with_copy(mut self, copy: bool) -> Self {
        self.copy = copy;
        self
    }
}

/// Where a drop would land: insertion slot `index` within `container`
#[derive(Debug, Clone, PartialEq)]
pub struct DropLocation {
    pub container: NodeId,
    pub index: usize,
    pub axis: Axis,
}

/// Payload of `DragStart` / `Drag` / `DragEnd`
#[derive(Debug, Clone, PartialEq)]
pub struct DragEvent {
    pub object: DragObject,
    pub pointer: DragPointer,
    pub target: Option<DropLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging,
}

/// Why a drag could not start or a pointer could not be placed
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DragRejection {
    #[error("A drag is already in progress")]
    AlreadyDragging,

    #[error("No drag in progress")]
    NotDragging,

    #[error("Document {0} is closed")]
    DocumentClosed(String),

    #[error("Nothing to drag")]
    EmptyObject,

    #[error("Node {0} is not part of the document")]
    UnknownNode(NodeId),

    #[error("Node {0} is locked")]
    Locked(NodeId),

    #[error("The root node cannot be dragged")]
    RootNode,

    #[error("Cannot drop {0} into itself or one of its descendants")]
    SelfOrDescendantDrop(NodeId),

    #[error("No container under the pointer accepts the dragged content")]
    NoContainer,

    #[error("Drop failed: {0}")]
    DropFailed(String),
}

/// Result of `Dragon::drop`
#[derive(Debug, Clone, PartialEq)]
pub enum DragOutcome {
    Moved(Vec<NodeId>),
    Copied(Vec<NodeId>),
    Inserted(Vec<NodeId>),
    Cancelled,
}

impl DragOutcome {
    pub fn nodes(&self) -> &[NodeId] {
        match self {
            DragOutcome::Moved(nodes)
            | DragOutcome::Copied(nodes)
            | DragOutcome::Inserted(nodes) => nodes,
            DragOutcome::Cancelled => &[],
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, DragOutcome::Cancelled)
    }
}

#[derive(Debug)]
struct DragSession {
    object: DragObject,
    pointer: DragPointer,
    target: Option<DropLocation>,
    /// Whether `pointer` came from a `drag` call (vs. the boost position)
    moved: bool,
}

#[derive(Debug)]
pub struct Dragon {
    bus: EventBus,
    session: Option<DragSession>,
    last_rejection: Option<DragRejection>,
}

impl Dragon {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            session: None,
            last_rejection: None,
        }
    }

    pub fn state(&self) -> DragState {
        match self.session {
            Some(_) => DragState::Dragging,
            None => DragState::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn object(&self) -> Option<&DragObject> {
        self.session.as_ref().map(|s| &s.object)
    }

    /// Current candidate drop location
    pub fn target(&self) -> Option<&DropLocation> {
        self.session.as_ref().and_then(|s| s.target.as_ref())
    }

    /// Reason the last boost or target resolution was refused
    pub fn last_rejection(&self) -> Option<&DragRejection> {
        self.last_rejection.as_ref()
    }

    /// Begin a drag. Returns false (and stays idle) if the drag is refused.
    pub fn boost(&mut self, object: DragObject, pointer: DragPointer, doc: &Document) -> bool {
        let object = match self.check_boost(object, doc) {
            Ok(object) => object,
            Err(rejection) => {
                tracing::debug!("[Dragon] boost rejected: {}", rejection);
                self.last_rejection = Some(rejection);
                return false;
            }
        };

        self.last_rejection = None;
        self.bus.emit(EditorEvent::DragStart(DragEvent {
            object: object.clone(),
            pointer,
            target: None,
        }));
        self.session = Some(DragSession {
            object,
            pointer,
            target: None,
            moved: false,
        });
        true
    }

    /// Track a pointer move and resolve the candidate drop target
    pub fn drag(
        &mut self,
        pointer: DragPointer,
        doc: &Document,
        sensor: &dyn LayoutSensor,
    ) -> Option<DropLocation> {
        let session = self.session.as_ref()?;
        if session.moved && session.pointer == pointer {
            return session.target.clone();
        }

        let target = match self.locate(&session.object, pointer, doc, sensor) {
            Ok(location) => {
                self.last_rejection = None;
                Some(location)
            }
            Err(rejection) => {
                tracing::debug!("[Dragon] no drop target: {}", rejection);
                self.last_rejection = Some(rejection);
                None
            }
        };

        let session = self.session.as_mut()?;
        session.pointer = pointer;
        session.target = target.clone();
        session.moved = true;

        self.bus.emit(EditorEvent::Drag(DragEvent {
            object: session.object.clone(),
            pointer,
            target: target.clone(),
        }));
        target
    }

    /// Resolve where `object` would land for a pointer position
    pub fn locate(
        &self,
        object: &DragObject,
        pointer: DragPointer,
        doc: &Document,
        sensor: &dyn LayoutSensor,
    ) -> Result<DropLocation, DragRejection> {
        let hit = sensor.node_at(pointer.canvas).ok_or(DragRejection::NoContainer)?;
        if !doc.is_attached(hit.as_str()) {
            return Err(DragRejection::UnknownNode(hit));
        }

        let mut chain = vec![hit.clone()];
        chain.extend(doc.ancestors(hit.as_str()));

        if let DragObject::Node { nodes } = object {
            let dragged: HashSet<&NodeId> = nodes.iter().collect();
            if let Some(own) = chain.iter().find(|id| dragged.contains(id)) {
                return Err(DragRejection::SelfOrDescendantDrop(own.clone()));
            }
        }

        let names = dragged_names(object, doc);
        let container = chain
            .into_iter()
            .find(|id| self.accepts(doc, id, &names))
            .ok_or(DragRejection::NoContainer)?;

        let axis = sensor.axis_of(&container);
        let index = insertion_index(doc, &container, axis, pointer.canvas, sensor);
        Ok(DropLocation {
            container,
            index,
            axis,
        })
    }

    /// Finish the drag, applying the mutation for the current target
    pub fn drop(&mut self, doc: &mut Document, selection: &mut Selection) -> DragOutcome {
        let Some(session) = self.session.take() else {
            self.last_rejection = Some(DragRejection::NotDragging);
            return DragOutcome::Cancelled;
        };

        let Some(target) = session.target.clone() else {
            tracing::debug!("[Dragon] dropped without a target");
            self.end(session, None);
            return DragOutcome::Cancelled;
        };

        match apply_drop(doc, &session.object, &target, session.pointer.copy) {
            Ok(outcome) => {
                tracing::info!(
                    "[Dragon] dropped {} node(s) into {} at {}",
                    outcome.nodes().len(),
                    target.container,
                    target.index
                );
                selection.select_all(outcome.nodes().iter().cloned());
                self.end(session, Some(target));
                outcome
            }
            Err(e) => {
                tracing::warn!(
                    "[Dragon] drop into {} failed, rolled back: {}",
                    target.container,
                    e
                );
                self.last_rejection = Some(DragRejection::DropFailed(e.to_string()));
                self.end(session, None);
                DragOutcome::Cancelled
            }
        }
    }

    /// Abort the drag without touching the document
    pub fn cancel(&mut self) -> bool {
        match self.session.take() {
            Some(session) => {
                tracing::debug!("[Dragon] drag cancelled");
                self.end(session, None);
                true
            }
            None => false,
        }
    }

    fn end(&self, session: DragSession, target: Option<DropLocation>) {
        self.bus.emit(EditorEvent::DragEnd(DragEvent {
            object: session.object,
            pointer: session.pointer,
            target,
        }));
    }

    fn check_boost(&self, object: DragObject, doc: &Document) -> Result<DragObject, DragRejection> {
        if self.session.is_some() {
            return Err(DragRejection::AlreadyDragging);
        }
        if !doc.is_open() {
            return Err(DragRejection::DocumentClosed(doc.id().to_string()));
        }
        if object.is_empty() {
            return Err(DragRejection::EmptyObject);
        }

        let nodes = match object {
            DragObject::Node { nodes } => nodes,
            data => return Ok(data),
        };

        for id in &nodes {
            let node = doc
                .get_node(id.as_str())
                .filter(|_| doc.is_attached(id.as_str()))
                .ok_or_else(|| DragRejection::UnknownNode(id.clone()))?;
            if id == doc.root_id() {
                return Err(DragRejection::RootNode);
            }
            if node.is_locked() {
                return Err(DragRejection::Locked(id.clone()));
            }
        }

        // Keep only top-level nodes, in the order given
        let mut top: Vec<NodeId> = Vec::new();
        for id in &nodes {
            let covered = nodes.iter().any(|other| doc.is_ancestor_of(other.as_str(), id.as_str()));
            if !covered && !top.contains(id) {
                top.push(id.clone());
            }
        }
        Ok(DragObject::Node { nodes: top })
    }

    fn accepts(&self, doc: &Document, container: &NodeId, names: &[String]) -> bool {
        let Some(node) = doc.get_node(container.as_str()) else {
            return false;
        };
        let metas = doc.metas();
        if node.is_locked() || !metas.is_container(node.component_name()) {
            return false;
        }

        let parent_rule = metas.nesting_rule(node.component_name());
        names.iter().all(|name| {
            parent_rule.accepts_child(name)
                && metas.nesting_rule(name).accepts_parent(node.component_name())
        })
    }
}

fn dragged_names(object: &DragObject, doc: &Document) -> Vec<String> {
    match object {
        DragObject::Node { nodes } => nodes
            .iter()
            .filter_map(|id| doc.get_node(id.as_str()))
            .map(|node| node.component_name().to_string())
            .collect(),
        DragObject::NodeData { data } => {
            data.iter().map(|schema| schema.component_name.clone()).collect()
        }
    }
}

/// Slot index within `container` for a pointer position
///
/// The nearest child (with a known rect) along `axis` decides: before it when
/// the pointer is ahead of its midpoint, after it otherwise. On equal distance
/// the later child wins.
fn insertion_index(
    doc: &Document,
    container: &NodeId,
    axis: Axis,
    point: Point,
    sensor: &dyn LayoutSensor,
) -> usize {
    let children = doc.children_of(container.as_str());
    let coord = axis.coord(point);

    let mut nearest: Option<(usize, f64, f64)> = None;
    for (i, child) in children.iter().enumerate() {
        let Some(rect) = sensor.rect_of(child) else {
            continue;
        };
        let distance = rect.distance_along(axis, coord);
        if nearest.map_or(true, |(_, best, _)| distance <= best) {
            nearest = Some((i, distance, rect.mid(axis)));
        }
    }

    match nearest {
        Some((i, _, mid)) if coord < mid => i,
        Some((i, _, _)) => i + 1,
        None => children.len(),
    }
}

fn apply_drop(
    doc: &mut Document,
    object: &DragObject,
    target: &DropLocation,
    copy: bool,
) -> Result<DragOutcome, crate::document::DocumentError> {
    let container = target.container.clone();
    let mut at = target.index;

    match object {
        DragObject::Node { nodes } if copy => doc.transact(Some("copy"), |doc| {
            let mut copies = Vec::with_capacity(nodes.len());
            for id in nodes {
                let schema = doc.export_node(id.as_str(), TransformStage::Clone)?;
                let duplicate = doc.create_node(&schema)?;
                doc.insert_node(&container, &duplicate, Some(at))?;
                copies.push(duplicate);
                at += 1;
            }
            Ok(DragOutcome::Copied(copies))
        }),
        DragObject::Node { nodes } => doc.transact(Some("move"), |doc| {
            for id in nodes {
                if doc.parent_of(id.as_str()) == Some(&container) {
                    // The slot was computed with the original still in place
                    if let Some(current) = doc.index_of(id.as_str()) {
                        if current < at {
                            at -= 1;
                        }
                    }
                }
                doc.insert_node(&container, id, Some(at))?;
                at += 1;
            }
            Ok(DragOutcome::Moved(nodes.clone()))
        }),
        DragObject::NodeData { data } => doc.transact(Some("insert"), |doc| {
            let mut created = Vec::with_capacity(data.len());
            for schema in data {
                let id = doc.create_node(schema)?;
                doc.insert_node(&container, &id, Some(at))?;
                created.push(id);
                at += 1;
            }
            Ok(DragOutcome::Inserted(created))
        }),
    }
}
