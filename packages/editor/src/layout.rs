//! Canvas geometry used by the drag engine.
//!
//! The renderer owns the real layout; the editor only needs hit-testing and
//! bounding boxes, which it asks for through `LayoutSensor`.

use crate::node::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn start(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.y,
            Axis::Horizontal => self.x,
        }
    }

    pub fn end(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Vertical => self.y + self.height,
            Axis::Horizontal => self.x + self.width,
        }
    }

    pub fn mid(&self, axis: Axis) -> f64 {
        (self.start(axis) + self.end(axis)) / 2.0
    }

    /// Distance from a coordinate to this rect along one axis (0 inside)
    pub fn distance_along(&self, axis: Axis, coord: f64) -> f64 {
        if coord < self.start(axis) {
            self.start(axis) - coord
        } else if coord > self.end(axis) {
            coord - self.end(axis)
        } else {
            0.0
        }
    }
}

/// Dominant layout direction of a container's children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

impl Axis {
    pub fn coord(&self, point: Point) -> f64 {
        match self {
            Axis::Vertical => point.y,
            Axis::Horizontal => point.x,
        }
    }
}

/// Geometry provider implemented by the rendering layer
pub trait LayoutSensor {
    /// Deepest node painted under a canvas point
    fn node_at(&self, point: Point) -> Option<NodeId>;

    /// Canvas-space bounding box of a node
    fn rect_of(&self, node: &NodeId) -> Option<Rect>;

    /// Layout direction of a container's children
    fn axis_of(&self, _container: &NodeId) -> Axis {
        Axis::Vertical
    }
}

/// Precomputed layout: a list of node rectangles
///
/// Hit-testing picks the smallest rectangle containing the point; on equal
/// area the one registered last wins (painted on top).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticLayout {
    rects: Vec<(NodeId, Rect)>,
    #[serde(default)]
    axes: HashMap<NodeId, Axis>,
}

impl StaticLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rect(mut self, node: impl Into<NodeId>, rect: Rect) -> Self {
        self.set_rect(node.into(), rect);
        self
    }

    pub fn with_axis(mut self, node: impl Into<NodeId>, axis: Axis) -> Self {
        self.axes.insert(node.into(), axis);
        self
    }

    pub fn set_rect(&mut self, node: NodeId, rect: Rect) {
        match self.rects.iter_mut().find(|(id, _)| *id == node) {
            Some(entry) => entry.1 = rect,
            None => self.rects.push((node, rect)),
        }
    }
}

impl LayoutSensor for StaticLayout {
    fn node_at(&self, point: Point) -> Option<NodeId> {
        let mut best: Option<&(NodeId, Rect)> = None;
        for entry in &self.rects {
            if !entry.1.contains(point) {
                continue;
            }
            if best.map_or(true, |b| entry.1.area() <= b.1.area()) {
                best = Some(entry);
            }
        }
        best.map(|(id, _)| id.clone())
    }

    fn rect_of(&self, node: &NodeId) -> Option<Rect> {
        self.rects.iter().find(|(id, _)| id == node).map(|(_, rect)| *rect)
    }

    fn axis_of(&self, container: &NodeId) -> Axis {
        self.axes.get(container).copied().unwrap_or_default()
    }
}
