//! # Node Records
//!
//! A node is one placed component instance. Nodes live in the document's
//! arena keyed by `NodeId`; the parent link is an id, never an owning
//! reference. A node's single authoritative location is its parent's
//! `children` list (or the document's root slot).

use mosaic_common::{NodeSchema, Props};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Borrow;
use std::fmt;

/// Identity of a node, unique within its document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Arena record for a single node
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) component_name: String,
    pub(crate) title: Option<String>,
    pub(crate) props: Props,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) is_hidden: bool,
    pub(crate) is_locked: bool,
    pub(crate) condition: Option<Value>,
    pub(crate) loop_: Option<Value>,
}

impl Node {
    /// Build a record from a schema, without children (those are linked by the document)
    pub(crate) fn from_schema(id: NodeId, schema: &NodeSchema, parent: Option<NodeId>) -> Self {
        Self {
            id,
            component_name: schema.component_name.clone(),
            title: schema.title.clone(),
            props: schema.props.clone(),
            children: Vec::with_capacity(schema.children.len()),
            parent,
            is_hidden: schema.is_hidden,
            is_locked: schema.is_locked,
            condition: schema.condition.clone(),
            loop_: schema.loop_.clone(),
        }
    }

    pub fn id(&self) -> &NodeId {
        &self.id
    }

    pub fn component_name(&self) -> &str {
        &self.component_name
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<&NodeId> {
        self.parent.as_ref()
    }

    pub fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    pub fn is_locked(&self) -> bool {
        self.is_locked
    }

    pub fn condition(&self) -> Option<&Value> {
        self.condition.as_ref()
    }

    pub fn loop_expr(&self) -> Option<&Value> {
        self.loop_.as_ref()
    }

    /// Shallow schema for this node (children left empty)
    pub(crate) fn to_schema(&self, keep_id: bool) -> NodeSchema {
        NodeSchema {
            component_name: self.component_name.clone(),
            id: keep_id.then(|| self.id.to_string()),
            title: self.title.clone(),
            props: self.props.clone(),
            children: Vec::new(),
            is_hidden: self.is_hidden,
            is_locked: self.is_locked,
            condition: self.condition.clone(),
            loop_: self.loop_.clone(),
        }
    }
}
