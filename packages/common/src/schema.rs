//! # Schema Types
//!
//! The serialized form of a component tree. These are the types that cross
//! every boundary: persistence, clipboard, palette snippets and history
//! snapshots all speak `NodeSchema`.
//!
//! ```text
//! {
//!   "componentName": "Page",
//!   "id": "node_1a2b-1",
//!   "props": { "title": "Home" },
//!   "children": [ { "componentName": "Button" } ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Ordered property mapping (insertion order is preserved)
pub type Props = Map<String, Value>;

/// Marker `type` used by expression-valued props, conditions and loops
pub const EXPRESSION_TYPE: &str = "JSExpression";

/// Tag written into clipboard payloads
pub const CLIPBOARD_TYPE: &str = "NodeSchema";

/// Serialized component node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSchema {
    #[serde(default)]
    pub component_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub props: Props,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSchema>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_hidden: bool,

    #[serde(default, skip_serializing_if = "is_false")]
    pub is_locked: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,

    #[serde(default, rename = "loop", skip_serializing_if = "Option::is_none")]
    pub loop_: Option<Value>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl NodeSchema {
    /// Create a schema with only a component name
    pub fn new(component_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.props.insert(key.into(), value);
        self
    }

    pub fn with_child(mut self, child: NodeSchema) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = NodeSchema>) -> Self {
        self.children.extend(children);
        self
    }

    /// Number of nodes in this subtree (including self)
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(NodeSchema::node_count).sum::<usize>()
    }

    /// Compare shape and content while ignoring ids
    pub fn structurally_eq(&self, other: &NodeSchema) -> bool {
        self.component_name == other.component_name
            && self.title == other.title
            && self.props == other.props
            && self.is_hidden == other.is_hidden
            && self.is_locked == other.is_locked
            && self.condition == other.condition
            && self.loop_ == other.loop_
            && self.children.len() == other.children.len()
            && self
                .children
                .iter()
                .zip(&other.children)
                .all(|(a, b)| a.structurally_eq(b))
    }
}

/// Build an expression marker value
pub fn expression(source: impl Into<String>) -> Value {
    let mut map = Map::new();
    map.insert("type".to_string(), Value::String(EXPRESSION_TYPE.to_string()));
    map.insert("value".to_string(), Value::String(source.into()));
    Value::Object(map)
}

/// Check whether a prop value is an expression marker
pub fn is_expression(value: &Value) -> bool {
    value
        .get("type")
        .and_then(Value::as_str)
        .map_or(false, |t| t == EXPRESSION_TYPE)
}

/// A project groups one or more component trees under a version tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSchema {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub components_map: Map<String, Value>,

    #[serde(default)]
    pub components_tree: Vec<NodeSchema>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl ProjectSchema {
    pub fn new(components_tree: Vec<NodeSchema>) -> Self {
        Self {
            version: default_version(),
            components_map: Map::new(),
            components_tree,
        }
    }
}

impl Default for ProjectSchema {
    fn default() -> Self {
        Self::new(vec![NodeSchema::new("Page")])
    }
}

/// Clipboard exchange format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardPayload {
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub components_map: Map<String, Value>,

    #[serde(default)]
    pub components_tree: Vec<NodeSchema>,
}

impl ClipboardPayload {
    pub fn new(components_tree: Vec<NodeSchema>) -> Self {
        Self {
            kind: CLIPBOARD_TYPE.to_string(),
            components_map: Map::new(),
            components_tree,
        }
    }

    /// Parse clipboard text, returning `None` for foreign content
    pub fn parse(text: &str) -> Option<Self> {
        let payload: ClipboardPayload = serde_json::from_str(text).ok()?;
        (payload.kind == CLIPBOARD_TYPE).then_some(payload)
    }
}

/// Named export mode controlling what a node emits when serialized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformStage {
    Render,
    Serialize,
    Save,
    Clone,
    Init,
    Upgrade,
}

impl TransformStage {
    pub const ALL: [TransformStage; 6] = [
        TransformStage::Render,
        TransformStage::Serialize,
        TransformStage::Save,
        TransformStage::Clone,
        TransformStage::Init,
        TransformStage::Upgrade,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformStage::Render => "render",
            TransformStage::Serialize => "serialize",
            TransformStage::Save => "save",
            TransformStage::Clone => "clone",
            TransformStage::Init => "init",
            TransformStage::Upgrade => "upgrade",
        }
    }

    /// Whether node ids survive this stage
    pub fn keeps_ids(&self) -> bool {
        !matches!(self, TransformStage::Clone)
    }
}

impl std::fmt::Display for TransformStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransformStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransformStage::ALL
            .iter()
            .copied()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| format!("unknown transform stage: {}", s))
    }
}
