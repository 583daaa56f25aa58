//! In-process clipboard holding node trees as JSON text.
//!
//! The text format is the interchange `ClipboardPayload`, so content copied
//! here can be handed to the system clipboard verbatim and text coming back
//! from it is accepted as long as it parses as a payload.

use crate::document::{Document, DocumentError};
use crate::errors::EditorError;
use crate::node::NodeId;
use mosaic_common::{ClipboardPayload, TransformStage};

#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    text: Option<String>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serialize `nodes` (ids stripped) and keep the payload text
    pub fn copy(
        &mut self,
        doc: &Document,
        nodes: &[NodeId],
    ) -> Result<ClipboardPayload, EditorError> {
        let tree = nodes
            .iter()
            .map(|id| doc.export_node(id.as_str(), TransformStage::Clone))
            .collect::<Result<Vec<_>, _>>()?;

        let payload = ClipboardPayload::new(tree);
        self.text = Some(serde_json::to_string(&payload)?);
        tracing::debug!("[Clipboard] copied {} node(s)", nodes.len());
        Ok(payload)
    }

    /// Replace the clipboard content with arbitrary text
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// The stored payload, if the clipboard holds one
    pub fn payload(&self) -> Option<ClipboardPayload> {
        self.text.as_deref().and_then(ClipboardPayload::parse)
    }

    pub fn is_empty(&self) -> bool {
        self.payload().map_or(true, |p| p.components_tree.is_empty())
    }

    pub fn clear(&mut self) {
        self.text = None;
    }
}

/// Insert the payload's trees as one undo step
///
/// With an anchor the content lands right after it, in the anchor's parent;
/// without one (or when the anchor is the root) it is appended to the root.
pub fn paste(
    doc: &mut Document,
    payload: &ClipboardPayload,
    anchor: Option<&NodeId>,
) -> Result<Vec<NodeId>, DocumentError> {
    let anchored = anchor.and_then(|id| doc.parent_of(id.as_str()).map(|p| (id, p.clone())));
    let (parent, mut at) = match anchored {
        Some((id, parent)) => {
            let index = doc
                .index_of(id.as_str())
                .map_or(doc.children_of(parent.as_str()).len(), |i| i + 1);
            (parent, index)
        }
        None => {
            let root = doc.root_id().clone();
            let end = doc.children_of(root.as_str()).len();
            (root, end)
        }
    };

    doc.transact(Some("paste"), |doc| {
        let mut pasted = Vec::with_capacity(payload.components_tree.len());
        for schema in &payload.components_tree {
            let id = doc.create_node(schema)?;
            doc.insert_node(&parent, &id, Some(at))?;
            pasted.push(id);
            at += 1;
        }
        Ok(pasted)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_bus::EventBus;
    use crate::history::HistoryConfig;
    use crate::meta::ComponentMetaRegistry;
    use mosaic_common::{NodeSchema, CLIPBOARD_TYPE};
    use serde_json::json;

    fn document() -> Document {
        let schema = NodeSchema::new("Page").with_id("root").with_children([
            NodeSchema::new("Leaf").with_id("a").with_prop("text", json!("A")),
            NodeSchema::new("Leaf").with_id("b"),
        ]);
        Document::new(
            "clip",
            &schema,
            ComponentMetaRegistry::with_builtins(),
            EventBus::new(),
            HistoryConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_copy_produces_payload_text() {
        let doc = document();
        let mut clipboard = Clipboard::new();
        let payload = clipboard.copy(&doc, &[NodeId::new("a")]).unwrap();

        assert_eq!(payload.kind, CLIPBOARD_TYPE);
        assert_eq!(payload.components_tree[0].id, None);

        let text: serde_json::Value = serde_json::from_str(clipboard.text().unwrap()).unwrap();
        assert_eq!(text["type"], json!("NodeSchema"));
        assert_eq!(text["componentsMap"], json!({}));
        assert_eq!(text["componentsTree"][0]["props"]["text"], json!("A"));
    }

    #[test]
    fn test_foreign_text_is_not_a_payload() {
        let mut clipboard = Clipboard::new();
        clipboard.set_text("hello");
        assert!(clipboard.payload().is_none());
        assert!(clipboard.is_empty());
    }

    #[test]
    fn test_paste_after_anchor() {
        let mut doc = document();
        let mut clipboard = Clipboard::new();
        let payload = clipboard.copy(&doc, &[NodeId::new("a")]).unwrap();

        let pasted = paste(&mut doc, &payload, Some(&NodeId::new("a"))).unwrap();
        assert_eq!(pasted.len(), 1);
        assert_eq!(doc.children_of("root")[1], pasted[0]);
        assert_eq!(doc.history().undo_levels(), 1);
    }

    #[test]
    fn test_paste_without_anchor_appends_to_root() {
        let mut doc = document();
        let payload = ClipboardPayload::new(vec![NodeSchema::new("Leaf"), NodeSchema::new("Leaf")]);

        let pasted = paste(&mut doc, &payload, None).unwrap();
        assert_eq!(&doc.children_of("root")[2..], pasted.as_slice());
    }
}
