//! # Component Meta Registry
//!
//! Maps a component-type name to its declared metadata.
//!
//! Lookups never fail: asking for an unknown component issues a `Pending`
//! placeholder slot. When the real metadata is registered later the slot is
//! upgraded to `Resolved` in place, so every `MetaHandle` taken before the
//! registration keeps pointing at the right entry.
//!
//! ```text
//! name ──► MetaHandle(slot) ──► MetaSlot::Pending(placeholder)
//!                                    │ register()
//!                                    ▼
//!                               MetaSlot::Resolved(meta)
//! ```

use crate::errors::RegistryError;
use crate::event_bus::{EditorEvent, EventBus};
use mosaic_common::{NodeSchema, Props};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Built-in container component names
pub const BUILTIN_CONTAINERS: [&str; 4] = ["Page", "Block", "Component", "Slot"];

/// Pre-filled schema fragment offered for insertion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snippet {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,

    pub schema: NodeSchema,
}

/// Placement constraints between components
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestingRule {
    /// Components this one may be placed into (None = any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_whitelist: Option<Vec<String>>,

    /// Components this one accepts as children (None = any)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_whitelist: Option<Vec<String>>,
}

impl NestingRule {
    pub fn accepts_parent(&self, parent: &str) -> bool {
        self.parent_whitelist
            .as_ref()
            .map_or(true, |list| list.iter().any(|name| name == parent))
    }

    pub fn accepts_child(&self, child: &str) -> bool {
        self.child_whitelist
            .as_ref()
            .map_or(true, |list| list.iter().any(|name| name == child))
    }
}

/// Declared capabilities and configuration of a component type
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentMeta {
    pub component_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub is_container: bool,

    #[serde(default)]
    pub is_minimal_render_unit: bool,

    /// Configuration schema consumed by the settings panel
    #[serde(default)]
    pub configure: Value,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub snippets: Vec<Snippet>,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub default_props: Props,

    #[serde(default)]
    pub nesting_rule: NestingRule,
}

impl ComponentMeta {
    pub fn new(component_name: impl Into<String>) -> Self {
        Self {
            component_name: component_name.into(),
            ..Default::default()
        }
    }

    pub fn container(component_name: impl Into<String>) -> Self {
        Self {
            is_container: true,
            ..Self::new(component_name)
        }
    }

    /// Stand-in used until the real metadata arrives
    pub fn placeholder(component_name: &str) -> Self {
        Self {
            title: Some(component_name.to_string()),
            ..Self::new(component_name)
        }
    }

    pub fn with_nesting_rule(mut self, rule: NestingRule) -> Self {
        self.nesting_rule = rule;
        self
    }

    pub fn with_default_prop(mut self, key: impl Into<String>, value: Value) -> Self {
        self.default_props.insert(key.into(), value);
        self
    }

    pub fn with_snippet(mut self, snippet: Snippet) -> Self {
        self.snippets.push(snippet);
        self
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.component_name)
    }
}

/// Registry slot: either real metadata or a placeholder awaiting it
#[derive(Debug, Clone, PartialEq)]
pub enum MetaSlot {
    Resolved(ComponentMeta),
    Pending(ComponentMeta),
}

impl MetaSlot {
    pub fn meta(&self) -> &ComponentMeta {
        match self {
            MetaSlot::Resolved(meta) | MetaSlot::Pending(meta) => meta,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, MetaSlot::Pending(_))
    }
}

/// Stable reference to a registry slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetaHandle(usize);

#[derive(Debug, Default)]
struct RegistryInner {
    slots: Vec<MetaSlot>,
    index: HashMap<String, MetaHandle>,
    bus: Option<EventBus>,
}

impl RegistryInner {
    fn handle(&mut self, component_name: &str) -> MetaHandle {
        if let Some(handle) = self.index.get(component_name) {
            return *handle;
        }

        let handle = MetaHandle(self.slots.len());
        self.slots.push(MetaSlot::Pending(ComponentMeta::placeholder(component_name)));
        self.index.insert(component_name.to_string(), handle);
        handle
    }
}

/// Shared, cheaply clonable registry handle
#[derive(Debug, Clone, Default)]
pub struct ComponentMetaRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl ComponentMetaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in page/block/slot metas
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        {
            let mut inner = registry.inner.borrow_mut();
            for name in BUILTIN_CONTAINERS {
                let handle = inner.handle(name);
                inner.slots[handle.0] = MetaSlot::Resolved(ComponentMeta::container(name));
            }
            let handle = inner.handle("Leaf");
            inner.slots[handle.0] = MetaSlot::Resolved(ComponentMeta::new("Leaf"));
        }
        registry
    }

    /// Publish `MetaRegistered` events on this bus
    pub fn set_event_bus(&self, bus: EventBus) {
        self.inner.borrow_mut().bus = Some(bus);
    }

    /// Get the slot for a component, issuing a placeholder if unknown
    pub fn handle(&self, component_name: &str) -> MetaHandle {
        self.inner.borrow_mut().handle(component_name)
    }

    /// Register real metadata, upgrading a placeholder in place
    pub fn register(
        &self,
        meta: ComponentMeta,
        overwrite: bool,
    ) -> Result<MetaHandle, RegistryError> {
        let name = meta.component_name.clone();
        let (handle, bus) = {
            let mut inner = self.inner.borrow_mut();
            let handle = inner.handle(&name);
            let slot = &mut inner.slots[handle.0];

            if !slot.is_pending() && !overwrite {
                return Err(RegistryError::DuplicateRegistration {
                    kind: "component meta",
                    name,
                });
            }

            *slot = MetaSlot::Resolved(meta);
            (handle, inner.bus.clone())
        };

        tracing::debug!("[MetaRegistry] registered {}", name);
        if let Some(bus) = bus {
            bus.emit(EditorEvent::MetaRegistered { component_name: name });
        }
        Ok(handle)
    }

    /// Register many metas; stops at the first duplicate
    pub fn register_all(
        &self,
        metas: impl IntoIterator<Item = ComponentMeta>,
        overwrite: bool,
    ) -> Result<Vec<MetaHandle>, RegistryError> {
        metas.into_iter().map(|meta| self.register(meta, overwrite)).collect()
    }

    /// Copy of the metadata behind a handle
    pub fn get(&self, handle: MetaHandle) -> Option<ComponentMeta> {
        self.inner.borrow().slots.get(handle.0).map(|slot| slot.meta().clone())
    }

    /// Copy of the metadata for a component (placeholder if unknown)
    pub fn meta(&self, component_name: &str) -> ComponentMeta {
        let handle = self.handle(component_name);
        self.with_slot(handle, |slot| slot.meta().clone())
    }

    pub fn is_pending(&self, handle: MetaHandle) -> bool {
        self.inner
            .borrow()
            .slots
            .get(handle.0)
            .map_or(true, MetaSlot::is_pending)
    }

    pub fn is_registered(&self, component_name: &str) -> bool {
        let inner = self.inner.borrow();
        inner
            .index
            .get(component_name)
            .and_then(|handle| inner.slots.get(handle.0))
            .map_or(false, |slot| !slot.is_pending())
    }

    pub fn is_container(&self, component_name: &str) -> bool {
        let handle = self.handle(component_name);
        self.with_slot(handle, |slot| slot.meta().is_container)
    }

    pub fn nesting_rule(&self, component_name: &str) -> NestingRule {
        let handle = self.handle(component_name);
        self.with_slot(handle, |slot| slot.meta().nesting_rule.clone())
    }

    pub fn default_props(&self, component_name: &str) -> Props {
        let handle = self.handle(component_name);
        self.with_slot(handle, |slot| slot.meta().default_props.clone())
    }

    /// Names of all resolved components, in registration order
    pub fn component_names(&self) -> Vec<String> {
        self.inner
            .borrow()
            .slots
            .iter()
            .filter(|slot| !slot.is_pending())
            .map(|slot| slot.meta().component_name.clone())
            .collect()
    }

    /// Names still waiting for their metadata
    pub fn pending_names(&self) -> Vec<String> {
        self.inner
            .borrow()
            .slots
            .iter()
            .filter(|slot| slot.is_pending())
            .map(|slot| slot.meta().component_name.clone())
            .collect()
    }

    /// Every snippet offered by resolved components
    pub fn snippets(&self) -> Vec<Snippet> {
        self.inner
            .borrow()
            .slots
            .iter()
            .filter(|slot| !slot.is_pending())
            .flat_map(|slot| slot.meta().snippets.iter().cloned())
            .collect()
    }

    fn with_slot<R>(&self, handle: MetaHandle, f: impl FnOnce(&MetaSlot) -> R) -> R {
        let inner = self.inner.borrow();
        f(&inner.slots[handle.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_component_gets_placeholder() {
        let registry = ComponentMetaRegistry::new();
        let handle = registry.handle("Card");

        assert!(registry.is_pending(handle));
        assert!(!registry.is_registered("Card"));
        assert!(!registry.is_container("Card"));
        assert_eq!(registry.meta("Card").display_title(), "Card");
        assert_eq!(registry.pending_names(), vec!["Card"]);
    }

    #[test]
    fn test_placeholder_resolves_in_place() {
        let registry = ComponentMetaRegistry::new();
        let before = registry.handle("Card");

        let after = registry.register(ComponentMeta::container("Card"), false).unwrap();

        assert_eq!(before, after);
        assert!(!registry.is_pending(before));
        assert!(registry.get(before).unwrap().is_container);
        assert!(registry.pending_names().is_empty());
    }

    #[test]
    fn test_duplicate_registration_rejected_without_overwrite() {
        let registry = ComponentMetaRegistry::new();
        registry.register(ComponentMeta::new("Button"), false).unwrap();

        let err = registry.register(ComponentMeta::container("Button"), false).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRegistration { .. }));
        assert!(!registry.is_container("Button"));

        registry.register(ComponentMeta::container("Button"), true).unwrap();
        assert!(registry.is_container("Button"));
    }

    #[test]
    fn test_builtins_and_events() {
        let registry = ComponentMetaRegistry::with_builtins();
        let bus = EventBus::new();
        let log = bus.record();
        registry.set_event_bus(bus);

        assert!(registry.is_container("Page"));
        assert!(registry.is_container("Slot"));
        assert!(!registry.is_container("Leaf"));

        registry.register(ComponentMeta::new("Text"), false).unwrap();
        assert_eq!(log.types(), vec!["meta:registered"]);
    }

    #[test]
    fn test_meta_json_and_nesting_rules() {
        let json = r#"{
            "componentName": "Tab",
            "isContainer": true,
            "defaultProps": { "label": "Tab" },
            "nestingRule": { "parentWhitelist": ["Tabs"] },
            "snippets": [ { "title": "Tab", "schema": { "componentName": "Tab" } } ]
        }"#;
        let meta: ComponentMeta = serde_json::from_str(json).unwrap();
        assert!(meta.is_container);
        assert_eq!(meta.default_props.get("label"), Some(&json!("Tab")));
        assert!(meta.nesting_rule.accepts_parent("Tabs"));
        assert!(!meta.nesting_rule.accepts_parent("Page"));
        assert!(meta.nesting_rule.accepts_child("Anything"));

        let registry = ComponentMetaRegistry::new();
        registry.register(meta, false).unwrap();
        assert_eq!(registry.snippets().len(), 1);
        assert_eq!(registry.component_names(), vec!["Tab"]);
    }
}
