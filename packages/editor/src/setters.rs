//! Setter registry: property-editor widgets keyed by type.
//!
//! The editor core never renders setters; it only keeps track of which widget
//! handles which prop type so panels can look them up.

use crate::errors::RegistryError;
use mosaic_common::Props;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A property-editor widget description
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Setter {
    pub name: String,

    /// Widget identifier understood by the UI layer
    pub component: String,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub default_props: Props,
}

impl Setter {
    pub fn new(name: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            component: component.into(),
            default_props: Props::new(),
        }
    }

    pub fn with_default_prop(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.default_props.insert(key.into(), value);
        self
    }
}

/// Shared, cheaply clonable setter registry handle
#[derive(Debug, Clone, Default)]
pub struct SetterRegistry {
    setters: Rc<RefCell<HashMap<String, Setter>>>,
}

impl SetterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        type_key: impl Into<String>,
        setter: Setter,
        overwrite: bool,
    ) -> Result<(), RegistryError> {
        let type_key = type_key.into();
        let mut setters = self.setters.borrow_mut();
        if setters.contains_key(&type_key) && !overwrite {
            return Err(RegistryError::DuplicateRegistration {
                kind: "setter",
                name: type_key,
            });
        }

        tracing::debug!("[SetterRegistry] registered {} -> {}", type_key, setter.component);
        setters.insert(type_key, setter);
        Ok(())
    }

    pub fn get(&self, type_key: &str) -> Option<Setter> {
        self.setters.borrow().get(type_key).cloned()
    }

    pub fn contains(&self, type_key: &str) -> bool {
        self.setters.borrow().contains_key(type_key)
    }

    /// Registered type keys, sorted
    pub fn type_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.setters.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }
}
