//! Shared context handed to every plugin hook.
//!
//! Plugins publish capabilities under a name (`set`) and read what their
//! dependencies published (`get`). Values are stored type-erased and handed
//! back as `Rc<T>`; asking for the wrong type yields `None`.

use mosaic_editor::EventBus;
use std::any::Any;
use std::collections::HashMap;
use std::rc::Rc;

pub struct PluginContext {
    bus: EventBus,
    capabilities: HashMap<String, Rc<dyn Any>>,
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&String> = self.capabilities.keys().collect();
        keys.sort();
        f.debug_struct("PluginContext")
            .field("bus", &self.bus)
            .field("capabilities", &keys)
            .finish()
    }
}

impl PluginContext {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            capabilities: HashMap::new(),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Publish a capability, replacing any previous value under `key`
    pub fn set<T: Any>(&mut self, key: impl Into<String>, value: T) {
        self.set_shared(key, Rc::new(value));
    }

    /// Publish an already shared capability
    pub fn set_shared<T: Any>(&mut self, key: impl Into<String>, value: Rc<T>) {
        let key = key.into();
        tracing::debug!("[PluginContext] capability set: {}", key);
        self.capabilities.insert(key, value);
    }

    pub fn get<T: Any>(&self, key: &str) -> Option<Rc<T>> {
        self.capabilities.get(key)?.clone().downcast::<T>().ok()
    }

    pub fn has(&self, key: &str) -> bool {
        self.capabilities.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.capabilities.remove(key).is_some()
    }

    /// Capability names, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.capabilities.keys().cloned().collect();
        keys.sort();
        keys
    }
}
