//! # Plugin Manager
//!
//! Registers plugins, orders them by their declared dependencies and drives
//! their lifecycle.
//!
//! ```text
//! register ──► Registered ──init_all──► Initializing ──► Ready ──destroy_all──► Destroyed
//!                                            │
//!                                            └─ error ──► Failed (startup aborted,
//!                                                         started plugins destroyed)
//! ```
//!
//! The dependency graph is validated as a whole before the first `init`
//! runs, so a missing or circular dependency never leaves half the plugins
//! started.

use crate::context::PluginContext;
use crate::errors::{DependencyError, PluginError};
use crate::graph::DependencyGraph;
use crate::plugin::{Plugin, PluginState, RegisterOptions};
use mosaic_editor::{EditorEvent, EventBus};
use std::collections::HashSet;

struct PluginEntry {
    name: String,
    plugin: Box<dyn Plugin>,
    state: PluginState,
}

pub struct PluginManager {
    /// Registration order
    entries: Vec<PluginEntry>,
    graph: DependencyGraph,
    context: PluginContext,
    /// Names of ready plugins, in the order they started
    started: Vec<String>,
    running: bool,
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let states: Vec<(&str, PluginState)> =
            self.entries.iter().map(|e| (e.name.as_str(), e.state)).collect();
        f.debug_struct("PluginManager")
            .field("plugins", &states)
            .field("running", &self.running)
            .finish()
    }
}

impl PluginManager {
    pub fn new(bus: EventBus) -> Self {
        Self::with_context(PluginContext::new(bus))
    }

    pub fn with_context(context: PluginContext) -> Self {
        Self {
            entries: Vec::new(),
            graph: DependencyGraph::new(),
            context,
            started: Vec::new(),
            running: false,
        }
    }

    pub fn context(&self) -> &PluginContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut PluginContext {
        &mut self.context
    }

    /// Register a plugin
    ///
    /// After `init_all` has succeeded, a newly registered plugin starts right
    /// away; its dependencies must already be ready.
    pub fn register(
        &mut self,
        plugin: Box<dyn Plugin>,
        options: RegisterOptions,
    ) -> Result<(), PluginError> {
        let name = plugin.name().to_string();
        let deps = plugin.deps();
        let existing = self.position(&name);

        if existing.is_some() && !options.overwrite {
            return Err(PluginError::DuplicateRegistration(name));
        }

        if self.running {
            let not_ready = deps.iter().find(|dep| self.state(dep) != Some(PluginState::Ready));
            if let Some(missing) = not_ready {
                return Err(DependencyError::Missing {
                    plugin: name,
                    dependency: missing.clone(),
                }
                .into());
            }
        }

        let entry = PluginEntry {
            name: name.clone(),
            plugin,
            state: PluginState::Registered,
        };
        let mut dependents = Vec::new();
        let index = match existing {
            Some(index) => {
                dependents = self.stop_dependents(&name);
                self.stop(index);
                self.entries[index] = entry;
                tracing::info!("[PluginManager] replaced {}", name);
                index
            }
            None => {
                self.entries.push(entry);
                tracing::debug!("[PluginManager] registered {}", name);
                self.entries.len() - 1
            }
        };
        self.graph.set_dependencies(name, deps);

        if self.running {
            self.start(index)?;
            self.restart(dependents)?;
        }
        Ok(())
    }

    /// Build a plugin from the shared context and register it
    pub fn register_factory<F>(
        &mut self,
        factory: F,
        options: RegisterOptions,
    ) -> Result<(), PluginError>
    where
        F: FnOnce(&PluginContext) -> Box<dyn Plugin>,
    {
        let plugin = factory(&self.context);
        self.register(plugin, options)
    }

    /// Destroy (if ready) and forget a plugin
    ///
    /// Refused while another registered plugin depends on it.
    pub fn unregister(&mut self, name: &str) -> Result<(), PluginError> {
        let index = self
            .position(name)
            .ok_or_else(|| PluginError::NotFound(name.to_string()))?;
        if let Some(dependent) = self.graph.get_dependents(name).first() {
            return Err(DependencyError::InUse {
                plugin: name.to_string(),
                dependent: dependent.to_string(),
            }
            .into());
        }
        self.stop(index);
        self.entries.remove(index);
        self.graph.remove(name);
        tracing::debug!("[PluginManager] unregistered {}", name);
        Ok(())
    }

    /// Start every registered plugin in dependency order
    ///
    /// If one fails, the plugins started so far are destroyed in reverse
    /// order and the error is returned.
    pub fn init_all(&mut self) -> Result<(), PluginError> {
        let order = self.graph.topological_sort()?;
        tracing::debug!("[PluginManager] start-up order: {}", order.join(", "));

        for name in order {
            let Some(index) = self.position(&name) else {
                continue;
            };
            if self.entries[index].state == PluginState::Ready {
                continue;
            }

            if let Err(e) = self.start(index) {
                tracing::warn!("[PluginManager] start-up aborted: {}", e);
                self.destroy_all();
                return Err(e);
            }
        }

        self.running = true;
        tracing::info!("[PluginManager] {} plugin(s) ready", self.started.len());
        Ok(())
    }

    /// Destroy every ready plugin, last started first
    pub fn destroy_all(&mut self) {
        while let Some(name) = self.started.last().cloned() {
            match self.position(&name) {
                Some(index) => self.stop(index),
                None => {
                    self.started.pop();
                }
            }
        }
        self.running = false;
    }

    pub fn state(&self, name: &str) -> Option<PluginState> {
        self.position(name).map(|i| self.entries[i].state)
    }

    /// Plugin names in registration order
    pub fn plugin_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Ready plugins in the order they started
    pub fn init_order(&self) -> &[String] {
        &self.started
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    fn start(&mut self, index: usize) -> Result<(), PluginError> {
        let entry = &mut self.entries[index];
        entry.state = PluginState::Initializing;
        tracing::debug!("[PluginManager] initializing {}", entry.name);

        match entry.plugin.init(&mut self.context) {
            Ok(()) => {
                entry.state = PluginState::Ready;
                let name = entry.name.clone();
                self.started.push(name.clone());
                self.context.bus().emit(EditorEvent::PluginReady { name });
                Ok(())
            }
            Err(source) => {
                entry.state = PluginState::Failed;
                Err(PluginError::InitFailed {
                    name: entry.name.clone(),
                    source,
                })
            }
        }
    }

    /// Destroy every ready plugin that depends on `name`, directly or
    /// transitively, last started first. Returns them in start order.
    fn stop_dependents(&mut self, name: &str) -> Vec<String> {
        let mut affected: HashSet<String> = HashSet::new();
        let mut queue = vec![name.to_string()];
        while let Some(current) = queue.pop() {
            for dependent in self.graph.get_dependents(&current) {
                if affected.insert(dependent.to_string()) {
                    queue.push(dependent.to_string());
                }
            }
        }

        let stopped: Vec<String> = self
            .started
            .iter()
            .filter(|n| affected.contains(*n))
            .cloned()
            .collect();
        for dependent in stopped.iter().rev() {
            if let Some(index) = self.position(dependent) {
                self.stop(index);
            }
        }
        stopped
    }

    /// Start plugins again in the given order. Stops at the first failure;
    /// the rest stay destroyed.
    fn restart(&mut self, names: Vec<String>) -> Result<(), PluginError> {
        for name in names {
            if let Some(index) = self.position(&name) {
                self.start(index)?;
            }
        }
        Ok(())
    }

    /// Destroy one plugin if it is ready
    fn stop(&mut self, index: usize) {
        let entry = &mut self.entries[index];
        if entry.state != PluginState::Ready {
            return;
        }

        if let Err(e) = entry.plugin.destroy(&mut self.context) {
            tracing::warn!("[PluginManager] {} failed to destroy cleanly: {:#}", entry.name, e);
        }
        entry.state = PluginState::Destroyed;

        let name = entry.name.clone();
        self.started.retain(|n| *n != name);
        self.context.bus().emit(EditorEvent::PluginDestroyed { name });
    }
}
