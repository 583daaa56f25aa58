//! The plugin contract

use crate::context::PluginContext;

/// An editor extension
///
/// `init` runs once every plugin named in `deps` is ready; `destroy` runs in
/// reverse start-up order when the manager shuts down.
pub trait Plugin {
    /// Unique plugin name
    fn name(&self) -> &str;

    /// Names of plugins that must be ready before this one starts
    fn deps(&self) -> Vec<String> {
        Vec::new()
    }

    fn init(&mut self, ctx: &mut PluginContext) -> anyhow::Result<()>;

    fn destroy(&mut self, _ctx: &mut PluginContext) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Lifecycle of a registered plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginState {
    Registered,
    Initializing,
    Ready,
    Destroyed,
    Failed,
}

impl PluginState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PluginState::Registered => "registered",
            PluginState::Initializing => "initializing",
            PluginState::Ready => "ready",
            PluginState::Destroyed => "destroyed",
            PluginState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for PluginState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options for `PluginManager::register`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Replace a plugin already registered under the same name
    pub overwrite: bool,
}

impl RegisterOptions {
    pub fn overwrite() -> Self {
        Self { overwrite: true }
    }
}
