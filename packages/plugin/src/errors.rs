//! Error types for plugin management

use thiserror::Error;

/// Problems with the declared dependency graph
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("Circular plugin dependency: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("Plugin '{plugin}' depends on '{dependency}', which is not available")]
    Missing { plugin: String, dependency: String },

    #[error("Plugin '{plugin}' is still required by '{dependent}'")]
    InUse { plugin: String, dependent: String },
}

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Dependency error: {0}")]
    Dependency(#[from] DependencyError),

    #[error("Duplicate registration: plugin '{0}' already exists")]
    DuplicateRegistration(String),

    #[error("Plugin '{name}' failed to initialize: {source}")]
    InitFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Plugin not found: {0}")]
    NotFound(String),
}
