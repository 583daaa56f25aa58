//! # Mosaic Plugins
//!
//! Dependency-ordered plugin lifecycle for the Mosaic editor.
//!
//! Plugins declare the names of the plugins they depend on. `PluginManager`
//! validates the whole graph (missing names, cycles) before starting
//! anything, then calls `init` dependencies-first and `destroy` in reverse.
//! Plugins talk to each other through capabilities published on the shared
//! `PluginContext`.
//!
//! ```rust,ignore
//! use mosaic_plugin::{Plugin, PluginContext, PluginManager, RegisterOptions};
//!
//! struct Outline;
//!
//! impl Plugin for Outline {
//!     fn name(&self) -> &str { "outline" }
//!     fn deps(&self) -> Vec<String> { vec!["panels".into()] }
//!     fn init(&mut self, ctx: &mut PluginContext) -> anyhow::Result<()> {
//!         ctx.set("outline", true);
//!         Ok(())
//!     }
//! }
//!
//! let mut manager = PluginManager::new(editor.bus().clone());
//! manager.register(Box::new(Outline), RegisterOptions::default())?;
//! manager.init_all()?;
//! ```

mod context;
mod errors;
mod graph;
mod manager;
mod plugin;

pub use context::PluginContext;
pub use errors::{DependencyError, PluginError};
pub use graph::DependencyGraph;
pub use manager::PluginManager;
pub use plugin::{Plugin, PluginState, RegisterOptions};
