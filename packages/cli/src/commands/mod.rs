pub mod apply;
pub mod export;
pub mod inspect;
pub mod validate;

pub use apply::{apply, ApplyArgs};
pub use export::{export, ExportArgs};
pub use inspect::{inspect, InspectArgs};
pub use validate::{validate, ValidateArgs};

use crate::config::Config;
use anyhow::{Context, Result};
use mosaic_common::{load_project, ProjectSchema};
use mosaic_editor::{ComponentMeta, ComponentMetaRegistry, Editor};
use std::collections::BTreeSet;
use std::path::Path;

/// Read a JSON array of component metas into the registry
///
/// Entries replace built-ins and earlier files of the same name.
pub fn load_meta_file(metas: &ComponentMetaRegistry, path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Cannot read meta file {}", path.display()))?;
    let entries: Vec<ComponentMeta> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid meta file {}", path.display()))?;

    let count = entries.len();
    metas.register_all(entries, true)?;
    tracing::debug!("loaded {} metas from {}", count, path.display());
    Ok(count)
}

pub fn read_project(path: &Path) -> Result<ProjectSchema> {
    load_project(path).with_context(|| format!("Cannot load project {}", path.display()))
}

/// Editor with configured metas and one document per tree of the project
pub fn open_editor(project: &ProjectSchema, config: &Config, cwd: &Path) -> Result<Editor> {
    let mut editor = Editor::new(config.history);
    for path in config.meta_paths(cwd) {
        load_meta_file(editor.metas(), &path)?;
    }
    editor.load_project(project)?;
    Ok(editor)
}

/// Component names used in any document that have no registered metadata
pub fn unknown_components(editor: &Editor) -> Vec<String> {
    let names: BTreeSet<&str> = editor
        .project()
        .documents()
        .iter()
        .flat_map(|doc| doc.node_ids().filter_map(move |id| doc.get_node(id.as_str())))
        .map(|node| node.component_name())
        .filter(|name| !editor.metas().is_registered(name))
        .collect();
    names.into_iter().map(str::to_string).collect()
}
