//! Replays a JSON list of editing operations against a project
//!
//! ```json
//! [
//!   { "op": "insert", "parent": "root", "node": { "componentName": "Button" }, "index": 0 },
//!   { "op": "move", "node": "title", "parent": "body" },
//!   { "op": "setProp", "node": "title", "key": "text", "value": "Hi" },
//!   { "op": "select", "nodes": ["title"] },
//!   { "op": "hotkey", "combo": "mod+c" },
//!   { "op": "undo" }
//! ]
//! ```

use super::export::write_project;
use super::{open_editor, read_project};
use crate::config::Config;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use mosaic_common::{NodeSchema, TransformStage};
use mosaic_editor::{Document, Editor, EditorError, NodeId};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Project JSON file
    pub project: PathBuf,

    /// JSON file holding an array of operations
    pub operations: PathBuf,

    /// Document to edit (defaults to the first)
    #[arg(short, long)]
    pub document: Option<String>,

    /// Write the result to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// One scripted editing step
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Operation {
    Insert {
        parent: NodeId,
        node: NodeSchema,
        #[serde(default)]
        index: Option<usize>,
    },
    Move {
        node: NodeId,
        parent: NodeId,
        #[serde(default)]
        index: Option<usize>,
    },
    Remove {
        node: NodeId,
    },
    Duplicate {
        node: NodeId,
    },
    SetProp {
        node: NodeId,
        key: String,
        value: Value,
    },
    RemoveProp {
        node: NodeId,
        key: String,
    },
    SetHidden {
        node: NodeId,
        value: bool,
    },
    SetLocked {
        node: NodeId,
        value: bool,
    },
    Select {
        nodes: Vec<NodeId>,
    },
    Hotkey {
        combo: String,
    },
    Undo,
    Redo,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Insert { .. } => "insert",
            Operation::Move { .. } => "move",
            Operation::Remove { .. } => "remove",
            Operation::Duplicate { .. } => "duplicate",
            Operation::SetProp { .. } => "setProp",
            Operation::RemoveProp { .. } => "removeProp",
            Operation::SetHidden { .. } => "setHidden",
            Operation::SetLocked { .. } => "setLocked",
            Operation::Select { .. } => "select",
            Operation::Hotkey { .. } => "hotkey",
            Operation::Undo => "undo",
            Operation::Redo => "redo",
        }
    }
}

#[derive(Error, Debug)]
pub enum ApplyError {
    #[error("Operation #{index} ({op}) failed: {source}")]
    Failed {
        index: usize,
        op: &'static str,
        #[source]
        source: EditorError,
    },

    #[error("Operation #{index} ({op}): unbound hotkey '{combo}'")]
    UnboundHotkey {
        index: usize,
        op: &'static str,
        combo: String,
    },
}

pub fn apply(args: ApplyArgs, config: &Config, cwd: &Path) -> Result<()> {
    let schema = read_project(&args.project)?;
    let content = std::fs::read_to_string(&args.operations)
        .with_context(|| format!("Cannot read operations {}", args.operations.display()))?;
    let operations: Vec<Operation> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid operations file {}", args.operations.display()))?;

    let mut editor = open_editor(&schema, config, cwd)?;
    if let Some(document) = &args.document {
        editor.project_mut().set_current(document)?;
    }

    run_operations(&mut editor, &operations)?;

    write_project(&editor.project().export(TransformStage::Save), args.output.as_deref())?;
    if let Some(output) = &args.output {
        eprintln!(
            "✨ {} {} operation(s) → {}",
            "Applied".green().bold(),
            operations.len(),
            output.display()
        );
    }
    Ok(())
}

/// Run operations in order against the current document, stopping at the
/// first failure. Earlier operations stay applied.
pub fn run_operations(editor: &mut Editor, operations: &[Operation]) -> Result<(), ApplyError> {
    for (index, operation) in operations.iter().enumerate() {
        tracing::debug!("applying #{} {}", index, operation.name());
        let failed = |source: EditorError| ApplyError::Failed {
            index,
            op: operation.name(),
            source,
        };

        match operation {
            Operation::Select { nodes } => editor.selection_mut().select_all(nodes.iter().cloned()),
            Operation::Hotkey { combo } => {
                if editor.handle_hotkey(combo).map_err(failed)?.is_none() {
                    return Err(ApplyError::UnboundHotkey {
                        index,
                        op: operation.name(),
                        combo: combo.clone(),
                    });
                }
            }
            _ => {
                let doc = editor
                    .document_mut()
                    .ok_or(EditorError::NoActiveDocument)
                    .map_err(failed)?;
                edit_document(doc, operation).map_err(failed)?;
            }
        }
    }
    Ok(())
}

fn edit_document(doc: &mut Document, operation: &Operation) -> Result<(), EditorError> {
    match operation {
        Operation::Insert { parent, node, index } => {
            doc.transact(Some("insert"), |doc| {
                let id = doc.create_node(node)?;
                doc.insert_node(parent, &id, *index)
            })?;
        }
        Operation::Move { node, parent, index } => {
            doc.insert_node(parent, node, *index)?;
        }
        Operation::Remove { node } => doc.remove_node(node)?,
        Operation::Duplicate { node } => {
            doc.duplicate_node(node)?;
        }
        Operation::SetProp { node, key, value } => doc.set_prop(node, key, value.clone())?,
        Operation::RemoveProp { node, key } => doc.remove_prop(node, key)?,
        Operation::SetHidden { node, value } => doc.set_hidden(node, *value)?,
        Operation::SetLocked { node, value } => doc.set_locked(node, *value)?,
        Operation::Undo => {
            doc.undo()?;
        }
        Operation::Redo => {
            doc.redo()?;
        }
        Operation::Select { .. } | Operation::Hotkey { .. } => {}
    }
    Ok(())
}
