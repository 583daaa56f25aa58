use super::{open_editor, read_project, unknown_components};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mosaic_editor::{Document, NodeId};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Project JSON file
    pub project: PathBuf,

    /// Also print node props
    #[arg(short, long)]
    pub props: bool,
}

pub fn inspect(args: InspectArgs, config: &Config, cwd: &Path) -> Result<()> {
    let schema = read_project(&args.project)?;
    let editor = open_editor(&schema, config, cwd)?;

    println!("🔍 {} {}", "Project".green().bold(), args.project.display());
    println!("   Version:   {}", schema.version);
    println!("   Documents: {}", editor.project().len());
    println!();

    for doc in editor.project().documents() {
        println!("{} {} ({} nodes)", "▸".cyan(), doc.id().bold(), doc.node_count());
        for line in outline(doc, args.props) {
            println!("  {}", line);
        }
        println!();
    }

    let unknown = unknown_components(&editor);
    if !unknown.is_empty() {
        println!("   {} no metadata for: {}", "⚠".yellow(), unknown.join(", "));
    }

    Ok(())
}

/// One line per attached node, indented by depth
pub fn outline(doc: &Document, with_props: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let mut stack: Vec<(&NodeId, usize)> = vec![(doc.root_id(), 0)];

    while let Some((id, depth)) = stack.pop() {
        let Some(node) = doc.get_node(id.as_str()) else {
            continue;
        };

        let mut line = format!("{}{} #{}", "  ".repeat(depth), node.component_name(), id);
        if let Some(title) = node.title() {
            line.push_str(&format!(" \"{}\"", title));
        }
        if node.is_hidden() {
            line.push_str(" [hidden]");
        }
        if node.is_locked() {
            line.push_str(" [locked]");
        }
        if with_props && !node.props().is_empty() {
            line.push_str(&format!(" {}", serde_json::Value::Object(node.props().clone())));
        }
        lines.push(line);

        for child in node.children().iter().rev() {
            stack.push((child, depth + 1));
        }
    }
    lines
}
