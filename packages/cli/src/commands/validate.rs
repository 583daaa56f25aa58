use super::{open_editor, read_project, unknown_components};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use mosaic_common::{IdCollector, MissingNameFinder, NodeSchema, ProjectSchema, Visitor};
use mosaic_editor::{ComponentMetaRegistry, Document};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Project JSON file
    pub project: PathBuf,

    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    /// Index of the tree in `componentsTree`
    pub tree: usize,
    pub message: String,
}

impl Finding {
    fn error(tree: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            tree,
            message: message.into(),
        }
    }

    fn warning(tree: usize, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            tree,
            message: message.into(),
        }
    }
}

pub fn validate(args: ValidateArgs, config: &Config, cwd: &Path) -> Result<()> {
    println!("🔍 {} {}", "Validating".green().bold(), args.project.display());

    let schema = read_project(&args.project)?;
    let findings = check_project(&schema, config, cwd)?;

    let errors = findings.iter().filter(|f| f.severity == Severity::Error).count();
    let warnings = findings.len() - errors;

    for finding in &findings {
        let tag = match finding.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
        };
        println!("   {} [tree {}] {}", tag, finding.tree, finding.message);
    }

    println!();
    if findings.is_empty() {
        println!("   {} No issues found!", "✓".green());
        return Ok(());
    }
    println!("   {} error(s), {} warning(s)", errors, warnings);

    if errors > 0 || (args.strict && warnings > 0) {
        anyhow::bail!("validation failed");
    }
    Ok(())
}

/// Schema-level checks first, then every tree is loaded into a document and
/// checked against the component metadata.
pub fn check_project(schema: &ProjectSchema, config: &Config, cwd: &Path) -> Result<Vec<Finding>> {
    let mut findings = Vec::new();

    if schema.components_tree.is_empty() {
        findings.push(Finding::error(0, "project has no component trees"));
        return Ok(findings);
    }

    let mut loadable = true;
    for (tree, root) in schema.components_tree.iter().enumerate() {
        if let Some(path) = MissingNameFinder::check(root) {
            let message = format!("node at child path {:?} has no componentName", path);
            findings.push(Finding::error(tree, message));
            loadable = false;
        }
        for id in duplicate_ids(root) {
            findings.push(Finding::warning(tree, format!("id '{}' is used more than once", id)));
        }
    }
    if !loadable {
        return Ok(findings);
    }

    let editor = open_editor(schema, config, cwd)?;
    for (tree, doc) in editor.project().documents().iter().enumerate() {
        for problem in doc.check_integrity() {
            findings.push(Finding::error(tree, problem));
        }
        check_placement(doc, editor.metas(), tree, &mut findings);
    }

    for name in unknown_components(&editor) {
        // Not tied to a tree; reported against the first
        findings.push(Finding::warning(0, format!("no metadata registered for '{}'", name)));
    }

    Ok(findings)
}

fn duplicate_ids(root: &NodeSchema) -> Vec<String> {
    let mut collector = IdCollector::default();
    collector.visit_node(root);

    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();
    for id in collector.ids {
        if !seen.insert(id.clone()) && !duplicates.contains(&id) {
            duplicates.push(id);
        }
    }
    duplicates
}

fn check_placement(
    doc: &Document,
    metas: &ComponentMetaRegistry,
    tree: usize,
    findings: &mut Vec<Finding>,
) {
    let mut stack = vec![doc.root_id().clone()];
    while let Some(id) = stack.pop() {
        let Some(node) = doc.get_node(id.as_str()) else {
            continue;
        };
        let parent_name = node.component_name();
        let is_container = metas.is_container(parent_name);
        let rule = metas.nesting_rule(parent_name);

        for child_id in node.children() {
            let Some(child) = doc.get_node(child_id.as_str()) else {
                continue;
            };
            let child_name = child.component_name();

            if !is_container && !metas.is_pending(metas.handle(parent_name)) {
                findings.push(Finding::error(
                    tree,
                    format!("{} #{} is not a container but holds #{}", parent_name, id, child_id),
                ));
            }
            if !rule.accepts_child(child_name) {
                findings.push(Finding::warning(
                    tree,
                    format!("{} #{} does not accept {} children", parent_name, id, child_name),
                ));
            }
            if !metas.nesting_rule(child_name).accepts_parent(parent_name) {
                findings.push(Finding::warning(
                    tree,
                    format!("{} #{} cannot be placed inside {}", child_name, child_id, parent_name),
                ));
            }
            stack.push(child_id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::PROJECT;
    use super::*;

    fn findings(json: &str) -> Vec<Finding> {
        let schema: ProjectSchema = serde_json::from_str(json).unwrap();
        check_project(&schema, &Config::default(), Path::new(".")).unwrap()
    }

    #[test]
    fn test_unknown_components_are_warnings() {
        let found = findings(PROJECT);
        assert!(found.iter().all(|f| f.severity == Severity::Warning));
        assert!(found.iter().any(|f| f.message.contains("'Button'")));
        assert!(found.iter().any(|f| f.message.contains("'Text'")));
    }

    #[test]
    fn test_missing_component_name_stops_loading() {
        let found = findings(
            r#"{ "componentsTree": [{ "componentName": "Page", "children": [{ "id": "x" }] }] }"#,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Error);
        assert!(found[0].message.contains("[0]"));
    }

    #[test]
    fn test_children_under_leaf_are_errors() {
        let found = findings(
            r#"{ "componentsTree": [{ "componentName": "Page", "children": [
                { "componentName": "Leaf", "id": "leaf",
                  "children": [{ "componentName": "Block" }] }
            ] }] }"#,
        );
        assert!(found.iter().any(|f| {
            f.severity == Severity::Error && f.message.contains("Leaf #leaf is not a container")
        }));
    }

    #[test]
    fn test_duplicate_ids_are_reported() {
        let found = findings(
            r#"{ "componentsTree": [{ "componentName": "Page", "id": "p", "children": [
                { "componentName": "Block", "id": "dup" },
                { "componentName": "Block", "id": "dup" }
            ] }] }"#,
        );
        assert_eq!(
            found,
            vec![Finding::warning(0, "id 'dup' is used more than once")]
        );
    }

    #[test]
    fn test_empty_project_is_an_error() {
        let found = findings(r#"{ "componentsTree": [] }"#);
        assert_eq!(found[0].severity, Severity::Error);
    }
}
