use super::{open_editor, read_project};
use crate::config::Config;
use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use mosaic_common::{ProjectSchema, TransformStage};
use std::path::{Path, PathBuf};

/// Transform stage names accepted on the command line
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Render,
    Serialize,
    Save,
    Clone,
    Init,
    Upgrade,
}

impl From<Stage> for TransformStage {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Render => TransformStage::Render,
            Stage::Serialize => TransformStage::Serialize,
            Stage::Save => TransformStage::Save,
            Stage::Clone => TransformStage::Clone,
            Stage::Init => TransformStage::Init,
            Stage::Upgrade => TransformStage::Upgrade,
        }
    }
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Project JSON file
    pub project: PathBuf,

    /// Transform stage to export at
    #[arg(short, long, value_enum, default_value = "save")]
    pub stage: Stage,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn export(args: ExportArgs, config: &Config, cwd: &Path) -> Result<()> {
    let schema = read_project(&args.project)?;
    let editor = open_editor(&schema, config, cwd)?;
    let stage = TransformStage::from(args.stage);

    let exported = editor.project().export(stage);
    write_project(&exported, args.output.as_deref())?;

    if let Some(output) = &args.output {
        eprintln!(
            "✨ {} {} document(s) at stage {} → {}",
            "Exported".green().bold(),
            exported.components_tree.len(),
            stage,
            output.display()
        );
    }
    Ok(())
}

/// Pretty-print a project to `output`, or stdout when absent
pub fn write_project(project: &ProjectSchema, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(project)?;
    match output {
        Some(path) => std::fs::write(path, json + "\n")?,
        None => println!("{}", json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use mosaic_common::load_project;

    #[test]
    fn test_export_to_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "project.json", PROJECT);
        let output = dir.path().join("out.json");

        export(
            ExportArgs {
                project: input.clone(),
                stage: Stage::Save,
                output: Some(output.clone()),
            },
            &Config::default(),
            dir.path(),
        )
        .unwrap();

        let original = load_project(&input).unwrap();
        let exported = load_project(&output).unwrap();
        assert!(exported.components_tree[0].structurally_eq(&original.components_tree[0]));
        assert_eq!(exported.components_tree[0].id.as_deref(), Some("root"));
    }

    #[test]
    fn test_clone_stage_drops_ids() {
        let dir = tempfile::tempdir().unwrap();
        let input = write(dir.path(), "project.json", PROJECT);
        let output = dir.path().join("clone.json");

        export(
            ExportArgs {
                project: input,
                stage: Stage::Clone,
                output: Some(output.clone()),
            },
            &Config::default(),
            dir.path(),
        )
        .unwrap();

        let exported = load_project(&output).unwrap();
        assert!(exported.components_tree[0].id.is_none());
    }
}
