mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{apply, export, inspect, validate, ApplyArgs, ExportArgs, InspectArgs, ValidateArgs};
use config::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Mosaic CLI - inspect and edit Mosaic component projects
#[derive(Parser, Debug)]
#[command(name = "mosaic")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding mosaic.config.json (defaults to the current directory)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Log filter, overriding the config file (e.g. "debug")
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the document trees of a project
    Inspect(InspectArgs),

    /// Export a project at a transform stage
    Export(ExportArgs),

    /// Check a project against component metadata
    Validate(ValidateArgs),

    /// Replay a list of editing operations and write the result
    Apply(ApplyArgs),
}

/// Log to stderr so exported JSON on stdout stays clean. `RUST_LOG` wins
/// over both the flag and the config file.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = match cli.config_dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let config = Config::load(&cwd)?;
    init_logging(cli.log_level.as_deref().unwrap_or(&config.log_level));
    tracing::debug!("config: {:?}", config);

    match cli.command {
        Command::Inspect(args) => inspect(args, &config, &cwd),
        Command::Export(args) => export(args, &config, &cwd),
        Command::Validate(args) => validate(args, &config, &cwd),
        Command::Apply(args) => apply(args, &config, &cwd),
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
