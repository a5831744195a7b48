//! CLI command definitions and dispatch.

pub mod graph;
pub mod outputs;
pub mod plan;
pub mod synth;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use sitestack_common::config::SiteConfig;
use sitestack_common::constants::{CONFIG_ENV_VAR, DEFAULT_CONFIG_FILE};
use sitestack_compose::site::{SiteStack, compose_site};

/// sitestack: Declarative static site stack composer.
#[derive(Parser, Debug)]
#[command(name = "sitestack", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the site configuration file (YAML or JSON).
    #[arg(long, global = true, env = CONFIG_ENV_VAR, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Display the ordered apply plan.
    Plan(plan::PlanArgs),
    /// Write the plan and output declarations as a JSON manifest.
    Synth(synth::SynthArgs),
    /// Print the dependency graph in Graphviz DOT format.
    Graph(graph::GraphArgs),
    /// List the exported output identifiers.
    Outputs(outputs::OutputsArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Plan(args) => plan::execute(&cli.config, &args),
        Command::Synth(args) => synth::execute(&cli.config, &args),
        Command::Graph(args) => graph::execute(&cli.config, &args),
        Command::Outputs(args) => outputs::execute(&cli.config, &args),
    }
}

/// Loads the configuration and composes the site declarations.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or composed.
pub fn load_stack(config_path: &Path) -> anyhow::Result<(SiteConfig, SiteStack)> {
    let config = SiteConfig::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let stack = compose_site(&config).context("failed to compose site declarations")?;
    Ok((config, stack))
}
