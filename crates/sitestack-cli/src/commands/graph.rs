//! `sitestack graph`: Print the dependency graph in DOT format.

use std::path::Path;

use anyhow::Context;
use clap::Args;

/// Arguments for the `graph` command.
#[derive(Args, Debug)]
pub struct GraphArgs {}

/// Executes the `graph` command.
///
/// # Errors
///
/// Returns an error if loading, composition, or graph building fails.
pub fn execute(config_path: &Path, _args: &GraphArgs) -> anyhow::Result<()> {
    let (_, stack) = super::load_stack(config_path)?;
    let graph = stack.graph().context("failed to build dependency graph")?;
    print!("{}", graph.to_dot());
    Ok(())
}
