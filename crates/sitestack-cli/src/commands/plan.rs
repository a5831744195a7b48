//! `sitestack plan`: Display the ordered apply plan.

use std::path::Path;

use anyhow::Context;
use clap::Args;

use crate::output;

/// Arguments for the `plan` command.
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Show every configuration option of each step.
    #[arg(short, long)]
    pub verbose: bool,
}

/// Executes the `plan` command.
///
/// Loads the configuration, composes the site declarations, builds the
/// dependency graph, and prints the resulting plan.
///
/// # Errors
///
/// Returns an error if loading, composition, or compilation fails.
pub fn execute(config_path: &Path, args: &PlanArgs) -> anyhow::Result<()> {
    let (config, stack) = super::load_stack(config_path)?;
    let plan = stack.plan().context("failed to compile plan")?;
    tracing::info!(steps = plan.len(), "plan compiled");

    let title = format!("Apply Plan for: {}", config.domain_name);
    print!("{}", output::render_plan(&title, &plan, args.verbose));

    if !stack.outputs.is_empty() {
        println!();
        println!("  Outputs:");
        for line in output::render_outputs(&stack.outputs).lines() {
            println!("    {line}");
        }
    }
    Ok(())
}
