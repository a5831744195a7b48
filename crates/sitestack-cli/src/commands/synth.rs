//! `sitestack synth`: Write the plan manifest consumed by the apply step.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use serde::Serialize;
use sitestack_common::config::Environment;
use sitestack_common::constants::{APP_NAME, MANIFEST_VERSION};
use sitestack_compose::outputs::OutputDeclaration;
use sitestack_compose::plan::Plan;

/// Arguments for the `synth` subcommand.
#[derive(Args, Debug)]
pub struct SynthArgs {
    /// Write the manifest to a file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Manifest handed to the external apply engine.
#[derive(Debug, Serialize)]
pub struct Manifest<'a> {
    /// Manifest format version.
    pub version: u32,
    /// Producing tool.
    pub generator: &'static str,
    /// Target account and region, if configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<&'a Environment>,
    /// Ordered apply plan.
    pub plan: &'a Plan,
    /// Outputs the apply step binds.
    pub outputs: &'a [OutputDeclaration],
}

impl<'a> Manifest<'a> {
    /// Assembles a manifest from its parts.
    #[must_use]
    pub const fn new(
        environment: Option<&'a Environment>,
        plan: &'a Plan,
        outputs: &'a [OutputDeclaration],
    ) -> Self {
        Self {
            version: MANIFEST_VERSION,
            generator: APP_NAME,
            environment,
            plan,
            outputs,
        }
    }
}

/// Executes the `synth` command.
///
/// # Errors
///
/// Returns an error if composition, compilation, or writing fails.
pub fn execute(config_path: &Path, args: &SynthArgs) -> anyhow::Result<()> {
    let (config, stack) = super::load_stack(config_path)?;
    let plan = stack.plan().context("failed to compile plan")?;
    let manifest = Manifest::new(config.environment.as_ref(), &plan, &stack.outputs);
    let json = serde_json::to_string_pretty(&manifest)?;

    if let Some(ref out_path) = args.output {
        std::fs::write(out_path, format!("{json}\n"))
            .with_context(|| format!("failed to write {}", out_path.display()))?;
        tracing::info!(path = %out_path.display(), steps = plan.len(), "manifest written");
        println!("Synthesized {} -> {}", config_path.display(), out_path.display());
        println!("Resources: {}", plan.len());
        println!("Outputs: {}", stack.outputs.len());
    } else {
        println!("{json}");
    }
    Ok(())
}
