//! `sitestack outputs`: List exported output identifiers.

use std::path::Path;

use clap::Args;

use crate::output;

/// Arguments for the `outputs` command.
#[derive(Args, Debug)]
pub struct OutputsArgs {
    /// Print the output declarations as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Executes the `outputs` command.
///
/// # Errors
///
/// Returns an error if loading or composition fails.
pub fn execute(config_path: &Path, args: &OutputsArgs) -> anyhow::Result<()> {
    let (_, stack) = super::load_stack(config_path)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stack.outputs)?);
    } else {
        print!("{}", output::render_outputs(&stack.outputs));
    }
    Ok(())
}
