//! Synth command implementation

use anyhow::Result;

use crate::cli::{GlobalArgs, SynthArgs};
use crate::context::RuntimeContext;

/// Execute the synth command: resolve and synthesize locally, publishing
/// nothing to the deployment bucket's configuration area.
pub async fn execute(args: &SynthArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global, args.remap)?;
    ctx.verbose(&format!("synthesizing dashboard {}", args.dashboard_id));

    let synthesis = ctx.orchestrator.synthesize(&args.dashboard_id).await?;

    println!(
        "Synthesized analysis {} ({})",
        synthesis.analysis_name, synthesis.analysis_id
    );
    println!("  source document: {}", synthesis.source_path.display());
    println!("  dest document:   {}", synthesis.dest_path.display());
    if let Some(parent_path) = &synthesis.parent_path {
        println!("  parent document: {}", parent_path.display());
        println!("  groups:          {}", synthesis.groups.len());
    }
    println!(
        "  declared parameters: {}",
        synthesis.dest_contract().parameters.len()
    );

    Ok(())
}
