//! Init command implementation

use anyhow::Result;
use bw_pipeline::RunMode;

use crate::cli::{GlobalArgs, InitArgs};
use crate::context::RuntimeContext;

/// Execute the init command: full synthesis plus publication of the
/// per-stage parameter fill-in files and tracking records.
pub async fn execute(args: &InitArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global, args.remap)?;
    ctx.verbose(&format!("initializing pipeline for {}", args.dashboard_id));

    let summary = ctx
        .orchestrator
        .run(RunMode::Initialize, &args.dashboard_id)
        .await?;

    println!(
        "\nInitialized promotion of analysis {} ({})",
        summary.analysis_name, summary.analysis_id
    );
    println!(
        "Fill in the staged parameter files for each stage, then run: bw deploy {}",
        args.dashboard_id
    );
    if !summary.uploads_ok {
        eprintln!("Warning: some configuration uploads failed; check the output above");
    }

    Ok(())
}
