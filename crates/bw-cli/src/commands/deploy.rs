//! Deploy command implementation

use anyhow::Result;
use bw_pipeline::RunMode;

use crate::cli::{DeployArgs, GlobalArgs};
use crate::context::RuntimeContext;

/// Execute the deploy command: re-synthesize, validate the operator
/// parameter files, and package the deployable archives.
pub async fn execute(args: &DeployArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global, args.remap)?;
    ctx.verbose(&format!("deploying dashboard {}", args.dashboard_id));

    let summary = ctx
        .orchestrator
        .run(RunMode::Deploy, &args.dashboard_id)
        .await?;

    println!(
        "\nPackaged deployment artifacts for analysis {} ({})",
        summary.analysis_name, summary.analysis_id
    );
    if !summary.uploads_ok {
        eprintln!("Warning: some artifact uploads failed; check the output above");
    }

    Ok(())
}
