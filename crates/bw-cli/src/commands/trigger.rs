//! Trigger command implementation

use anyhow::Result;
use bw_pipeline::{TriggerEvent, TriggerOutcome};

use crate::cli::{GlobalArgs, TriggerArgs};
use crate::context::RuntimeContext;

/// Execute the trigger command: deploy when the event's asset is tracked
/// by this pipeline, succeed as a no-op otherwise.
pub async fn execute(args: &TriggerArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = RuntimeContext::new(global, false)?;
    ctx.verbose(&format!("trigger event for asset {}", args.asset_id));

    let outcome = ctx
        .orchestrator
        .run_event(&TriggerEvent {
            asset_id: args.asset_id.clone(),
        })
        .await?;

    match outcome {
        TriggerOutcome::Skipped => {
            println!(
                "Asset {} is not tracked by this pipeline; nothing to do",
                args.asset_id
            );
        }
        TriggerOutcome::Deployed(summary) => {
            println!(
                "Deployed analysis {} ({})",
                summary.analysis_name, summary.analysis_id
            );
        }
    }

    Ok(())
}
