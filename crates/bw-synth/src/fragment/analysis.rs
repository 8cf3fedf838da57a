//! Analysis fragment generator (destination account)

use crate::context::SynthContext;
use crate::error::SynthResult;
use crate::skeleton;
use bw_core::ident::{arn_sub, arn_sub_in_account, ResourceKind};
use bw_core::{AnalysisDef, ReplicationMode, TemplateDocument};
use serde_json::json;

/// Generate the analysis resource that instantiates the shared template in
/// the destination account.
pub fn generate(
    analysis: &AnalysisDef,
    doc: &mut TemplateDocument,
    ctx: &SynthContext,
) -> SynthResult<()> {
    if doc.has_resource(&analysis.cfn_id) {
        log::info!(
            "analysis with id {} already exists, skipping",
            analysis.cfn_id
        );
        return Ok(());
    }
    log::info!(
        "Processing analysis {} (ID {})",
        analysis.name,
        analysis.id
    );

    let references: Vec<serde_json::Value> = analysis
        .datasets
        .iter()
        .filter(|d| !d.is_rls)
        .map(|d| {
            json!({
                "DataSetArn": arn_sub(ResourceKind::DataSet, &d.id),
                "DataSetPlaceholder": d.placeholder_name,
            })
        })
        .collect();

    let mut tags = vec![json!({ "Key": "PipelineName", "Value": analysis.pipeline_name })];
    if ctx.mode == ReplicationMode::Template {
        tags.push(json!({ "Key": "UpdatedAt", "Value": ctx.timestamp_string() }));
    }

    let mut resource = skeleton::analysis_resource()?;
    let props = resource.properties_mut();
    props.insert("AnalysisId".to_string(), json!(analysis.id));
    props.insert("Name".to_string(), json!(analysis.name));
    props.insert(
        "SourceEntity".to_string(),
        json!({
            "SourceTemplate": {
                "Arn": arn_sub_in_account(
                    ResourceKind::Template,
                    &analysis.template_id,
                    "${SourceAccountID}",
                ),
                "DataSetReferences": references,
            }
        }),
    );
    props.insert("Tags".to_string(), json!(tags));
    resource.depends_on = analysis.depending_datasets();

    doc.insert_resource(&analysis.cfn_id, resource);
    Ok(())
}

#[cfg(test)]
#[path = "analysis_test.rs"]
mod tests;
