//! Source-account template fragment generator

use crate::context::SynthContext;
use crate::error::SynthResult;
use crate::skeleton;
use bw_core::ident::{arn_sub, cfn_id, ResourceKind};
use bw_core::{AnalysisDef, TemplateDocument};
use serde_json::json;

/// Generate the reusable template resource that models the live analysis
/// in the source account. The destination analysis instantiates it across
/// the account boundary.
pub fn generate(
    analysis: &AnalysisDef,
    doc: &mut TemplateDocument,
    _ctx: &SynthContext,
) -> SynthResult<()> {
    let template_cfn_id = cfn_id(ResourceKind::Template, &analysis.template_id);
    if doc.has_resource(&template_cfn_id) {
        log::info!(
            "template with id {} already exists, skipping",
            template_cfn_id
        );
        return Ok(());
    }
    log::info!(
        "Processing template {} for analysis {} (ID {})",
        analysis.template_id,
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

    let mut resource = skeleton::template_resource()?;
    let props = resource.properties_mut();
    props.insert("TemplateId".to_string(), json!(analysis.template_id));
    props.insert(
        "Name".to_string(),
        json!(format!("Pipeline template for analysis {}", analysis.name)),
    );

    // The skeleton carries the source-analysis ARN with an `{analysis_id}`
    // marker; bind it to the live analysis.
    if let Some(source_entity) = props
        .get_mut("SourceEntity")
        .and_then(|v| v.get_mut("SourceAnalysis"))
        .and_then(|v| v.as_object_mut())
    {
        if let Some(sub) = source_entity
            .get("Arn")
            .and_then(|v| v.get("Fn::Sub"))
            .and_then(|v| v.as_str())
        {
            let bound = sub.replace("{analysis_id}", &analysis.id);
            source_entity.insert("Arn".to_string(), json!({ "Fn::Sub": bound }));
        }
        source_entity.insert("DataSetReferences".to_string(), json!(references));
    }

    // Share the template across the account boundary: full control for the
    // owning user, read access for the destination account.
    props.insert(
        "Permissions".to_string(),
        json!([
            {
                "Principal": format!(
                    "arn:aws:quicksight:{}:{}:user/default/{}",
                    analysis.qs_admin_region, analysis.account_id, analysis.qs_user
                ),
                "Actions": [
                    "quicksight:DescribeTemplate",
                    "quicksight:DescribeTemplatePermissions",
                    "quicksight:UpdateTemplate",
                    "quicksight:UpdateTemplatePermissions",
                    "quicksight:DeleteTemplate",
                ],
            },
            {
                "Principal": { "Fn::Sub": "arn:${AWS::Partition}:iam::${DestinationAccountID}:root" },
                "Actions": ["quicksight:DescribeTemplate"],
            }
        ]),
    );

    doc.insert_resource(&template_cfn_id, resource);
    Ok(())
}

#[cfg(test)]
#[path = "template_test.rs"]
mod tests;
