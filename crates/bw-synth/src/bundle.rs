//! Bulk asset-export replication path.
//!
//! Delegates the whole graph to the export subsystem: build the
//! property-override directives, submit a job scoped to the analysis ARN,
//! poll it to a terminal state with exponential backoff, then fetch and
//! convert the JSON payload into the internal document form.

use crate::context::SynthContext;
use crate::error::{SynthError, SynthResult};
use bw_api::records::{ExportJobDescription, ExportJobRequest, ExportJobStatus};
use bw_api::BundleExporter;
use bw_core::{AnalysisDef, DataSourceDef, ServiceConnection, TemplateDocument};
use serde_json::{json, Value};
use std::time::Duration;

/// First poll wait; doubles on every retry
const INITIAL_POLL_WAIT: Duration = Duration::from_secs(5);

/// Poll budget after submission
const MAX_POLL_ATTEMPTS: usize = 5;

/// Export format requested from the subsystem
const EXPORT_FORMAT: &str = "CLOUDFORMATION_JSON";

/// Run the export job for the analysis and convert its payload into the
/// destination document.
pub async fn export_destination(
    analysis: &AnalysisDef,
    ctx: &SynthContext,
    exporter: &dyn BundleExporter,
) -> SynthResult<TemplateDocument> {
    let overrides = if ctx.remap {
        Some(override_directives(analysis))
    } else {
        None
    };

    let request = ExportJobRequest {
        resource_arns: vec![analysis.arn.clone()],
        include_all_dependencies: true,
        export_format: EXPORT_FORMAT.to_string(),
        cloud_formation_override_property_configuration: overrides,
    };

    let job_id = exporter.start_export(request).await?;
    log::info!("submitted asset export job {}", job_id);

    let description = poll_until_terminal(exporter, &job_id).await?;

    match description.job_status {
        ExportJobStatus::Failed => {
            return Err(SynthError::ExportFailed {
                job_id: job_id.clone(),
                detail: description
                    .error_message
                    .unwrap_or_else(|| "no error detail reported".to_string()),
            })
        }
        ExportJobStatus::Successful => {}
        // poll_until_terminal only returns terminal states
        other => {
            return Err(SynthError::ExportTimeout {
                job_id: job_id.clone(),
                attempts: MAX_POLL_ATTEMPTS,
                last_status: other.to_string(),
            })
        }
    }

    let url = description
        .download_url
        .ok_or(SynthError::MissingDownloadUrl {
            job_id: job_id.clone(),
        })?;
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(SynthError::BadDownloadScheme { url });
    }

    let payload = exporter.download(&url).await?;
    Ok(TemplateDocument::from_json_slice(&payload)?)
}

/// Poll the job until it reaches a terminal state or the retry budget runs
/// out. An exhausted budget on a non-terminal status is a hard failure;
/// a possibly-incomplete export must never pass as success.
async fn poll_until_terminal(
    exporter: &dyn BundleExporter,
    job_id: &str,
) -> SynthResult<ExportJobDescription> {
    let mut wait = INITIAL_POLL_WAIT;
    let mut description = exporter.describe_export(job_id).await?;

    for _ in 0..MAX_POLL_ATTEMPTS {
        if description.job_status.is_terminal() {
            return Ok(description);
        }
        log::info!(
            "export job {} is {}, waiting {}s",
            job_id,
            description.job_status,
            wait.as_secs()
        );
        tokio::time::sleep(wait).await;
        wait *= 2;
        description = exporter.describe_export(job_id).await?;
    }

    if description.job_status.is_terminal() {
        Ok(description)
    } else {
        Err(SynthError::ExportTimeout {
            job_id: job_id.to_string(),
            attempts: MAX_POLL_ATTEMPTS,
            last_status: description.job_status.to_string(),
        })
    }
}

/// Property-override directives: which attributes of which exported
/// resource stay externally supplied instead of baked in.
pub fn override_directives(analysis: &AnalysisDef) -> Value {
    let mut vpc_connections: Vec<Value> = Vec::new();
    let mut refresh_schedules: Vec<Value> = Vec::new();
    let mut data_sources: Vec<Value> = Vec::new();
    let mut seen_vpc: Vec<String> = Vec::new();
    let mut seen_sources: Vec<String> = Vec::new();

    for dataset in analysis.all_datasets() {
        for schedule in &dataset.refresh_schedules {
            refresh_schedules.push(json!({
                "Arn": format!(
                    "{}/refresh-schedule/{}",
                    dataset_arn(analysis, &dataset.id),
                    schedule.schedule_id
                ),
                "Properties": ["StartAfterDateTime"],
            }));
        }

        for source in &dataset.depending_sources {
            if seen_sources.contains(&source.id().to_string()) {
                continue;
            }
            seen_sources.push(source.id().to_string());
            data_sources.push(json!({
                "Arn": source.common().arn,
                "Properties": overridable_source_properties(source),
            }));

            if let Some(vpc_arn) = source.vpc_connection_arn() {
                if !seen_vpc.contains(&vpc_arn.to_string()) {
                    seen_vpc.push(vpc_arn.to_string());
                    vpc_connections.push(json!({
                        "Arn": vpc_arn,
                        "Properties": ["Name", "DnsResolvers", "RoleArn"],
                    }));
                }
            }
        }
    }

    json!({
        "VPCConnections": vpc_connections,
        "RefreshSchedules": refresh_schedules,
        "DataSources": data_sources,
    })
}

/// Connection attributes that stay overridable, per source kind
fn overridable_source_properties(source: &DataSourceDef) -> Vec<&'static str> {
    match source {
        DataSourceDef::Service(s) => match s.connection {
            ServiceConnection::S3 { .. } => vec!["ManifestFileLocation"],
            ServiceConnection::Athena { .. } => vec!["WorkGroup"],
        },
        DataSourceDef::ManagedRelational(_) => vec!["InstanceId", "Database"],
        DataSourceDef::GenericRelational(g) => {
            if g.cluster_id.is_some() {
                vec!["Host", "Port", "Database", "ClusterId"]
            } else {
                vec!["Host", "Port", "Database"]
            }
        }
    }
}

/// Literal dataset ARN in the source account (override directives address
/// live resources, so no deferred substitution here).
fn dataset_arn(analysis: &AnalysisDef, dataset_id: &str) -> String {
    format!(
        "arn:aws:quicksight:{}:{}:dataset/{}",
        analysis.qs_region, analysis.account_id, dataset_id
    )
}

#[cfg(test)]
#[path = "bundle_test.rs"]
mod tests;
