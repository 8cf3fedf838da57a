//! Structured records returned by the external collaborators.
//!
//! Field names follow the metadata API's wire casing so records can be
//! deserialized straight from captured responses (which is also how the
//! JSON fixture catalog is authored).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// describe-dashboard response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DashboardRecord {
    pub dashboard_id: String,
    #[serde(default)]
    pub name: Option<String>,
    /// ARN of the analysis this dashboard was published from
    pub source_entity_arn: String,
}

/// describe-analysis response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AnalysisRecord {
    pub analysis_id: String,
    pub arn: String,
    pub name: String,
    #[serde(default)]
    pub data_set_arns: Vec<String>,
}

/// One grant from describe-analysis-permissions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PermissionGrant {
    pub principal: String,
    #[serde(default)]
    pub actions: Vec<String>,
}

/// Row-level-security relation on a dataset record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RlsRecord {
    pub arn: String,
    #[serde(default)]
    pub format_version: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
    pub permission_policy: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// describe-data-set response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSetRecord {
    pub data_set_id: String,
    pub arn: String,
    pub name: String,
    pub import_mode: String,
    #[serde(default)]
    pub physical_table_map: Value,
    #[serde(default)]
    pub logical_table_map: Value,
    #[serde(default)]
    pub row_level_permission_data_set: Option<RlsRecord>,
    /// Optional properties (column groups, field folders, usage config, ...)
    /// carried through untyped
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// One refresh schedule from list-refresh-schedules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RefreshScheduleRecord {
    pub schedule_id: String,
    /// Full schedule detail as returned by the API (including the
    /// inconsistently-cased `Timezone` field)
    pub schedule: Value,
}

/// VPC connection reference on a data source record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VpcConnectionProperties {
    pub vpc_connection_arn: String,
}

/// describe-data-source response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataSourceRecord {
    pub data_source_id: String,
    pub arn: String,
    pub name: String,
    #[serde(rename = "Type")]
    pub source_type: String,
    /// Type-dependent connection parameters, e.g.
    /// `{"S3Parameters": {"ManifestFileLocation": {...}}}`
    #[serde(default)]
    pub data_source_parameters: Value,
    #[serde(default)]
    pub vpc_connection_properties: Option<VpcConnectionProperties>,
    #[serde(default)]
    pub secret_arn: Option<String>,
}

/// Status of a bulk asset-export job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportJobStatus {
    #[serde(rename = "QUEUED_FOR_IMMEDIATE_EXECUTION")]
    Queued,
    InProgress,
    Successful,
    Failed,
}

impl ExportJobStatus {
    /// Whether the job has finished (successfully or not)
    pub fn is_terminal(&self) -> bool {
        matches!(self, ExportJobStatus::Successful | ExportJobStatus::Failed)
    }
}

impl std::fmt::Display for ExportJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExportJobStatus::Queued => "QUEUED_FOR_IMMEDIATE_EXECUTION",
            ExportJobStatus::InProgress => "IN_PROGRESS",
            ExportJobStatus::Successful => "SUCCESSFUL",
            ExportJobStatus::Failed => "FAILED",
        };
        write!(f, "{}", name)
    }
}

/// Request to the bulk asset-export subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportJobRequest {
    /// Root ARNs to export
    pub resource_arns: Vec<String>,
    /// Export the full dependency closure
    pub include_all_dependencies: bool,
    /// Output format requested from the subsystem
    pub export_format: String,
    /// Property-override directives, when remapping is requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloud_formation_override_property_configuration: Option<Value>,
}

/// describe-export response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExportJobDescription {
    pub job_id: String,
    pub job_status: ExportJobStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}
