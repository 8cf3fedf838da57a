//! Collaborator trait definitions.
//!
//! The synthesizer only ever talks to the outside world through these
//! traits; the shipped implementations in [`crate::local`] are
//! filesystem-backed, and cloud-backed ones plug in without touching the
//! core. Implementations must be Send + Sync for async operation.

use crate::error::ApiResult;
use crate::records::{
    AnalysisRecord, DashboardRecord, DataSetRecord, DataSourceRecord, ExportJobDescription,
    ExportJobRequest, PermissionGrant, RefreshScheduleRecord,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Read-only access to the source account's asset metadata
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Resolve a dashboard to its record (including the source analysis ARN)
    async fn describe_dashboard(&self, dashboard_id: &str) -> ApiResult<DashboardRecord>;

    /// Resolve an analysis record
    async fn describe_analysis(&self, analysis_id: &str) -> ApiResult<AnalysisRecord>;

    /// Permission grants on an analysis; the first grant identifies the owner
    async fn describe_analysis_permissions(
        &self,
        analysis_id: &str,
    ) -> ApiResult<Vec<PermissionGrant>>;

    /// Resolve a dataset record
    async fn describe_data_set(&self, data_set_id: &str) -> ApiResult<DataSetRecord>;

    /// Refresh schedules of a dataset (empty for direct-query datasets)
    async fn list_refresh_schedules(
        &self,
        data_set_id: &str,
    ) -> ApiResult<Vec<RefreshScheduleRecord>>;

    /// Resolve a data source record
    async fn describe_data_source(&self, data_source_id: &str) -> ApiResult<DataSourceRecord>;
}

/// The bulk asset-export subsystem
#[async_trait]
pub trait BundleExporter: Send + Sync {
    /// Submit an export job; returns the job id
    async fn start_export(&self, request: ExportJobRequest) -> ApiResult<String>;

    /// Current job state
    async fn describe_export(&self, job_id: &str) -> ApiResult<ExportJobDescription>;

    /// Fetch the finished job's payload from its download URL
    async fn download(&self, url: &str) -> ApiResult<Vec<u8>>;
}

/// Object storage used to stage artifacts for the deployment pipeline
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Verify the bucket belongs to the expected account
    async fn check_bucket_owner(&self, bucket: &str, expected_owner: &str) -> ApiResult<()>;

    /// Upload a local file under the given key
    async fn upload_file(&self, bucket: &str, key: &str, local_path: &Path) -> ApiResult<()>;

    /// Write raw content under the given key
    async fn put_object(&self, bucket: &str, key: &str, content: &[u8]) -> ApiResult<()>;

    /// Download every object under a key prefix into a local directory;
    /// returns the downloaded paths
    async fn download_by_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        dest_dir: &Path,
    ) -> ApiResult<Vec<PathBuf>>;

    /// Retrieval URL for an object
    async fn presigned_url(&self, bucket: &str, key: &str) -> ApiResult<String>;
}

/// Which side of the promotion a tracked record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetScope {
    /// Source-account artifacts
    Source,
    /// Destination-account artifacts
    Dest,
}

impl std::fmt::Display for AssetScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetScope::Source => write!(f, "source"),
            AssetScope::Dest => write!(f, "dest"),
        }
    }
}

/// An asset registered for event-driven deployment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedAsset {
    pub asset_id: String,
    pub pipeline_name: String,
}

/// A declared parameter persisted for operator fill-in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredParameter {
    pub key: String,
    pub description: String,
    pub param_type: String,
}

/// Key-value store for tracked assets and parameter definitions, keyed by
/// `(scope, stage)`
#[async_trait]
pub trait TrackingStore: Send + Sync {
    async fn put_assets(
        &self,
        scope: AssetScope,
        stage: &str,
        assets: &[TrackedAsset],
    ) -> ApiResult<()>;

    async fn get_assets(&self, scope: AssetScope, stage: &str) -> ApiResult<Vec<TrackedAsset>>;

    /// All tracked assets across scopes and stages
    async fn scan_assets(&self) -> ApiResult<Vec<TrackedAsset>>;

    async fn put_parameters(
        &self,
        scope: AssetScope,
        stage: &str,
        parameters: &[StoredParameter],
    ) -> ApiResult<()>;

    async fn get_parameters(
        &self,
        scope: AssetScope,
        stage: &str,
    ) -> ApiResult<Vec<StoredParameter>>;
}
