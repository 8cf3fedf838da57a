//! Filesystem-backed collaborator implementations.
//!
//! These back the CLI when working against a captured metadata catalog and
//! a local staging directory, and they are what the test suites run
//! against. Cloud-backed implementations live behind the same traits.

use crate::error::{ApiError, ApiResult};
use crate::records::{
    AnalysisRecord, DashboardRecord, DataSetRecord, DataSourceRecord, ExportJobDescription,
    ExportJobRequest, ExportJobStatus, PermissionGrant, RefreshScheduleRecord,
};
use crate::traits::{
    AssetScope, BundleExporter, MetadataSource, ObjectStore, StoredParameter, TrackedAsset,
    TrackingStore,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

fn io_err(path: &Path, source: std::io::Error) -> ApiError {
    ApiError::IoWithPath {
        path: path.display().to_string(),
        source,
    }
}

// ---------------------------------------------------------------------------
// Metadata catalog
// ---------------------------------------------------------------------------

/// On-disk shape of the JSON fixture catalog
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct CatalogFile {
    dashboards: HashMap<String, DashboardRecord>,
    analyses: HashMap<String, AnalysisRecord>,
    analysis_permissions: HashMap<String, Vec<PermissionGrant>>,
    data_sets: HashMap<String, DataSetRecord>,
    refresh_schedules: HashMap<String, Vec<RefreshScheduleRecord>>,
    data_sources: HashMap<String, DataSourceRecord>,
}

/// Metadata source reading from a captured JSON catalog file
pub struct FixtureCatalog {
    catalog: CatalogFile,
}

impl FixtureCatalog {
    /// Load a catalog from a JSON file
    pub fn load(path: &Path) -> ApiResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let catalog: CatalogFile = serde_json::from_str(&content)?;
        Ok(Self { catalog })
    }

    /// Build a catalog from raw JSON (used by tests)
    pub fn from_json(value: serde_json::Value) -> ApiResult<Self> {
        let catalog: CatalogFile = serde_json::from_value(value)?;
        Ok(Self { catalog })
    }
}

#[async_trait]
impl MetadataSource for FixtureCatalog {
    async fn describe_dashboard(&self, dashboard_id: &str) -> ApiResult<DashboardRecord> {
        self.catalog
            .dashboards
            .get(dashboard_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                entity: "dashboard",
                id: dashboard_id.to_string(),
            })
    }

    async fn describe_analysis(&self, analysis_id: &str) -> ApiResult<AnalysisRecord> {
        self.catalog
            .analyses
            .get(analysis_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                entity: "analysis",
                id: analysis_id.to_string(),
            })
    }

    async fn describe_analysis_permissions(
        &self,
        analysis_id: &str,
    ) -> ApiResult<Vec<PermissionGrant>> {
        self.catalog
            .analysis_permissions
            .get(analysis_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                entity: "analysis permissions",
                id: analysis_id.to_string(),
            })
    }

    async fn describe_data_set(&self, data_set_id: &str) -> ApiResult<DataSetRecord> {
        self.catalog
            .data_sets
            .get(data_set_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                entity: "dataset",
                id: data_set_id.to_string(),
            })
    }

    async fn list_refresh_schedules(
        &self,
        data_set_id: &str,
    ) -> ApiResult<Vec<RefreshScheduleRecord>> {
        Ok(self
            .catalog
            .refresh_schedules
            .get(data_set_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn describe_data_source(&self, data_source_id: &str) -> ApiResult<DataSourceRecord> {
        self.catalog
            .data_sources
            .get(data_source_id)
            .cloned()
            .ok_or_else(|| ApiError::NotFound {
                entity: "data source",
                id: data_source_id.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Object store
// ---------------------------------------------------------------------------

/// Object store backed by a local directory tree (one subdirectory per
/// bucket). Presigned URLs are emulated with a stable `https` form so
/// downstream documents remain well-formed.
pub struct LocalObjectStore {
    root: PathBuf,
    owner: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, owner: &str) -> Self {
        Self {
            root: root.into(),
            owner: owner.to_string(),
        }
    }

    fn object_path(&self, bucket: &str, key: &str) -> PathBuf {
        self.root.join(bucket).join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn check_bucket_owner(&self, bucket: &str, expected_owner: &str) -> ApiResult<()> {
        if self.owner == expected_owner {
            Ok(())
        } else {
            Err(ApiError::BucketOwnership {
                bucket: bucket.to_string(),
                expected: expected_owner.to_string(),
            })
        }
    }

    async fn upload_file(&self, bucket: &str, key: &str, local_path: &Path) -> ApiResult<()> {
        let content = std::fs::read(local_path).map_err(|e| io_err(local_path, e))?;
        self.put_object(bucket, key, &content).await
    }

    async fn put_object(&self, bucket: &str, key: &str, content: &[u8]) -> ApiResult<()> {
        let path = self.object_path(bucket, key);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        std::fs::write(&path, content).map_err(|e| io_err(&path, e))?;
        log::debug!("stored object {}/{}", bucket, key);
        Ok(())
    }

    async fn download_by_prefix(
        &self,
        bucket: &str,
        prefix: &str,
        dest_dir: &Path,
    ) -> ApiResult<Vec<PathBuf>> {
        let bucket_dir = self.root.join(bucket);
        let mut keys = Vec::new();
        collect_keys(&bucket_dir, &bucket_dir, &mut keys)?;
        keys.sort();

        std::fs::create_dir_all(dest_dir).map_err(|e| io_err(dest_dir, e))?;
        let mut downloaded = Vec::new();
        for key in keys.iter().filter(|k| k.starts_with(prefix)) {
            let source = bucket_dir.join(key);
            let file_name = source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| key.replace('/', "_"));
            let dest = dest_dir.join(file_name);
            std::fs::copy(&source, &dest).map_err(|e| io_err(&source, e))?;
            downloaded.push(dest);
        }
        Ok(downloaded)
    }

    async fn presigned_url(&self, bucket: &str, key: &str) -> ApiResult<String> {
        Ok(format!("https://{}.store.local/{}", bucket, key))
    }
}

/// Collect object keys ('/'-separated relative paths) under a bucket dir
fn collect_keys(base: &Path, dir: &Path, keys: &mut Vec<String>) -> ApiResult<()> {
    if !dir.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(dir).map_err(|e| io_err(dir, e))? {
        let entry = entry.map_err(|e| io_err(dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            collect_keys(base, &path, keys)?;
        } else if let Ok(relative) = path.strip_prefix(base) {
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            keys.push(key);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Bundle exporter
// ---------------------------------------------------------------------------

/// Bundle exporter serving a prepared payload file.
///
/// Jobs complete immediately; the download URL routes back to the payload
/// on disk. Used for offline runs and tests of the bundle strategy.
pub struct PreparedBundleExporter {
    payload_path: PathBuf,
    jobs: Mutex<HashMap<String, ExportJobRequest>>,
}

impl PreparedBundleExporter {
    pub fn new(payload_path: impl Into<PathBuf>) -> Self {
        Self {
            payload_path: payload_path.into(),
            jobs: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl BundleExporter for PreparedBundleExporter {
    async fn start_export(&self, request: ExportJobRequest) -> ApiResult<String> {
        let job_id = uuid::Uuid::new_v4().to_string();
        let mut jobs = self.jobs.lock().unwrap_or_else(|p| p.into_inner());
        jobs.insert(job_id.clone(), request);
        Ok(job_id)
    }

    async fn describe_export(&self, job_id: &str) -> ApiResult<ExportJobDescription> {
        let jobs = self.jobs.lock().unwrap_or_else(|p| p.into_inner());
        if !jobs.contains_key(job_id) {
            return Err(ApiError::UnknownJob {
                job_id: job_id.to_string(),
            });
        }
        Ok(ExportJobDescription {
            job_id: job_id.to_string(),
            job_status: ExportJobStatus::Successful,
            error_message: None,
            download_url: Some(format!("https://bundles.store.local/{}", job_id)),
        })
    }

    async fn download(&self, url: &str) -> ApiResult<Vec<u8>> {
        let job_id = url.rsplit('/').next().unwrap_or_default();
        let jobs = self.jobs.lock().unwrap_or_else(|p| p.into_inner());
        if !jobs.contains_key(job_id) {
            return Err(ApiError::UnknownJob {
                job_id: job_id.to_string(),
            });
        }
        std::fs::read(&self.payload_path).map_err(|e| io_err(&self.payload_path, e))
    }
}

// ---------------------------------------------------------------------------
// Tracking store
// ---------------------------------------------------------------------------

/// On-disk / in-memory shape of the tracking store
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct TrackingState {
    assets: HashMap<String, Vec<TrackedAsset>>,
    parameters: HashMap<String, Vec<StoredParameter>>,
}

fn tracking_key(scope: AssetScope, stage: &str) -> String {
    format!("{}/{}", scope, stage)
}

/// Tracking store persisted as a single JSON file
pub struct FileTrackingStore {
    path: PathBuf,
    state: Mutex<TrackingState>,
}

impl FileTrackingStore {
    /// Open (or create) the store at the given path
    pub fn open(path: impl Into<PathBuf>) -> ApiResult<Self> {
        let path = path.into();
        let state = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
            serde_json::from_str(&content)?
        } else {
            TrackingState::default()
        };
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn persist(&self, state: &TrackingState) -> ApiResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        let content = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, content).map_err(|e| io_err(&self.path, e))
    }
}

#[async_trait]
impl TrackingStore for FileTrackingStore {
    async fn put_assets(
        &self,
        scope: AssetScope,
        stage: &str,
        assets: &[TrackedAsset],
    ) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state
            .assets
            .insert(tracking_key(scope, stage), assets.to_vec());
        self.persist(&state)
    }

    async fn get_assets(&self, scope: AssetScope, stage: &str) -> ApiResult<Vec<TrackedAsset>> {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        Ok(state
            .assets
            .get(&tracking_key(scope, stage))
            .cloned()
            .unwrap_or_default())
    }

    async fn scan_assets(&self) -> ApiResult<Vec<TrackedAsset>> {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        let mut all: Vec<TrackedAsset> = state.assets.values().flatten().cloned().collect();
        all.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        all.dedup();
        Ok(all)
    }

    async fn put_parameters(
        &self,
        scope: AssetScope,
        stage: &str,
        parameters: &[StoredParameter],
    ) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state
            .parameters
            .insert(tracking_key(scope, stage), parameters.to_vec());
        self.persist(&state)
    }

    async fn get_parameters(
        &self,
        scope: AssetScope,
        stage: &str,
    ) -> ApiResult<Vec<StoredParameter>> {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        Ok(state
            .parameters
            .get(&tracking_key(scope, stage))
            .cloned()
            .unwrap_or_default())
    }
}

/// In-memory tracking store for tests
#[derive(Default)]
pub struct MemoryTrackingStore {
    state: Mutex<TrackingState>,
}

impl MemoryTrackingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TrackingStore for MemoryTrackingStore {
    async fn put_assets(
        &self,
        scope: AssetScope,
        stage: &str,
        assets: &[TrackedAsset],
    ) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state
            .assets
            .insert(tracking_key(scope, stage), assets.to_vec());
        Ok(())
    }

    async fn get_assets(&self, scope: AssetScope, stage: &str) -> ApiResult<Vec<TrackedAsset>> {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        Ok(state
            .assets
            .get(&tracking_key(scope, stage))
            .cloned()
            .unwrap_or_default())
    }

    async fn scan_assets(&self) -> ApiResult<Vec<TrackedAsset>> {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        let mut all: Vec<TrackedAsset> = state.assets.values().flatten().cloned().collect();
        all.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        all.dedup();
        Ok(all)
    }

    async fn put_parameters(
        &self,
        scope: AssetScope,
        stage: &str,
        parameters: &[StoredParameter],
    ) -> ApiResult<()> {
        let mut state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        state
            .parameters
            .insert(tracking_key(scope, stage), parameters.to_vec());
        Ok(())
    }

    async fn get_parameters(
        &self,
        scope: AssetScope,
        stage: &str,
    ) -> ApiResult<Vec<StoredParameter>> {
        let state = self.state.lock().unwrap_or_else(|p| p.into_inner());
        Ok(state
            .parameters
            .get(&tracking_key(scope, stage))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "local_test.rs"]
mod tests;
