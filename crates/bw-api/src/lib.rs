//! bw-api - External service abstraction layer for Boardwalk
//!
//! This crate defines the collaborator traits the synthesizer depends on
//! (metadata source, bulk exporter, object store, tracking store) together
//! with the structured records they exchange, and ships filesystem-backed
//! implementations for local operation and tests.

pub mod error;
pub mod local;
pub mod records;
pub mod traits;

pub use error::{ApiError, ApiResult};
pub use local::{
    FileTrackingStore, FixtureCatalog, LocalObjectStore, MemoryTrackingStore,
    PreparedBundleExporter,
};
pub use records::{
    AnalysisRecord, DashboardRecord, DataSetRecord, DataSourceRecord, ExportJobDescription,
    ExportJobRequest, ExportJobStatus, PermissionGrant, RefreshScheduleRecord, RlsRecord,
    VpcConnectionProperties,
};
pub use traits::{
    AssetScope, BundleExporter, MetadataSource, ObjectStore, StoredParameter, TrackedAsset,
    TrackingStore,
};
