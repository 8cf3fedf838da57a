//! Error types for bw-api

use thiserror::Error;

/// External collaborator errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// A001: Entity not found in the metadata source
    #[error("[A001] {entity} '{id}' not found")]
    NotFound { entity: &'static str, id: String },

    /// A002: IO error with file path context
    #[error("[A002] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// A003: Payload serialization error
    #[error("[A003] JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A004: Storage operation failed
    #[error("[A004] Storage error: {message}")]
    Storage { message: String },

    /// A005: Bucket is not owned by the expected account
    #[error("[A005] Bucket '{bucket}' does not belong to the expected account {expected}")]
    BucketOwnership { bucket: String, expected: String },

    /// A006: Unknown export job id
    #[error("[A006] Unknown export job '{job_id}'")]
    UnknownJob { job_id: String },
}

/// Result type alias for ApiError
pub type ApiResult<T> = Result<T, ApiError>;
