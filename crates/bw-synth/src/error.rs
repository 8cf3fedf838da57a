//! Error types for bw-synth

use thiserror::Error;

/// Synthesis errors
#[derive(Error, Debug)]
pub enum SynthError {
    /// S001: the bulk export job reported failure
    #[error("[S001] Asset export job '{job_id}' failed: {detail}")]
    ExportFailed { job_id: String, detail: String },

    /// S002: the polling budget ran out before the job finished
    #[error("[S002] Asset export job '{job_id}' did not reach a terminal state after {attempts} polls (last status {last_status})")]
    ExportTimeout {
        job_id: String,
        attempts: usize,
        last_status: String,
    },

    /// S003: the export download URL uses a disallowed scheme
    #[error("[S003] Export download URL '{url}' must use http or https")]
    BadDownloadScheme { url: String },

    /// S004: a successful export carried no download URL
    #[error("[S004] Export job '{job_id}' completed without a download URL")]
    MissingDownloadUrl { job_id: String },

    /// S005: a cross-reference resolved to a resource of the wrong kind
    #[error("[S005] Reference to '{reference}' in '{resource}' resolved to a {found} resource, expected {expected}")]
    ReferenceKindMismatch {
        resource: String,
        reference: String,
        expected: String,
        found: String,
    },

    /// S006: a cross-reference points at nothing trackable
    #[error("[S006] Reference to '{reference}' in '{resource}' does not match any tracked resource")]
    UnknownReference { resource: String, reference: String },

    /// S007: row-level-security relations form a cycle
    #[error("[S007] Row-level-security relation cycle detected: {path}")]
    RlsCycle { path: String },

    /// S008: the metadata source reported a type this synthesizer cannot emit
    #[error("[S008] Data source '{name}' (ID {id}) has unsupported type '{source_type}'")]
    UnsupportedSourceType {
        name: String,
        id: String,
        source_type: String,
    },

    /// S009: a metadata record is missing an expected field
    #[error("[S009] Malformed metadata record for {entity} '{id}': {message}")]
    MalformedRecord {
        entity: &'static str,
        id: String,
        message: String,
    },

    /// Core model error
    #[error(transparent)]
    Core(#[from] bw_core::CoreError),

    /// Collaborator error
    #[error(transparent)]
    Api(#[from] bw_api::ApiError),
}

/// Result type alias for SynthError
pub type SynthResult<T> = Result<T, SynthError>;
