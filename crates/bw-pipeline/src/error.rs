//! Error types for bw-pipeline

use thiserror::Error;

/// Deployment pipeline errors
#[derive(Error, Debug)]
pub enum PipelineError {
    /// P001: operator parameter set drifted from fresh synthesis
    #[error(
        "[P001] Parameter configuration for stage '{stage}' does not match the synthesized template: missing [{}], extra [{}]",
        .missing.join(", "),
        .extra.join(", ")
    )]
    ParameterDrift {
        stage: String,
        missing: Vec<String>,
        extra: Vec<String>,
    },

    /// P002: a deploy run found no operator parameter file for a stage
    #[error("[P002] No {scope} parameter file found for stage '{stage}'; run initialize first")]
    MissingParameterFile { scope: String, stage: String },

    /// P003: packaging failure
    #[error("[P003] Failed to package '{path}': {message}")]
    Package { path: String, message: String },

    /// P004: IO error with file path context
    #[error("[P004] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// P005: parameter file content error
    #[error("[P005] Malformed parameter file '{path}': {message}")]
    MalformedParameterFile { path: String, message: String },

    /// Core model error
    #[error(transparent)]
    Core(#[from] bw_core::CoreError),

    /// Synthesis error
    #[error(transparent)]
    Synth(#[from] bw_synth::SynthError),

    /// Collaborator error
    #[error(transparent)]
    Api(#[from] bw_api::ApiError),
}

/// Result type alias for PipelineError
pub type PipelineResult<T> = Result<T, PipelineError>;
