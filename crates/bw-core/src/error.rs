//! Error types for bw-core

use thiserror::Error;

/// Core error type for Boardwalk
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Failed to parse configuration file
    #[error("[C002] Failed to parse config: {message}")]
    ConfigParseError { message: String },

    /// C003: Invalid configuration value
    #[error("[C003] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C004: A data source is missing a mandatory connection parameter
    #[error("[C004] {kind} data source '{name}' (ID {id}, index {index}) is missing mandatory parameter '{parameter}'")]
    MissingSourceParameter {
        kind: String,
        name: String,
        id: String,
        index: usize,
        parameter: String,
    },

    /// C005: A relational data source carries no secret reference
    #[error("[C005] {kind} data source '{name}' (ID {id}) is not configured with a secret, cannot proceed")]
    MissingSecret {
        kind: String,
        name: String,
        id: String,
    },

    /// C006: A DependsOn edge references a resource absent from the document
    #[error("[C006] Resource '{resource}' depends on '{target}' which is not declared in the document")]
    UnknownDependency { resource: String, target: String },

    /// C007: Circular dependency among document resources
    #[error("[C007] Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// C008: IO error with file path context
    #[error("[C008] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C009: YAML serialization error
    #[error("[C009] YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// C010: JSON serialization error
    #[error("[C010] JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// C011: An empty raw identifier was provided where one is required
    #[error("[C011] Empty identifier for {context}")]
    EmptyId { context: String },
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
