//! Configuration types and parsing for boardwalk.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which replication strategy produces the document pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReplicationMode {
    /// Synthesize a reusable template resource plus an analysis that
    /// instantiates it (default)
    #[default]
    Template,
    /// Delegate to the bulk asset-export subsystem and convert its output
    Bundle,
}

impl std::fmt::Display for ReplicationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplicationMode::Template => write!(f, "template"),
            ReplicationMode::Bundle => write!(f, "bundle"),
        }
    }
}

/// Main project configuration from boardwalk.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Pipeline name used to scope storage prefixes and tags
    #[serde(default = "default_pipeline_name")]
    pub pipeline_name: String,

    /// Account the assets are read from
    pub source_account_id: String,

    /// Account the deployment artifacts are staged into
    pub deployment_account_id: String,

    /// Region the source assets live in
    pub aws_region: String,

    /// Bucket the deployment pipeline reads artifacts from
    pub deployment_bucket: String,

    /// Region of the deployment bucket; falls back to `aws_region`
    #[serde(default)]
    pub deployment_bucket_region: String,

    /// Asset-owning user in the source account
    pub source_user: String,

    /// User granted access in destination accounts
    pub dest_user: String,

    /// Deployment stages; the first entry is the source stage, the rest
    /// receive parameter fill-in files
    pub stages: Vec<String>,

    /// Replication strategy
    #[serde(default)]
    pub replication: ReplicationMode,

    /// Emit externally-supplied parameters for connection attributes
    /// instead of baking in source-account literals
    #[serde(default)]
    pub remap: bool,

    /// Split destination documents into nested-stack groups
    #[serde(default)]
    pub partition: bool,

    /// Hard cap on resources per nested-stack group
    #[serde(default = "default_max_resources_per_group")]
    pub max_resources_per_group: usize,

    /// Local directory synthesized artifacts are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Backend locations for the shipped local implementations
    #[serde(default)]
    pub backends: BackendsConfig,
}

/// Locations for the filesystem-backed collaborator implementations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendsConfig {
    /// JSON catalog file describing the source-account assets
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Root directory of the local object store (one subdirectory per bucket)
    #[serde(default = "default_store_root")]
    pub store_root: String,

    /// JSON file backing the tracked-asset / parameter key-value store
    #[serde(default = "default_tracking_path")]
    pub tracking_path: String,

    /// Directory prepared bundle-export payloads are served from
    #[serde(default)]
    pub bundle_dir: Option<String>,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            store_root: default_store_root(),
            tracking_path: default_tracking_path(),
            bundle_dir: None,
        }
    }
}

fn default_pipeline_name() -> String {
    "boardwalk".to_string()
}

fn default_max_resources_per_group() -> usize {
    10
}

fn default_output_dir() -> String {
    "target/output".to_string()
}

fn default_catalog_path() -> String {
    "catalog.json".to_string()
}

fn default_store_root() -> String {
    "target/store".to_string()
}

fn default_tracking_path() -> String {
    "target/tracking.json".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for boardwalk.yml or boardwalk.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("boardwalk.yml");
        let yaml_path = dir.join("boardwalk.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: dir.join("boardwalk.yml").display().to_string(),
            })
        }
    }

    /// Fail-fast validation of required fields
    pub fn validate(&self) -> CoreResult<()> {
        let required = [
            ("source_account_id", &self.source_account_id),
            ("deployment_account_id", &self.deployment_account_id),
            ("aws_region", &self.aws_region),
            ("deployment_bucket", &self.deployment_bucket),
            ("source_user", &self.source_user),
            ("dest_user", &self.dest_user),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(CoreError::ConfigInvalid {
                    message: format!("'{}' must not be empty", field),
                });
            }
        }
        if self.stages.len() < 2 {
            return Err(CoreError::ConfigInvalid {
                message: "'stages' needs the source stage plus at least one deployment stage"
                    .to_string(),
            });
        }
        if self.max_resources_per_group == 0 {
            return Err(CoreError::ConfigInvalid {
                message: "'max_resources_per_group' must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Region of the deployment bucket, defaulting to the asset region
    pub fn deployment_bucket_region(&self) -> &str {
        if self.deployment_bucket_region.is_empty() {
            &self.aws_region
        } else {
            &self.deployment_bucket_region
        }
    }

    /// Stages that receive parameter fill-in files (all but the source stage)
    pub fn deployment_stages(&self) -> &[String] {
        &self.stages[1..]
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
