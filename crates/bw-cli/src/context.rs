//! Runtime context for CLI commands

use anyhow::{bail, Context, Result};
use bw_api::{BundleExporter, FileTrackingStore, FixtureCatalog, LocalObjectStore, PreparedBundleExporter};
use bw_core::{Config, ReplicationMode};
use bw_pipeline::Orchestrator;
use std::path::Path;
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Runtime context containing the loaded config and a wired orchestrator
pub struct RuntimeContext {
    /// The loaded configuration
    pub config: Config,

    /// Orchestrator wired to the configured backends
    pub orchestrator: Orchestrator,

    /// Verbose output enabled
    pub verbose: bool,
}

impl RuntimeContext {
    /// Create a new runtime context from global arguments.
    ///
    /// `force_remap` lets a command flag turn remapping on over the
    /// configured default (it never turns it off).
    pub fn new(args: &GlobalArgs, force_remap: bool) -> Result<Self> {
        let project_path = Path::new(&args.project_dir);

        let mut config = if let Some(config_path) = &args.config {
            Config::load(Path::new(config_path)).context("Failed to load configuration file")?
        } else {
            Config::load_from_dir(project_path).context("Failed to load project configuration")?
        };
        if force_remap {
            config.remap = true;
        }

        let catalog = Arc::new(
            FixtureCatalog::load(Path::new(&config.backends.catalog_path))
                .context("Failed to load the asset catalog")?,
        );
        let store = Arc::new(LocalObjectStore::new(
            &config.backends.store_root,
            &config.deployment_account_id,
        ));
        let tracking = Arc::new(
            FileTrackingStore::open(&config.backends.tracking_path)
                .context("Failed to open the tracking store")?,
        );

        let exporter: Arc<dyn BundleExporter> = match (&config.replication, &config.backends.bundle_dir) {
            (ReplicationMode::Bundle, Some(dir)) => {
                Arc::new(PreparedBundleExporter::new(Path::new(dir).join("bundle.json")))
            }
            (ReplicationMode::Bundle, None) => {
                bail!("replication 'bundle' requires backends.bundle_dir in boardwalk.yml")
            }
            // Unused on the template path; point it at the store root
            (ReplicationMode::Template, _) => Arc::new(PreparedBundleExporter::new(
                Path::new(&config.backends.store_root).join("bundle.json"),
            )),
        };

        let orchestrator = Orchestrator::new(
            config.clone(),
            catalog,
            exporter,
            store,
            tracking,
        )
        .context("Invalid configuration")?;

        Ok(Self {
            config,
            orchestrator,
            verbose: args.verbose,
        })
    }

    /// Print verbose output if enabled
    pub fn verbose(&self, msg: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", msg);
        }
    }
}
