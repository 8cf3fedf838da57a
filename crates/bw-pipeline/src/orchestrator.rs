//! End-to-end orchestration across the two operating modes.
//!
//! `Initialize` synthesizes the documents and publishes the parameter
//! fill-in contract; `Deploy` re-synthesizes against the current source
//! state, validates the operator-maintained configuration against it, and
//! only then packages the deployable archives. The event trigger path is
//! a deploy gated on the tracked-asset list.

use crate::error::{PipelineError, PipelineResult};
use crate::package::{self, object_key};
use crate::params;
use bw_api::{
    AssetScope, BundleExporter, MetadataSource, ObjectStore, TrackedAsset, TrackingStore,
};
use bw_core::{Config, DocFormat, ReplicationMode, TemplateDocument};
use bw_synth::{
    assemble_parent, flatten_references, partition, patch_permissions, strategy, ResourceGroup,
    Resolver, SynthContext,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Operating mode of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Synthesize and publish the parameter fill-in contract
    Initialize,
    /// Validate the operator configuration and package deployables
    Deploy,
}

/// Event-driven trigger payload
#[derive(Debug, Clone)]
pub struct TriggerEvent {
    /// Dashboard id the event refers to
    pub asset_id: String,
}

/// Everything one synthesis pass produced
pub struct Synthesis {
    pub dashboard_id: String,
    pub analysis_id: String,
    pub analysis_name: String,
    pub source: TemplateDocument,
    pub dest: TemplateDocument,
    pub parent: Option<TemplateDocument>,
    pub groups: Vec<ResourceGroup>,
    pub source_path: PathBuf,
    pub dest_path: PathBuf,
    pub parent_path: Option<PathBuf>,
}

impl Synthesis {
    /// The document whose parameters form the destination-side contract:
    /// the parent when partitioned, the flat document otherwise.
    pub fn dest_contract(&self) -> &TemplateDocument {
        self.parent.as_ref().unwrap_or(&self.dest)
    }
}

/// What a full run produced
#[derive(Debug)]
pub struct RunSummary {
    pub analysis_id: String,
    pub analysis_name: String,
    pub source_document_path: PathBuf,
    pub dest_document_path: PathBuf,
    pub parent_document_path: Option<PathBuf>,
    /// False when any staging upload was reported failed (the run itself
    /// still completes; storage failures are non-fatal by policy)
    pub uploads_ok: bool,
}

/// Outcome of the event trigger path
#[derive(Debug)]
pub enum TriggerOutcome {
    /// The event referenced an asset this pipeline does not track; not an
    /// error, nothing was done
    Skipped,
    Deployed(RunSummary),
}

/// Drives resolution, synthesis, post-processing and the parameter
/// lifecycle against the configured collaborators.
pub struct Orchestrator {
    config: Config,
    catalog: Arc<dyn MetadataSource>,
    exporter: Arc<dyn BundleExporter>,
    store: Arc<dyn ObjectStore>,
    tracking: Arc<dyn TrackingStore>,
}

impl Orchestrator {
    /// Build an orchestrator, failing fast on invalid configuration.
    pub fn new(
        config: Config,
        catalog: Arc<dyn MetadataSource>,
        exporter: Arc<dyn BundleExporter>,
        store: Arc<dyn ObjectStore>,
        tracking: Arc<dyn TrackingStore>,
    ) -> PipelineResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            catalog,
            exporter,
            store,
            tracking,
        })
    }

    fn config_files_prefix(&self) -> String {
        format!("{}/ConfigFiles", self.config.pipeline_name)
    }

    fn assets_prefix(&self) -> String {
        format!("{}/CFNTemplates", self.config.pipeline_name)
    }

    fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.output_dir)
    }

    /// Run one mode end to end.
    pub async fn run(&self, mode: RunMode, dashboard_id: &str) -> PipelineResult<RunSummary> {
        if dashboard_id.is_empty() {
            return Err(PipelineError::Core(bw_core::CoreError::EmptyId {
                context: "dashboard id for the run".to_string(),
            }));
        }
        let synthesis = self.synthesize(dashboard_id).await?;
        match mode {
            RunMode::Initialize => self.initialize(&synthesis).await,
            RunMode::Deploy => self.deploy(&synthesis).await,
        }
    }

    /// Event trigger path: deploy only when the referenced asset is
    /// tracked by this pipeline; otherwise succeed as a no-op.
    pub async fn run_event(&self, event: &TriggerEvent) -> PipelineResult<TriggerOutcome> {
        let tracked = self.tracking.scan_assets().await?;
        if !tracked.iter().any(|a: &TrackedAsset| a.asset_id == event.asset_id) {
            log::info!(
                "event references untracked asset {}, nothing to do",
                event.asset_id
            );
            return Ok(TriggerOutcome::Skipped);
        }
        let summary = self.run(RunMode::Deploy, &event.asset_id).await?;
        Ok(TriggerOutcome::Deployed(summary))
    }

    /// Resolve, synthesize, post-process and write the documents locally.
    /// Pure with respect to the tracking store; deploy/initialize decide
    /// what to publish.
    pub async fn synthesize(&self, dashboard_id: &str) -> PipelineResult<Synthesis> {
        let ctx = SynthContext::new(self.config.remap, self.config.replication);
        let resolver = Resolver::new(self.catalog.as_ref(), &self.config);
        let analysis = resolver.resolve_dashboard(dashboard_id).await?;
        if analysis.qs_user != self.config.source_user {
            log::warn!(
                "analysis {} is owned by '{}', configured source_user is '{}'",
                analysis.id,
                analysis.qs_user,
                self.config.source_user
            );
        }
        let mut pair = strategy::synthesize_pair(&analysis, &ctx, self.exporter.as_ref()).await?;

        if patch_permissions(&mut pair.dest) {
            // Default the grant target to the configured destination user
            if let Some(def) = pair.dest.parameters.get_mut(bw_synth::QS_USER_PARAMETER) {
                def.extra
                    .insert("Default".to_string(), serde_json::json!(self.config.dest_user));
            }
        }

        let out = self.output_dir();
        let source_path = pair
            .source
            .write(&out.join("assets_cfn_source.yaml"), DocFormat::Yaml)?;

        let mut parent = None;
        let mut parent_path = None;
        let mut groups = Vec::new();
        if self.config.partition {
            if self.config.replication == ReplicationMode::Bundle {
                flatten_references(&mut pair.dest)?;
            }
            groups = partition(&pair.dest, self.config.max_resources_per_group)?;
            for group in &groups {
                group
                    .document
                    .write(&out.join(format!("{}.yaml", group.key)), DocFormat::Yaml)?;
            }
            let assembled = assemble_parent(
                &groups,
                self.store.as_ref(),
                &self.config.deployment_bucket,
                &self.assets_prefix(),
            )
            .await?;
            parent_path = Some(
                assembled.write(&out.join("assets_cfn_dest_parent.yaml"), DocFormat::Yaml)?,
            );
            parent = Some(assembled);
        }

        let dest_path = pair
            .dest
            .write(&out.join("assets_cfn_dest.yaml"), DocFormat::Yaml)?;

        Ok(Synthesis {
            dashboard_id: dashboard_id.to_string(),
            analysis_id: analysis.id.clone(),
            analysis_name: analysis.name.clone(),
            source: pair.source,
            dest: pair.dest,
            parent,
            groups,
            source_path,
            dest_path,
            parent_path,
        })
    }

    /// Initialize: publish per-stage fill-in files, record the parameter
    /// contract and the tracked asset, print the operator summary.
    async fn initialize(&self, synthesis: &Synthesis) -> PipelineResult<RunSummary> {
        let prefix = self.config_files_prefix();
        println!(
            "Initialize requested: staging configuration files under {} on {} in deployment account {}",
            prefix, self.config.deployment_bucket, self.config.deployment_account_id
        );

        let out = self.output_dir();
        let mut uploads_ok = true;

        for stage in self.config.deployment_stages() {
            for (scope, doc) in [
                (AssetScope::Source, &synthesis.source),
                (AssetScope::Dest, synthesis.dest_contract()),
            ] {
                let file_name =
                    format!("{}_cfn_template_parameters_{}.json", scope, stage.trim());
                let local = out.join(&file_name);
                params::write_fill_in_file(doc, &local)?;
                uploads_ok &= package::upload_or_warn(
                    self.store.as_ref(),
                    &self.config.deployment_bucket,
                    &self.config.deployment_account_id,
                    &object_key(&prefix, &file_name),
                    &local,
                )
                .await;

                self.tracking
                    .put_parameters(scope, stage, &params::stored_parameters(doc))
                    .await?;
                self.tracking
                    .put_assets(
                        scope,
                        stage,
                        &[TrackedAsset {
                            asset_id: synthesis.dashboard_id.clone(),
                            pipeline_name: self.config.pipeline_name.clone(),
                        }],
                    )
                    .await?;
            }
        }

        params::summarize(&synthesis.source, "SourceAssets", &prefix);
        params::summarize(synthesis.dest_contract(), "DestinationAssets", &prefix);

        Ok(self.summary(synthesis, uploads_ok))
    }

    /// Deploy: validate the operator configuration for every stage against
    /// fresh synthesis, then (and only then) package and stage archives.
    async fn deploy(&self, synthesis: &Synthesis) -> PipelineResult<RunSummary> {
        println!(
            "Deploy requested: packaging assets from the config files under {} on {}",
            self.config_files_prefix(),
            self.config.deployment_bucket
        );

        let out = self.output_dir();
        let source_files = self
            .validated_parameter_files(AssetScope::Source, &synthesis.source, &out.join("cfg-source"))
            .await?;
        let dest_files = self
            .validated_parameter_files(
                AssetScope::Dest,
                synthesis.dest_contract(),
                &out.join("cfg-dest"),
            )
            .await?;

        // Validation passed for every stage; build the archives.
        let mut uploads_ok = true;

        let mut source_bundle = source_files;
        source_bundle.push(synthesis.source_path.clone());
        uploads_ok &= package::zip_and_upload(
            self.store.as_ref(),
            &self.config.deployment_bucket,
            &self.config.deployment_account_id,
            &self.assets_prefix(),
            &source_bundle,
            &out.join("SOURCE_assets_CFN.zip"),
        )
        .await?;

        let mut dest_bundle = dest_files;
        dest_bundle.push(synthesis.dest_path.clone());
        if let Some(parent_path) = &synthesis.parent_path {
            dest_bundle.push(parent_path.clone());
        }
        uploads_ok &= package::zip_and_upload(
            self.store.as_ref(),
            &self.config.deployment_bucket,
            &self.config.deployment_account_id,
            &self.assets_prefix(),
            &dest_bundle,
            &out.join("DEST_assets_CFN.zip"),
        )
        .await?;

        Ok(self.summary(synthesis, uploads_ok))
    }

    /// Pull the operator parameter file for every deployment stage and
    /// validate its key set against the given document.
    async fn validated_parameter_files(
        &self,
        scope: AssetScope,
        doc: &TemplateDocument,
        work_dir: &Path,
    ) -> PipelineResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for stage in self.config.deployment_stages() {
            let prefix = object_key(
                &self.config_files_prefix(),
                &format!("{}_cfn_template_parameters_{}", scope, stage.trim()),
            );
            let downloaded = self
                .store
                .download_by_prefix(&self.config.deployment_bucket, &prefix, work_dir)
                .await?;
            let Some(file) = downloaded.first() else {
                return Err(PipelineError::MissingParameterFile {
                    scope: scope.to_string(),
                    stage: stage.clone(),
                });
            };
            let entries = params::read_fill_in_file(file)?;
            params::validate_parameter_sets(stage, doc, &entries)?;
            files.push(file.clone());
        }
        Ok(files)
    }

    fn summary(&self, synthesis: &Synthesis, uploads_ok: bool) -> RunSummary {
        RunSummary {
            analysis_id: synthesis.analysis_id.clone(),
            analysis_name: synthesis.analysis_name.clone(),
            source_document_path: synthesis.source_path.clone(),
            dest_document_path: synthesis.dest_path.clone(),
            parent_document_path: synthesis.parent_path.clone(),
            uploads_ok,
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
