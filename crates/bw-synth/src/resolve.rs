//! Asset graph resolution.
//!
//! Walks the metadata source from a dashboard id down to every transitively
//! depended asset and normalizes the records into the typed definitions the
//! generators consume: dashboard → analysis → datasets → data sources, plus
//! refresh schedules and row-level-security chains. Data source ordinals
//! are assigned here, deduplicated by raw id across the whole analysis.

use crate::error::{SynthError, SynthResult};
use bw_api::records::DataSourceRecord;
use bw_api::MetadataSource;
use bw_core::ident::{self, id_from_arn};
use bw_core::{
    AnalysisDef, Config, DataSetDef, DataSourceDef, ImportMode, RefreshScheduleDef,
    RlsDependency, RlsDescriptor, SourceKind, OPTIONAL_DATASET_PROPERTIES,
};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Resolves dashboards into fully-populated analysis definitions
pub struct Resolver<'a> {
    catalog: &'a dyn MetadataSource,
    config: &'a Config,
}

/// Mutable discovery state threaded through dataset resolution
struct Discovery {
    /// Next data source ordinal
    ordinal: usize,
    /// Data sources already resolved, by raw id
    registry: HashMap<String, DataSourceDef>,
    /// Dataset ids on the current resolution path (RLS cycle guard)
    visiting: HashSet<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a dyn MetadataSource, config: &'a Config) -> Self {
        Self { catalog, config }
    }

    /// Resolve the dashboard's full asset graph.
    pub async fn resolve_dashboard(&self, dashboard_id: &str) -> SynthResult<AnalysisDef> {
        let dashboard = self.catalog.describe_dashboard(dashboard_id).await?;
        let analysis_id = id_from_arn(&dashboard.source_entity_arn, "analysis").to_string();

        let record = self.catalog.describe_analysis(&analysis_id).await?;
        let grants = self
            .catalog
            .describe_analysis_permissions(&analysis_id)
            .await?;
        let owner = grants.last().ok_or_else(|| SynthError::MalformedRecord {
            entity: "analysis permissions",
            id: analysis_id.clone(),
            message: "no permission grants returned".to_string(),
        })?;

        let mut analysis = AnalysisDef::new(&record.analysis_id, &record.name);
        analysis.arn = record.arn.clone();
        analysis.dashboard_id = dashboard_id.to_string();
        analysis.pipeline_name = self.config.pipeline_name.clone();
        analysis.account_id = self.config.source_account_id.clone();
        analysis.template_id = ident::template_id(&record.name);
        analysis.qs_user = match owner.principal.rsplit_once("default/") {
            Some((_, rest)) => rest.to_string(),
            None => owner.principal.clone(),
        };
        analysis.qs_admin_region = arn_region(&owner.principal);
        analysis.qs_region = arn_region(&record.arn);

        let mut discovery = Discovery {
            ordinal: 0,
            registry: HashMap::new(),
            visiting: HashSet::new(),
        };

        for dataset_arn in &record.data_set_arns {
            let dataset_id = id_from_arn(dataset_arn, "dataset").to_string();
            let dataset = self.resolve_dataset(&dataset_id, &mut discovery).await?;
            analysis.datasets.push(dataset);
        }

        Ok(analysis)
    }

    /// Resolve one dataset, recursing into its row-level-security relation.
    async fn resolve_dataset(
        &self,
        dataset_id: &str,
        discovery: &mut Discovery,
    ) -> SynthResult<DataSetDef> {
        if !discovery.visiting.insert(dataset_id.to_string()) {
            let mut path: Vec<String> = discovery.visiting.iter().cloned().collect();
            path.sort();
            path.push(dataset_id.to_string());
            return Err(SynthError::RlsCycle {
                path: path.join(" -> "),
            });
        }

        let record = self.catalog.describe_data_set(dataset_id).await?;
        let import_mode = ImportMode::from_api_name(&record.import_mode).ok_or_else(|| {
            SynthError::MalformedRecord {
                entity: "dataset",
                id: dataset_id.to_string(),
                message: format!("unknown import mode '{}'", record.import_mode),
            }
        })?;

        let mut dataset = DataSetDef::new(
            dataset_id,
            &record.name,
            import_mode,
            record.physical_table_map.clone(),
            record.logical_table_map.clone(),
        );

        for key in OPTIONAL_DATASET_PROPERTIES {
            if let Some(value) = record.extra.get(key) {
                if !is_empty_value(value) {
                    dataset
                        .optional_properties
                        .insert(key.to_string(), value.clone());
                }
            }
        }

        if import_mode == ImportMode::Spice {
            dataset.refresh_schedules = self
                .catalog
                .list_refresh_schedules(dataset_id)
                .await?
                .into_iter()
                .map(|r| RefreshScheduleDef::new(&r.schedule_id, r.schedule))
                .collect();
        }

        for source_id in dataset.physical_table_source_ids() {
            let source = match discovery.registry.get(&source_id) {
                Some(existing) => existing.clone(),
                None => {
                    let resolved = self
                        .resolve_data_source(&source_id, discovery.ordinal)
                        .await?;
                    discovery.ordinal += 1;
                    discovery
                        .registry
                        .insert(source_id.clone(), resolved.clone());
                    resolved
                }
            };
            dataset.add_depending_source(source);
        }

        if let Some(rls) = &record.row_level_permission_data_set {
            let rls_id = id_from_arn(&rls.arn, "dataset").to_string();
            let mut permission_dataset =
                Box::pin(self.resolve_dataset(&rls_id, discovery)).await?;
            permission_dataset.is_rls = true;
            dataset.rls = Some(RlsDependency {
                descriptor: RlsDescriptor {
                    arn: rls.arn.clone(),
                    format_version: rls.format_version.clone(),
                    namespace: rls.namespace.clone(),
                    permission_policy: rls.permission_policy.clone(),
                    status: rls.status.clone(),
                },
                dataset: Box::new(permission_dataset),
            });
        }

        discovery.visiting.remove(dataset_id);
        Ok(dataset)
    }

    /// Resolve one data source record into its typed definition.
    async fn resolve_data_source(
        &self,
        source_id: &str,
        index: usize,
    ) -> SynthResult<DataSourceDef> {
        let record = self.catalog.describe_data_source(source_id).await?;
        let kind = SourceKind::from_api_name(&record.source_type).ok_or_else(|| {
            SynthError::UnsupportedSourceType {
                name: record.name.clone(),
                id: source_id.to_string(),
                source_type: record.source_type.clone(),
            }
        })?;

        let vpc = record
            .vpc_connection_properties
            .as_ref()
            .map(|v| v.vpc_connection_arn.clone());
        let secret = record.secret_arn.clone();

        let def = match kind {
            SourceKind::S3 => {
                let location = nested_object(
                    &record,
                    &["S3Parameters", "ManifestFileLocation"],
                )?;
                DataSourceDef::new_service(&record.name, &record.arn, index, kind, location)?
            }
            SourceKind::Athena => {
                let params = nested_object(&record, &["AthenaParameters"])?;
                DataSourceDef::new_service(&record.name, &record.arn, index, kind, params)?
            }
            _ => {
                // Managed (RDS-hosted) sources are identified by the shape
                // of the connection parameters, not by the declared type.
                if let Ok(rds) = nested_object(&record, &["RdsParameters"]) {
                    DataSourceDef::new_managed_relational(
                        &record.name,
                        &record.arn,
                        index,
                        kind,
                        rds,
                        secret,
                        vpc,
                    )?
                } else {
                    let params = single_parameters_entry(&record)?;
                    DataSourceDef::new_generic_relational(
                        &record.name,
                        &record.arn,
                        index,
                        kind,
                        params,
                        secret,
                        vpc,
                    )?
                }
            }
        };
        Ok(def)
    }
}

/// Region segment of an ARN (`arn:partition:service:region:account:...`)
fn arn_region(arn: &str) -> String {
    arn.split(':').nth(3).unwrap_or_default().to_string()
}

/// Whether an optional property value should be treated as absent
fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Walk a path of object keys under `DataSourceParameters`
fn nested_object<'r>(
    record: &'r DataSourceRecord,
    path: &[&str],
) -> SynthResult<&'r Map<String, Value>> {
    let mut current = &record.data_source_parameters;
    for key in path {
        current = current.get(key).ok_or_else(|| malformed_source(record, key))?;
    }
    current
        .as_object()
        .ok_or_else(|| malformed_source(record, path.last().unwrap_or(&"")))
}

/// The single type-dependent entry under `DataSourceParameters`
fn single_parameters_entry(record: &DataSourceRecord) -> SynthResult<&Map<String, Value>> {
    record
        .data_source_parameters
        .as_object()
        .and_then(|map| map.values().next())
        .and_then(Value::as_object)
        .ok_or_else(|| malformed_source(record, "DataSourceParameters"))
}

fn malformed_source(record: &DataSourceRecord, key: &str) -> SynthError {
    SynthError::MalformedRecord {
        entity: "data source",
        id: record.data_source_id.clone(),
        message: format!("missing '{}' in connection parameters", key),
    }
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;
