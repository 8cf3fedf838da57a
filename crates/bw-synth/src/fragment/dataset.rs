//! Dataset fragment generator.
//!
//! Datasets are the only kind whose generation recurses: a dataset carrying
//! a row-level-security relation first generates the permission dataset's
//! own fragment (and that dataset's data sources and schedules) before
//! emitting itself. The recursion is bounded by a visited set so a cyclic
//! relation fails loudly instead of overflowing the stack.

use crate::context::SynthContext;
use crate::error::{SynthError, SynthResult};
use crate::fragment::{datasource, schedule};
use crate::skeleton;
use bw_core::ident::{arn_sub, ResourceKind};
use bw_core::{DataSetDef, TemplateDocument};
use serde_json::{json, Map, Value};
use std::collections::HashSet;

/// Generate the dataset resource fragment (and everything it depends on)
/// into `doc`.
pub fn generate(
    def: &DataSetDef,
    doc: &mut TemplateDocument,
    ctx: &SynthContext,
) -> SynthResult<()> {
    generate_guarded(def, doc, ctx, &mut HashSet::new())
}

fn generate_guarded(
    def: &DataSetDef,
    doc: &mut TemplateDocument,
    ctx: &SynthContext,
    visiting: &mut HashSet<String>,
) -> SynthResult<()> {
    if doc.has_resource(&def.cfn_id) {
        log::info!("dataset with id {} already exists, skipping", def.cfn_id);
        return Ok(());
    }
    if !visiting.insert(def.id.clone()) {
        let mut path: Vec<String> = visiting.iter().cloned().collect();
        path.sort();
        path.push(def.id.clone());
        return Err(SynthError::RlsCycle {
            path: path.join(" -> "),
        });
    }

    log::info!(
        "Processing dataset {} (ID {}, mode {})",
        def.name,
        def.id,
        def.import_mode
    );

    // Data sources first; visits through other datasets are no-ops.
    for source in &def.depending_sources {
        datasource::generate(source, doc, ctx)?;
    }

    // The permission dataset's whole chain goes in ahead of this dataset.
    if let Some(rls) = &def.rls {
        generate_guarded(&rls.dataset, doc, ctx, visiting)?;
    }

    let mut resource = skeleton::dataset_resource()?;
    let props = resource.properties_mut();
    props.insert("DataSetId".to_string(), json!(def.id));
    props.insert("Name".to_string(), json!(def.name));
    props.insert("ImportMode".to_string(), json!(def.import_mode.api_name()));
    props.insert(
        "PhysicalTableMap".to_string(),
        rewrite_table_sources(&def.physical_table_map),
    );
    props.insert(
        "LogicalTableMap".to_string(),
        def.logical_table_map.clone(),
    );
    for (key, value) in &def.optional_properties {
        props.insert(key.clone(), value.clone());
    }

    resource.depends_on = def.source_cfn_ids();

    if let Some(rls) = &def.rls {
        let mut relation = Map::new();
        relation.insert(
            "Arn".to_string(),
            arn_sub(ResourceKind::DataSet, &rls.dataset.id),
        );
        relation.insert(
            "PermissionPolicy".to_string(),
            json!(rls.descriptor.permission_policy),
        );
        if let Some(format_version) = &rls.descriptor.format_version {
            relation.insert("FormatVersion".to_string(), json!(format_version));
        }
        if let Some(namespace) = &rls.descriptor.namespace {
            relation.insert("Namespace".to_string(), json!(namespace));
        }
        if let Some(status) = &rls.descriptor.status {
            relation.insert("Status".to_string(), json!(status));
        }
        resource
            .properties_mut()
            .insert("RowLevelPermissionDataSet".to_string(), Value::Object(relation));
        resource.depends_on.push(rls.dataset.cfn_id.clone());
    }

    doc.insert_resource(&def.cfn_id, resource);

    // Schedules depend on the dataset, so they go in afterwards.
    schedule::generate(def, doc, ctx)?;

    visiting.remove(&def.id);
    Ok(())
}

/// Rewrite every physical table's data-source back-reference from the
/// source-account literal ARN into a deferred-substitution reference, so
/// the same table map binds to the destination account's copy.
fn rewrite_table_sources(table_map: &Value) -> Value {
    let mut rewritten = table_map.clone();
    if let Some(tables) = rewritten.as_object_mut() {
        for table in tables.values_mut() {
            // Single type-dependent child key (RelationalTable, CustomSql,
            // S3Source) holding the data source reference.
            let Some(inner) = table.as_object_mut().and_then(|t| t.values_mut().next()) else {
                continue;
            };
            let Some(entry) = inner.as_object_mut() else {
                continue;
            };
            if let Some(arn) = entry.get("DataSourceArn").and_then(Value::as_str) {
                let source_id = bw_core::ident::id_from_arn(arn, "datasource").to_string();
                entry.insert(
                    "DataSourceArn".to_string(),
                    arn_sub(ResourceKind::DataSource, &source_id),
                );
            }
        }
    }
    rewritten
}

#[cfg(test)]
#[path = "dataset_test.rs"]
mod tests;
