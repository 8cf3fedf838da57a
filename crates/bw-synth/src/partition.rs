//! Post-processing passes over the destination document: permission
//! patching, cross-reference flattening, and nested-stack partitioning for
//! size-limited declarative engines.

use crate::error::{SynthError, SynthResult};
use bw_api::ObjectStore;
use bw_core::ident::{arn_sub, ResourceKind};
use bw_core::{ParameterDef, Resource, TemplateDocument};
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};

/// Parameter naming the user granted access in the stage
pub const QS_USER_PARAMETER: &str = "QuickSightUser";

/// Parameter naming the identity region of that user
pub const QS_ADMIN_REGION_PARAMETER: &str = "QSAdminRegion";

// ---------------------------------------------------------------------------
// Permission patching
// ---------------------------------------------------------------------------

/// Access grants per resource kind; kinds without a permission model
/// return None and are left alone.
fn permission_actions(kind: ResourceKind) -> Option<&'static [&'static str]> {
    match kind {
        ResourceKind::Analysis => Some(&[
            "quicksight:RestoreAnalysis",
            "quicksight:UpdateAnalysisPermissions",
            "quicksight:DeleteAnalysis",
            "quicksight:DescribeAnalysisPermissions",
            "quicksight:QueryAnalysis",
            "quicksight:DescribeAnalysis",
            "quicksight:UpdateAnalysis",
        ]),
        ResourceKind::DataSet => Some(&[
            "quicksight:DescribeDataSet",
            "quicksight:DescribeDataSetPermissions",
            "quicksight:PassDataSet",
            "quicksight:DescribeIngestion",
            "quicksight:ListIngestions",
            "quicksight:UpdateDataSet",
            "quicksight:DeleteDataSet",
            "quicksight:CreateIngestion",
            "quicksight:CancelIngestion",
            "quicksight:UpdateDataSetPermissions",
        ]),
        ResourceKind::DataSource => Some(&[
            "quicksight:DescribeDataSource",
            "quicksight:DescribeDataSourcePermissions",
            "quicksight:PassDataSource",
            "quicksight:UpdateDataSource",
            "quicksight:DeleteDataSource",
            "quicksight:UpdateDataSourcePermissions",
        ]),
        ResourceKind::Theme => Some(&[
            "quicksight:DescribeTheme",
            "quicksight:DescribeThemeAlias",
            "quicksight:ListThemeAliases",
            "quicksight:ListThemeVersions",
        ]),
        ResourceKind::Template
        | ResourceKind::RefreshSchedule
        | ResourceKind::VpcConnection => None,
    }
}

/// Overwrite the `Permissions` property of every recognized resource with
/// the per-kind grant, parameterized by stage user and identity region.
/// Declares the two parameters iff anything was patched; returns whether
/// it did.
pub fn patch_permissions(doc: &mut TemplateDocument) -> bool {
    let mut patched = false;

    for resource in doc.resources.values_mut() {
        let Some(kind) = ResourceKind::from_resource_type(&resource.resource_type) else {
            continue;
        };
        let Some(actions) = permission_actions(kind) else {
            continue;
        };
        resource.properties_mut().insert(
            "Permissions".to_string(),
            json!([{
                "Principal": {
                    "Fn::Sub": format!(
                        "arn:${{AWS::Partition}}:quicksight:${{{}}}:${{AWS::AccountId}}:user/default/${{{}}}",
                        QS_ADMIN_REGION_PARAMETER, QS_USER_PARAMETER
                    )
                },
                "Actions": actions,
            }]),
        );
        patched = true;
    }

    if patched {
        doc.declare_parameter(
            QS_USER_PARAMETER,
            ParameterDef::string("User granted access to the deployed assets in the stage"),
        );
        doc.declare_parameter(
            QS_ADMIN_REGION_PARAMETER,
            ParameterDef::string("Identity region of the user granted access in the stage"),
        );
    }
    patched
}

// ---------------------------------------------------------------------------
// Reference flattening
// ---------------------------------------------------------------------------

/// Which kind a reference under this property key must resolve to
fn expectation_for_key(key: &str) -> Option<ResourceKind> {
    match key {
        "DataSourceArn" => Some(ResourceKind::DataSource),
        "DataSetArn" => Some(ResourceKind::DataSet),
        "RowLevelPermissionDataSet" => Some(ResourceKind::DataSet),
        "VpcConnectionArn" | "VPCConnectionArn" => Some(ResourceKind::VpcConnection),
        "ThemeArn" => Some(ResourceKind::Theme),
        _ => None,
    }
}

/// Property key carrying a resource's real external id, per kind
fn physical_id_key(kind: ResourceKind) -> Option<&'static str> {
    match kind {
        ResourceKind::Analysis => Some("AnalysisId"),
        ResourceKind::DataSet => Some("DataSetId"),
        ResourceKind::DataSource => Some("DataSourceId"),
        ResourceKind::Template => Some("TemplateId"),
        ResourceKind::VpcConnection => Some("VPCConnectionId"),
        ResourceKind::Theme => Some("ThemeId"),
        ResourceKind::RefreshSchedule => None,
    }
}

/// Real external id of a resource, read from its properties
fn physical_id(kind: ResourceKind, resource: &Resource) -> Option<String> {
    let key = physical_id_key(kind)?;
    resource
        .properties
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Rewrite every same-document object-attribute reference in analysis,
/// dataset and data source resources into a direct-substitution ARN built
/// from the target's real id. Required before partitioning: once resources
/// are split into sibling documents, in-document attribute references no
/// longer resolve.
pub fn flatten_references(doc: &mut TemplateDocument) -> SynthResult<()> {
    let mut ids: HashMap<String, (ResourceKind, String)> = HashMap::new();
    for (logical_id, resource) in &doc.resources {
        let Some(kind) = ResourceKind::from_resource_type(&resource.resource_type) else {
            continue;
        };
        if let Some(physical) = physical_id(kind, resource) {
            ids.insert(logical_id.clone(), (kind, physical));
        }
    }

    for (logical_id, resource) in doc.resources.iter_mut() {
        let rewrite = matches!(
            ResourceKind::from_resource_type(&resource.resource_type),
            Some(ResourceKind::Analysis | ResourceKind::DataSet | ResourceKind::DataSource)
        );
        if rewrite {
            rewrite_value(logical_id, &mut resource.properties, None, &ids)?;
        }
    }
    Ok(())
}

/// Target logical id of an `Fn::GetAtt` expression (list or dotted form),
/// when the requested attribute is `Arn`
fn getatt_target(value: &Value) -> Option<String> {
    match value {
        Value::Array(parts) => match (parts.first(), parts.get(1)) {
            (Some(Value::String(target)), Some(Value::String(attr))) if attr == "Arn" => {
                Some(target.clone())
            }
            _ => None,
        },
        Value::String(dotted) => dotted
            .strip_suffix(".Arn")
            .map(str::to_string),
        _ => None,
    }
}

fn rewrite_value(
    resource_id: &str,
    value: &mut Value,
    expected: Option<ResourceKind>,
    ids: &HashMap<String, (ResourceKind, String)>,
) -> SynthResult<()> {
    let target = match &*value {
        Value::Object(map) if map.len() == 1 => {
            map.get("Fn::GetAtt").and_then(getatt_target)
        }
        _ => None,
    };

    if let Some(target) = target {
        let Some((kind, physical)) = ids.get(&target) else {
            return Err(SynthError::UnknownReference {
                resource: resource_id.to_string(),
                reference: target,
            });
        };
        if let Some(expected) = expected {
            if *kind != expected {
                return Err(SynthError::ReferenceKindMismatch {
                    resource: resource_id.to_string(),
                    reference: target,
                    expected: expected.to_string(),
                    found: kind.to_string(),
                });
            }
        }
        *value = arn_sub(*kind, physical);
        return Ok(());
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map.iter_mut() {
                let child_expected = expectation_for_key(key).or(expected);
                rewrite_value(resource_id, child, child_expected, ids)?;
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                rewrite_value(resource_id, item, expected, ids)?;
            }
        }
        _ => {}
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Partitioning
// ---------------------------------------------------------------------------

/// Family a nested-stack group belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKind {
    VpcConnections,
    DataSources,
    DataSets,
    Analyses,
}

impl GroupKind {
    /// Prefix of the group key (`datasources_0`, ...)
    pub fn key_prefix(&self) -> &'static str {
        match self {
            GroupKind::VpcConnections => "vpcConnections",
            GroupKind::DataSources => "datasources",
            GroupKind::DataSets => "datasets",
            GroupKind::Analyses => "analysis",
        }
    }

    fn logical_prefix(&self) -> &'static str {
        match self {
            GroupKind::VpcConnections => "VpcConnectionsGroup",
            GroupKind::DataSources => "DatasourcesGroup",
            GroupKind::DataSets => "DatasetsGroup",
            GroupKind::Analyses => "AnalysisGroup",
        }
    }

    /// Group kinds this kind's stacks must wait for. Fixed precedence:
    /// analysis → datasets → datasources → vpcConnections.
    pub fn depends_on(&self) -> &'static [GroupKind] {
        match self {
            GroupKind::Analyses => &[GroupKind::DataSets],
            GroupKind::DataSets => &[GroupKind::DataSources],
            GroupKind::DataSources => &[GroupKind::VpcConnections],
            GroupKind::VpcConnections => &[],
        }
    }

    fn from_resource_kind(kind: ResourceKind) -> Option<GroupKind> {
        match kind {
            ResourceKind::DataSource => Some(GroupKind::DataSources),
            ResourceKind::DataSet => Some(GroupKind::DataSets),
            ResourceKind::Analysis | ResourceKind::Template => Some(GroupKind::Analyses),
            ResourceKind::VpcConnection | ResourceKind::Theme => Some(GroupKind::VpcConnections),
            ResourceKind::RefreshSchedule => None,
        }
    }
}

/// One capped sub-document of the partition
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceGroup {
    /// Stable group key, e.g. `datasets_1`
    pub key: String,
    /// Logical id of the nested-stack resource in the parent document
    pub logical_id: String,
    pub kind: GroupKind,
    pub document: TemplateDocument,
}

/// Bucket the document's resources into capped groups.
///
/// Refresh schedules are colocated with their owning dataset (located by
/// the exact dataset id, and counted against the cap); their intra-group
/// ordering edge is kept while every other `DependsOn` moves up to the
/// stack level.
pub fn partition(
    doc: &TemplateDocument,
    max_per_group: usize,
) -> SynthResult<Vec<ResourceGroup>> {
    // Owning-dataset index: dataset raw id -> dataset logical id
    let mut dataset_index: HashMap<String, String> = HashMap::new();
    for (logical_id, resource) in &doc.resources {
        if ResourceKind::from_resource_type(&resource.resource_type)
            == Some(ResourceKind::DataSet)
        {
            if let Some(id) = physical_id(ResourceKind::DataSet, resource) {
                dataset_index.insert(id, logical_id.clone());
            }
        }
    }

    // Colocated schedules, keyed by their owner's logical id
    let mut schedules: HashMap<String, Vec<(String, Resource)>> = HashMap::new();
    for (logical_id, resource) in &doc.resources {
        if ResourceKind::from_resource_type(&resource.resource_type)
            != Some(ResourceKind::RefreshSchedule)
        {
            continue;
        }
        let owner_id = resource
            .properties
            .get("DataSetId")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let Some(owner_logical) = dataset_index.get(owner_id) else {
            return Err(SynthError::UnknownReference {
                resource: logical_id.clone(),
                reference: owner_id.to_string(),
            });
        };
        schedules
            .entry(owner_logical.clone())
            .or_default()
            .push((logical_id.clone(), resource.clone()));
    }

    // Fill groups per kind, in fixed instantiation order
    let mut buckets: HashMap<GroupKind, Vec<Vec<(String, Resource)>>> = HashMap::new();
    for (logical_id, resource) in &doc.resources {
        let Some(kind) = ResourceKind::from_resource_type(&resource.resource_type) else {
            continue;
        };
        let Some(group_kind) = GroupKind::from_resource_kind(kind) else {
            continue; // schedules travel with their owning dataset
        };

        // A dataset brings its schedules along as one unit
        let mut unit: Vec<(String, Resource)> = Vec::new();
        let mut primary = resource.clone();
        primary.depends_on.clear();
        unit.push((logical_id.clone(), primary));
        if let Some(owned) = schedules.get(logical_id) {
            unit.extend(owned.iter().cloned());
        }

        let groups = buckets.entry(group_kind).or_default();
        let fits = groups
            .last()
            .map(|g| g.len() + unit.len() <= max_per_group)
            .unwrap_or(false);
        if !fits {
            if unit.len() > max_per_group {
                log::warn!(
                    "resource {} and its colocated schedules exceed the group cap of {}",
                    logical_id,
                    max_per_group
                );
            }
            groups.push(Vec::new());
        }
        if let Some(current) = groups.last_mut() {
            current.extend(unit);
        }
    }

    // Materialize group documents with their parameter subsets
    let mut result = Vec::new();
    for group_kind in [
        GroupKind::VpcConnections,
        GroupKind::DataSources,
        GroupKind::DataSets,
        GroupKind::Analyses,
    ] {
        let Some(groups) = buckets.get(&group_kind) else {
            continue;
        };
        for (index, members) in groups.iter().enumerate() {
            let key = format!("{}_{}", group_kind.key_prefix(), index);
            let mut document = TemplateDocument::new();
            document.format_version = Some("2010-09-09".to_string());
            document.description = Some(format!("Nested stack group {}", key));
            for (id, resource) in members {
                document.insert_resource(id, resource.clone());
            }
            assign_group_parameters(doc, &mut document);

            result.push(ResourceGroup {
                logical_id: format!("{}{}", group_kind.logical_prefix(), index),
                key,
                kind: group_kind,
                document,
            });
        }
    }
    Ok(result)
}

/// Copy into the group every parameter it needs: parameters whose
/// description names a member resource's id exactly, plus shared
/// parameters the group's resources reference.
fn assign_group_parameters(doc: &TemplateDocument, group: &mut TemplateDocument) {
    let mut member_ids: HashSet<String> = HashSet::new();
    let mut referenced: HashSet<String> = HashSet::new();
    for resource in group.resources.values() {
        if let Some(kind) = ResourceKind::from_resource_type(&resource.resource_type) {
            if let Some(id) = physical_id(kind, resource) {
                member_ids.insert(id);
            }
        }
        collect_referenced_names(&resource.properties, &mut referenced);
    }

    for (name, def) in &doc.parameters {
        let owned = description_asset_id(&def.description)
            .map(|id| member_ids.contains(id))
            .unwrap_or(false);
        if owned || referenced.contains(name) {
            group.declare_parameter(name, def.clone());
        }
    }
}

/// The raw asset id embedded in a remap parameter description, parsed from
/// the `(ID <id>,` marker. Exact extraction; no substring scoring.
fn description_asset_id(description: &str) -> Option<&str> {
    let start = description.find("(ID ")? + "(ID ".len();
    let rest = &description[start..];
    let end = rest.find(',')?;
    Some(rest[..end].trim())
}

/// Parameter names referenced by a property tree, through `Ref` objects
/// and `${...}` tokens inside `Fn::Sub` strings
fn collect_referenced_names(value: &Value, out: &mut HashSet<String>) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(name)) = map.get("Ref") {
                out.insert(name.clone());
            }
            if let Some(Value::String(sub)) = map.get("Fn::Sub") {
                let mut rest = sub.as_str();
                while let Some(start) = rest.find("${") {
                    rest = &rest[start + 2..];
                    if let Some(end) = rest.find('}') {
                        let token = &rest[..end];
                        if !token.starts_with("AWS::") {
                            out.insert(token.to_string());
                        }
                        rest = &rest[end + 1..];
                    } else {
                        break;
                    }
                }
            }
            for child in map.values() {
                collect_referenced_names(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_referenced_names(item, out);
            }
        }
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Parent assembly
// ---------------------------------------------------------------------------

/// Stage each group document in the object store and build the parent
/// document wiring the nested stacks in dependency order.
pub async fn assemble_parent(
    groups: &[ResourceGroup],
    store: &dyn ObjectStore,
    bucket: &str,
    prefix: &str,
) -> SynthResult<TemplateDocument> {
    let mut parent = TemplateDocument::new();
    parent.format_version = Some("2010-09-09".to_string());
    parent.description =
        Some("Parent stack instantiating the partitioned asset groups".to_string());

    for group in groups {
        let object_key = format!("{}/{}.yaml", prefix.trim_end_matches('/'), group.key);
        store
            .put_object(bucket, &object_key, group.document.to_yaml_string()?.as_bytes())
            .await?;
        let url = store.presigned_url(bucket, &object_key).await?;
        log::info!("staged group {} at {}", group.key, url);

        let mut pass_through = Map::new();
        for name in group.document.parameters.keys() {
            pass_through.insert(name.clone(), json!({ "Ref": name }));
            if let Some(def) = group.document.parameters.get(name) {
                parent.declare_parameter(name, def.clone());
            }
        }

        let mut resource = Resource::new("AWS::CloudFormation::Stack");
        let props = resource.properties_mut();
        props.insert("TemplateURL".to_string(), json!(url));
        if !pass_through.is_empty() {
            props.insert("Parameters".to_string(), Value::Object(pass_through));
        }
        resource.depends_on = groups
            .iter()
            .filter(|other| group.kind.depends_on().contains(&other.kind))
            .map(|other| other.logical_id.clone())
            .collect();

        parent.insert_resource(&group.logical_id, resource);
    }

    parent.validate()?;
    Ok(parent)
}

#[cfg(test)]
#[path = "partition_test.rs"]
mod tests;
