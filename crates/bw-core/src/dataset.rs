//! Dataset definition objects

use crate::datasource::DataSourceDef;
use crate::ident::{cfn_id, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// How a dataset ingests its data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportMode {
    /// Ingested into the in-memory engine; may carry refresh schedules
    Spice,
    /// Queried live against the data source
    DirectQuery,
}

impl ImportMode {
    /// The API-facing name
    pub fn api_name(&self) -> &'static str {
        match self {
            ImportMode::Spice => "SPICE",
            ImportMode::DirectQuery => "DIRECT_QUERY",
        }
    }

    /// Parse an API import mode name
    pub fn from_api_name(name: &str) -> Option<Self> {
        match name {
            "SPICE" => Some(ImportMode::Spice),
            "DIRECT_QUERY" => Some(ImportMode::DirectQuery),
            _ => None,
        }
    }
}

impl std::fmt::Display for ImportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

/// Dataset properties copied through only when present and non-empty
pub const OPTIONAL_DATASET_PROPERTIES: [&str; 6] = [
    "ColumnGroups",
    "FieldFolders",
    "RowLevelPermissionTagConfiguration",
    "ColumnLevelPermissionRules",
    "DataSetUsageConfiguration",
    "DatasetParameters",
];

/// One refresh schedule owned by a SPICE dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshScheduleDef {
    /// Raw schedule id
    pub schedule_id: String,
    /// Synthetic resource id
    pub cfn_id: String,
    /// Schedule detail as returned by the metadata source, copied verbatim
    pub detail: Value,
}

impl RefreshScheduleDef {
    pub fn new(schedule_id: &str, detail: Value) -> Self {
        Self {
            cfn_id: cfn_id(ResourceKind::RefreshSchedule, schedule_id),
            schedule_id: schedule_id.to_string(),
            detail,
        }
    }
}

/// The row-level-security descriptor attached to a protected dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RlsDescriptor {
    /// ARN of the permission dataset
    pub arn: String,
    pub format_version: Option<String>,
    pub namespace: Option<String>,
    pub permission_policy: String,
    pub status: Option<String>,
}

/// A resolved row-level-security relation: the descriptor to re-emit on the
/// protected dataset plus the fully resolved permission dataset itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RlsDependency {
    pub descriptor: RlsDescriptor,
    pub dataset: Box<DataSetDef>,
}

/// A typed dataset definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSetDef {
    /// Raw asset id
    pub id: String,
    /// Display name
    pub name: String,
    /// Synthetic resource id
    pub cfn_id: String,
    /// Placeholder used for template dataset-reference substitution
    pub placeholder_name: String,
    pub import_mode: ImportMode,
    /// Physical table map copied verbatim from the metadata source
    pub physical_table_map: Value,
    /// Logical table map copied verbatim from the metadata source
    pub logical_table_map: Value,
    /// Optional dataset properties present and non-empty at resolve time
    pub optional_properties: BTreeMap<String, Value>,
    /// Populated only for SPICE datasets
    pub refresh_schedules: Vec<RefreshScheduleDef>,
    /// Data sources this dataset reads from, deduplicated by raw id
    pub depending_sources: Vec<DataSourceDef>,
    /// Row-level-security relation, when the dataset is protected
    pub rls: Option<RlsDependency>,
    /// True when this dataset itself carries row-level permissions for
    /// another dataset; such datasets never appear in placeholder lists
    pub is_rls: bool,
}

impl DataSetDef {
    /// Create a dataset definition; all containers start empty
    pub fn new(
        id: &str,
        name: &str,
        import_mode: ImportMode,
        physical_table_map: Value,
        logical_table_map: Value,
    ) -> Self {
        Self {
            cfn_id: cfn_id(ResourceKind::DataSet, id),
            id: id.to_string(),
            name: name.to_string(),
            placeholder_name: name.to_string(),
            import_mode,
            physical_table_map,
            logical_table_map,
            optional_properties: BTreeMap::new(),
            refresh_schedules: Vec::new(),
            depending_sources: Vec::new(),
            rls: None,
            is_rls: false,
        }
    }

    /// Physical table keys in stable order
    pub fn physical_table_keys(&self) -> Vec<String> {
        match self.physical_table_map.as_object() {
            Some(map) => map.keys().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Raw ids of the data sources referenced by the physical tables, in
    /// first-appearance order with duplicates removed (one dataset may read
    /// the same source through several tables).
    pub fn physical_table_source_ids(&self) -> Vec<String> {
        let mut seen = Vec::new();
        if let Some(tables) = self.physical_table_map.as_object() {
            for table in tables.values() {
                // Each table has a single type-dependent child key
                // (RelationalTable, CustomSql, S3Source) holding the
                // data source reference.
                let arn = table
                    .as_object()
                    .and_then(|t| t.values().next())
                    .and_then(|inner| inner.get("DataSourceArn"))
                    .and_then(Value::as_str);
                if let Some(arn) = arn {
                    let id = crate::ident::id_from_arn(arn, "datasource").to_string();
                    if !seen.contains(&id) {
                        seen.push(id);
                    }
                }
            }
        }
        seen
    }

    /// Attach a depending data source unless one with the same raw id is
    /// already present.
    pub fn add_depending_source(&mut self, source: DataSourceDef) {
        if !self.depending_sources.iter().any(|s| s.id() == source.id()) {
            self.depending_sources.push(source);
        }
    }

    /// Synthetic ids of all depending data sources
    pub fn source_cfn_ids(&self) -> Vec<String> {
        self.depending_sources
            .iter()
            .map(|s| s.cfn_id().to_string())
            .collect()
    }
}

#[cfg(test)]
#[path = "dataset_test.rs"]
mod tests;
