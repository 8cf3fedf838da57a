//! Mutable declarative document model.
//!
//! A [`TemplateDocument`] is the accumulating structure every fragment
//! generator appends to: `Parameters`, `Resources` and `Outputs` sections
//! plus a description. Resource `Properties` stay schemaless
//! ([`serde_json::Value`]) because table maps and schedule details are
//! copied verbatim from the metadata source; everything the synthesizer
//! itself tracks (parameter declarations, dependency edges, resource keys)
//! is typed.

use crate::dag::ResourceDag;
use crate::error::{CoreError, CoreResult};
use crate::serde_helpers::string_or_seq;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Parameter value type in the declarative grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    /// Free-form string parameter
    String,
    /// Numeric parameter
    Number,
}

/// An externally-supplied parameter declaration.
///
/// The description doubles as the traceability record: for remapped
/// connection attributes it embeds the owning resource's name, raw id, type
/// and ordinal so downstream passes (and operators) can attribute the
/// parameter without consulting the source account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDef {
    /// Human-readable description of what must be filled in
    #[serde(rename = "Description", default)]
    pub description: String,

    /// Declared value type
    #[serde(rename = "Type")]
    pub param_type: ParamType,

    /// Additional declaration fields (defaults, allowed values) carried
    /// through untouched when a document is read back
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ParameterDef {
    /// String-typed parameter with the given description
    pub fn string(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            param_type: ParamType::String,
            extra: BTreeMap::new(),
        }
    }

    /// Number-typed parameter with the given description
    pub fn number(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            param_type: ParamType::Number,
            extra: BTreeMap::new(),
        }
    }
}

/// A single resource entry keyed by its synthetic id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    /// Declarative resource type (e.g. `AWS::QuickSight::DataSet`)
    #[serde(rename = "Type")]
    pub resource_type: String,

    /// Resources that must exist before this one is created
    #[serde(
        rename = "DependsOn",
        default,
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "string_or_seq"
    )]
    pub depends_on: Vec<String>,

    /// Kind-specific properties, merged from the skeleton and resolved values
    #[serde(rename = "Properties", default)]
    pub properties: Value,

    /// Any further top-level keys (conditions, metadata) carried through
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Resource {
    /// New resource of the given type with empty properties
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            depends_on: Vec::new(),
            properties: Value::Object(serde_json::Map::new()),
            extra: BTreeMap::new(),
        }
    }

    /// Mutable access to the `Properties` object map.
    ///
    /// Replaces a non-object `Properties` value with an empty object first.
    pub fn properties_mut(&mut self) -> &mut serde_json::Map<String, Value> {
        if !self.properties.is_object() {
            self.properties = Value::Object(serde_json::Map::new());
        }
        self.properties
            .as_object_mut()
            .expect("properties forced to object above")
    }
}

/// An entry in the document `Outputs` section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputDef {
    /// What this output carries
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Output value or substitution expression
    #[serde(rename = "Value")]
    pub value: Value,
}

/// Serialization format for persisted documents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocFormat {
    /// YAML (default for templates)
    Yaml,
    /// JSON (parameter files, bundle payloads)
    Json,
}

/// A declarative stack document under construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TemplateDocument {
    /// Declarative format version, carried from the skeleton when present
    #[serde(
        rename = "AWSTemplateFormatVersion",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub format_version: Option<String>,

    /// Document description
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Externally-supplied parameters declared so far
    #[serde(
        rename = "Parameters",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub parameters: BTreeMap<String, ParameterDef>,

    /// Resources keyed by synthetic id
    #[serde(rename = "Resources", default)]
    pub resources: BTreeMap<String, Resource>,

    /// Document outputs
    #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, OutputDef>,
}

impl TemplateDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from YAML text
    pub fn from_yaml_str(content: &str) -> CoreResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Parse a document from a JSON value (bundle payloads)
    pub fn from_json_value(value: Value) -> CoreResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Parse a document from raw JSON bytes
    pub fn from_json_slice(bytes: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize to YAML
    pub fn to_yaml_string(&self) -> CoreResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json_string(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Serialize to a JSON value
    pub fn to_json_value(&self) -> CoreResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Whether a resource with this synthetic id is already present
    pub fn has_resource(&self, cfn_id: &str) -> bool {
        self.resources.contains_key(cfn_id)
    }

    /// Whether a parameter with this key is already declared
    pub fn has_parameter(&self, key: &str) -> bool {
        self.parameters.contains_key(key)
    }

    /// Insert a resource, refusing to overwrite an existing entry.
    ///
    /// Returns `false` (and leaves the document untouched) if the key is
    /// taken. Generators rely on this to make duplicate visits no-ops.
    pub fn insert_resource(&mut self, cfn_id: &str, resource: Resource) -> bool {
        if self.resources.contains_key(cfn_id) {
            log::debug!("resource {} already present, skipping insert", cfn_id);
            return false;
        }
        self.resources.insert(cfn_id.to_string(), resource);
        true
    }

    /// Declare a parameter (idempotent for identical re-declarations)
    pub fn declare_parameter(&mut self, key: &str, def: ParameterDef) {
        self.parameters.insert(key.to_string(), def);
    }

    /// Set an output entry
    pub fn set_output(&mut self, key: &str, output: OutputDef) {
        self.outputs.insert(key.to_string(), output);
    }

    /// All declared parameter keys, in stable order
    pub fn parameter_keys(&self) -> Vec<String> {
        self.parameters.keys().cloned().collect()
    }

    /// Validate internal consistency: every `DependsOn` target must resolve
    /// to a resource in this document, and the dependency graph must be
    /// acyclic.
    pub fn validate(&self) -> CoreResult<()> {
        let mut dependencies: HashMap<String, Vec<String>> = HashMap::new();
        for (id, resource) in &self.resources {
            for target in &resource.depends_on {
                if !self.resources.contains_key(target) {
                    return Err(CoreError::UnknownDependency {
                        resource: id.clone(),
                        target: target.clone(),
                    });
                }
            }
            dependencies.insert(id.clone(), resource.depends_on.clone());
        }
        ResourceDag::build(&dependencies)?;
        Ok(())
    }

    /// Write the document to a file in the given format, creating parent
    /// directories as needed. Returns the path written.
    pub fn write(&self, path: &Path, format: DocFormat) -> CoreResult<PathBuf> {
        let content = match format {
            DocFormat::Yaml => self.to_yaml_string()?,
            DocFormat::Json => self.to_json_string()?,
        };
        write_file(path, &content)?;
        Ok(path.to_path_buf())
    }
}

/// Write text content to a path, creating parent directories first
pub fn write_file(path: &Path, content: &str) -> CoreResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CoreError::IoWithPath {
            path: parent.display().to_string(),
            source: e,
        })?;
    }
    std::fs::write(path, content).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
#[path = "document_test.rs"]
mod tests;
