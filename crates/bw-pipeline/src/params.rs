//! Parameter lifecycle: fill-in list generation, operator summaries, and
//! the declare → fill-in → validate-on-deploy contract.

use crate::error::{PipelineError, PipelineResult};
use bw_api::StoredParameter;
use bw_core::{ParamType, TemplateDocument};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Sentinel the operator replaces in string-typed parameters
pub const FILL_ME: &str = "<fill_me>";

/// Placeholder value for number-typed parameters
pub const NUMBER_PLACEHOLDER: &str = "1234";

const DIVIDER_SECTION: &str =
    "----------------------------------------------------------";

/// One entry of a stage-scoped parameter fill-in file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParameterEntry {
    pub parameter_key: String,
    pub parameter_value: String,
}

/// Flat fill-in list for every parameter the document declares
pub fn fill_in_list(doc: &TemplateDocument) -> Vec<ParameterEntry> {
    doc.parameters
        .iter()
        .map(|(key, def)| ParameterEntry {
            parameter_key: key.clone(),
            parameter_value: match def.param_type {
                ParamType::Number => NUMBER_PLACEHOLDER.to_string(),
                ParamType::String => FILL_ME.to_string(),
            },
        })
        .collect()
}

/// Parameter declarations in the tracking-store record shape
pub fn stored_parameters(doc: &TemplateDocument) -> Vec<StoredParameter> {
    doc.parameters
        .iter()
        .map(|(key, def)| StoredParameter {
            key: key.clone(),
            description: def.description.clone(),
            param_type: match def.param_type {
                ParamType::Number => "Number".to_string(),
                ParamType::String => "String".to_string(),
            },
        })
        .collect()
}

/// Write a fill-in list as a JSON parameter file
pub fn write_fill_in_file(doc: &TemplateDocument, path: &Path) -> PipelineResult<PathBuf> {
    let list = fill_in_list(doc);
    let content = serde_json::to_string_pretty(&list).map_err(|e| {
        PipelineError::MalformedParameterFile {
            path: path.display().to_string(),
            message: e.to_string(),
        }
    })?;
    bw_core::document::write_file(path, &content)?;
    Ok(path.to_path_buf())
}

/// Read an operator-maintained parameter file back
pub fn read_fill_in_file(path: &Path) -> PipelineResult<Vec<ParameterEntry>> {
    let content = std::fs::read_to_string(path).map_err(|e| PipelineError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| PipelineError::MalformedParameterFile {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

/// Validate that the operator configuration carries exactly the parameter
/// keys fresh synthesis declares; anything missing or extra aborts the
/// deploy before packaging.
pub fn validate_parameter_sets(
    stage: &str,
    doc: &TemplateDocument,
    operator: &[ParameterEntry],
) -> PipelineResult<()> {
    let fresh: BTreeSet<&str> = doc.parameters.keys().map(String::as_str).collect();
    let provided: BTreeSet<&str> = operator
        .iter()
        .map(|e| e.parameter_key.as_str())
        .collect();

    let missing: Vec<String> = fresh
        .difference(&provided)
        .map(|k| k.to_string())
        .collect();
    let extra: Vec<String> = provided
        .difference(&fresh)
        .map(|k| k.to_string())
        .collect();

    if missing.is_empty() && extra.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::ParameterDrift {
            stage: stage.to_string(),
            missing,
            extra,
        })
    }
}

/// Print the operator-facing summary of a document's parameters: what must
/// be filled in, where the files live, and the inline override format.
pub fn summarize(doc: &TemplateDocument, template_name: &str, config_files_prefix: &str) {
    println!("{}", DIVIDER_SECTION);
    println!(
        "Template {} declares parameters that each stage must provide via its \
         configuration file. Fill-in files were staged under {}; edit them per \
         environment, then run deploy.",
        template_name, config_files_prefix
    );
    println!();
    for (key, def) in &doc.parameters {
        println!("{}: {}", key, def.description);
    }
    println!();
    println!(
        "Inline overrides in the deploy action remain possible using this format, \
         though configuration files scale better:"
    );
    for key in doc.parameters.keys() {
        println!("ParameterKey={},ParameterValue=", key);
    }
    println!("{}", DIVIDER_SECTION);
}

#[cfg(test)]
#[path = "params_test.rs"]
mod tests;
