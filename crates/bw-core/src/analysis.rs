//! Analysis definition object

use crate::dataset::DataSetDef;
use crate::ident::{cfn_id, ResourceKind};
use serde::{Deserialize, Serialize};

/// A typed analysis definition: the unit being promoted across accounts,
/// together with every dataset it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDef {
    /// Raw asset id
    pub id: String,
    /// Source-account ARN
    pub arn: String,
    /// Display name
    pub name: String,
    /// Synthetic resource id
    pub cfn_id: String,
    /// Pipeline this promotion belongs to
    pub pipeline_name: String,
    /// Dashboard that triggered the promotion
    pub dashboard_id: String,
    /// Owning user in the source account
    pub qs_user: String,
    /// Region the analysis lives in
    pub qs_region: String,
    /// Identity region of the owning user
    pub qs_admin_region: String,
    /// Source account id
    pub account_id: String,
    /// Template shared from the source account
    pub template_id: String,
    /// Owned datasets in discovery order
    pub datasets: Vec<DataSetDef>,
}

impl AnalysisDef {
    /// Create an analysis definition; dependency collections start empty
    /// and are populated during resolution.
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            cfn_id: cfn_id(ResourceKind::Analysis, id),
            id: id.to_string(),
            name: name.to_string(),
            arn: String::new(),
            pipeline_name: String::new(),
            dashboard_id: String::new(),
            qs_user: String::new(),
            qs_region: String::new(),
            qs_admin_region: String::new(),
            account_id: String::new(),
            template_id: String::new(),
            datasets: Vec::new(),
        }
    }

    /// Synthetic ids of every owned dataset not tagged as a row-level
    /// permission dataset; these are the datasets the analysis references
    /// through placeholders and depends on.
    pub fn depending_datasets(&self) -> Vec<String> {
        self.datasets
            .iter()
            .filter(|d| !d.is_rls)
            .map(|d| d.cfn_id.clone())
            .collect()
    }

    /// Look up an owned dataset by raw id
    pub fn dataset(&self, id: &str) -> Option<&DataSetDef> {
        self.datasets.iter().find(|d| d.id == id)
    }

    /// Tag an owned dataset as a row-level permission dataset so it is
    /// excluded from placeholder references.
    pub fn mark_rls(&mut self, dataset_id: &str) {
        if let Some(dataset) = self.datasets.iter_mut().find(|d| d.id == dataset_id) {
            dataset.is_rls = true;
        }
    }

    /// Every dataset in the graph, including row-level permission datasets
    /// reached through RLS relations, in discovery order.
    pub fn all_datasets(&self) -> Vec<&DataSetDef> {
        let mut collected = Vec::new();
        for dataset in &self.datasets {
            collect_datasets(dataset, &mut collected);
        }
        collected
    }
}

fn collect_datasets<'a>(dataset: &'a DataSetDef, collected: &mut Vec<&'a DataSetDef>) {
    collected.push(dataset);
    if let Some(rls) = &dataset.rls {
        collect_datasets(&rls.dataset, collected);
    }
}

#[cfg(test)]
#[path = "analysis_test.rs"]
mod tests;
