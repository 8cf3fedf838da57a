use super::*;
use crate::dataset::{DataSetDef, ImportMode};
use serde_json::json;

fn analysis_with_two_datasets() -> AnalysisDef {
    let mut analysis = AnalysisDef::new("ana-1", "Sales Overview");
    analysis.datasets.push(DataSetDef::new(
        "set-1",
        "orders",
        ImportMode::Spice,
        json!({}),
        json!({}),
    ));
    analysis.datasets.push(DataSetDef::new(
        "set-2",
        "customers",
        ImportMode::DirectQuery,
        json!({}),
        json!({}),
    ));
    analysis
}

#[test]
fn test_cfn_id_is_deterministic() {
    let a = AnalysisDef::new("ana-1", "Sales Overview");
    let b = AnalysisDef::new("ana-1", "Sales Overview");
    assert_eq!(a.cfn_id, "ANAana1");
    assert_eq!(a.cfn_id, b.cfn_id);
}

#[test]
fn test_depending_datasets_excludes_rls() {
    let mut analysis = analysis_with_two_datasets();
    assert_eq!(analysis.depending_datasets(), vec!["DSetset1", "DSetset2"]);

    analysis.mark_rls("set-2");
    assert_eq!(analysis.depending_datasets(), vec!["DSetset1"]);
}

#[test]
fn test_dataset_lookup() {
    let analysis = analysis_with_two_datasets();
    assert_eq!(analysis.dataset("set-1").unwrap().name, "orders");
    assert!(analysis.dataset("set-9").is_none());
}
