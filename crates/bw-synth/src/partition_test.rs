use super::*;
use bw_api::LocalObjectStore;
use serde_json::json;

fn datasource(id: &str) -> Resource {
    let mut r = Resource::new("AWS::QuickSight::DataSource");
    r.properties = json!({ "DataSourceId": id, "Name": id });
    r
}

fn dataset(id: &str, source_key: &str) -> Resource {
    let mut r = Resource::new("AWS::QuickSight::DataSet");
    r.depends_on = vec![source_key.to_string()];
    r.properties = json!({ "DataSetId": id, "Name": id });
    r
}

fn schedule(dataset_id: &str, dataset_key: &str) -> Resource {
    let mut r = Resource::new("AWS::QuickSight::RefreshSchedule");
    r.depends_on = vec![dataset_key.to_string()];
    r.properties = json!({ "DataSetId": dataset_id, "Schedule": {} });
    r
}

/// A small patched destination document: one source, one dataset with a
/// schedule, one analysis
fn small_doc() -> TemplateDocument {
    let mut doc = TemplateDocument::new();
    doc.insert_resource("DSsrca", datasource("src-a"));
    doc.insert_resource("DSetset1", dataset("set-1", "DSsrca"));
    doc.insert_resource("RSchedulesch1", schedule("set-1", "DSetset1"));

    let mut analysis = Resource::new("AWS::QuickSight::Analysis");
    analysis.depends_on = vec!["DSetset1".to_string()];
    analysis.properties = json!({ "AnalysisId": "ana-1", "Name": "Sales" });
    doc.insert_resource("ANAana1", analysis);
    doc
}

#[test]
fn test_patch_permissions_covers_recognized_kinds() {
    let mut doc = small_doc();
    assert!(patch_permissions(&mut doc));

    for key in ["DSsrca", "DSetset1", "ANAana1"] {
        let grants = doc.resources[key].properties["Permissions"].as_array().unwrap();
        let principal = grants[0]["Principal"]["Fn::Sub"].as_str().unwrap();
        assert!(principal.contains("${QuickSightUser}"));
        assert!(principal.contains("${QSAdminRegion}"));
        assert!(!grants[0]["Actions"].as_array().unwrap().is_empty());
    }

    // Schedules carry no permission model
    assert!(doc.resources["RSchedulesch1"]
        .properties
        .get("Permissions")
        .is_none());

    assert!(doc.has_parameter(QS_USER_PARAMETER));
    assert!(doc.has_parameter(QS_ADMIN_REGION_PARAMETER));
}

#[test]
fn test_patch_permissions_without_recognized_kinds_declares_nothing() {
    let mut doc = TemplateDocument::new();
    doc.insert_resource("Other", Resource::new("AWS::S3::Bucket"));
    assert!(!patch_permissions(&mut doc));
    assert!(doc.parameters.is_empty());
}

#[test]
fn test_flatten_rewrites_getatt_to_direct_arn() {
    let mut doc = TemplateDocument::new();
    doc.insert_resource("DSsrca", datasource("src-a"));

    let mut set = dataset("set-1", "DSsrca");
    set.properties["PhysicalTableMap"] = json!({
        "t1": { "RelationalTable": {
            "DataSourceArn": { "Fn::GetAtt": ["DSsrca", "Arn"] }
        } }
    });
    doc.insert_resource("DSetset1", set);

    flatten_references(&mut doc).unwrap();

    let rewritten =
        &doc.resources["DSetset1"].properties["PhysicalTableMap"]["t1"]["RelationalTable"]["DataSourceArn"];
    let sub = rewritten["Fn::Sub"].as_str().unwrap();
    assert!(sub.ends_with("datasource/src-a"));
    assert!(rewritten.get("Fn::GetAtt").is_none());
}

#[test]
fn test_flatten_accepts_dotted_getatt_form() {
    let mut doc = TemplateDocument::new();
    doc.insert_resource("DSsrca", datasource("src-a"));

    let mut set = dataset("set-1", "DSsrca");
    set.properties["PhysicalTableMap"] = json!({
        "t1": { "RelationalTable": { "DataSourceArn": { "Fn::GetAtt": "DSsrca.Arn" } } }
    });
    doc.insert_resource("DSetset1", set);

    flatten_references(&mut doc).unwrap();
    let rewritten =
        &doc.resources["DSetset1"].properties["PhysicalTableMap"]["t1"]["RelationalTable"]["DataSourceArn"];
    assert!(rewritten["Fn::Sub"].as_str().unwrap().ends_with("datasource/src-a"));
}

#[test]
fn test_flatten_rejects_kind_mismatch() {
    let mut doc = TemplateDocument::new();
    doc.insert_resource("DSetother", dataset("set-2", "DSsrca"));

    let mut set = dataset("set-1", "DSsrca");
    // A data-source reference pointing at a dataset resource
    set.properties["PhysicalTableMap"] = json!({
        "t1": { "RelationalTable": {
            "DataSourceArn": { "Fn::GetAtt": ["DSetother", "Arn"] }
        } }
    });
    doc.insert_resource("DSetset1", set);

    let err = flatten_references(&mut doc).unwrap_err();
    assert!(matches!(err, SynthError::ReferenceKindMismatch { .. }));
}

#[test]
fn test_flatten_rejects_unknown_target() {
    let mut doc = TemplateDocument::new();
    let mut set = dataset("set-1", "DSsrca");
    set.properties["RowLevelPermissionDataSet"] =
        json!({ "Arn": { "Fn::GetAtt": ["DSetmissing", "Arn"] } });
    doc.insert_resource("DSetset1", set);

    let err = flatten_references(&mut doc).unwrap_err();
    assert!(matches!(err, SynthError::UnknownReference { .. }));
}

#[test]
fn test_partition_respects_the_cap() {
    let mut doc = TemplateDocument::new();
    for i in 0..12 {
        doc.insert_resource(&format!("DSsrc{:02}", i), datasource(&format!("src-{:02}", i)));
    }

    let groups = partition(&doc, 10).unwrap();
    assert_eq!(groups.len(), 2);
    assert!(groups.iter().all(|g| g.document.resources.len() <= 10));
    assert_eq!(groups[0].key, "datasources_0");
    assert_eq!(groups[1].key, "datasources_1");
    assert_eq!(
        groups.iter().map(|g| g.document.resources.len()).sum::<usize>(),
        12
    );
}

#[test]
fn test_partition_colocates_schedules_with_their_dataset() {
    let doc = small_doc();
    let groups = partition(&doc, 10).unwrap();

    let dataset_group = groups
        .iter()
        .find(|g| g.kind == GroupKind::DataSets)
        .unwrap();
    assert!(dataset_group.document.has_resource("DSetset1"));
    assert!(dataset_group.document.has_resource("RSchedulesch1"));

    // Dataset edges move to the stack level; the colocated schedule keeps
    // its intra-group ordering edge
    assert!(dataset_group.document.resources["DSetset1"].depends_on.is_empty());
    assert_eq!(
        dataset_group.document.resources["RSchedulesch1"].depends_on,
        vec!["DSetset1".to_string()]
    );
    dataset_group.document.validate().unwrap();
}

#[test]
fn test_partition_counts_colocated_schedules_against_the_cap() {
    let mut doc = TemplateDocument::new();
    for i in 0..6 {
        let set_id = format!("set-{}", i);
        let set_key = format!("DSetset{}", i);
        doc.insert_resource(&set_key, dataset(&set_id, "DSsrca"));
        doc.insert_resource(&format!("RSchedulesch{}", i), schedule(&set_id, &set_key));
    }

    // 6 datasets + 6 schedules with a cap of 4: each unit is 2 resources
    let groups = partition(&doc, 4).unwrap();
    let dataset_groups: Vec<_> = groups
        .iter()
        .filter(|g| g.kind == GroupKind::DataSets)
        .collect();
    assert_eq!(dataset_groups.len(), 3);
    assert!(dataset_groups
        .iter()
        .all(|g| g.document.resources.len() <= 4));
}

#[test]
fn test_group_parameters_follow_their_resources() {
    let mut doc = TemplateDocument::new();
    doc.declare_parameter(
        "MYSQLHost0",
        ParameterDef::string(
            "Database host to use for data source sales db (ID src-a, type MYSQL) with index 0 in the stage",
        ),
    );
    doc.declare_parameter(
        "DSSecretArn",
        ParameterDef::string("Secret Arn to use in the stage"),
    );
    doc.declare_parameter(
        "UnrelatedParam",
        ParameterDef::string("belongs to nothing in this document"),
    );

    let mut source = datasource("src-a");
    source.properties["DataSourceParameters"] =
        json!({ "MySqlParameters": { "Host": { "Ref": "MYSQLHost0" } } });
    source.properties["Credentials"] = json!({ "SecretArn": { "Ref": "DSSecretArn" } });
    doc.insert_resource("DSsrca", source);
    doc.insert_resource("DSetset1", dataset("set-1", "DSsrca"));

    let groups = partition(&doc, 10).unwrap();
    let source_group = groups
        .iter()
        .find(|g| g.kind == GroupKind::DataSources)
        .unwrap();

    // Owned by description id, and referenced shared parameter
    assert!(source_group.document.has_parameter("MYSQLHost0"));
    assert!(source_group.document.has_parameter("DSSecretArn"));
    assert!(!source_group.document.has_parameter("UnrelatedParam"));

    let dataset_group = groups
        .iter()
        .find(|g| g.kind == GroupKind::DataSets)
        .unwrap();
    assert!(!dataset_group.document.has_parameter("MYSQLHost0"));
}

#[tokio::test]
async fn test_parent_document_wires_groups_in_dependency_order() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalObjectStore::new(dir.path(), "444455556666");

    let doc = small_doc();
    let groups = partition(&doc, 10).unwrap();
    let parent = assemble_parent(&groups, &store, "artifacts", "promo/CFNTemplates")
        .await
        .unwrap();

    // Every group landed in the store and has a stack resource
    assert_eq!(parent.resources.len(), groups.len());
    for group in &groups {
        let stack = &parent.resources[&group.logical_id];
        assert_eq!(stack.resource_type, "AWS::CloudFormation::Stack");
        let url = stack.properties["TemplateURL"].as_str().unwrap();
        assert!(url.contains(&group.key));
    }

    // Dataset stacks wait for datasource stacks; analysis waits for datasets
    let dataset_stack = &parent.resources["DatasetsGroup0"];
    assert_eq!(dataset_stack.depends_on, vec!["DatasourcesGroup0".to_string()]);
    let analysis_stack = &parent.resources["AnalysisGroup0"];
    assert_eq!(analysis_stack.depends_on, vec!["DatasetsGroup0".to_string()]);

    // Every DependsOn in the parent resolves to a declared group
    parent.validate().unwrap();
}
