use super::*;
use bw_core::{ReplicationMode, SourceKind};
use chrono::{TimeZone, Utc};
use serde_json::json;

fn ctx(remap: bool) -> SynthContext {
    SynthContext::at(
        remap,
        ReplicationMode::Template,
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    )
}

fn s3_source(index: usize) -> DataSourceDef {
    let params = json!({ "Bucket": "data-bucket", "Key": "manifests/m.json" });
    DataSourceDef::new_service(
        "files",
        "arn:aws:quicksight:eu-west-1:111122223333:datasource/src-s3",
        index,
        SourceKind::S3,
        params.as_object().unwrap(),
    )
    .unwrap()
}

fn mysql_source(index: usize) -> DataSourceDef {
    let params = json!({ "Host": "db.internal", "Port": 3306, "Database": "sales" });
    DataSourceDef::new_generic_relational(
        "sales db",
        "arn:aws:quicksight:eu-west-1:111122223333:datasource/src-db",
        index,
        SourceKind::Mysql,
        params.as_object().unwrap(),
        Some("arn:aws:secretsmanager:eu-west-1:111122223333:secret:db".to_string()),
        Some("arn:aws:quicksight:eu-west-1:111122223333:vpcConnection/v-1".to_string()),
    )
    .unwrap()
}

#[test]
fn test_s3_literal_generation() {
    let mut doc = TemplateDocument::new();
    generate(&s3_source(0), &mut doc, &ctx(false)).unwrap();

    let resource = &doc.resources["DSsrcs3"];
    assert_eq!(resource.resource_type, "AWS::QuickSight::DataSource");
    let props = resource.properties.as_object().unwrap();
    assert_eq!(props["Type"], json!("S3"));
    assert_eq!(
        props["DataSourceParameters"]["S3Parameters"]["ManifestFileLocation"]["Bucket"],
        json!("data-bucket")
    );
    // no remap, no connection parameters declared
    assert!(doc.parameters.is_empty());
}

#[test]
fn test_s3_remap_declares_parameters() {
    let mut doc = TemplateDocument::new();
    generate(&s3_source(2), &mut doc, &ctx(true)).unwrap();

    assert!(doc.has_parameter("S3DestinationBucket2"));
    assert!(doc.has_parameter("S3DestinationKey2"));

    let description = &doc.parameters["S3DestinationBucket2"].description;
    assert!(description.contains("files"));
    assert!(description.contains("(ID src-s3, type S3) with index 2"));

    let location =
        &doc.resources["DSsrcs3"].properties["DataSourceParameters"]["S3Parameters"]["ManifestFileLocation"];
    assert_eq!(location["Bucket"], json!({ "Ref": "S3DestinationBucket2" }));
    assert_eq!(location["Key"], json!({ "Ref": "S3DestinationKey2" }));
}

#[test]
fn test_generate_twice_is_a_no_op() {
    let mut doc = TemplateDocument::new();
    generate(&mysql_source(0), &mut doc, &ctx(true)).unwrap();
    let snapshot = doc.clone();

    generate(&mysql_source(0), &mut doc, &ctx(true)).unwrap();
    assert_eq!(doc, snapshot);
}

#[test]
fn test_relational_source_gets_secret_and_vpc_refs() {
    let mut doc = TemplateDocument::new();
    generate(&mysql_source(1), &mut doc, &ctx(false)).unwrap();

    let props = doc.resources["DSsrcdb"].properties.as_object().unwrap();
    assert_eq!(
        props["Credentials"],
        json!({ "SecretArn": { "Ref": "DSSecretArn" } })
    );
    assert_eq!(
        props["VpcConnectionProperties"],
        json!({ "VpcConnectionArn": { "Ref": "VpcConnectionArn" } })
    );
    assert!(doc.has_parameter(SECRET_ARN_PARAMETER));
    assert!(doc.has_parameter(VPC_CONNECTION_PARAMETER));
}

#[test]
fn test_generic_relational_remap_port_is_number_typed() {
    let mut doc = TemplateDocument::new();
    generate(&mysql_source(1), &mut doc, &ctx(true)).unwrap();

    assert_eq!(
        doc.parameters["MYSQLPort1"].param_type,
        bw_core::ParamType::Number
    );
    assert_eq!(
        doc.parameters["MYSQLHost1"].param_type,
        bw_core::ParamType::String
    );

    let inner = &doc.resources["DSsrcdb"].properties["DataSourceParameters"]["MySqlParameters"];
    assert_eq!(inner["Port"], json!({ "Ref": "MYSQLPort1" }));
    assert_eq!(inner["Database"], json!({ "Ref": "MYSQLDBName1" }));
}

#[test]
fn test_redshift_cluster_id_parameter() {
    let params = json!({
        "Host": "cluster.internal",
        "Port": 5439,
        "Database": "dw",
        "ClusterId": "dw-cluster"
    });
    let def = DataSourceDef::new_generic_relational(
        "warehouse",
        "arn:aws:quicksight:eu-west-1:111122223333:datasource/src-rs",
        0,
        SourceKind::Redshift,
        params.as_object().unwrap(),
        Some("arn:aws:secretsmanager:eu-west-1:111122223333:secret:dw".to_string()),
        None,
    )
    .unwrap();

    let mut doc = TemplateDocument::new();
    generate(&def, &mut doc, &ctx(true)).unwrap();

    assert!(doc.has_parameter("REDSHIFTClusterId0"));
    let inner = &doc.resources["DSsrcrs"].properties["DataSourceParameters"]["RedshiftParameters"];
    assert_eq!(inner["ClusterId"], json!({ "Ref": "REDSHIFTClusterId0" }));
}

#[test]
fn test_managed_relational_literal_generation() {
    let params = json!({ "InstanceId": "prod-db-1", "Database": "sales" });
    let def = DataSourceDef::new_managed_relational(
        "sales db",
        "arn:aws:quicksight:eu-west-1:111122223333:datasource/src-rds",
        0,
        SourceKind::Mysql,
        params.as_object().unwrap(),
        Some("arn:aws:secretsmanager:eu-west-1:111122223333:secret:db".to_string()),
        None,
    )
    .unwrap();

    let mut doc = TemplateDocument::new();
    generate(&def, &mut doc, &ctx(false)).unwrap();

    let inner = &doc.resources["DSsrcrds"].properties["DataSourceParameters"]["RdsParameters"];
    assert_eq!(inner["InstanceId"], json!("prod-db-1"));
    assert_eq!(inner["Database"], json!("sales"));
}
