use super::*;
use serde_json::json;

fn obj(value: serde_json::Value) -> Map<String, Value> {
    value.as_object().unwrap().clone()
}

const ARN: &str = "arn:aws:quicksight:eu-west-1:111122223333:datasource/src-42";

#[test]
fn test_s3_source_requires_bucket_and_key() {
    let params = obj(json!({ "Bucket": "my-bucket" }));
    let err = DataSourceDef::new_service("files", ARN, 0, SourceKind::S3, &params).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("S3"));
    assert!(msg.contains("files"));
    assert!(msg.contains("src-42"));
    assert!(msg.contains("Key"));
}

#[test]
fn test_s3_source_construction() {
    let params = obj(json!({ "Bucket": "my-bucket", "Key": "manifests/m.json" }));
    let def = DataSourceDef::new_service("files", ARN, 3, SourceKind::S3, &params).unwrap();

    assert_eq!(def.id(), "src-42");
    assert_eq!(def.cfn_id(), "DSsrc42");
    assert_eq!(def.index(), 3);
    assert_eq!(def.api_type(), "S3");
    assert!(!def.is_relational());
}

#[test]
fn test_athena_source_requires_workgroup() {
    let params = obj(json!({}));
    let err =
        DataSourceDef::new_service("queries", ARN, 1, SourceKind::Athena, &params).unwrap_err();
    assert!(err.to_string().contains("WorkGroup"));
}

#[test]
fn test_generic_relational_requires_host_port_database() {
    let params = obj(json!({ "Host": "db.internal", "Database": "sales" }));
    let err = DataSourceDef::new_generic_relational(
        "sales db",
        ARN,
        2,
        SourceKind::Mysql,
        &params,
        Some("arn:aws:secretsmanager:eu-west-1:111122223333:secret:db".to_string()),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::MissingSourceParameter { .. }));
    assert!(err.to_string().contains("Port"));
    assert!(err.to_string().contains("MYSQL"));
}

#[test]
fn test_redshift_additionally_requires_cluster_id() {
    let params = obj(json!({ "Host": "c.internal", "Port": 5439, "Database": "dw" }));
    let err = DataSourceDef::new_generic_relational(
        "warehouse",
        ARN,
        0,
        SourceKind::Redshift,
        &params,
        Some("arn:aws:secretsmanager:eu-west-1:111122223333:secret:dw".to_string()),
        None,
    )
    .unwrap_err();
    assert!(err.to_string().contains("ClusterId"));
}

#[test]
fn test_relational_source_without_secret_is_rejected() {
    let params = obj(json!({ "Host": "db.internal", "Port": 3306, "Database": "sales" }));
    let err = DataSourceDef::new_generic_relational(
        "sales db",
        ARN,
        0,
        SourceKind::Mysql,
        &params,
        None,
        None,
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::MissingSecret { .. }));
}

#[test]
fn test_port_accepts_string_encoding() {
    let params = obj(json!({ "Host": "db.internal", "Port": "3306", "Database": "sales" }));
    let def = DataSourceDef::new_generic_relational(
        "sales db",
        ARN,
        0,
        SourceKind::Mysql,
        &params,
        Some("arn:aws:secretsmanager:eu-west-1:111122223333:secret:db".to_string()),
        None,
    )
    .unwrap();
    match def {
        DataSourceDef::GenericRelational(ref g) => assert_eq!(g.port, 3306),
        _ => panic!("expected generic relational"),
    }
}

#[test]
fn test_managed_relational_construction() {
    let params = obj(json!({ "InstanceId": "prod-db-1", "Database": "sales" }));
    let def = DataSourceDef::new_managed_relational(
        "sales db",
        ARN,
        1,
        SourceKind::Mysql,
        &params,
        Some("arn:aws:secretsmanager:eu-west-1:111122223333:secret:db".to_string()),
        Some("arn:aws:quicksight:eu-west-1:111122223333:vpcConnection/v-1".to_string()),
    )
    .unwrap();

    assert!(def.is_relational());
    assert_eq!(def.api_type(), "MYSQL");
    assert!(def.vpc_connection_arn().is_some());
    assert!(def.secret_arn().is_some());
}

#[test]
fn test_source_kind_api_names_round_trip() {
    for kind in [
        SourceKind::S3,
        SourceKind::Athena,
        SourceKind::Mysql,
        SourceKind::Postgresql,
        SourceKind::Mariadb,
        SourceKind::Oracle,
        SourceKind::Sqlserver,
        SourceKind::Aurora,
        SourceKind::AuroraPostgresql,
        SourceKind::Redshift,
        SourceKind::Rds,
    ] {
        assert_eq!(SourceKind::from_api_name(kind.api_name()), Some(kind));
    }
    assert_eq!(SourceKind::from_api_name("SNOWFLAKE"), None);
}
