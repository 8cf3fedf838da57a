//! End-to-end synthesis scenarios: resolve a fixture catalog, synthesize
//! the document pair, post-process, partition and assemble the parent.

use bw_api::{FixtureCatalog, LocalObjectStore, PreparedBundleExporter};
use bw_core::{Config, ReplicationMode};
use bw_synth::{
    assemble_parent, flatten_references, partition, patch_permissions, strategy, Resolver,
    SynthContext,
};
use chrono::{TimeZone, Utc};
use serde_json::json;

fn arn(kind: &str, id: &str) -> String {
    format!("arn:aws:quicksight:eu-west-1:111122223333:{}/{}", kind, id)
}

fn config() -> Config {
    serde_yaml::from_str(
        r#"
pipeline_name: promo
source_account_id: "111122223333"
deployment_account_id: "444455556666"
aws_region: eu-west-1
deployment_bucket: promo-artifacts
source_user: author
dest_user: deployer
stages: [source, staging, prod]
remap: true
"#,
    )
    .unwrap()
}

/// Dashboard with two datasets sharing one S3 source; the first dataset is
/// SPICE with a weekly refresh schedule and protected by an RLS dataset.
fn catalog() -> FixtureCatalog {
    FixtureCatalog::from_json(json!({
        "Dashboards": {
            "dash-1": { "DashboardId": "dash-1", "SourceEntityArn": arn("analysis", "ana-1") }
        },
        "Analyses": {
            "ana-1": {
                "AnalysisId": "ana-1",
                "Arn": arn("analysis", "ana-1"),
                "Name": "Sales Overview",
                "DataSetArns": [arn("dataset", "set-1"), arn("dataset", "set-2")]
            }
        },
        "AnalysisPermissions": {
            "ana-1": [{
                "Principal": "arn:aws:quicksight:us-east-1:111122223333:user/default/author",
                "Actions": ["quicksight:DescribeAnalysis"]
            }]
        },
        "DataSets": {
            "set-1": {
                "DataSetId": "set-1",
                "Arn": arn("dataset", "set-1"),
                "Name": "orders",
                "ImportMode": "SPICE",
                "PhysicalTableMap": {
                    "t1": { "S3Source": { "DataSourceArn": arn("datasource", "src-x") } }
                },
                "LogicalTableMap": {},
                "RowLevelPermissionDataSet": {
                    "Arn": arn("dataset", "set-rls"),
                    "PermissionPolicy": "GRANT_ACCESS",
                    "FormatVersion": "VERSION_1",
                    "Status": "ENABLED"
                }
            },
            "set-2": {
                "DataSetId": "set-2",
                "Arn": arn("dataset", "set-2"),
                "Name": "customers",
                "ImportMode": "DIRECT_QUERY",
                "PhysicalTableMap": {
                    "t1": { "S3Source": { "DataSourceArn": arn("datasource", "src-x") } }
                },
                "LogicalTableMap": {}
            },
            "set-rls": {
                "DataSetId": "set-rls",
                "Arn": arn("dataset", "set-rls"),
                "Name": "permissions",
                "ImportMode": "DIRECT_QUERY",
                "PhysicalTableMap": {
                    "t1": { "S3Source": { "DataSourceArn": arn("datasource", "src-x") } }
                },
                "LogicalTableMap": {}
            }
        },
        "RefreshSchedules": {
            "set-1": [{
                "ScheduleId": "sch-1",
                "Schedule": {
                    "ScheduleId": "sch-1",
                    "RefreshType": "FULL_REFRESH",
                    "ScheduleFrequency": { "Interval": "WEEKLY", "Timezone": "UTC" }
                }
            }]
        },
        "DataSources": {
            "src-x": {
                "DataSourceId": "src-x",
                "Arn": arn("datasource", "src-x"),
                "Name": "files",
                "Type": "S3",
                "DataSourceParameters": {
                    "S3Parameters": {
                        "ManifestFileLocation": { "Bucket": "data-bucket", "Key": "m.json" }
                    }
                }
            }
        }
    }))
    .unwrap()
}

fn ctx(remap: bool, mode: ReplicationMode) -> SynthContext {
    SynthContext::at(
        remap,
        mode,
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    )
}

#[tokio::test]
async fn template_path_end_to_end() {
    let catalog = catalog();
    let config = config();
    let resolver = Resolver::new(&catalog, &config);
    let analysis = resolver.resolve_dashboard("dash-1").await.unwrap();

    let pair =
        strategy::synthesize_template_pair(&analysis, &ctx(true, ReplicationMode::Template))
            .unwrap();
    let mut dest = pair.dest;

    // One shared data source despite three datasets using it
    let source_count = dest
        .resources
        .values()
        .filter(|r| r.resource_type == "AWS::QuickSight::DataSource")
        .count();
    assert_eq!(source_count, 1);

    // RLS dataset generated but excluded from the analysis references
    assert!(dest.has_resource("DSetsetrls"));
    let references = dest.resources["ANAana1"].properties["SourceEntity"]["SourceTemplate"]
        ["DataSetReferences"]
        .as_array()
        .unwrap()
        .clone();
    assert_eq!(references.len(), 2);
    assert!(references
        .iter()
        .all(|r| r["DataSetPlaceholder"] != json!("permissions")));

    // Protected dataset depends on both its source and the RLS dataset
    let set1_deps = &dest.resources["DSetset1"].depends_on;
    assert!(set1_deps.contains(&"DSsrcx".to_string()));
    assert!(set1_deps.contains(&"DSetsetrls".to_string()));

    // Schedule exists, pinned to the run timestamp
    assert_eq!(
        dest.resources["RSchedulesch1"].properties["Schedule"]["StartAfterDateTime"],
        json!("2024-03-08T12:00:00Z")
    );

    // Remap declared the connection parameters
    assert!(dest.has_parameter("S3DestinationBucket0"));
    assert!(dest.has_parameter("S3DestinationKey0"));

    dest.validate().unwrap();

    // Post-processing and partitioning keep the document consistent
    assert!(patch_permissions(&mut dest));
    let groups = partition(&dest, 10).unwrap();
    assert!(groups.iter().all(|g| g.document.resources.len() <= 10));

    let dir = tempfile::tempdir().unwrap();
    let store = LocalObjectStore::new(dir.path(), &config.deployment_account_id);
    let parent = assemble_parent(&groups, &store, &config.deployment_bucket, "promo/CFNTemplates")
        .await
        .unwrap();
    parent.validate().unwrap();

    // The remapped S3 parameters follow their data source's group
    let source_group = groups
        .iter()
        .find(|g| g.key.starts_with("datasources"))
        .unwrap();
    assert!(source_group.document.has_parameter("S3DestinationBucket0"));
}

#[tokio::test]
async fn bundle_path_end_to_end() {
    // A bundle payload with an in-document attribute reference
    let payload = json!({
        "Resources": {
            "DSsrcx": {
                "Type": "AWS::QuickSight::DataSource",
                "Properties": { "DataSourceId": "src-x", "Name": "files", "Type": "S3" }
            },
            "DSetset1": {
                "Type": "AWS::QuickSight::DataSet",
                "DependsOn": ["DSsrcx"],
                "Properties": {
                    "DataSetId": "set-1",
                    "Name": "orders",
                    "PhysicalTableMap": {
                        "t1": { "S3Source": {
                            "DataSourceArn": { "Fn::GetAtt": ["DSsrcx", "Arn"] }
                        } }
                    }
                }
            }
        }
    });

    let dir = tempfile::tempdir().unwrap();
    let payload_path = dir.path().join("bundle.json");
    std::fs::write(&payload_path, serde_json::to_vec(&payload).unwrap()).unwrap();
    let exporter = PreparedBundleExporter::new(&payload_path);

    let catalog = catalog();
    let config = config();
    let resolver = Resolver::new(&catalog, &config);
    let analysis = resolver.resolve_dashboard("dash-1").await.unwrap();

    let pair = strategy::synthesize_pair(
        &analysis,
        &ctx(true, ReplicationMode::Bundle),
        &exporter,
    )
    .await
    .unwrap();

    // Placeholder source document, converted destination document
    assert!(pair.source.resources.is_empty());
    let mut dest = pair.dest;
    assert!(dest.has_resource("DSsrcx"));
    assert!(dest.has_resource("DSetset1"));

    // Flatten the attribute reference before partitioning
    flatten_references(&mut dest).unwrap();
    let rewritten =
        &dest.resources["DSetset1"].properties["PhysicalTableMap"]["t1"]["S3Source"]["DataSourceArn"];
    assert!(rewritten["Fn::Sub"]
        .as_str()
        .unwrap()
        .ends_with("datasource/src-x"));

    let groups = partition(&dest, 10).unwrap();
    assert_eq!(groups.len(), 2);
    for group in &groups {
        group.document.validate().unwrap();
    }
}
