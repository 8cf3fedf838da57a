use super::*;
use bw_api::{FixtureCatalog, LocalObjectStore, MemoryTrackingStore, PreparedBundleExporter};
use serde_json::json;

fn arn(kind: &str, id: &str) -> String {
    format!("arn:aws:quicksight:eu-west-1:111122223333:{}/{}", kind, id)
}

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
                "DataSetArns": [arn("dataset", "set-1")]
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
                "ImportMode": "DIRECT_QUERY",
                "PhysicalTableMap": {
                    "t1": { "S3Source": { "DataSourceArn": arn("datasource", "src-x") } }
                },
                "LogicalTableMap": {}
            }
        },
        "RefreshSchedules": {},
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

struct Harness {
    orchestrator: Orchestrator,
    store: Arc<LocalObjectStore>,
    _dir: tempfile::TempDir,
    work: PathBuf,
}

fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let output_dir = dir.path().join("output");

    let mut config: Config = serde_yaml::from_str(
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
    .unwrap();
    config.output_dir = output_dir.display().to_string();

    let store = Arc::new(LocalObjectStore::new(
        dir.path().join("store"),
        "444455556666",
    ));
    let orchestrator = Orchestrator::new(
        config,
        Arc::new(catalog()),
        Arc::new(PreparedBundleExporter::new(dir.path().join("unused.json"))),
        store.clone(),
        Arc::new(MemoryTrackingStore::new()),
    )
    .unwrap();

    let work = dir.path().join("work");
    Harness {
        orchestrator,
        store,
        _dir: dir,
        work,
    }
}

#[tokio::test]
async fn test_initialize_publishes_the_parameter_contract() {
    let h = harness();
    let summary = h
        .orchestrator
        .run(RunMode::Initialize, "dash-1")
        .await
        .unwrap();

    assert_eq!(summary.analysis_id, "ana-1");
    assert!(summary.uploads_ok);
    assert!(summary.source_document_path.exists());
    assert!(summary.dest_document_path.exists());

    // One fill-in file per deployment stage and scope
    let downloaded = h
        .store
        .download_by_prefix("promo-artifacts", "promo/ConfigFiles/", &h.work)
        .await
        .unwrap();
    let names: Vec<String> = downloaded
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    for expected in [
        "source_cfn_template_parameters_staging.json",
        "source_cfn_template_parameters_prod.json",
        "dest_cfn_template_parameters_staging.json",
        "dest_cfn_template_parameters_prod.json",
    ] {
        assert!(names.contains(&expected.to_string()), "missing {}", expected);
    }

    // Remapped S3 parameters appear in the destination fill-in list
    let dest_file = downloaded
        .iter()
        .find(|p| p.to_string_lossy().contains("dest_cfn_template_parameters_prod"))
        .unwrap();
    let entries = params::read_fill_in_file(dest_file).unwrap();
    assert!(entries
        .iter()
        .any(|e| e.parameter_key == "S3DestinationBucket0"));
    assert!(entries
        .iter()
        .all(|e| e.parameter_value == params::FILL_ME
            || e.parameter_value == params::NUMBER_PLACEHOLDER));
}

#[tokio::test]
async fn test_deploy_packages_after_validation() {
    let h = harness();
    h.orchestrator
        .run(RunMode::Initialize, "dash-1")
        .await
        .unwrap();

    let summary = h.orchestrator.run(RunMode::Deploy, "dash-1").await.unwrap();
    assert!(summary.uploads_ok);

    let archives = h
        .store
        .download_by_prefix("promo-artifacts", "promo/CFNTemplates/", &h.work)
        .await
        .unwrap();
    let names: Vec<String> = archives
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert!(names.contains(&"SOURCE_assets_CFN.zip".to_string()));
    assert!(names.contains(&"DEST_assets_CFN.zip".to_string()));
}

#[tokio::test]
async fn test_deploy_aborts_on_missing_parameter_key() {
    let h = harness();
    h.orchestrator
        .run(RunMode::Initialize, "dash-1")
        .await
        .unwrap();

    // The operator's prod file lost a key the fresh synthesis requires
    let key = "promo/ConfigFiles/dest_cfn_template_parameters_prod.json";
    let downloaded = h
        .store
        .download_by_prefix("promo-artifacts", key, &h.work)
        .await
        .unwrap();
    let mut entries = params::read_fill_in_file(&downloaded[0]).unwrap();
    entries.retain(|e| e.parameter_key != "S3DestinationBucket0");
    h.store
        .put_object(
            "promo-artifacts",
            key,
            serde_json::to_string(&entries).unwrap().as_bytes(),
        )
        .await
        .unwrap();

    let err = h
        .orchestrator
        .run(RunMode::Deploy, "dash-1")
        .await
        .unwrap_err();
    match &err {
        PipelineError::ParameterDrift { stage, missing, .. } => {
            assert_eq!(stage, "prod");
            assert_eq!(missing, &vec!["S3DestinationBucket0".to_string()]);
        }
        other => panic!("expected ParameterDrift, got {}", other),
    }

    // Nothing was packaged or staged
    let archives = h
        .store
        .download_by_prefix("promo-artifacts", "promo/CFNTemplates/", &h.work.join("after"))
        .await
        .unwrap();
    assert!(archives.is_empty());
}

#[tokio::test]
async fn test_deploy_without_initialize_names_the_missing_file() {
    let h = harness();
    let err = h
        .orchestrator
        .run(RunMode::Deploy, "dash-1")
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingParameterFile { .. }));
}

#[tokio::test]
async fn test_event_trigger_skips_untracked_assets() {
    let h = harness();

    let outcome = h
        .orchestrator
        .run_event(&TriggerEvent {
            asset_id: "dash-unknown".to_string(),
        })
        .await
        .unwrap();
    assert!(matches!(outcome, TriggerOutcome::Skipped));

    // After initialize the asset is tracked and the trigger deploys
    h.orchestrator
        .run(RunMode::Initialize, "dash-1")
        .await
        .unwrap();
    let outcome = h
        .orchestrator
        .run_event(&TriggerEvent {
            asset_id: "dash-1".to_string(),
        })
        .await
        .unwrap();
    assert!(matches!(outcome, TriggerOutcome::Deployed(_)));
}

#[tokio::test]
async fn test_empty_dashboard_id_is_rejected() {
    let h = harness();
    let err = h.orchestrator.run(RunMode::Initialize, "").await.unwrap_err();
    assert!(err.to_string().contains("dashboard id"));
}
