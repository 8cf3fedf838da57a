use super::*;
use async_trait::async_trait;
use bw_api::error::ApiResult;
use bw_core::{DataSetDef, DataSourceDef, ImportMode, RefreshScheduleDef, ReplicationMode, SourceKind};
use chrono::{TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

/// Exporter whose describe responses follow a script
struct ScriptedExporter {
    statuses: Mutex<VecDeque<ExportJobStatus>>,
    download_url: Option<String>,
    error_message: Option<String>,
    payload: Vec<u8>,
}

impl ScriptedExporter {
    fn new(statuses: Vec<ExportJobStatus>) -> Self {
        Self {
            statuses: Mutex::new(statuses.into()),
            download_url: Some("https://bundles.example.com/job".to_string()),
            error_message: None,
            payload: br#"{"Resources":{"DSetx":{"Type":"AWS::QuickSight::DataSet","Properties":{}}}}"#
                .to_vec(),
        }
    }
}

#[async_trait]
impl BundleExporter for ScriptedExporter {
    async fn start_export(&self, _request: ExportJobRequest) -> ApiResult<String> {
        Ok("job-1".to_string())
    }

    async fn describe_export(&self, job_id: &str) -> ApiResult<ExportJobDescription> {
        let mut statuses = self.statuses.lock().unwrap();
        let status = statuses.pop_front().unwrap_or(ExportJobStatus::InProgress);
        Ok(ExportJobDescription {
            job_id: job_id.to_string(),
            job_status: status,
            error_message: self.error_message.clone(),
            download_url: self.download_url.clone(),
        })
    }

    async fn download(&self, _url: &str) -> ApiResult<Vec<u8>> {
        Ok(self.payload.clone())
    }
}

fn ctx(remap: bool) -> SynthContext {
    SynthContext::at(
        remap,
        ReplicationMode::Bundle,
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    )
}

fn analysis() -> AnalysisDef {
    let mut analysis = AnalysisDef::new("ana-1", "Sales Overview");
    analysis.arn = "arn:aws:quicksight:eu-west-1:111122223333:analysis/ana-1".to_string();
    analysis.account_id = "111122223333".to_string();
    analysis.qs_region = "eu-west-1".to_string();
    analysis
}

#[tokio::test(start_paused = true)]
async fn test_export_succeeds_after_polling() {
    let exporter = ScriptedExporter::new(vec![
        ExportJobStatus::Queued,
        ExportJobStatus::InProgress,
        ExportJobStatus::Successful,
    ]);

    let doc = export_destination(&analysis(), &ctx(false), &exporter)
        .await
        .unwrap();
    assert!(doc.has_resource("DSetx"));
}

#[tokio::test(start_paused = true)]
async fn test_failed_export_carries_job_error() {
    let mut exporter = ScriptedExporter::new(vec![ExportJobStatus::Failed]);
    exporter.error_message = Some("asset too large".to_string());

    let err = export_destination(&analysis(), &ctx(false), &exporter)
        .await
        .unwrap_err();
    match err {
        SynthError::ExportFailed { detail, .. } => assert_eq!(detail, "asset too large"),
        other => panic!("expected ExportFailed, got {}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_polls_are_a_timeout_failure() {
    // Never terminal: the scripted deque is empty so every describe
    // reports IN_PROGRESS
    let exporter = ScriptedExporter::new(vec![]);

    let err = export_destination(&analysis(), &ctx(false), &exporter)
        .await
        .unwrap_err();
    match err {
        SynthError::ExportTimeout {
            attempts,
            last_status,
            ..
        } => {
            assert_eq!(attempts, 5);
            assert_eq!(last_status, "IN_PROGRESS");
        }
        other => panic!("expected ExportTimeout, got {}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_disallowed_download_scheme_is_fatal() {
    let mut exporter = ScriptedExporter::new(vec![ExportJobStatus::Successful]);
    exporter.download_url = Some("ftp://bundles.example.com/job".to_string());

    let err = export_destination(&analysis(), &ctx(false), &exporter)
        .await
        .unwrap_err();
    assert!(matches!(err, SynthError::BadDownloadScheme { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_missing_download_url_is_fatal() {
    let mut exporter = ScriptedExporter::new(vec![ExportJobStatus::Successful]);
    exporter.download_url = None;

    let err = export_destination(&analysis(), &ctx(false), &exporter)
        .await
        .unwrap_err();
    assert!(matches!(err, SynthError::MissingDownloadUrl { .. }));
}

#[test]
fn test_override_directives_cover_the_graph() {
    let mut analysis = analysis();

    let mut dataset = DataSetDef::new(
        "set-1",
        "orders",
        ImportMode::Spice,
        serde_json::json!({}),
        serde_json::json!({}),
    );
    dataset
        .refresh_schedules
        .push(RefreshScheduleDef::new("sch-1", serde_json::json!({})));

    let params = serde_json::json!({ "Host": "db.internal", "Port": 3306, "Database": "sales" });
    let source = DataSourceDef::new_generic_relational(
        "sales db",
        "arn:aws:quicksight:eu-west-1:111122223333:datasource/src-db",
        0,
        SourceKind::Mysql,
        params.as_object().unwrap(),
        Some("arn:aws:secretsmanager:eu-west-1:111122223333:secret:db".to_string()),
        Some("arn:aws:quicksight:eu-west-1:111122223333:vpcConnection/v-1".to_string()),
    )
    .unwrap();
    dataset.add_depending_source(source);
    analysis.datasets.push(dataset);

    let directives = override_directives(&analysis);

    let schedules = directives["RefreshSchedules"].as_array().unwrap();
    assert_eq!(schedules.len(), 1);
    assert!(schedules[0]["Arn"]
        .as_str()
        .unwrap()
        .ends_with("dataset/set-1/refresh-schedule/sch-1"));
    assert_eq!(schedules[0]["Properties"], serde_json::json!(["StartAfterDateTime"]));

    let sources = directives["DataSources"].as_array().unwrap();
    assert_eq!(sources.len(), 1);
    assert_eq!(
        sources[0]["Properties"],
        serde_json::json!(["Host", "Port", "Database"])
    );

    let vpcs = directives["VPCConnections"].as_array().unwrap();
    assert_eq!(vpcs.len(), 1);
    assert_eq!(
        vpcs[0]["Properties"],
        serde_json::json!(["Name", "DnsResolvers", "RoleArn"])
    );
}
