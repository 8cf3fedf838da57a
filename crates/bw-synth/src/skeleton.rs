//! Fixed boilerplate fragments merged with synthesized properties.
//!
//! Each resource kind starts from one of these embedded skeletons; the
//! generators fill in identity, connection and reference properties. The
//! skeletons are the only place literal resource-type boilerplate lives.

use crate::error::SynthResult;
use bw_core::{Resource, TemplateDocument};

const DEST_DOCUMENT_SKEL: &str = r#"
AWSTemplateFormatVersion: '2010-09-09'
Description: Destination-account assets synthesized from the source analysis
Parameters:
  SourceAccountID:
    Description: Account that shares the analysis template with this stage
    Type: String
Resources: {}
"#;

const SOURCE_DOCUMENT_SKEL: &str = r#"
AWSTemplateFormatVersion: '2010-09-09'
Description: Source-account template share for the promoted analysis
Parameters:
  DestinationAccountID:
    Description: Account the shared template is granted to in this stage
    Type: String
Resources: {}
"#;

const BUNDLE_SOURCE_PLACEHOLDER_SKEL: &str = r#"
AWSTemplateFormatVersion: '2010-09-09'
Description: No source-account artifact; the export bundle carries the full asset graph
Resources: {}
"#;

const DATASOURCE_SKEL: &str = r#"
Type: AWS::QuickSight::DataSource
Properties:
  AwsAccountId:
    Fn::Sub: '${AWS::AccountId}'
  DataSourceId: ''
  Name: ''
"#;

const DATASET_SKEL: &str = r#"
Type: AWS::QuickSight::DataSet
Properties:
  AwsAccountId:
    Fn::Sub: '${AWS::AccountId}'
  DataSetId: ''
  Name: ''
"#;

const ANALYSIS_SKEL: &str = r#"
Type: AWS::QuickSight::Analysis
Properties:
  AwsAccountId:
    Fn::Sub: '${AWS::AccountId}'
  AnalysisId: ''
  Name: ''
  SourceEntity:
    SourceTemplate:
      Arn: ''
      DataSetReferences: []
"#;

const TEMPLATE_SKEL: &str = r#"
Type: AWS::QuickSight::Template
Properties:
  AwsAccountId:
    Fn::Sub: '${AWS::AccountId}'
  TemplateId: ''
  Name: ''
  SourceEntity:
    SourceAnalysis:
      Arn:
        Fn::Sub: 'arn:${AWS::Partition}:quicksight:${AWS::Region}:${AWS::AccountId}:analysis/{analysis_id}'
      DataSetReferences: []
"#;

const REFRESH_SCHEDULE_SKEL: &str = r#"
Type: AWS::QuickSight::RefreshSchedule
Properties:
  AwsAccountId:
    Fn::Sub: '${AWS::AccountId}'
  DataSetId: ''
  Schedule: {}
"#;

fn parse_document(skel: &str) -> SynthResult<TemplateDocument> {
    Ok(TemplateDocument::from_yaml_str(skel)?)
}

fn parse_resource(skel: &str) -> SynthResult<Resource> {
    Ok(serde_yaml::from_str(skel).map_err(bw_core::CoreError::Yaml)?)
}

/// Empty destination-account document (declares the cross-account parameter)
pub fn dest_document() -> SynthResult<TemplateDocument> {
    parse_document(DEST_DOCUMENT_SKEL)
}

/// Empty source-account document
pub fn source_document() -> SynthResult<TemplateDocument> {
    parse_document(SOURCE_DOCUMENT_SKEL)
}

/// Placeholder source document for the bundle path
pub fn bundle_source_placeholder() -> SynthResult<TemplateDocument> {
    parse_document(BUNDLE_SOURCE_PLACEHOLDER_SKEL)
}

/// Data source resource skeleton
pub fn datasource_resource() -> SynthResult<Resource> {
    parse_resource(DATASOURCE_SKEL)
}

/// Dataset resource skeleton
pub fn dataset_resource() -> SynthResult<Resource> {
    parse_resource(DATASET_SKEL)
}

/// Analysis resource skeleton
pub fn analysis_resource() -> SynthResult<Resource> {
    parse_resource(ANALYSIS_SKEL)
}

/// Source-account template resource skeleton; the `{analysis_id}` marker in
/// the source-analysis ARN is substituted by the template generator
pub fn template_resource() -> SynthResult<Resource> {
    parse_resource(TEMPLATE_SKEL)
}

/// Refresh schedule resource skeleton
pub fn refresh_schedule_resource() -> SynthResult<Resource> {
    parse_resource(REFRESH_SCHEDULE_SKEL)
}
