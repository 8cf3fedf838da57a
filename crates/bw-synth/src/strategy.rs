//! Replication strategies.
//!
//! Both strategies yield the same shape — a source-account document and a
//! destination-account document — so everything downstream (permission
//! patching, partitioning, the parameter lifecycle) is strategy-agnostic.

use crate::bundle;
use crate::context::SynthContext;
use crate::error::SynthResult;
use crate::fragment;
use crate::skeleton;
use bw_api::BundleExporter;
use bw_core::{AnalysisDef, OutputDef, ReplicationMode, TemplateDocument};
use serde_json::json;

/// The synthesized document pair
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentPair {
    /// Source-account scope (template share, or a placeholder on the
    /// bundle path)
    pub source: TemplateDocument,
    /// Destination-account scope
    pub dest: TemplateDocument,
}

/// Synthesize the document pair with the strategy selected in the context.
pub async fn synthesize_pair(
    analysis: &AnalysisDef,
    ctx: &SynthContext,
    exporter: &dyn BundleExporter,
) -> SynthResult<DocumentPair> {
    match ctx.mode {
        ReplicationMode::Template => synthesize_template_pair(analysis, ctx),
        ReplicationMode::Bundle => {
            let dest = bundle::export_destination(analysis, ctx, exporter).await?;
            let source = skeleton::bundle_source_placeholder()?;
            Ok(DocumentPair { source, dest })
        }
    }
}

/// Template-based replication: deterministic fragment generation, no
/// external job.
pub fn synthesize_template_pair(
    analysis: &AnalysisDef,
    ctx: &SynthContext,
) -> SynthResult<DocumentPair> {
    let mut dest = skeleton::dest_document()?;

    // Data sources first so every dataset's DependsOn targets exist even
    // when datasets are generated out of discovery order.
    for dataset in &analysis.datasets {
        for source in &dataset.depending_sources {
            fragment::datasource::generate(source, &mut dest, ctx)?;
        }
    }

    let mut source = skeleton::source_document()?;
    fragment::template::generate(analysis, &mut source, ctx)?;

    for dataset in &analysis.datasets {
        fragment::dataset::generate(dataset, &mut dest, ctx)?;
    }

    fragment::analysis::generate(analysis, &mut dest, ctx)?;

    attach_outputs(analysis, &mut source, &mut dest);

    dest.validate()?;
    Ok(DocumentPair { source, dest })
}

/// Outputs: the shared template id on the source side, the deployed
/// analysis URL on the destination side.
fn attach_outputs(
    analysis: &AnalysisDef,
    source: &mut TemplateDocument,
    dest: &mut TemplateDocument,
) {
    source.set_output(
        "TemplateId",
        OutputDef {
            description: Some(
                "Id of the template that models the promoted analysis".to_string(),
            ),
            value: json!(analysis.template_id),
        },
    );
    dest.set_output(
        "AnalysisURL",
        OutputDef {
            description: Some(
                "URL of the analysis instantiated from the shared template, identical across stages"
                    .to_string(),
            ),
            value: json!(format!(
                "https://{}.quicksight.aws.amazon.com/sn/analyses/{}",
                analysis.qs_region, analysis.id
            )),
        },
    );
}

#[cfg(test)]
#[path = "strategy_test.rs"]
mod tests;
