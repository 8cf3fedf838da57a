//! Identifier and reference model.
//!
//! Raw asset ids (UUID-style, hyphenated) are not valid logical resource
//! names in the declarative template grammar, so every synthesized resource
//! gets a synthetic id: a kind tag followed by the sanitized raw id.
//! Sanitization is a pure function, so re-synthesizing the same asset always
//! lands on the same key (which is what makes fragment generation
//! idempotent), while distinct raw ids never collide.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Resource kinds in the declarative vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    /// BI analysis instantiated in the destination account
    Analysis,
    /// Dataset backing an analysis
    DataSet,
    /// Connection definition to an underlying system
    DataSource,
    /// Reusable template resource shared from the source account
    Template,
    /// Refresh schedule owned by a SPICE dataset
    RefreshSchedule,
    /// VPC connection used by a data source
    VpcConnection,
    /// Display theme
    Theme,
}

impl ResourceKind {
    /// Prefix tag used when building synthetic resource ids.
    pub fn tag(&self) -> &'static str {
        match self {
            ResourceKind::Analysis => "ANA",
            ResourceKind::DataSet => "DSet",
            ResourceKind::DataSource => "DS",
            ResourceKind::Template => "TPL",
            ResourceKind::RefreshSchedule => "RSchedule",
            ResourceKind::VpcConnection => "VPC",
            ResourceKind::Theme => "Theme",
        }
    }

    /// ARN resource segment for this kind.
    pub fn arn_segment(&self) -> &'static str {
        match self {
            ResourceKind::Analysis => "analysis",
            ResourceKind::DataSet => "dataset",
            ResourceKind::DataSource => "datasource",
            ResourceKind::Template => "template",
            ResourceKind::RefreshSchedule => "refresh-schedule",
            ResourceKind::VpcConnection => "vpcConnection",
            ResourceKind::Theme => "theme",
        }
    }

    /// Declarative resource type name for this kind.
    pub fn resource_type(&self) -> &'static str {
        match self {
            ResourceKind::Analysis => "AWS::QuickSight::Analysis",
            ResourceKind::DataSet => "AWS::QuickSight::DataSet",
            ResourceKind::DataSource => "AWS::QuickSight::DataSource",
            ResourceKind::Template => "AWS::QuickSight::Template",
            ResourceKind::RefreshSchedule => "AWS::QuickSight::RefreshSchedule",
            ResourceKind::VpcConnection => "AWS::QuickSight::VPCConnection",
            ResourceKind::Theme => "AWS::QuickSight::Theme",
        }
    }

    /// Reverse lookup from a declarative resource type name.
    pub fn from_resource_type(resource_type: &str) -> Option<Self> {
        match resource_type {
            "AWS::QuickSight::Analysis" => Some(ResourceKind::Analysis),
            "AWS::QuickSight::DataSet" => Some(ResourceKind::DataSet),
            "AWS::QuickSight::DataSource" => Some(ResourceKind::DataSource),
            "AWS::QuickSight::Template" => Some(ResourceKind::Template),
            "AWS::QuickSight::RefreshSchedule" => Some(ResourceKind::RefreshSchedule),
            "AWS::QuickSight::VPCConnection" => Some(ResourceKind::VpcConnection),
            "AWS::QuickSight::Theme" => Some(ResourceKind::Theme),
            _ => None,
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.arn_segment())
    }
}

/// Strip separator characters from a raw asset id.
///
/// Pure and idempotent: `sanitize(sanitize(x)) == sanitize(x)`. Collisions
/// are only possible for raw ids that differ solely in hyphen placement,
/// which the upstream id scheme does not produce.
pub fn sanitize(raw: &str) -> String {
    raw.replace('-', "")
}

/// Build the synthetic resource id for `raw` under `kind`.
///
/// Deterministic, so re-synthesizing the same asset maps onto the same
/// document key. Callers guarantee `raw` is non-empty.
pub fn cfn_id(kind: ResourceKind, raw: &str) -> String {
    format!("{}{}", kind.tag(), sanitize(raw))
}

/// ARN reference string templated over partition/region/account.
///
/// This is a deferred-substitution expression, not a literal ARN; it only
/// resolves when the declarative engine applies the document.
pub fn arn_sub_string(kind: ResourceKind, id: &str) -> String {
    format!(
        "arn:${{AWS::Partition}}:quicksight:${{AWS::Region}}:${{AWS::AccountId}}:{}/{}",
        kind.arn_segment(),
        id
    )
}

/// Deferred-substitution ARN expression for use inside a document.
pub fn arn_sub(kind: ResourceKind, id: &str) -> Value {
    json!({ "Fn::Sub": arn_sub_string(kind, id) })
}

/// Deferred-substitution ARN expression with an explicit account expression
/// (used for cross-account references such as the shared template).
pub fn arn_sub_in_account(kind: ResourceKind, id: &str, account_expr: &str) -> Value {
    json!({
        "Fn::Sub": format!(
            "arn:${{AWS::Partition}}:quicksight:${{AWS::Region}}:{}:{}/{}",
            account_expr,
            kind.arn_segment(),
            id
        )
    })
}

/// Derive the template id shared from the source account for an analysis.
pub fn template_id(analysis_name: &str) -> String {
    format!("{}-template", analysis_name.replace(' ', "-"))
}

/// Extract the trailing asset id from an ARN, given its resource segment.
///
/// `arn:aws:quicksight:eu-west-1:123:dataset/abc-def` with segment
/// `"dataset"` yields `abc-def`.
pub fn id_from_arn<'a>(arn: &'a str, segment: &str) -> &'a str {
    let marker = format!("{}/", segment);
    match arn.rfind(&marker) {
        Some(pos) => &arn[pos + marker.len()..],
        None => arn.rsplit('/').next().unwrap_or(arn),
    }
}

#[cfg(test)]
#[path = "ident_test.rs"]
mod tests;
