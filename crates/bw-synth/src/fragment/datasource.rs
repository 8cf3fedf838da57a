//! Data source fragment generator

use crate::context::SynthContext;
use crate::error::SynthResult;
use crate::fragment::remap_description;
use crate::skeleton;
use bw_core::{DataSourceDef, ParameterDef, ServiceConnection, TemplateDocument};
use serde_json::{json, Map, Value};

/// Shared parameter naming the secret every relational source reads its
/// credentials from in the stage
pub const SECRET_ARN_PARAMETER: &str = "DSSecretArn";

/// Shared parameter naming the VPC connection data sources attach to
pub const VPC_CONNECTION_PARAMETER: &str = "VpcConnectionArn";

/// Generate the data source resource fragment into `doc`.
///
/// A second call for the same definition (or another definition with the
/// same raw id) leaves the document untouched.
pub fn generate(
    def: &DataSourceDef,
    doc: &mut TemplateDocument,
    ctx: &SynthContext,
) -> SynthResult<()> {
    if doc.has_resource(def.cfn_id()) {
        log::info!(
            "data source with id {} already exists, skipping",
            def.cfn_id()
        );
        return Ok(());
    }

    log::info!(
        "Processing data source {} (ID {}, type {}) with index {}",
        def.name(),
        def.id(),
        def.api_type(),
        def.index()
    );

    let connection = connection_parameters(def, doc, ctx);

    let mut resource = skeleton::datasource_resource()?;
    let props = resource.properties_mut();
    props.insert("DataSourceId".to_string(), json!(def.id()));
    props.insert("Name".to_string(), json!(def.name()));
    props.insert("Type".to_string(), json!(def.api_type()));
    props.insert("DataSourceParameters".to_string(), connection);

    if def.vpc_connection_arn().is_some() {
        props.insert(
            "VpcConnectionProperties".to_string(),
            json!({ "VpcConnectionArn": { "Ref": VPC_CONNECTION_PARAMETER } }),
        );
        doc.declare_parameter(
            VPC_CONNECTION_PARAMETER,
            ParameterDef::string(
                "VPC Connection Arn to use in the stage, to be parametrized per deployment stage",
            ),
        );
    }

    // Credentials never travel as literals; the stage supplies its own secret.
    if def.is_relational() {
        props.insert(
            "Credentials".to_string(),
            json!({ "SecretArn": { "Ref": SECRET_ARN_PARAMETER } }),
        );
        doc.declare_parameter(
            SECRET_ARN_PARAMETER,
            ParameterDef::string(
                "Secret Arn to use in the stage, to be parametrized per deployment stage",
            ),
        );
    }

    doc.insert_resource(def.cfn_id(), resource);
    Ok(())
}

/// Build the type-dependent `DataSourceParameters` value, declaring remap
/// parameters as needed.
fn connection_parameters(
    def: &DataSourceDef,
    doc: &mut TemplateDocument,
    ctx: &SynthContext,
) -> Value {
    match def {
        DataSourceDef::Service(s) => match &s.connection {
            ServiceConnection::S3 { bucket, key } => {
                let (bucket_v, key_v) = if ctx.remap {
                    let bucket_param = format!("S3DestinationBucket{}", def.index());
                    let key_param = format!("S3DestinationKey{}", def.index());
                    doc.declare_parameter(
                        &bucket_param,
                        ParameterDef::string(remap_description("S3 bucket", def)),
                    );
                    doc.declare_parameter(
                        &key_param,
                        ParameterDef::string(remap_description("S3 key", def)),
                    );
                    (json!({ "Ref": bucket_param }), json!({ "Ref": key_param }))
                } else {
                    (json!(bucket), json!(key))
                };
                json!({
                    "S3Parameters": {
                        "ManifestFileLocation": { "Bucket": bucket_v, "Key": key_v }
                    }
                })
            }
            ServiceConnection::Athena { workgroup } => {
                let workgroup_v = if ctx.remap {
                    let param = format!("ATHENAWorkgroup{}", def.index());
                    doc.declare_parameter(
                        &param,
                        ParameterDef::string(remap_description("Athena Workgroup", def)),
                    );
                    json!({ "Ref": param })
                } else {
                    json!(workgroup)
                };
                json!({ "AthenaParameters": { "WorkGroup": workgroup_v } })
            }
        },
        DataSourceDef::ManagedRelational(m) => {
            let (instance_v, database_v) = if ctx.remap {
                let instance_param = format!("RDSInstanceID{}", def.index());
                let database_param = format!("RDSDBName{}", def.index());
                doc.declare_parameter(
                    &instance_param,
                    ParameterDef::string(remap_description("RDS Instance Id", def)),
                );
                doc.declare_parameter(
                    &database_param,
                    ParameterDef::string(remap_description("Database name", def)),
                );
                (
                    json!({ "Ref": instance_param }),
                    json!({ "Ref": database_param }),
                )
            } else {
                (json!(m.instance_id), json!(m.database))
            };
            json!({
                "RdsParameters": { "InstanceId": instance_v, "Database": database_v }
            })
        }
        DataSourceDef::GenericRelational(g) => {
            let engine = g.engine.api_name();
            let (host_v, port_v, database_v) = if ctx.remap {
                let host_param = format!("{}Host{}", engine, def.index());
                let port_param = format!("{}Port{}", engine, def.index());
                let database_param = format!("{}DBName{}", engine, def.index());
                doc.declare_parameter(
                    &host_param,
                    ParameterDef::string(remap_description("Database host", def)),
                );
                doc.declare_parameter(
                    &port_param,
                    ParameterDef::number(remap_description("Database port", def)),
                );
                doc.declare_parameter(
                    &database_param,
                    ParameterDef::string(remap_description("Database name", def)),
                );
                (
                    json!({ "Ref": host_param }),
                    json!({ "Ref": port_param }),
                    json!({ "Ref": database_param }),
                )
            } else {
                (json!(g.host), json!(g.port), json!(g.database))
            };

            let mut inner = Map::new();
            inner.insert("Host".to_string(), host_v);
            inner.insert("Port".to_string(), port_v);
            inner.insert("Database".to_string(), database_v);

            if let Some(cluster_id) = &g.cluster_id {
                let cluster_v = if ctx.remap {
                    let param = format!("{}ClusterId{}", engine, def.index());
                    doc.declare_parameter(
                        &param,
                        ParameterDef::string(remap_description("ClusterId", def)),
                    );
                    json!({ "Ref": param })
                } else {
                    json!(cluster_id)
                };
                inner.insert("ClusterId".to_string(), cluster_v);
            }

            let mut outer = Map::new();
            outer.insert(g.engine.parameters_key().to_string(), Value::Object(inner));
            Value::Object(outer)
        }
    }
}

#[cfg(test)]
#[path = "datasource_test.rs"]
mod tests;
