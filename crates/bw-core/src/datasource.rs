//! Data source definition objects.
//!
//! External metadata returns type-dependent record shapes; this module
//! normalizes them into a closed set of variants so every consumption site
//! can match exhaustively. Construction is the validation boundary: a
//! record missing a mandatory connection parameter for its declared kind
//! fails here, naming the resource so operators can locate the offending
//! asset, and nothing half-built escapes into the synthesis pass.

use crate::error::{CoreError, CoreResult};
use crate::ident::{cfn_id, id_from_arn, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Supported data source kinds, as named by the metadata API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    S3,
    Athena,
    Mysql,
    Postgresql,
    Mariadb,
    Oracle,
    Sqlserver,
    Aurora,
    AuroraPostgresql,
    Redshift,
    Rds,
}

impl SourceKind {
    /// The API-facing name, also used as the parameter-name prefix
    pub fn api_name(&self) -> &'static str {
        match self {
            SourceKind::S3 => "S3",
            SourceKind::Athena => "ATHENA",
            SourceKind::Mysql => "MYSQL",
            SourceKind::Postgresql => "POSTGRESQL",
            SourceKind::Mariadb => "MARIADB",
            SourceKind::Oracle => "ORACLE",
            SourceKind::Sqlserver => "SQLSERVER",
            SourceKind::Aurora => "AURORA",
            SourceKind::AuroraPostgresql => "AURORA_POSTGRESQL",
            SourceKind::Redshift => "REDSHIFT",
            SourceKind::Rds => "RDS",
        }
    }

    /// Parse an API type name
    pub fn from_api_name(name: &str) -> Option<Self> {
        match name {
            "S3" => Some(SourceKind::S3),
            "ATHENA" => Some(SourceKind::Athena),
            "MYSQL" => Some(SourceKind::Mysql),
            "POSTGRESQL" => Some(SourceKind::Postgresql),
            "MARIADB" => Some(SourceKind::Mariadb),
            "ORACLE" => Some(SourceKind::Oracle),
            "SQLSERVER" => Some(SourceKind::Sqlserver),
            "AURORA" => Some(SourceKind::Aurora),
            "AURORA_POSTGRESQL" => Some(SourceKind::AuroraPostgresql),
            "REDSHIFT" => Some(SourceKind::Redshift),
            "RDS" => Some(SourceKind::Rds),
            _ => None,
        }
    }

    /// Service-hosted kinds (object storage, query engine)
    pub fn is_service(&self) -> bool {
        matches!(self, SourceKind::S3 | SourceKind::Athena)
    }

    /// Relational kinds (managed or generic); these require a secret
    pub fn is_relational(&self) -> bool {
        !self.is_service()
    }

    /// The type-dependent key under `DataSourceParameters` for this kind
    pub fn parameters_key(&self) -> &'static str {
        match self {
            SourceKind::S3 => "S3Parameters",
            SourceKind::Athena => "AthenaParameters",
            SourceKind::Mysql => "MySqlParameters",
            SourceKind::Postgresql => "PostgreSqlParameters",
            SourceKind::Mariadb => "MariaDbParameters",
            SourceKind::Oracle => "OracleParameters",
            SourceKind::Sqlserver => "SqlServerParameters",
            SourceKind::Aurora => "AuroraParameters",
            SourceKind::AuroraPostgresql => "AuroraPostgreSqlParameters",
            SourceKind::Redshift => "RedshiftParameters",
            SourceKind::Rds => "RdsParameters",
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.api_name())
    }
}

/// Attributes shared by every data source variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSourceCommon {
    /// Raw asset id
    pub id: String,
    /// Source-account ARN
    pub arn: String,
    /// Display name
    pub name: String,
    /// Synthetic resource id
    pub cfn_id: String,
    /// Ordinal assigned at discovery time; disambiguates generated
    /// parameter names when several sources share a kind
    pub index: usize,
    /// VPC connection this source reaches its backend through, if any
    pub vpc_connection_arn: Option<String>,
}

/// Connection detail for service-hosted sources
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ServiceConnection {
    /// Manifest file location in object storage
    S3 { bucket: String, key: String },
    /// Query workgroup
    Athena { workgroup: String },
}

/// A service-hosted data source (S3, ATHENA)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDataSource {
    pub common: DataSourceCommon,
    pub connection: ServiceConnection,
}

/// A managed relational data source (RDS-hosted instance)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedRelationalDataSource {
    pub common: DataSourceCommon,
    /// Underlying engine kind reported by the API
    pub engine: SourceKind,
    pub instance_id: String,
    pub database: String,
    pub secret_arn: String,
}

/// A generic relational data source reached by host/port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericRelationalDataSource {
    pub common: DataSourceCommon,
    pub engine: SourceKind,
    pub host: String,
    pub port: i64,
    pub database: String,
    /// Present only for REDSHIFT
    pub cluster_id: Option<String>,
    pub secret_arn: String,
}

/// A typed data source definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataSourceDef {
    Service(ServiceDataSource),
    ManagedRelational(ManagedRelationalDataSource),
    GenericRelational(GenericRelationalDataSource),
}

impl DataSourceDef {
    /// Build a service-hosted definition from a flat connection-parameter
    /// map (`Bucket`/`Key` for S3, `WorkGroup` for ATHENA).
    pub fn new_service(
        name: &str,
        arn: &str,
        index: usize,
        kind: SourceKind,
        params: &Map<String, Value>,
    ) -> CoreResult<Self> {
        let common = DataSourceCommon::build(name, arn, index, None);
        let connection = match kind {
            SourceKind::S3 => ServiceConnection::S3 {
                bucket: require_str(params, "Bucket", kind, name, &common.id, index)?,
                key: require_str(params, "Key", kind, name, &common.id, index)?,
            },
            SourceKind::Athena => ServiceConnection::Athena {
                workgroup: require_str(params, "WorkGroup", kind, name, &common.id, index)?,
            },
            other => {
                return Err(CoreError::MissingSourceParameter {
                    kind: other.api_name().to_string(),
                    name: name.to_string(),
                    id: common.id.clone(),
                    index,
                    parameter: "a service connection".to_string(),
                })
            }
        };
        Ok(DataSourceDef::Service(ServiceDataSource { common, connection }))
    }

    /// Build a managed relational (RDS-hosted) definition.
    pub fn new_managed_relational(
        name: &str,
        arn: &str,
        index: usize,
        engine: SourceKind,
        params: &Map<String, Value>,
        secret_arn: Option<String>,
        vpc_connection_arn: Option<String>,
    ) -> CoreResult<Self> {
        let common = DataSourceCommon::build(name, arn, index, vpc_connection_arn);
        let secret_arn = require_secret(secret_arn, engine, name, &common.id)?;
        Ok(DataSourceDef::ManagedRelational(ManagedRelationalDataSource {
            instance_id: require_str(params, "InstanceId", engine, name, &common.id, index)?,
            database: require_str(params, "Database", engine, name, &common.id, index)?,
            secret_arn,
            engine,
            common,
        }))
    }

    /// Build a generic relational definition; REDSHIFT additionally
    /// requires a cluster id.
    pub fn new_generic_relational(
        name: &str,
        arn: &str,
        index: usize,
        engine: SourceKind,
        params: &Map<String, Value>,
        secret_arn: Option<String>,
        vpc_connection_arn: Option<String>,
    ) -> CoreResult<Self> {
        let common = DataSourceCommon::build(name, arn, index, vpc_connection_arn);
        let secret_arn = require_secret(secret_arn, engine, name, &common.id)?;
        let cluster_id = if engine == SourceKind::Redshift {
            Some(require_str(params, "ClusterId", engine, name, &common.id, index)?)
        } else {
            None
        };
        Ok(DataSourceDef::GenericRelational(GenericRelationalDataSource {
            host: require_str(params, "Host", engine, name, &common.id, index)?,
            port: require_number(params, "Port", engine, name, &common.id, index)?,
            database: require_str(params, "Database", engine, name, &common.id, index)?,
            cluster_id,
            secret_arn,
            engine,
            common,
        }))
    }

    /// Shared attributes
    pub fn common(&self) -> &DataSourceCommon {
        match self {
            DataSourceDef::Service(s) => &s.common,
            DataSourceDef::ManagedRelational(m) => &m.common,
            DataSourceDef::GenericRelational(g) => &g.common,
        }
    }

    /// Raw asset id
    pub fn id(&self) -> &str {
        &self.common().id
    }

    /// Synthetic resource id
    pub fn cfn_id(&self) -> &str {
        &self.common().cfn_id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.common().name
    }

    /// Discovery ordinal
    pub fn index(&self) -> usize {
        self.common().index
    }

    /// The API type name emitted as the resource `Type` property
    pub fn api_type(&self) -> &'static str {
        match self {
            DataSourceDef::Service(s) => match s.connection {
                ServiceConnection::S3 { .. } => SourceKind::S3.api_name(),
                ServiceConnection::Athena { .. } => SourceKind::Athena.api_name(),
            },
            DataSourceDef::ManagedRelational(m) => m.engine.api_name(),
            DataSourceDef::GenericRelational(g) => g.engine.api_name(),
        }
    }

    /// Whether this source carries a secret reference
    pub fn is_relational(&self) -> bool {
        !matches!(self, DataSourceDef::Service(_))
    }

    /// Secret ARN for relational variants
    pub fn secret_arn(&self) -> Option<&str> {
        match self {
            DataSourceDef::Service(_) => None,
            DataSourceDef::ManagedRelational(m) => Some(&m.secret_arn),
            DataSourceDef::GenericRelational(g) => Some(&g.secret_arn),
        }
    }

    /// VPC connection ARN, if the source uses one
    pub fn vpc_connection_arn(&self) -> Option<&str> {
        self.common().vpc_connection_arn.as_deref()
    }
}

impl DataSourceCommon {
    fn build(name: &str, arn: &str, index: usize, vpc_connection_arn: Option<String>) -> Self {
        let id = id_from_arn(arn, "datasource").to_string();
        Self {
            cfn_id: cfn_id(ResourceKind::DataSource, &id),
            id,
            arn: arn.to_string(),
            name: name.to_string(),
            index,
            vpc_connection_arn,
        }
    }
}

fn require_str(
    params: &Map<String, Value>,
    key: &str,
    kind: SourceKind,
    name: &str,
    id: &str,
    index: usize,
) -> CoreResult<String> {
    match params.get(key).and_then(Value::as_str) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(missing_parameter(kind, name, id, index, key)),
    }
}

fn require_number(
    params: &Map<String, Value>,
    key: &str,
    kind: SourceKind,
    name: &str,
    id: &str,
    index: usize,
) -> CoreResult<i64> {
    // Ports occasionally come back as strings; accept both encodings.
    match params.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .ok_or_else(|| missing_parameter(kind, name, id, index, key)),
        Some(Value::String(s)) => s
            .parse::<i64>()
            .map_err(|_| missing_parameter(kind, name, id, index, key)),
        _ => Err(missing_parameter(kind, name, id, index, key)),
    }
}

fn require_secret(
    secret_arn: Option<String>,
    kind: SourceKind,
    name: &str,
    id: &str,
) -> CoreResult<String> {
    match secret_arn {
        Some(arn) if !arn.is_empty() => Ok(arn),
        _ => Err(CoreError::MissingSecret {
            kind: kind.api_name().to_string(),
            name: name.to_string(),
            id: id.to_string(),
        }),
    }
}

fn missing_parameter(
    kind: SourceKind,
    name: &str,
    id: &str,
    index: usize,
    parameter: &str,
) -> CoreError {
    CoreError::MissingSourceParameter {
        kind: kind.api_name().to_string(),
        name: name.to_string(),
        id: id.to_string(),
        index,
        parameter: parameter.to_string(),
    }
}

#[cfg(test)]
#[path = "datasource_test.rs"]
mod tests;
