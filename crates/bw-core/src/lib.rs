//! bw-core - Core library for Boardwalk
//!
//! This crate provides the shared types used across all Boardwalk
//! components: configuration parsing, the identifier/reference model,
//! typed resource definitions, the mutable declarative document, and the
//! resource dependency DAG.

pub mod analysis;
pub mod config;
pub mod dag;
pub mod dataset;
pub mod datasource;
pub mod document;
pub mod error;
pub mod ident;
pub(crate) mod serde_helpers;

pub use analysis::AnalysisDef;
pub use config::{BackendsConfig, Config, ReplicationMode};
pub use dag::ResourceDag;
pub use dataset::{
    DataSetDef, ImportMode, RefreshScheduleDef, RlsDependency, RlsDescriptor,
    OPTIONAL_DATASET_PROPERTIES,
};
pub use datasource::{
    DataSourceCommon, DataSourceDef, GenericRelationalDataSource, ManagedRelationalDataSource,
    ServiceConnection, ServiceDataSource, SourceKind,
};
pub use document::{
    DocFormat, OutputDef, ParamType, ParameterDef, Resource, TemplateDocument,
};
pub use error::CoreError;
pub use ident::ResourceKind;
