//! bw-synth - Template synthesis for Boardwalk
//!
//! This crate turns a resolved asset graph into declarative documents:
//! per-kind fragment generators, the two replication strategies (template
//! share vs. bulk export), and the post-processing passes (permission
//! patching, reference flattening, nested-stack partitioning).

pub mod bundle;
pub mod context;
pub mod error;
pub mod fragment;
pub mod partition;
pub mod resolve;
pub mod skeleton;
pub mod strategy;

pub use context::{SynthContext, TIMESTAMP_FORMAT};
pub use error::{SynthError, SynthResult};
pub use partition::{
    assemble_parent, flatten_references, partition, patch_permissions, GroupKind, ResourceGroup,
    QS_ADMIN_REGION_PARAMETER, QS_USER_PARAMETER,
};
pub use resolve::Resolver;
pub use strategy::{synthesize_pair, synthesize_template_pair, DocumentPair};
