//! bw-pipeline - Deployment pipeline for Boardwalk
//!
//! This crate drives the end-to-end flow: orchestration across the
//! initialize/deploy modes and the event trigger path, the externally
//! supplied parameter lifecycle (declare → operator fill-in → validate on
//! deploy), and deployable archive packaging.

pub mod error;
pub mod orchestrator;
pub mod package;
pub mod params;

pub use error::{PipelineError, PipelineResult};
pub use orchestrator::{
    Orchestrator, RunMode, RunSummary, Synthesis, TriggerEvent, TriggerOutcome,
};
pub use params::{ParameterEntry, FILL_ME, NUMBER_PLACEHOLDER};
