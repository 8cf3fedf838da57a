//! Synthesis run context

use bw_core::ReplicationMode;
use chrono::{DateTime, Utc};

/// Timestamp format used throughout emitted documents
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Per-run synthesis settings threaded through every generator.
///
/// The timestamp is captured once when the run starts; schedule start-after
/// times are computed from it, never from the clock at generation (or
/// apply) time, so the two documents of a run always agree.
#[derive(Debug, Clone)]
pub struct SynthContext {
    /// Emit externally-supplied parameters for connection attributes
    pub remap: bool,

    /// Which replication strategy is producing the pair
    pub mode: ReplicationMode,

    /// The synthesis-run instant
    pub synthesized_at: DateTime<Utc>,
}

impl SynthContext {
    /// Context stamped with the current instant
    pub fn new(remap: bool, mode: ReplicationMode) -> Self {
        Self::at(remap, mode, Utc::now())
    }

    /// Context with an explicit run timestamp (tests, replays)
    pub fn at(remap: bool, mode: ReplicationMode, synthesized_at: DateTime<Utc>) -> Self {
        Self {
            remap,
            mode,
            synthesized_at,
        }
    }

    /// The run timestamp in document form
    pub fn timestamp_string(&self) -> String {
        self.synthesized_at.format(TIMESTAMP_FORMAT).to_string()
    }
}
