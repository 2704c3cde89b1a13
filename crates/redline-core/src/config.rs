//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Maximum number of undo entries kept by default.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Default minimum distance between consecutive stroke samples.
///
/// Points closer than this are coalesced so that fast input sampling does
/// not grow strokes without bound.
pub const DEFAULT_COALESCE_EPSILON: f64 = 0.5;

/// Conflict rule applied during replay when an incoming record's id is
/// already present in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MergePolicy {
    /// The incoming record replaces the existing entity in place.
    #[default]
    LastWriteWins,
    /// The incoming record is ignored.
    KeepExisting,
}

/// Tunable engine behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Consecutive stroke points closer than this are coalesced.
    #[serde(default = "default_epsilon")]
    pub coalesce_epsilon: f64,
    /// Upper bound on the undo stack; oldest entries are discarded first.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    /// Replay conflict rule for the two-canvas sync scenario.
    #[serde(default)]
    pub merge_policy: MergePolicy,
}

fn default_epsilon() -> f64 {
    DEFAULT_COALESCE_EPSILON
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            coalesce_epsilon: DEFAULT_COALESCE_EPSILON,
            history_limit: DEFAULT_HISTORY_LIMIT,
            merge_policy: MergePolicy::default(),
        }
    }
}
