//! Error taxonomy for engine commands.

use thiserror::Error;

/// Errors reported by sketch engine commands.
///
/// Every failure is local and recoverable: a failed command leaves the
/// document unchanged and the engine usable. Export formats are validated
/// by the raster crate, which carries the `UnsupportedFormat` arm of the
/// shared taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("operation not valid in current state: {0}")]
    InvalidState(&'static str),
    #[error("no entity with id {0}")]
    NotFound(u64),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("nothing to undo")]
    NothingToUndo,
    #[error("nothing to redo")]
    NothingToRedo,
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
