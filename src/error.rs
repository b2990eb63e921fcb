//! Error types for tour construction, mutation and engine configuration.

use thiserror::Error;

/// Errors reported synchronously by the annealing core.
///
/// Numeric edge cases inside a run (zero temperature, `exp` underflow)
/// are not errors; they resolve to a rejected move.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Coordinates cannot produce a usable distance matrix.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A tour was built from a sequence that is not a permutation of `1..=N`.
    #[error("invalid permutation: {0}")]
    InvalidPermutation(String),

    /// A mutation was called with an out-of-range or equal index pair.
    #[error("invalid index pair ({i}, {j}) for tour of {len} nodes")]
    InvalidIndex { i: usize, j: usize, len: usize },

    /// A cooling schedule needs a parameter that was not supplied.
    #[error("cooling schedule {schedule} requires params[{index}]")]
    MissingParameter { schedule: &'static str, index: usize },

    /// Unknown variant id or invalid numeric configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
