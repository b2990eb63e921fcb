//! Euclidean TSP primitives.
//!
//! [`DistanceOracle`] holds the rounded pairwise distances; [`Tour`] is the
//! mutable permutation with a cached length kept exact by incremental
//! edge accounting.

mod distance;
mod tour;

pub use distance::{optimality_gap, DistanceOracle, Point};
pub use tour::{AppliedMove, ChainOrder, Move, Tour};
