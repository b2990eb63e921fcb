//! Simulated annealing for the Euclidean Traveling Salesman Problem.
//!
//! - **[`tsp`]**: rounded distance matrix and a tour whose length is kept
//!   exact by incremental edge accounting under relocate, swap, segment
//!   reversal and three-piece reorder moves, each undoable in place.
//! - **[`sa`]**: neighborhood operators, cooling schedules and the
//!   annealing engine that runs the Metropolis chain over one tour.
//!
//! # Architecture
//!
//! The engine owns a single trajectory: its tour, best solution,
//! trajectory record and RNG. The distance oracle is immutable and shared
//! through `Arc`, so many engines can run concurrently over one instance.
//! Instance parsing, plotting and result persistence belong to callers.

pub mod error;
pub mod random;
pub mod sa;
pub mod tsp;

pub use error::{Error, Result};
