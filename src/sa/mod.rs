//! Simulated Annealing for the Euclidean TSP.
//!
//! A single-trajectory search: each outer iteration fixes a temperature
//! from the [`CoolingSchedule`], then runs `chain_length` proposals from
//! the [`NeighborhoodOperator`] through the Metropolis test. Rejected
//! moves are reverted in place, so the tour is never copied per step.
//!
//! # References
//!
//! - Kirkpatrick, Gelatt & Vecchi (1983), "Optimization by Simulated Annealing"
//! - Cerny (1985), "Thermodynamical Approach to the Travelling Salesman Problem"
//! - Geman & Geman (1984), logarithmic cooling

mod config;
mod cooling;
mod operator;
mod runner;
mod types;

pub use config::AnnealConfig;
pub use cooling::CoolingSchedule;
pub use operator::NeighborhoodOperator;
pub use runner::{acceptance_probability, run_batch, AnnealingEngine};
pub use types::{AnnealOutcome, BestSolution, EngineState, MoveStats, TrajectoryPoint};
