//! Annealing run configuration.

use super::cooling::CoolingSchedule;
use super::operator::NeighborhoodOperator;
use crate::error::{Error, Result};

/// Configuration for one annealing trajectory.
///
/// Passed by value into a fresh [`AnnealingEngine`](super::AnnealingEngine);
/// a sweep over many settings builds one config per trajectory.
///
/// # Examples
///
/// ```
/// use u_tsp::sa::{AnnealConfig, CoolingSchedule, NeighborhoodOperator};
///
/// let config = AnnealConfig::default()
///     .with_initial_temperature(50.0)
///     .with_schedule(CoolingSchedule::Exponential, vec![0.005])
///     .with_operator(NeighborhoodOperator::Hybrid)
///     .with_chain_length(200)
///     .with_max_iterations(1000)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnealConfig {
    /// Initial temperature `T0`. Must be positive.
    pub initial_temperature: f64,

    /// Cooling schedule.
    pub schedule: CoolingSchedule,

    /// Schedule parameters, e.g. `[offset]` for logarithmic cooling.
    pub schedule_params: Vec<f64>,

    /// Neighborhood operator used for every proposal.
    pub operator: NeighborhoodOperator,

    /// Proposals per temperature (inner loop length).
    pub chain_length: usize,

    /// Number of temperature steps (outer loop length, `Nmax`).
    pub max_iterations: usize,

    /// Random seed for reproducibility. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for AnnealConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 10.0,
            schedule: CoolingSchedule::Logarithmic,
            schedule_params: vec![1.0],
            operator: NeighborhoodOperator::SwapTwo,
            chain_length: 100,
            max_iterations: 1000,
            seed: None,
        }
    }
}

impl AnnealConfig {
    pub fn with_initial_temperature(mut self, t: f64) -> Self {
        self.initial_temperature = t;
        self
    }

    pub fn with_schedule(mut self, schedule: CoolingSchedule, params: Vec<f64>) -> Self {
        self.schedule = schedule;
        self.schedule_params = params;
        self
    }

    pub fn with_operator(mut self, operator: NeighborhoodOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn with_chain_length(mut self, n: usize) -> Self {
        self.chain_length = n;
        self
    }

    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Total number of proposals a full run makes.
    pub fn total_steps(&self) -> usize {
        self.chain_length.saturating_mul(self.max_iterations)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// - [`Error::Configuration`] for a non-positive `T0`, a zero chain
    ///   length or iteration count, or a non-positive schedule parameter
    /// - [`Error::MissingParameter`] if the schedule needs a parameter that
    ///   `schedule_params` lacks
    pub fn validate(&self) -> Result<()> {
        if !(self.initial_temperature.is_finite() && self.initial_temperature > 0.0) {
            return Err(Error::Configuration(format!(
                "initial_temperature must be positive, got {}",
                self.initial_temperature
            )));
        }
        if self.chain_length == 0 {
            return Err(Error::Configuration("chain_length must be positive".into()));
        }
        if self.max_iterations == 0 {
            return Err(Error::Configuration("max_iterations must be positive".into()));
        }
        let needed = self.schedule.param_count();
        if self.schedule_params.len() < needed {
            return Err(Error::MissingParameter {
                schedule: self.schedule.name(),
                index: self.schedule_params.len(),
            });
        }
        if let Some(&p) = self.schedule_params[..needed]
            .iter()
            .find(|p| !(p.is_finite() && **p > 0.0))
        {
            return Err(Error::Configuration(format!(
                "{} parameter must be positive, got {p}",
                self.schedule
            )));
        }
        Ok(())
    }
}
