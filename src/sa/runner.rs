//! Annealing engine: the outer cooling loop, the inner Metropolis chain,
//! and batch execution of independent trajectories.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::Rng;

use super::config::AnnealConfig;
use super::types::{AnnealOutcome, BestSolution, EngineState, MoveStats, TrajectoryPoint};
use crate::error::Result;
use crate::random::rng_from_seed;
use crate::tsp::{DistanceOracle, Point, Tour};

/// Metropolis acceptance probability for a move of length change `delta`
/// at `temperature`.
///
/// Non-worsening moves are always accepted. A worsening move at a
/// temperature that is zero, negative or NaN is never accepted, and an
/// `exp` that underflows yields `0.0`. The result is always in `[0, 1]`.
pub fn acceptance_probability(delta: i64, temperature: f64) -> f64 {
    if delta <= 0 {
        return 1.0;
    }
    if temperature.is_nan() || temperature <= 0.0 {
        return 0.0;
    }
    let p = (-(delta as f64) / temperature).exp();
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

/// Drives one annealing trajectory over a single [`Tour`].
///
/// The engine owns its tour, best solution, trajectory and RNG. Only the
/// [`DistanceOracle`] is shared, so independent engines can run on
/// separate threads over one oracle.
///
/// # Usage
///
/// ```
/// use std::sync::Arc;
/// use u_tsp::sa::{AnnealConfig, AnnealingEngine};
/// use u_tsp::tsp::{DistanceOracle, Point};
///
/// let points: Vec<Point> = (0..8)
///     .map(|k| Point::new((k as f64).cos() * 10.0, (k as f64).sin() * 10.0))
///     .collect();
/// let oracle = Arc::new(DistanceOracle::build(&points).unwrap());
/// let config = AnnealConfig::default()
///     .with_chain_length(20)
///     .with_max_iterations(50)
///     .with_seed(1);
/// let outcome = AnnealingEngine::new(oracle, config, None).unwrap().run().unwrap();
/// assert!(outcome.best.length <= outcome.trajectory[0].length);
/// ```
pub struct AnnealingEngine<R: Rng = StdRng> {
    config: AnnealConfig,
    tour: Tour,
    best: BestSolution,
    trajectory: Vec<TrajectoryPoint>,
    temperatures: Vec<f64>,
    stats: MoveStats,
    rng: R,
    state: EngineState,
    /// Index of the next outer iteration.
    outer: usize,
}

impl AnnealingEngine<StdRng> {
    /// Creates an engine seeded from `config.seed`.
    ///
    /// With `initial = None` the tour starts from a random shuffle drawn
    /// from the engine's own stream.
    ///
    /// # Errors
    /// Configuration errors from [`AnnealConfig::validate`], or
    /// [`Error::InvalidPermutation`](crate::Error::InvalidPermutation) for a
    /// bad initial tour.
    pub fn new(
        oracle: Arc<DistanceOracle>,
        config: AnnealConfig,
        initial: Option<Vec<usize>>,
    ) -> Result<Self> {
        let rng = rng_from_seed(config.seed);
        Self::with_rng(oracle, config, initial, rng)
    }

    /// Builds the oracle from coordinates and creates an engine.
    ///
    /// Fewer than two points yield a degenerate engine that completes
    /// immediately with a zero-length tour.
    pub fn from_coordinates(
        coordinates: &[Point],
        config: AnnealConfig,
        initial: Option<Vec<usize>>,
    ) -> Result<Self> {
        let oracle = if coordinates.len() < 2 {
            DistanceOracle::trivial(coordinates.len())
        } else {
            DistanceOracle::build(coordinates)?
        };
        Self::new(Arc::new(oracle), config, initial)
    }
}

impl<R: Rng> AnnealingEngine<R> {
    /// Creates an engine drawing from `rng`.
    ///
    /// `config.seed` is ignored; the caller controls the stream.
    pub fn with_rng(
        oracle: Arc<DistanceOracle>,
        config: AnnealConfig,
        initial: Option<Vec<usize>>,
        mut rng: R,
    ) -> Result<Self> {
        config.validate()?;
        let tour = match initial {
            Some(nodes) => Tour::new(oracle, nodes)?,
            None => Tour::random(oracle, &mut rng),
        };
        let best = BestSolution {
            tour: tour.nodes().to_vec(),
            length: tour.length(),
        };
        Ok(Self {
            config,
            tour,
            best,
            trajectory: Vec::new(),
            temperatures: Vec::new(),
            stats: MoveStats::default(),
            rng,
            state: EngineState::Initialized,
            outer: 0,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &AnnealConfig {
        &self.config
    }

    /// The live tour.
    pub fn tour(&self) -> &Tour {
        &self.tour
    }

    pub fn best(&self) -> &BestSolution {
        &self.best
    }

    pub fn trajectory(&self) -> &[TrajectoryPoint] {
        &self.trajectory
    }

    /// Temperatures used so far, one per outer iteration.
    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    pub fn stats(&self) -> MoveStats {
        self.stats
    }

    /// Outer iterations executed so far.
    pub fn outer_iterations(&self) -> usize {
        self.outer
    }

    /// Runs one outer iteration: one temperature, `chain_length` proposals.
    ///
    /// Returns `Ok(true)` while outer iterations remain. Once the engine is
    /// [`EngineState::Completed`] this is a no-op returning `Ok(false)`.
    pub fn advance(&mut self) -> Result<bool> {
        if self.state == EngineState::Completed {
            return Ok(false);
        }
        if self.tour.len() < 2 {
            self.state = EngineState::Completed;
            return Ok(false);
        }

        let n = self.outer;
        let temperature = self.config.schedule.temperature_traced(
            self.config.initial_temperature,
            n,
            &self.config.schedule_params,
            &mut self.temperatures,
        )?;

        for m in 0..self.config.chain_length {
            self.step(temperature)?;
            self.trajectory.push(TrajectoryPoint {
                iteration: n * self.config.chain_length + m,
                length: self.tour.length(),
                temperature,
            });
        }

        self.outer += 1;
        log::debug!(
            "SA outer {}: temp={:.4}, current={}, best={}",
            n,
            temperature,
            self.tour.length(),
            self.best.length
        );

        self.state = if self.outer >= self.config.max_iterations {
            EngineState::Completed
        } else {
            EngineState::Running
        };
        Ok(self.state != EngineState::Completed)
    }

    /// One proposal followed by the accept/reject decision.
    fn step(&mut self, temperature: f64) -> Result<()> {
        let applied = self.config.operator.propose(&mut self.tour, &mut self.rng)?;
        self.stats.proposed += 1;

        let accept = if applied.delta <= 0 {
            if applied.delta < 0 {
                self.stats.improving += 1;
            }
            true
        } else {
            let p = acceptance_probability(applied.delta, temperature);
            p > 0.0 && self.rng.random::<f64>() < p
        };

        if accept {
            self.stats.accepted += 1;
        } else {
            self.tour.revert(&applied)?;
            self.stats.reverted += 1;
        }

        if self.tour.length() < self.best.length {
            self.best.length = self.tour.length();
            self.best.tour.clear();
            self.best.tour.extend_from_slice(self.tour.nodes());
            log::trace!("new best {} at outer {}", self.best.length, self.outer);
        }
        Ok(())
    }

    /// Runs all remaining outer iterations and returns the outcome.
    pub fn run(self) -> Result<AnnealOutcome> {
        self.run_with_cancel(None)
    }

    /// Runs with an optional cancellation token.
    ///
    /// The flag is checked before each outer iteration; an iteration that
    /// has started always finishes.
    pub fn run_with_cancel(mut self, cancel: Option<Arc<AtomicBool>>) -> Result<AnnealOutcome> {
        log::info!(
            "SA start: {} nodes, operator={}, schedule={}, T0={}, chain={}, outer={}",
            self.tour.len(),
            self.config.operator,
            self.config.schedule,
            self.config.initial_temperature,
            self.config.chain_length,
            self.config.max_iterations
        );

        while self.state != EngineState::Completed {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) {
                    break;
                }
            }
            self.advance()?;
        }
        Ok(self.finish())
    }

    /// Freezes the engine and returns what it produced so far.
    ///
    /// Finishing before all outer iterations ran marks the outcome as
    /// cancelled.
    pub fn finish(self) -> AnnealOutcome {
        let cancelled = self.tour.len() >= 2 && self.outer < self.config.max_iterations;
        log::info!(
            "SA done: best={}, final={}, outer={}, accepted={}/{}{}",
            self.best.length,
            self.tour.length(),
            self.outer,
            self.stats.accepted,
            self.stats.proposed,
            if cancelled { " (cancelled)" } else { "" }
        );
        AnnealOutcome {
            best: self.best,
            final_length: self.tour.length(),
            final_tour: self.tour.nodes().to_vec(),
            trajectory: self.trajectory,
            temperatures: self.temperatures,
            outer_iterations: self.outer,
            stats: self.stats,
            cancelled,
        }
    }
}

/// Runs one independent trajectory per config over a shared oracle.
///
/// Each trajectory gets its own tour (a copy of `initial`, or a shuffle
/// from its own seed) and its own RNG. With the `parallel` feature the
/// trajectories run on the rayon thread pool. Results keep the order of
/// `configs`.
pub fn run_batch(
    oracle: &Arc<DistanceOracle>,
    configs: &[AnnealConfig],
    initial: Option<&[usize]>,
) -> Vec<Result<AnnealOutcome>> {
    let run_one = |config: &AnnealConfig| {
        AnnealingEngine::new(
            Arc::clone(oracle),
            config.clone(),
            initial.map(<[usize]>::to_vec),
        )
        .and_then(|engine| engine.run())
    };

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        configs.par_iter().map(run_one).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        configs.iter().map(run_one).collect()
    }
}
