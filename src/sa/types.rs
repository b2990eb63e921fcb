//! Records produced by an annealing run.

/// Lifecycle of an [`AnnealingEngine`](super::AnnealingEngine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EngineState {
    /// Tour built, best seeded, nothing proposed yet.
    Initialized,
    /// At least one outer iteration done, more remaining.
    Running,
    /// All outer iterations done, or stopped early. The tour is frozen.
    Completed,
}

/// One inner step of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrajectoryPoint {
    /// `n * chain_length + m` for outer iteration `n`, inner step `m`.
    pub iteration: usize,
    /// Tour length after the accept/reject decision.
    pub length: i64,
    /// Temperature in force for this step.
    pub temperature: f64,
}

/// Shortest tour seen so far.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BestSolution {
    pub tour: Vec<usize>,
    pub length: i64,
}

/// Move counters for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MoveStats {
    /// Moves proposed (one per inner step).
    pub proposed: usize,
    /// Moves kept, including improving and neutral ones.
    pub accepted: usize,
    /// Moves with a strictly negative delta.
    pub improving: usize,
    /// Worsening moves rejected and reverted.
    pub reverted: usize,
}

impl MoveStats {
    /// Fraction of proposals that were kept.
    pub fn acceptance_ratio(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }
}

/// Final result of an annealing run.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnnealOutcome {
    /// Shortest tour seen during the run.
    pub best: BestSolution,

    /// Tour the trajectory ended on.
    pub final_tour: Vec<usize>,

    /// Length of `final_tour`.
    pub final_length: i64,

    /// One point per inner step.
    pub trajectory: Vec<TrajectoryPoint>,

    /// One temperature per outer iteration.
    pub temperatures: Vec<f64>,

    /// Outer iterations executed.
    pub outer_iterations: usize,

    pub stats: MoveStats,

    /// Whether the run was stopped before `max_iterations`.
    pub cancelled: bool,
}

impl AnnealOutcome {
    /// Best length sampled at each trajectory point, non-increasing.
    pub fn best_length_history(&self) -> Vec<i64> {
        let mut best = i64::MAX;
        self.trajectory
            .iter()
            .map(|p| {
                best = best.min(p.length);
                best
            })
            .collect()
    }
}
