//! Neighborhood operators.
//!
//! An operator draws two distinct tour positions and applies the matching
//! [`Tour`] mutation in place. The returned [`AppliedMove`] carries the
//! length delta and the undo record; whether to keep the move is up to
//! the caller.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::{Error, Result};
use crate::tsp::{AppliedMove, ChainOrder, Tour};

/// Lower bound (inclusive) of the `Hybrid` draw that selects `SwapTwo`.
const HYBRID_SWAP_FROM: f64 = 0.34;
/// Lower bound (inclusive) of the `Hybrid` draw that selects `BreakChain`.
const HYBRID_CHAIN_FROM: f64 = 0.67;

/// Tour perturbation move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NeighborhoodOperator {
    /// Move one node to just after another.
    RelocateOne,
    /// Exchange two nodes.
    #[default]
    SwapTwo,
    /// Cut into three pieces and reassemble them in a random order.
    BreakChain,
    /// One of `RelocateOne`, `SwapTwo`, `BreakChain` per proposal.
    Hybrid,
    /// Reverse the segment between two positions (2-opt). Never chosen by
    /// `Hybrid`.
    Reverse,
}

impl NeighborhoodOperator {
    pub const ALL: [NeighborhoodOperator; 5] = [
        NeighborhoodOperator::RelocateOne,
        NeighborhoodOperator::SwapTwo,
        NeighborhoodOperator::BreakChain,
        NeighborhoodOperator::Hybrid,
        NeighborhoodOperator::Reverse,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NeighborhoodOperator::RelocateOne => "relocate-one",
            NeighborhoodOperator::SwapTwo => "swap-two",
            NeighborhoodOperator::BreakChain => "break-chain",
            NeighborhoodOperator::Hybrid => "hybrid",
            NeighborhoodOperator::Reverse => "reverse",
        }
    }

    /// Concrete operator for one proposal.
    ///
    /// `Hybrid` consumes one uniform draw `u` in `[0, 1)`: `u < 0.34`
    /// relocates, `0.34 <= u < 0.67` swaps, `u >= 0.67` breaks the chain.
    /// Every other variant returns itself without touching `rng`.
    pub fn resolve<R: Rng>(self, rng: &mut R) -> NeighborhoodOperator {
        match self.pick(rng) {
            MoveKind::Relocate => NeighborhoodOperator::RelocateOne,
            MoveKind::Swap => NeighborhoodOperator::SwapTwo,
            MoveKind::Chain => NeighborhoodOperator::BreakChain,
            MoveKind::Reverse => NeighborhoodOperator::Reverse,
        }
    }

    /// Applies one random move of this kind to `tour`.
    ///
    /// # Errors
    /// [`Error::InvalidIndex`] if the tour has fewer than two nodes.
    pub fn propose<R: Rng>(self, tour: &mut Tour, rng: &mut R) -> Result<AppliedMove> {
        let kind = self.pick(rng);
        let (i, j) = distinct_pair(tour.len(), rng)?;
        match kind {
            MoveKind::Relocate => tour.relocate_one(i, j),
            MoveKind::Swap => tour.swap_two(i, j),
            MoveKind::Chain => {
                let order = ChainOrder::ALL[rng.random_range(0..ChainOrder::ALL.len())];
                tour.break_and_reorder(i, j, order)
            }
            MoveKind::Reverse => tour.reverse_segment(i, j),
        }
    }

    fn pick<R: Rng>(self, rng: &mut R) -> MoveKind {
        match self {
            NeighborhoodOperator::RelocateOne => MoveKind::Relocate,
            NeighborhoodOperator::SwapTwo => MoveKind::Swap,
            NeighborhoodOperator::BreakChain => MoveKind::Chain,
            NeighborhoodOperator::Reverse => MoveKind::Reverse,
            NeighborhoodOperator::Hybrid => hybrid_choice(rng.random::<f64>()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveKind {
    Relocate,
    Swap,
    Chain,
    Reverse,
}

fn hybrid_choice(u: f64) -> MoveKind {
    if u < HYBRID_SWAP_FROM {
        MoveKind::Relocate
    } else if u < HYBRID_CHAIN_FROM {
        MoveKind::Swap
    } else {
        MoveKind::Chain
    }
}

/// Two distinct positions drawn uniformly from `0..n`, resampling on ties.
fn distinct_pair<R: Rng>(n: usize, rng: &mut R) -> Result<(usize, usize)> {
    if n < 2 {
        return Err(Error::InvalidIndex { i: 0, j: 0, len: n });
    }
    loop {
        let i = rng.random_range(0..n);
        let j = rng.random_range(0..n);
        if i != j {
            return Ok((i, j));
        }
    }
}

impl fmt::Display for NeighborhoodOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NeighborhoodOperator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "relocate-one" | "relocate_one" | "relocate" => Ok(NeighborhoodOperator::RelocateOne),
            "swap-two" | "swap_two" | "swap" => Ok(NeighborhoodOperator::SwapTwo),
            "break-chain" | "break_chain" => Ok(NeighborhoodOperator::BreakChain),
            "hybrid" | "combined" => Ok(NeighborhoodOperator::Hybrid),
            "reverse" | "2-opt" => Ok(NeighborhoodOperator::Reverse),
            other => Err(Error::Configuration(format!("unknown operator '{other}'"))),
        }
    }
}

/// Legacy numeric operator ids: 1 relocate, 2 swap, 3 break-chain,
/// 4 hybrid, 5 reverse.
impl TryFrom<u8> for NeighborhoodOperator {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            1 => Ok(NeighborhoodOperator::RelocateOne),
            2 => Ok(NeighborhoodOperator::SwapTwo),
            3 => Ok(NeighborhoodOperator::BreakChain),
            4 => Ok(NeighborhoodOperator::Hybrid),
            5 => Ok(NeighborhoodOperator::Reverse),
            other => Err(Error::Configuration(format!("unknown operator id {other}"))),
        }
    }
}
