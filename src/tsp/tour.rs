//! Closed tour with an incrementally maintained length.
//!
//! Every mutation prices only the edges whose endpoints change:
//!
//! - [`Tour::swap_two`]: up to four edges, O(1)
//! - [`Tour::relocate_one`]: six edges priced in O(1), O(n) array shift
//! - [`Tour::reverse_segment`]: two boundary edges, O(segment) reversal
//! - [`Tour::break_and_reorder`]: up to six junction edges, O(n) splice
//!
//! Each mutation returns an [`AppliedMove`] that [`Tour::revert`] undoes
//! exactly, restoring both the node order and the cached length.

use std::sync::Arc;

use rand::Rng;

use super::distance::{check_permutation, DistanceOracle};
use crate::error::{Error, Result};
use crate::random::shuffle;

/// How [`Tour::break_and_reorder`] reassembles the pieces
/// `A = [0, i)`, `B = [i, j)`, `C = [j, N)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChainOrder {
    /// `A·C·B`
    SwapTail,
    /// `B·A·C`
    SwapHead,
    /// `C·B·A`
    SwapOuter,
}

impl ChainOrder {
    pub const ALL: [ChainOrder; 3] = [
        ChainOrder::SwapTail,
        ChainOrder::SwapHead,
        ChainOrder::SwapOuter,
    ];

    /// Piece ranges in their new order, given `A`, `B`, `C`.
    fn arrange(self, a: Piece, b: Piece, c: Piece) -> [Piece; 3] {
        match self {
            ChainOrder::SwapTail => [a, c, b],
            ChainOrder::SwapHead => [b, a, c],
            ChainOrder::SwapOuter => [c, b, a],
        }
    }

    /// Split points that undo this reordering of a tour of `n` nodes
    /// split at `(i, j)`. Each order is its own inverse under new splits.
    fn inverse_splits(self, i: usize, j: usize, n: usize) -> (usize, usize) {
        match self {
            ChainOrder::SwapTail => (i, i + n - j),
            ChainOrder::SwapHead => (j - i, j),
            ChainOrder::SwapOuter => (n - j, n - i),
        }
    }
}

type Piece = (usize, usize);

/// Shape of a committed mutation, with what is needed to undo it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    /// Node moved from `from` to just after the node at `to`; it now sits
    /// at `inserted_at`.
    Relocate {
        from: usize,
        to: usize,
        inserted_at: usize,
    },
    Swap { i: usize, j: usize },
    /// Closed range `[i, j]` reversed, `i < j`.
    Reverse { i: usize, j: usize },
    /// Split at `i <= j` and reassembled in `order`. Mutations always
    /// record `i < j`; the inverse of one may have an empty piece.
    Reorder { i: usize, j: usize, order: ChainOrder },
}

/// A mutation already applied to a [`Tour`] and its length change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMove {
    pub kind: Move,
    /// `length_after - length_before`.
    pub delta: i64,
}

/// A permutation of nodes `1..=N` visited as a closed cycle.
///
/// Invariants held between calls:
/// - the order is a permutation of `1..=N`
/// - `length()` equals the length recomputed from the order
///
/// A failed mutation leaves the tour untouched.
#[derive(Debug, Clone)]
pub struct Tour {
    oracle: Arc<DistanceOracle>,
    order: Vec<usize>,
    /// `position[node - 1]` is the index of `node` in `order`.
    position: Vec<usize>,
    length: i64,
}

impl Tour {
    /// Creates a tour visiting `nodes` in the given order.
    ///
    /// # Errors
    /// [`Error::InvalidPermutation`] if `nodes` is not a permutation of
    /// `1..=N`, where `N` is the oracle size.
    pub fn new(oracle: Arc<DistanceOracle>, nodes: Vec<usize>) -> Result<Self> {
        check_permutation(&nodes, oracle.len())?;
        Ok(Self::from_order(oracle, nodes))
    }

    /// Creates a tour over all nodes in a uniformly random order.
    pub fn random<R: Rng>(oracle: Arc<DistanceOracle>, rng: &mut R) -> Self {
        let mut nodes: Vec<usize> = (1..=oracle.len()).collect();
        shuffle(&mut nodes, rng);
        Self::from_order(oracle, nodes)
    }

    fn from_order(oracle: Arc<DistanceOracle>, order: Vec<usize>) -> Self {
        let mut position = vec![0; order.len()];
        for (idx, &node) in order.iter().enumerate() {
            position[node - 1] = idx;
        }
        let length = oracle.cycle_length(&order);
        Self {
            oracle,
            order,
            position,
            length,
        }
    }

    /// Cached closed-tour length. O(1).
    #[inline]
    pub fn length(&self) -> i64 {
        self.length
    }

    /// Full O(n) length recomputation against `oracle`.
    pub fn recompute_length(&self, oracle: &DistanceOracle) -> i64 {
        oracle.cycle_length(&self.order)
    }

    /// Node ids in visiting order.
    pub fn nodes(&self) -> &[usize] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn oracle(&self) -> &Arc<DistanceOracle> {
        &self.oracle
    }

    /// Index of `node` in the visiting order.
    pub fn position_of(&self, node: usize) -> Option<usize> {
        node.checked_sub(1)
            .and_then(|k| self.position.get(k))
            .copied()
    }

    /// Node visited right after `node`, wrapping around.
    pub fn successor(&self, node: usize) -> Option<usize> {
        self.position_of(node)
            .map(|idx| self.order[self.next_index(idx)])
    }

    /// Node visited right before `node`, wrapping around.
    pub fn predecessor(&self, node: usize) -> Option<usize> {
        self.position_of(node)
            .map(|idx| self.order[self.prev_index(idx)])
    }

    /// Removes the node at `from_index` and reinserts it right after the
    /// node that sat at `to_index` before the removal.
    ///
    /// # Errors
    /// [`Error::InvalidIndex`] if an index is out of range or they are equal.
    pub fn relocate_one(&mut self, from_index: usize, to_index: usize) -> Result<AppliedMove> {
        self.check_pair(from_index, to_index)?;

        let inserted_at = if to_index > from_index {
            to_index
        } else {
            to_index + 1
        };
        let delta = self.shift_delta(from_index, inserted_at);
        self.shift(from_index, inserted_at);
        self.length += delta;

        Ok(AppliedMove {
            kind: Move::Relocate {
                from: from_index,
                to: to_index,
                inserted_at,
            },
            delta,
        })
    }

    /// Exchanges the nodes at positions `i` and `j`.
    ///
    /// # Errors
    /// [`Error::InvalidIndex`] if an index is out of range or they are equal.
    pub fn swap_two(&mut self, i: usize, j: usize) -> Result<AppliedMove> {
        self.check_pair(i, j)?;

        let mut edges = [self.prev_index(i), i, self.prev_index(j), j];
        let before = self.touched_cost(&mut edges);
        self.exchange(i, j);
        let after = self.touched_cost(&mut edges);

        let delta = after - before;
        self.length += delta;
        Ok(AppliedMove {
            kind: Move::Swap { i, j },
            delta,
        })
    }

    /// Reverses the closed range between `i` and `j` (in either order).
    ///
    /// Interior edges keep their cost under reversal, so only the two
    /// boundary edges are priced.
    ///
    /// # Errors
    /// [`Error::InvalidIndex`] if an index is out of range or they are equal.
    pub fn reverse_segment(&mut self, i: usize, j: usize) -> Result<AppliedMove> {
        self.check_pair(i, j)?;
        let (lo, hi) = ordered(i, j);

        let mut edges = [self.prev_index(lo), hi];
        let before = self.touched_cost(&mut edges);
        self.reverse_range(lo, hi);
        let after = self.touched_cost(&mut edges);

        let delta = after - before;
        self.length += delta;
        Ok(AppliedMove {
            kind: Move::Reverse { i: lo, j: hi },
            delta,
        })
    }

    /// Splits the tour at `i < j` (in either order) into `A = [0, i)`,
    /// `B = [i, j)`, `C = [j, N)` and reassembles the pieces in `order`.
    ///
    /// Pieces keep their orientation, so only the junction edges between
    /// consecutive pieces change.
    ///
    /// # Errors
    /// [`Error::InvalidIndex`] if an index is out of range or they are equal.
    pub fn break_and_reorder(
        &mut self,
        i: usize,
        j: usize,
        order: ChainOrder,
    ) -> Result<AppliedMove> {
        self.check_pair(i, j)?;
        let (lo, hi) = ordered(i, j);
        Ok(self.reorder_at(lo, hi, order))
    }

    /// Applies the inverse of `applied` and returns it as a new move.
    ///
    /// When `applied` is the most recent mutation of this tour, the node
    /// order and the cached length return exactly to their prior state.
    /// The inverse is priced from the current edges rather than taken from
    /// `applied.delta`, so a stale record still leaves the tour a valid,
    /// correctly priced permutation. Reverting the returned move redoes
    /// `applied`.
    ///
    /// # Errors
    /// [`Error::InvalidIndex`] if the record's positions do not fit this
    /// tour. The tour is left untouched.
    pub fn revert(&mut self, applied: &AppliedMove) -> Result<AppliedMove> {
        let n = self.order.len();
        match applied.kind {
            Move::Relocate {
                from, inserted_at, ..
            } => {
                self.check_pair(inserted_at, from)?;
                let delta = self.shift_delta(inserted_at, from);
                let to = self.follows_after_shift(inserted_at, from);
                self.shift(inserted_at, from);
                self.length += delta;
                Ok(AppliedMove {
                    kind: Move::Relocate {
                        from: inserted_at,
                        to,
                        inserted_at: from,
                    },
                    delta,
                })
            }
            Move::Swap { i, j } => self.swap_two(i, j),
            Move::Reverse { i, j } => self.reverse_segment(i, j),
            Move::Reorder { i, j, order } => {
                if i > j || j > n {
                    return Err(Error::InvalidIndex { i, j, len: n });
                }
                let (i, j) = order.inverse_splits(i, j, n);
                Ok(self.reorder_at(i, j, order))
            }
        }
    }

    // ---- internals ----

    fn check_pair(&self, i: usize, j: usize) -> Result<()> {
        let len = self.order.len();
        if i >= len || j >= len || i == j {
            return Err(Error::InvalidIndex { i, j, len });
        }
        Ok(())
    }

    /// Length change of moving the node at `from` so it ends up at `target`.
    fn shift_delta(&self, from: usize, target: usize) -> i64 {
        let x = self.order[from];
        let p = self.order[self.prev_index(from)];
        let s = self.order[self.next_index(from)];
        let y = self.order[self.follows_after_shift(from, target)];
        let z = self.order[self.precedes_after_shift(from, target)];

        let d = |a: usize, b: usize| self.oracle.distance(a, b);
        d(p, s) - d(p, x) - d(x, s) + d(y, x) + d(x, z) - d(y, z)
    }

    /// Current index of the node that will sit right before the moved one.
    fn follows_after_shift(&self, from: usize, target: usize) -> usize {
        let rest = if target == 0 {
            self.order.len() - 2
        } else {
            target - 1
        };
        skip_index(rest, from)
    }

    /// Current index of the node that will sit right after the moved one.
    fn precedes_after_shift(&self, from: usize, target: usize) -> usize {
        let rest = if target + 1 == self.order.len() {
            0
        } else {
            target
        };
        skip_index(rest, from)
    }

    /// Reassembles `[0, lo)`, `[lo, hi)`, `[hi, N)` in `order`, for any
    /// `lo <= hi <= N`.
    fn reorder_at(&mut self, lo: usize, hi: usize, order: ChainOrder) -> AppliedMove {
        let n = self.order.len();
        let (a, b, c) = ((0, lo), (lo, hi), (hi, n));
        let before = self.junction_cost(&[a, b, c]);
        let after = self.junction_cost(&order.arrange(a, b, c));
        self.splice(lo, hi, order);

        let delta = after - before;
        self.length += delta;
        AppliedMove {
            kind: Move::Reorder { i: lo, j: hi, order },
            delta,
        }
    }

    #[inline]
    fn next_index(&self, idx: usize) -> usize {
        if idx + 1 == self.order.len() {
            0
        } else {
            idx + 1
        }
    }

    #[inline]
    fn prev_index(&self, idx: usize) -> usize {
        if idx == 0 {
            self.order.len() - 1
        } else {
            idx - 1
        }
    }

    /// Cost of the edge leaving position `k`.
    #[inline]
    fn edge_cost(&self, k: usize) -> i64 {
        self.oracle
            .distance(self.order[k], self.order[self.next_index(k)])
    }

    /// Sum of the distinct edges listed by starting position.
    fn touched_cost(&self, edges: &mut [usize]) -> i64 {
        edges.sort_unstable();
        let mut total = 0;
        let mut last = None;
        for &k in edges.iter() {
            if last != Some(k) {
                total += self.edge_cost(k);
                last = Some(k);
            }
        }
        total
    }

    /// Cost of the edges joining consecutive non-empty pieces, cyclically.
    fn junction_cost(&self, pieces: &[Piece]) -> i64 {
        let filled: Vec<Piece> = pieces.iter().copied().filter(|&(s, e)| s < e).collect();
        let m = filled.len();
        (0..m)
            .map(|k| {
                let last = self.order[filled[k].1 - 1];
                let first = self.order[filled[(k + 1) % m].0];
                self.oracle.distance(last, first)
            })
            .sum()
    }

    fn exchange(&mut self, i: usize, j: usize) {
        self.order.swap(i, j);
        self.position[self.order[i] - 1] = i;
        self.position[self.order[j] - 1] = j;
    }

    /// Moves the element at `from` so that it ends up at index `to`.
    fn shift(&mut self, from: usize, to: usize) {
        let node = self.order.remove(from);
        self.order.insert(to, node);
        let (lo, hi) = ordered(from, to);
        self.reindex(lo, hi + 1);
    }

    fn reverse_range(&mut self, lo: usize, hi: usize) {
        self.order[lo..=hi].reverse();
        self.reindex(lo, hi + 1);
    }

    fn splice(&mut self, lo: usize, hi: usize, order: ChainOrder) {
        let n = self.order.len();
        let mut next = Vec::with_capacity(n);
        for (s, e) in order.arrange((0, lo), (lo, hi), (hi, n)) {
            next.extend_from_slice(&self.order[s..e]);
        }
        self.order = next;
        self.reindex(0, n);
    }

    fn reindex(&mut self, start: usize, end: usize) {
        for idx in start..end {
            self.position[self.order[idx] - 1] = idx;
        }
    }
}

/// Index in the full order of entry `k` of the order with `removed` taken out.
#[inline]
fn skip_index(k: usize, removed: usize) -> usize {
    if k < removed {
        k
    } else {
        k + 1
    }
}

#[inline]
fn ordered(i: usize, j: usize) -> (usize, usize) {
    if i <= j {
        (i, j)
    } else {
        (j, i)
    }
}
