//! Precomputed pairwise distances.

use crate::error::{Error, Result};

/// A node location in the plane.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Symmetric matrix of rounded Euclidean distances between nodes `1..=N`.
///
/// Each entry is the Euclidean norm rounded half-to-even to an integer,
/// the cost metric used for all tour length accounting. Incremental
/// deltas and full recomputation therefore agree exactly.
#[derive(Debug, Clone)]
pub struct DistanceOracle {
    n: usize,
    matrix: Vec<i64>,
}

impl DistanceOracle {
    /// Builds the oracle from coordinates, where `coordinates[k]` belongs
    /// to node `k + 1`.
    ///
    /// # Errors
    /// [`Error::InvalidInput`] if fewer than two distinct points are given
    /// or a coordinate is not finite.
    pub fn build(coordinates: &[Point]) -> Result<Self> {
        if let Some(k) = coordinates
            .iter()
            .position(|p| !p.x.is_finite() || !p.y.is_finite())
        {
            return Err(Error::InvalidInput(format!(
                "coordinate of node {} is not finite",
                k + 1
            )));
        }
        let distinct = match coordinates.split_first() {
            Some((first, rest)) => rest.iter().any(|p| p != first),
            None => false,
        };
        if !distinct {
            return Err(Error::InvalidInput(format!(
                "need at least 2 distinct coordinates, got {} points",
                coordinates.len()
            )));
        }

        let n = coordinates.len();
        let mut matrix = vec![0i64; n * n];
        for a in 0..n {
            for b in (a + 1)..n {
                let d = round_metric(coordinates[a].distance(&coordinates[b]));
                matrix[a * n + b] = d;
                matrix[b * n + a] = d;
            }
        }
        Ok(Self { n, matrix })
    }

    /// Zero-distance oracle for instances with fewer than two nodes.
    pub(crate) fn trivial(n: usize) -> Self {
        Self {
            n,
            matrix: vec![0; n * n],
        }
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Rounded distance between nodes `a` and `b` (1-based ids).
    ///
    /// # Panics
    /// Panics if either id is outside `1..=N`.
    #[inline]
    pub fn distance(&self, a: usize, b: usize) -> i64 {
        assert!(
            (1..=self.n).contains(&a) && (1..=self.n).contains(&b),
            "node id out of range"
        );
        self.matrix[(a - 1) * self.n + (b - 1)]
    }

    /// Closed-tour length of an arbitrary node sequence.
    ///
    /// Used to price tours that come from outside the engine, such as a
    /// known-optimal tour.
    ///
    /// # Errors
    /// [`Error::InvalidPermutation`] if `nodes` is not a permutation of `1..=N`.
    pub fn tour_length(&self, nodes: &[usize]) -> Result<i64> {
        check_permutation(nodes, self.n)?;
        Ok(self.cycle_length(nodes))
    }

    /// Closed-tour length without validation.
    pub(crate) fn cycle_length(&self, nodes: &[usize]) -> i64 {
        match nodes.len() {
            0 | 1 => 0,
            len => (0..len)
                .map(|k| self.distance(nodes[k], nodes[(k + 1) % len]))
                .sum(),
        }
    }
}

/// Relative excess of `length` over a known optimum, e.g. `0.05` for 5%.
///
/// Returns `0.0` when the optimum is zero.
pub fn optimality_gap(length: i64, optimum: i64) -> f64 {
    if optimum == 0 {
        return 0.0;
    }
    (length - optimum) as f64 / optimum as f64
}

/// Checks that `nodes` holds each id in `1..=n` exactly once.
pub(crate) fn check_permutation(nodes: &[usize], n: usize) -> Result<()> {
    if nodes.len() != n {
        return Err(Error::InvalidPermutation(format!(
            "expected {n} nodes, got {}",
            nodes.len()
        )));
    }
    let mut seen = vec![false; n];
    for &node in nodes {
        if node == 0 || node > n {
            return Err(Error::InvalidPermutation(format!(
                "node {node} outside 1..={n}"
            )));
        }
        if std::mem::replace(&mut seen[node - 1], true) {
            return Err(Error::InvalidPermutation(format!("duplicate node {node}")));
        }
    }
    Ok(())
}

// Ties round to even.
fn round_metric(d: f64) -> i64 {
    d.round_ties_even() as i64
}
