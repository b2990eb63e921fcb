//! Property and end-to-end tests for the annealing core.

use std::sync::Arc;

use proptest::prelude::*;
use rand::RngCore;
use u_tsp::sa::{
    acceptance_probability, run_batch, AnnealConfig, AnnealingEngine, CoolingSchedule,
    NeighborhoodOperator,
};
use u_tsp::tsp::{ChainOrder, DistanceOracle, Move, Point, Tour};
use u_tsp::Error;

/// Replays a fixed list of uniform `[0, 1)` draws.
struct ScriptedRng {
    draws: Vec<f64>,
    next: usize,
}

impl ScriptedRng {
    fn new(draws: &[f64]) -> Self {
        Self {
            draws: draws.to_vec(),
            next: 0,
        }
    }
}

impl RngCore for ScriptedRng {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let u = self.draws[self.next % self.draws.len()];
        self.next += 1;
        // f64 sampling keeps the top 53 bits.
        ((u * (1u64 << 53) as f64) as u64) << 11
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

fn is_permutation(nodes: &[usize]) -> bool {
    let mut sorted = nodes.to_vec();
    sorted.sort_unstable();
    sorted.iter().copied().eq(1..=nodes.len())
}

fn circle(n: usize, radius: f64) -> Vec<Point> {
    (0..n)
        .map(|k| {
            let a = std::f64::consts::TAU * k as f64 / n as f64;
            Point::new(radius * a.cos(), radius * a.sin())
        })
        .collect()
}

fn points_strategy() -> impl Strategy<Value = Vec<Point>> {
    prop::collection::vec((0.0..1000.0f64, 0.0..1000.0f64), 2..40)
        .prop_map(|v| v.into_iter().map(Point::from).collect())
}

fn moves_strategy() -> impl Strategy<Value = Vec<(u8, usize, usize, usize)>> {
    prop::collection::vec((0u8..4, 0usize..1000, 0usize..1000, 0usize..3), 1..60)
}

fn apply(
    tour: &mut Tour,
    (kind, i, j, order): (u8, usize, usize, usize),
) -> u_tsp::Result<u_tsp::tsp::AppliedMove> {
    let n = tour.len();
    let (i, j) = (i % n, j % n);
    match kind {
        0 => tour.relocate_one(i, j),
        1 => tour.swap_two(i, j),
        2 => tour.reverse_segment(i, j),
        _ => tour.break_and_reorder(i, j, ChainOrder::ALL[order]),
    }
}

proptest! {
    #[test]
    fn prop_mutations_keep_permutation_and_length(
        points in points_strategy(),
        moves in moves_strategy(),
    ) {
        let oracle = DistanceOracle::build(&points);
        prop_assume!(oracle.is_ok());
        let oracle = Arc::new(oracle.unwrap());
        let n = oracle.len();
        let mut tour = Tour::new(oracle.clone(), (1..=n).collect()).unwrap();

        for mv in moves {
            let before = tour.nodes().to_vec();
            let length = tour.length();
            match apply(&mut tour, mv) {
                Ok(applied) => {
                    prop_assert_eq!(tour.length(), length + applied.delta);
                }
                Err(err) => {
                    let is_index_error = matches!(err, Error::InvalidIndex { .. });
                    prop_assert!(is_index_error);
                    prop_assert_eq!(tour.nodes(), before.as_slice());
                    prop_assert_eq!(tour.length(), length);
                }
            }
            prop_assert!(is_permutation(tour.nodes()));
            prop_assert_eq!(tour.length(), tour.recompute_length(&oracle));
        }
    }

    #[test]
    fn prop_revert_is_exact(
        points in points_strategy(),
        moves in moves_strategy(),
    ) {
        let oracle = DistanceOracle::build(&points);
        prop_assume!(oracle.is_ok());
        let oracle = Arc::new(oracle.unwrap());
        let n = oracle.len();
        let mut tour = Tour::new(oracle, (1..=n).rev().collect()).unwrap();

        for mv in moves {
            let before = tour.nodes().to_vec();
            let length = tour.length();
            if let Ok(applied) = apply(&mut tour, mv) {
                tour.revert(&applied).unwrap();
                prop_assert_eq!(tour.nodes(), before.as_slice());
                prop_assert_eq!(tour.length(), length);
                // Commit it for the next round.
                apply(&mut tour, mv).unwrap();
            }
        }
    }

    #[test]
    fn prop_reversal_prices_only_boundary_edges(
        points in prop::collection::vec((0.0..500.0f64, 0.0..500.0f64), 5..30),
        i in 0usize..1000,
        j in 0usize..1000,
    ) {
        let points: Vec<Point> = points.into_iter().map(Point::from).collect();
        let oracle = DistanceOracle::build(&points);
        prop_assume!(oracle.is_ok());
        let oracle = Arc::new(oracle.unwrap());
        let n = oracle.len();
        let (i, j) = (i % n, j % n);
        prop_assume!(i != j);
        let (lo, hi) = (i.min(j), i.max(j));

        let mut tour = Tour::new(oracle.clone(), (1..=n).collect()).unwrap();
        let nodes = tour.nodes().to_vec();
        let d = |a: usize, b: usize| oracle.distance(nodes[a], nodes[b]);
        let prev = (lo + n - 1) % n;
        let next = (hi + 1) % n;
        let boundary_delta = if prev == hi {
            0
        } else {
            d(prev, hi) + d(lo, next) - d(prev, lo) - d(hi, next)
        };

        let before = tour.recompute_length(&oracle);
        let applied = tour.reverse_segment(i, j).unwrap();
        let after = tour.recompute_length(&oracle);
        prop_assert_eq!(applied.delta, after - before);
        prop_assert_eq!(applied.delta, boundary_delta);
    }

    #[test]
    fn prop_acceptance_probability_in_unit_interval(
        delta in -1_000_000i64..1_000_000,
        temperature in 0.0..1e6f64,
    ) {
        let p = acceptance_probability(delta, temperature);
        prop_assert!((0.0..=1.0).contains(&p));
        if delta <= 0 {
            prop_assert_eq!(p, 1.0);
        }
    }

    #[test]
    fn prop_schedules_non_increasing(
        t0 in 0.1..1000.0f64,
        param in 0.01..10.0f64,
        n in 1usize..100_000,
    ) {
        for schedule in CoolingSchedule::ALL {
            let params = [param];
            let now = schedule.temperature(t0, n, &params).unwrap();
            let later = schedule.temperature(t0, n + 1, &params).unwrap();
            prop_assert!(later <= now, "{} rose at {}: {} > {}", schedule, n, later, now);
        }
    }
}

#[test]
fn test_best_length_never_increases() {
    let points: Vec<Point> = (0..25)
        .map(|k| Point::new((k * 37 % 101) as f64, (k * 53 % 89) as f64))
        .collect();
    let oracle = Arc::new(DistanceOracle::build(&points).unwrap());
    for op in NeighborhoodOperator::ALL {
        let config = AnnealConfig::default()
            .with_initial_temperature(30.0)
            .with_operator(op)
            .with_chain_length(40)
            .with_max_iterations(60)
            .with_seed(2024);
        let mut engine = AnnealingEngine::new(oracle.clone(), config, None).unwrap();
        let mut best = engine.best().length;
        while engine.advance().unwrap() {
            assert!(engine.best().length <= best, "{op}");
            best = engine.best().length;
            let min_seen = engine.trajectory().iter().map(|p| p.length).min().unwrap();
            assert!(best <= min_seen);
            assert!(is_permutation(engine.tour().nodes()));
            assert_eq!(
                engine.tour().length(),
                engine.tour().recompute_length(&oracle)
            );
        }
        let history = engine.finish().best_length_history();
        assert!(history.windows(2).all(|w| w[1] <= w[0]));
    }
}

#[test]
fn test_unit_square_reaches_optimum() {
    let square = [
        Point::new(0.0, 0.0),
        Point::new(0.0, 1.0),
        Point::new(1.0, 1.0),
        Point::new(1.0, 0.0),
    ];
    let config = AnnealConfig::default()
        .with_initial_temperature(10.0)
        .with_schedule(CoolingSchedule::Logarithmic, vec![1.0])
        .with_operator(NeighborhoodOperator::SwapTwo)
        .with_chain_length(50)
        .with_max_iterations(200)
        .with_seed(7);
    let outcome = AnnealingEngine::from_coordinates(&square, config, None)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(outcome.best.length, 4);
    assert!(is_permutation(&outcome.best.tour));
}

#[test]
fn test_swap_and_hybrid_find_convex_tour() {
    let o = Arc::new(DistanceOracle::build(&circle(10, 100.0)).unwrap());
    let optimum = o.tour_length(&(1..=10).collect::<Vec<_>>()).unwrap();
    assert_eq!(optimum, 620);

    for op in [NeighborhoodOperator::SwapTwo, NeighborhoodOperator::Hybrid] {
        let configs: Vec<AnnealConfig> = (0..4)
            .map(|seed| {
                AnnealConfig::default()
                    .with_initial_temperature(200.0)
                    .with_schedule(CoolingSchedule::Exponential, vec![0.01])
                    .with_operator(op)
                    .with_chain_length(200)
                    .with_max_iterations(1000)
                    .with_seed(seed)
            })
            .collect();
        let outcomes: Vec<_> = run_batch(&o, &configs, None)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        let best = outcomes.iter().map(|out| out.best.length).min().unwrap();
        assert_eq!(best, optimum, "{op}: best {best} vs optimum {optimum}");
        for out in &outcomes {
            assert!(out.best.length <= out.trajectory[0].length);
            assert_eq!(o.tour_length(&out.best.tour).unwrap(), out.best.length);
        }
    }
}

#[test]
fn test_single_node_is_zero_length() {
    let config = AnnealConfig::default().with_seed(1);
    let outcome = AnnealingEngine::from_coordinates(&[Point::new(5.0, 5.0)], config, None)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(outcome.best.length, 0);
    assert_eq!(outcome.final_length, 0);
    assert_eq!(outcome.stats.proposed, 0);
    assert_eq!(outcome.outer_iterations, 0);
}

#[test]
fn test_hybrid_dispatch_thresholds() {
    let mut rng = ScriptedRng::new(&[0.1, 0.5, 0.9]);
    let picked: Vec<NeighborhoodOperator> = (0..3)
        .map(|_| NeighborhoodOperator::Hybrid.resolve(&mut rng))
        .collect();
    assert_eq!(
        picked,
        vec![
            NeighborhoodOperator::RelocateOne,
            NeighborhoodOperator::SwapTwo,
            NeighborhoodOperator::BreakChain,
        ]
    );
}

#[test]
fn test_hybrid_propose_follows_draws() {
    let o = Arc::new(DistanceOracle::build(&circle(10, 100.0)).unwrap());
    // Hybrid draw, then two positions (0 and 9), then the chain order.
    let cases = [
        (
            0.1,
            Move::Relocate {
                from: 0,
                to: 9,
                inserted_at: 9,
            },
        ),
        (0.5, Move::Swap { i: 0, j: 9 }),
        (
            0.9,
            Move::Reorder {
                i: 0,
                j: 9,
                order: ChainOrder::SwapHead,
            },
        ),
    ];
    for (u, expected) in cases {
        let mut tour = Tour::new(o.clone(), (1..=10).collect()).unwrap();
        let mut rng = ScriptedRng::new(&[u, 0.05, 0.95, 0.5]);
        let applied = NeighborhoodOperator::Hybrid
            .propose(&mut tour, &mut rng)
            .unwrap();
        assert_eq!(applied.kind, expected, "draw {u}");
        assert_eq!(tour.length(), tour.recompute_length(&o));
    }
}

#[test]
fn test_logarithmic_schedule_values() {
    let schedule = CoolingSchedule::Logarithmic;
    let params = [1.0];
    assert_eq!(schedule.temperature(50.0, 0, &params).unwrap(), 50.0);
    let t1 = schedule.temperature(50.0, 1, &params).unwrap();
    assert!((t1 - 50.0 / 2f64.ln()).abs() < 1e-9);
    assert!((t1 - 72.13).abs() < 0.01);
    let t10 = schedule.temperature(50.0, 10, &params).unwrap();
    assert!((t10 - 50.0 / 11f64.ln()).abs() < 1e-9);
    assert!((t10 - 20.86).abs() < 0.02);
}

#[test]
fn test_injected_rng_drives_engine() {
    let points: Vec<Point> = (0..6).map(|k| Point::new(k as f64 * 10.0, 0.0)).collect();
    let oracle = Arc::new(DistanceOracle::build(&points).unwrap());
    let config = AnnealConfig::default()
        .with_chain_length(5)
        .with_max_iterations(4);
    let rng = ScriptedRng::new(&[0.05, 0.45, 0.85, 0.25, 0.65]);
    let outcome = AnnealingEngine::with_rng(oracle.clone(), config, None, rng)
        .unwrap()
        .run()
        .unwrap();
    assert_eq!(outcome.trajectory.len(), 20);
    assert_eq!(
        oracle.tour_length(&outcome.final_tour).unwrap(),
        outcome.final_length
    );
}
