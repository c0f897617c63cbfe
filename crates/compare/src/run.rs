use optima_core::Objective;
use optima_solvers::{Config, Method, SolverConfig, solve_unconstrained};

use crate::{ComparisonRecord, ComparisonTable};

#[cfg(feature = "rayon")]
use rayon::prelude::*;


/// Solves from every initial point with every method, one cell at a time.
///
/// The table holds exactly `initial_points.len() * methods.len()` records in
/// point-major order. Each cell starts from fresh solver state and its own
/// evaluation counters.
pub fn run_comparison<O, const N: usize>(
    objective: &O,
    initial_points: &[[f64; N]],
    methods: &[Method],
    config: &Config,
) -> ComparisonTable<N>
where
    O: Objective<N> + ?Sized,
{
    let records = cells(initial_points.len(), methods)
        .map(|(point_index, method)| {
            run_cell(objective, point_index, initial_points[point_index], method, config)
        })
        .collect();

    finish(records)
}

/// Runs the same matrix as [`run_comparison`] on the rayon thread pool.
///
/// Cells share only the objective, so the result is identical to the
/// sequential run, record for record and in the same order.
#[cfg(feature = "rayon")]
pub fn run_comparison_parallel<O, const N: usize>(
    objective: &O,
    initial_points: &[[f64; N]],
    methods: &[Method],
    config: &Config,
) -> ComparisonTable<N>
where
    O: Objective<N> + Sync + ?Sized,
{
    let pairs: Vec<_> = cells(initial_points.len(), methods).collect();
    let records = pairs
        .into_par_iter()
        .map(|(point_index, method)| {
            run_cell(objective, point_index, initial_points[point_index], method, config)
        })
        .collect();

    finish(records)
}

/// Every `(point index, method)` pair in point-major order.
fn cells(points: usize, methods: &[Method]) -> impl Iterator<Item = (usize, Method)> + '_ {
    (0..points).flat_map(move |point| methods.iter().map(move |&method| (point, method)))
}

fn run_cell<O, const N: usize>(
    objective: &O,
    point_index: usize,
    x0: [f64; N],
    method: Method,
    config: &Config,
) -> ComparisonRecord<N>
where
    O: Objective<N> + ?Sized,
{
    let solver_config = SolverConfig {
        tolerance: config.tolerance,
        max_iters: config.max_iters,
        ..SolverConfig::new(x0)
    }
    .with_method(method);

    let result = solve_unconstrained(objective, &solver_config);
    if let Err(error) = &result {
        log::warn!("point {point_index} with {method}: {error}");
    }

    ComparisonRecord {
        point_index,
        method,
        result,
    }
}

fn finish<const N: usize>(records: Vec<ComparisonRecord<N>>) -> ComparisonTable<N> {
    let table = ComparisonTable::new(records);
    log::info!(
        "comparison finished: {} of {} cells converged",
        table.successes(),
        table.len()
    );
    table
}
