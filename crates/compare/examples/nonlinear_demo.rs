//! Solves the Rosenbrock function with every solver family and compares the
//! unconstrained methods across several starting points.
//!
//! Run with:
//!
//! ```text
//! cargo run -p optima-compare --example nonlinear_demo
//! ```
//!
//! Set `OPTIMA_LOG=debug` to see per-iteration records.

use std::error::Error;

use env_logger::{Builder, Env};
use optima_compare::run_comparison_parallel;
use optima_core::{Bounds, Constraint, ConstraintSet, functions::Rosenbrock};
use optima_observers::History;
use optima_solvers::{
    Config, Method, SolverConfig, constrained::slsqp, solve_global, solve_unconstrained,
    unconstrained::bfgs,
};

fn main() -> Result<(), Box<dyn Error>> {
    Builder::from_env(Env::new().filter_or("OPTIMA_LOG", "info")).init();

    unconstrained()?;
    constrained()?;
    global()?;
    compare();
    Ok(())
}

// --- Unconstrained -----------------------------------------------------------

fn unconstrained() -> Result<(), Box<dyn Error>> {
    println!("=== Unconstrained ===");
    let rosenbrock = Rosenbrock::default();

    for method in Method::ALL {
        let config = SolverConfig::new([0.0, 0.0]).with_method(method);
        let solution = solve_unconstrained(&rosenbrock, &config)?;
        println!(
            "{method:<12} x = [{:.6}, {:.6}]  f = {:.6e}  iters = {}  nfev = {}  {:?}",
            solution.x[0],
            solution.x[1],
            solution.objective,
            solution.iters,
            solution.func_evals,
            solution.status,
        );
    }

    let mut history = History::new();
    bfgs::minimize(
        &rosenbrock,
        [0.0, 0.0],
        &Config::default(),
        &bfgs::Options::default(),
        &mut history,
    )?;
    println!(
        "BFGS objective went from {:.3e} to {:.3e} in {} iterations",
        history.objectives().next().unwrap_or(f64::NAN),
        history.best().unwrap_or(f64::NAN),
        history.len(),
    );
    Ok(())
}

// --- Constrained -------------------------------------------------------------

fn constrained() -> Result<(), Box<dyn Error>> {
    println!("\n=== Constrained (SLSQP) ===");

    let line = |x: &[f64; 2]| x[0] + x[1] - 1.0;
    let disk = |x: &[f64; 2]| 2.0 - (x[0] * x[0] + x[1] * x[1]);
    let constraints = ConstraintSet::new()
        .equality(Constraint::with_gradient(line, |_| [1.0, 1.0]))
        .inequality(Constraint::with_gradient(disk, |x| [-2.0 * x[0], -2.0 * x[1]]))
        .bounds(Bounds::uniform(-2.0, 2.0)?);

    let solution = slsqp::minimize_unobserved(
        &Rosenbrock::default(),
        [0.5, 0.5],
        &constraints,
        &Config::default(),
        &slsqp::Options::default(),
    )?;

    println!("x = [{:.6}, {:.6}]  f = {:.6}", solution.x[0], solution.x[1], solution.objective);
    println!("  x + y - 1      = {:.6e} (should be 0)", line(&solution.x));
    println!("  2 - x^2 - y^2  = {:.6e} (should be >= 0)", disk(&solution.x));
    println!("  status         = {:?}", solution.status);
    Ok(())
}

// --- Global ------------------------------------------------------------------

fn global() -> Result<(), Box<dyn Error>> {
    println!("\n=== Global (differential evolution) ===");

    let config = SolverConfig {
        seed: Some(42),
        ..SolverConfig::new([0.0, 0.0])
    };
    let solution = solve_global(&Rosenbrock::default(), &Bounds::uniform(-2.0, 2.0)?, &config)?;

    println!(
        "x = [{:.6}, {:.6}]  f = {:.6e}  generations = {}  nfev = {}",
        solution.x[0], solution.x[1], solution.objective, solution.iters, solution.func_evals,
    );
    Ok(())
}

// --- Comparison --------------------------------------------------------------

fn compare() {
    println!("\n=== Method comparison ===");

    let starts = [[0.0, 0.0], [-1.0, 1.0], [2.0, 2.0], [0.5, 1.5]];
    let config = Config::default();
    let table = run_comparison_parallel(&Rosenbrock::default(), &starts, &Method::ALL, &config);

    let mut current = None;
    for record in &table {
        if current != Some(record.point_index) {
            current = Some(record.point_index);
            let [x, y] = starts[record.point_index];
            println!("\nstart {}: [{x}, {y}]", record.point_index + 1);
        }
        match &record.result {
            Ok(s) => println!(
                "  {:<12} f = {:8.4}  iters = {:4}  nfev = {:5}  success = {}",
                record.method,
                s.objective,
                s.iters,
                s.func_evals,
                s.success(),
            ),
            Err(error) => println!("  {:<12} failed: {error}", record.method),
        }
    }

    println!("\n{} of {} runs converged", table.successes(), table.len());
}
