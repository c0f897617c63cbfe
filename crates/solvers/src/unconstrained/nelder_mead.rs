//! Nelder–Mead downhill simplex.
//!
//! Derivative-free: the solver only compares objective values at the `N + 1`
//! vertices of a simplex, which it reflects, expands, contracts, or shrinks
//! toward the best vertex.
//!
//! The initial simplex is `x0` plus one vertex per coordinate, perturbed by
//! 5% of that coordinate (or by `0.00025` when the coordinate is zero).
//!
//! Converged when the spread of vertex values about the best is at most the
//! tolerance and every vertex lies within `x_tol` of the best in every
//! coordinate.

use optima_core::{Objective, Observer};

use crate::{
    Action, Config, ConfigError, Error, Event, Solution, Status, error::check_start,
    evaluate::Evaluator,
};

use super::stop_requested;

const LABEL: &str = "Nelder-Mead";

const NONZERO_DELTA: f64 = 0.05;
const ZERO_DELTA: f64 = 0.00025;

/// Simplex transformation coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coefficients {
    pub reflection: f64,
    pub expansion: f64,
    pub contraction: f64,
    pub shrink: f64,
}

impl Default for Coefficients {
    fn default() -> Self {
        Self {
            reflection: 1.0,
            expansion: 2.0,
            contraction: 0.5,
            shrink: 0.5,
        }
    }
}

/// Tuning options for Nelder–Mead.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Options {
    pub coefficients: Coefficients,

    /// Largest allowed coordinate distance between a vertex and the best.
    pub x_tol: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            coefficients: Coefficients::default(),
            x_tol: 1e-4,
        }
    }
}

impl Options {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error unless `reflection > 0`, `expansion > 1`,
    /// `0 < contraction < 1`, `0 < shrink < 1`, and `x_tol` is finite and
    /// non-negative.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let Coefficients {
            reflection,
            expansion,
            contraction,
            shrink,
        } = self.coefficients;

        let invalid = |name| ConfigError::InvalidOption {
            name,
            reason: "out of range",
        };
        if !(reflection > 0.0 && reflection.is_finite()) {
            return Err(invalid("reflection"));
        }
        if !(expansion > 1.0 && expansion.is_finite()) {
            return Err(invalid("expansion"));
        }
        if !(contraction > 0.0 && contraction < 1.0) {
            return Err(invalid("contraction"));
        }
        if !(shrink > 0.0 && shrink < 1.0) {
            return Err(invalid("shrink"));
        }
        if !(self.x_tol >= 0.0 && self.x_tol.is_finite()) {
            return Err(invalid("x_tol"));
        }
        Ok(())
    }
}

/// A simplex vertex and its objective value.
type Vertex<const N: usize> = ([f64; N], f64);

/// Minimizes the objective with Nelder–Mead starting from `x0`.
///
/// The observer receives an [`Event`] after every iteration with the best
/// vertex as `x` and the spread of vertex values as the residual.
///
/// # Errors
///
/// Returns an error if the config or options are invalid or `x0` contains a
/// non-finite value.
pub fn minimize<O, Obs, const N: usize>(
    objective: &O,
    x0: [f64; N],
    config: &Config,
    options: &Options,
    mut observer: Obs,
) -> Result<Solution<N>, Error>
where
    O: Objective<N> + ?Sized,
    Obs: for<'a> Observer<Event<'a, N>, Action>,
{
    check_start(&x0, config)?;
    options.validate()?;

    let mut evaluator = Evaluator::new(objective);
    let Coefficients {
        reflection,
        expansion,
        contraction,
        shrink,
    } = options.coefficients;

    let mut simplex: Vec<Vertex<N>> = Vec::with_capacity(N + 1);
    for k in 0..=N {
        let mut x = x0;
        if k > 0 {
            let i = k - 1;
            x[i] = if x[i] == 0.0 {
                ZERO_DELTA
            } else {
                (1.0 + NONZERO_DELTA) * x[i]
            };
        }
        let value = evaluator.value(&x);
        if value.is_nan() {
            let (x, f) = best_or(&simplex, (x0, value));
            return Ok(Solution::finish(LABEL, Status::NumericalDegeneracy, x, f, 0, &evaluator));
        }
        simplex.push((x, value));
    }
    order(&mut simplex);

    for iter in 1..=config.max_iters {
        if is_converged(&simplex, config.tolerance, options.x_tol) {
            let (x, f) = simplex[0];
            return Ok(Solution::finish(LABEL, Status::Converged, x, f, iter - 1, &evaluator));
        }

        let (worst, f_worst) = simplex[N];
        let f_best = simplex[0].1;
        let f_second_worst = simplex[N - 1].1;
        let centroid = centroid(&simplex[..N]);

        // Point on the line from the worst vertex through the centroid, or
        // `None` if the objective is NaN there.
        let mut probe = |t: f64| -> Option<Vertex<N>> {
            let x = std::array::from_fn(|i| centroid[i] + t * (centroid[i] - worst[i]));
            let value = evaluator.value(&x);
            (!value.is_nan()).then_some((x, value))
        };

        let Some(reflected) = probe(reflection) else {
            return degenerate(&simplex, iter, &evaluator);
        };

        let replacement = if reflected.1 < f_best {
            let Some(expanded) = probe(reflection * expansion) else {
                return degenerate(&simplex, iter, &evaluator);
            };
            Some(if expanded.1 < reflected.1 { expanded } else { reflected })
        } else if reflected.1 < f_second_worst {
            Some(reflected)
        } else if reflected.1 < f_worst {
            let Some(outside) = probe(reflection * contraction) else {
                return degenerate(&simplex, iter, &evaluator);
            };
            (outside.1 <= reflected.1).then_some(outside)
        } else {
            let Some(inside) = probe(-contraction) else {
                return degenerate(&simplex, iter, &evaluator);
            };
            (inside.1 < f_worst).then_some(inside)
        };

        match replacement {
            Some(vertex) => simplex[N] = vertex,
            None => {
                let best = simplex[0].0;
                for k in 1..=N {
                    let vertex = simplex[k].0;
                    let x = std::array::from_fn(|i| best[i] + shrink * (vertex[i] - best[i]));
                    let value = evaluator.value(&x);
                    if value.is_nan() {
                        return degenerate(&simplex, iter, &evaluator);
                    }
                    simplex[k] = (x, value);
                }
            }
        }
        order(&mut simplex);

        let (x, f) = simplex[0];
        let spread = value_spread(&simplex);
        log::debug!("{LABEL} iter {iter}: f = {f:e}, spread = {spread:e}");

        if stop_requested(&mut observer, iter, &x, f, spread) {
            let status = Status::StoppedByObserver;
            return Ok(Solution::finish(LABEL, status, x, f, iter, &evaluator));
        }
    }

    let (x, f) = simplex[0];
    let status = if !f.is_finite() {
        log::warn!(
            "{LABEL}: no vertex with a finite objective after {} iterations",
            config.max_iters
        );
        Status::NumericalDegeneracy
    } else if is_converged(&simplex, config.tolerance, options.x_tol) {
        Status::Converged
    } else {
        Status::MaxIters
    };
    Ok(Solution::finish(LABEL, status, x, f, config.max_iters, &evaluator))
}

/// Minimizes the objective with Nelder–Mead without observer support.
///
/// # Errors
///
/// Returns an error if the config or options are invalid or `x0` contains a
/// non-finite value.
pub fn minimize_unobserved<O, const N: usize>(
    objective: &O,
    x0: [f64; N],
    config: &Config,
    options: &Options,
) -> Result<Solution<N>, Error>
where
    O: Objective<N> + ?Sized,
{
    minimize(objective, x0, config, options, ())
}

fn degenerate<O, const N: usize>(
    simplex: &[Vertex<N>],
    iter: usize,
    evaluator: &Evaluator<'_, O, N>,
) -> Result<Solution<N>, Error>
where
    O: Objective<N> + ?Sized,
{
    log::warn!("{LABEL}: objective returned NaN at iteration {iter}");
    let (x, f) = simplex[0];
    Ok(Solution::finish(LABEL, Status::NumericalDegeneracy, x, f, iter, evaluator))
}

fn best_or<const N: usize>(simplex: &[Vertex<N>], fallback: Vertex<N>) -> Vertex<N> {
    simplex
        .iter()
        .copied()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .unwrap_or(fallback)
}

/// Sorts vertices from best to worst; ties keep their previous order.
fn order<const N: usize>(simplex: &mut [Vertex<N>]) {
    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
}

fn centroid<const N: usize>(vertices: &[Vertex<N>]) -> [f64; N] {
    let count = vertices.len() as f64;
    std::array::from_fn(|i| vertices.iter().map(|(x, _)| x[i]).sum::<f64>() / count)
}

/// Largest distance from the best vertex value; infinite while the best
/// value is not finite.
fn value_spread<const N: usize>(simplex: &[Vertex<N>]) -> f64 {
    let best = simplex[0].1;
    if !best.is_finite() {
        return f64::INFINITY;
    }
    simplex[1..]
        .iter()
        .map(|(_, f)| (f - best).abs())
        .fold(0.0, f64::max)
}

fn is_converged<const N: usize>(simplex: &[Vertex<N>], tolerance: f64, x_tol: f64) -> bool {
    let best = &simplex[0].0;
    let x_spread = simplex[1..]
        .iter()
        .flat_map(|(x, _)| x.iter().zip(best).map(|(a, b)| (a - b).abs()))
        .fold(0.0, f64::max);
    value_spread(simplex) <= tolerance && x_spread <= x_tol
}
