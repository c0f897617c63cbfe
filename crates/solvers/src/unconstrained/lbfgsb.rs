//! Limited-memory BFGS with box bounds.
//!
//! Keeps the last `memory` correction pairs `(s, y)` and applies the inverse
//! Hessian approximation through the two-loop recursion. The quasi-Newton
//! step is projected into the box, giving the feasible direction
//! `d = P(x − H·g) − x`. When that is not a descent direction the projected
//! steepest-descent direction `P(x − g) − x` is used for that step. Steps
//! are chosen by Armijo backtracking along `d`, which stays inside the box
//! for every step in `(0, 1]`. If backtracking fails, the history is
//! discarded and the search is retried once before giving up.
//!
//! Converged when the projected gradient norm `‖P(x − g) − x‖` falls below
//! the tolerance. Points are always kept inside the bounds, including the
//! start point, which is projected before the first evaluation.

use std::collections::VecDeque;

use optima_core::{Bounds, Objective, Observer};

use crate::{
    Action, Config, ConfigError, Error, Event, LineSearch, LineSearchError, Solution, Status,
    error::check_start,
    evaluate::Evaluator,
    linalg::{axpy, dot, is_finite, norm, scale, sub},
};

use super::stop_requested;

const LABEL: &str = "L-BFGS-B";

/// Tuning options for L-BFGS-B.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Options {
    /// Number of correction pairs kept.
    pub memory: usize,

    /// Backtracking parameters; only `c1`, `max_trials` and `initial_step`
    /// are used.
    pub line_search: LineSearch,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            memory: 10,
            line_search: LineSearch::default(),
        }
    }
}

impl Options {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error if `memory` is zero or the line search parameters
    /// are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory == 0 {
            return Err(ConfigError::InvalidOption {
                name: "memory",
                reason: "must be positive",
            });
        }
        self.line_search.validate()
    }
}

#[derive(Debug, Clone, Copy)]
struct Correction<const N: usize> {
    s: [f64; N],
    y: [f64; N],
    rho: f64,
}

/// Minimizes the objective over `bounds` with L-BFGS-B starting from `x0`.
///
/// The observer receives an [`Event`] after every iteration, with the
/// projected gradient norm as the residual.
///
/// # Errors
///
/// Returns an error if the config or options are invalid or `x0` contains a
/// non-finite value.
pub fn minimize<O, Obs, const N: usize>(
    objective: &O,
    x0: [f64; N],
    bounds: &Bounds<N>,
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

    let mut x = bounds.clamp(&x0);
    let mut fx = evaluator.value(&x);
    if !fx.is_finite() {
        return Ok(Solution::finish(LABEL, Status::NumericalDegeneracy, x, fx, 0, &evaluator));
    }
    let mut gx = evaluator.gradient(&x, fx, bounds);
    if !is_finite(&gx) {
        return Ok(Solution::finish(LABEL, Status::NumericalDegeneracy, x, fx, 0, &evaluator));
    }

    let mut history: VecDeque<Correction<N>> = VecDeque::with_capacity(options.memory);
    let mut residual = norm(&projected_gradient(&x, &gx, bounds));

    for iter in 1..=config.max_iters {
        if residual < config.tolerance {
            return Ok(Solution::finish(LABEL, Status::Converged, x, fx, iter - 1, &evaluator));
        }

        let mut step = search(&mut evaluator, &x, fx, &gx, bounds, &history, &options.line_search);
        if let Err(error) = step {
            if !history.is_empty() && !matches!(error, LineSearchError::NonFinite { .. }) {
                log::warn!("{LABEL}: {error} at iteration {iter}, discarding history");
                history.clear();
                step = search(&mut evaluator, &x, fx, &gx, bounds, &history, &options.line_search);
            }
        }

        let (x_new, f_new) = match step {
            Ok(accepted) => accepted,
            Err(LineSearchError::NonFinite { alpha }) => {
                log::warn!("{LABEL}: objective is NaN at step {alpha:e}");
                let status = Status::NumericalDegeneracy;
                return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
            }
            Err(error) => {
                log::debug!("{LABEL}: {error}");
                let status = Status::LineSearchFailed;
                return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
            }
        };

        if !f_new.is_finite() {
            let status = Status::NumericalDegeneracy;
            return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
        }
        let g_new = evaluator.gradient(&x_new, f_new, bounds);
        if !is_finite(&g_new) {
            let status = Status::NumericalDegeneracy;
            return Ok(Solution::finish(LABEL, status, x_new, f_new, iter, &evaluator));
        }

        let s = sub(&x_new, &x);
        let y = sub(&g_new, &gx);
        let sy = dot(&s, &y);
        if sy > f64::EPSILON * dot(&y, &y) {
            if history.len() == options.memory {
                history.pop_front();
            }
            history.push_back(Correction { s, y, rho: 1.0 / sy });
        }

        x = x_new;
        fx = f_new;
        gx = g_new;
        residual = norm(&projected_gradient(&x, &gx, bounds));

        log::debug!("{LABEL} iter {iter}: f = {fx:e}, |pg| = {residual:e}");

        if stop_requested(&mut observer, iter, &x, fx, residual) {
            let status = Status::StoppedByObserver;
            return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
        }
    }

    let status = if residual < config.tolerance {
        Status::Converged
    } else {
        Status::MaxIters
    };
    Ok(Solution::finish(LABEL, status, x, fx, config.max_iters, &evaluator))
}

/// Minimizes the objective over `bounds` without observer support.
///
/// # Errors
///
/// Returns an error if the config or options are invalid or `x0` contains a
/// non-finite value.
pub fn minimize_unobserved<O, const N: usize>(
    objective: &O,
    x0: [f64; N],
    bounds: &Bounds<N>,
    config: &Config,
    options: &Options,
) -> Result<Solution<N>, Error>
where
    O: Objective<N> + ?Sized,
{
    minimize(objective, x0, bounds, config, options, ())
}

/// Picks a feasible direction and backtracks along it.
///
/// Returns the accepted point and its objective value.
fn search<O, const N: usize>(
    evaluator: &mut Evaluator<'_, O, N>,
    x: &[f64; N],
    fx: f64,
    gx: &[f64; N],
    bounds: &Bounds<N>,
    history: &VecDeque<Correction<N>>,
    line_search: &LineSearch,
) -> Result<([f64; N], f64), LineSearchError>
where
    O: Objective<N> + ?Sized,
{
    let quasi_newton = scale(&two_loop(gx, history), -1.0);
    let mut d = sub(&bounds.clamp(&axpy(x, 1.0, &quasi_newton)), x);
    let mut slope = dot(gx, &d);
    if !(slope < 0.0) {
        log::debug!("{LABEL}: quasi-Newton step is not descent, using projected gradient");
        d = projected_gradient(x, gx, bounds);
        slope = dot(gx, &d);
    }

    let (alpha, value) = line_search.backtrack(fx, slope, |alpha| {
        evaluator.value(&bounds.clamp(&axpy(x, alpha, &d)))
    })?;
    Ok((bounds.clamp(&axpy(x, alpha, &d)), value))
}

/// Returns `P(x − g) − x`, the projected steepest-descent step.
fn projected_gradient<const N: usize>(x: &[f64; N], g: &[f64; N], bounds: &Bounds<N>) -> [f64; N] {
    sub(&bounds.clamp(&sub(x, g)), x)
}

/// Applies the limited-memory inverse Hessian to `g`.
///
/// With an empty history the initial matrix is `I / max(1, ‖g‖)`, which keeps
/// the first trial step at unit length or shorter.
fn two_loop<const N: usize>(g: &[f64; N], history: &VecDeque<Correction<N>>) -> [f64; N] {
    let mut q = *g;
    let mut alphas = Vec::with_capacity(history.len());
    for pair in history.iter().rev() {
        let alpha = pair.rho * dot(&pair.s, &q);
        q = axpy(&q, -alpha, &pair.y);
        alphas.push(alpha);
    }

    let gamma = match history.back() {
        Some(last) => 1.0 / (last.rho * dot(&last.y, &last.y)),
        None => 1.0 / norm(g).max(1.0),
    };
    let mut r = scale(&q, gamma);

    for (pair, alpha) in history.iter().zip(alphas.iter().rev()) {
        let beta = pair.rho * dot(&pair.y, &r);
        r = axpy(&r, alpha - beta, &pair.s);
    }
    r
}
