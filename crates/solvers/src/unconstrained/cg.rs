//! Nonlinear conjugate gradient with the Polak–Ribière update.
//!
//! The search direction is `d ← −g + β·d` with
//! `β = gₖ₊₁ᵀ(gₖ₊₁ − gₖ) / gₖᵀgₖ`. The direction restarts as steepest
//! descent when `β < 0`, every `restart_interval` iterations (the problem
//! dimension by default), and whenever the combined direction is not a
//! descent direction.
//!
//! Steps come from a strong Wolfe line search with a tight curvature
//! constant (`c2 = 0.1`), which keeps successive directions close to
//! conjugate. Converged when the gradient norm falls below the tolerance.

use optima_core::{Bounds, Objective, Observer};

use crate::{
    Action, Config, ConfigError, Error, Event, LineSearch, LineSearchError, Solution, Status,
    error::check_start,
    evaluate::Evaluator,
    linalg::{axpy, dot, is_finite, norm, scale, sub},
};

use super::stop_requested;

const LABEL: &str = "CG";

/// Tuning options for conjugate gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Options {
    pub line_search: LineSearch,

    /// Iterations between forced restarts; `None` uses the problem dimension.
    pub restart_interval: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            line_search: LineSearch {
                c2: 0.1,
                ..LineSearch::default()
            },
            restart_interval: None,
        }
    }
}

impl Options {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error if the restart interval is zero or the line search
    /// parameters are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.restart_interval == Some(0) {
            return Err(ConfigError::InvalidOption {
                name: "restart_interval",
                reason: "must be positive",
            });
        }
        self.line_search.validate()
    }
}

/// Minimizes the objective with nonlinear conjugate gradient from `x0`.
///
/// The observer receives an [`Event`] after every iteration, with the
/// gradient norm as the residual.
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

    let unbounded = Bounds::unbounded();
    let restart_interval = options.restart_interval.unwrap_or(N);
    let mut evaluator = Evaluator::new(objective);

    let mut x = x0;
    let mut fx = evaluator.value(&x);
    if !fx.is_finite() {
        return Ok(Solution::finish(LABEL, Status::NumericalDegeneracy, x, fx, 0, &evaluator));
    }
    let mut gx = evaluator.gradient(&x, fx, &unbounded);
    if !is_finite(&gx) {
        return Ok(Solution::finish(LABEL, Status::NumericalDegeneracy, x, fx, 0, &evaluator));
    }

    let mut d = scale(&gx, -1.0);
    let mut is_steepest = true;
    // Chosen so the first trial step has length about one.
    let mut f_prev = fx + norm(&gx) / 2.0;

    for iter in 1..=config.max_iters {
        if norm(&gx) < config.tolerance {
            return Ok(Solution::finish(LABEL, Status::Converged, x, fx, iter - 1, &evaluator));
        }

        let alpha0 = initial_step(fx, f_prev, dot(&gx, &d));
        let mut step = options
            .line_search
            .strong_wolfe(&mut evaluator, &x, fx, &gx, &d, alpha0);

        if let Err(error) = step {
            if !is_steepest && !matches!(error, LineSearchError::NonFinite { .. }) {
                log::warn!("{LABEL}: {error} at iteration {iter}, restarting");
                d = scale(&gx, -1.0);
                let alpha0 = initial_step(fx, f_prev, dot(&gx, &d));
                step = options
                    .line_search
                    .strong_wolfe(&mut evaluator, &x, fx, &gx, &d, alpha0);
            }
        }

        let point = match step {
            Ok(point) => point,
            Err(LineSearchError::NonFinite { alpha }) => {
                log::warn!("{LABEL}: non-finite objective at step {alpha:e}");
                let status = Status::NumericalDegeneracy;
                return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
            }
            Err(error) => {
                log::debug!("{LABEL}: {error}");
                let status = Status::LineSearchFailed;
                return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
            }
        };

        if !point.value.is_finite() || !is_finite(&point.gradient) {
            let status = Status::NumericalDegeneracy;
            return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
        }

        let g_new = point.gradient;
        let next = next_direction(&g_new, &gx, &d, iter, restart_interval);
        d = next.d;
        is_steepest = next.restarted;
        let beta = next.beta;

        f_prev = fx;
        x = point.x;
        fx = point.value;
        gx = g_new;

        let gnorm = norm(&gx);
        log::debug!("{LABEL} iter {iter}: f = {fx:e}, |g| = {gnorm:e}, beta = {beta:e}");

        if stop_requested(&mut observer, iter, &x, fx, gnorm) {
            let status = Status::StoppedByObserver;
            return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
        }
    }

    let status = if norm(&gx) < config.tolerance {
        Status::Converged
    } else {
        Status::MaxIters
    };
    Ok(Solution::finish(LABEL, status, x, fx, config.max_iters, &evaluator))
}

/// Minimizes the objective with conjugate gradient without observer support.
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

/// Search direction for the next iteration.
#[derive(Debug, Clone, Copy)]
struct Direction<const N: usize> {
    d: [f64; N],
    beta: f64,
    restarted: bool,
}

/// Combines the new gradient with the previous direction using the
/// Polak–Ribière `β`, falling back to steepest descent when `β ≤ 0`, on
/// every `restart_interval`-th iteration, or when the combination is not a
/// descent direction.
fn next_direction<const N: usize>(
    g_new: &[f64; N],
    g_old: &[f64; N],
    d: &[f64; N],
    iter: usize,
    restart_interval: usize,
) -> Direction<N> {
    let steepest = scale(g_new, -1.0);
    let beta = dot(g_new, &sub(g_new, g_old)) / dot(g_old, g_old);
    let restart = |beta| Direction {
        d: steepest,
        beta,
        restarted: true,
    };

    if !(beta > 0.0) || iter % restart_interval == 0 {
        return restart(beta);
    }
    let combined = axpy(&steepest, beta, d);
    if dot(g_new, &combined) >= 0.0 {
        log::debug!("{LABEL}: direction lost descent at iteration {iter}, restarting");
        return restart(beta);
    }
    Direction {
        d: combined,
        beta,
        restarted: false,
    }
}

/// First trial step, assuming the decrease will match the previous one.
fn initial_step(fx: f64, f_prev: f64, slope: f64) -> f64 {
    let alpha = 1.01 * 2.0 * (fx - f_prev) / slope;
    if alpha.is_finite() && alpha > 0.0 {
        alpha.min(1.0)
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn initial_step_is_capped_at_one() {
        assert_relative_eq!(initial_step(1.0, 5.0, -0.5), 1.0);
        assert_relative_eq!(initial_step(1.0, 1.5, -101.0), 0.01);
    }

    #[test]
    fn initial_step_falls_back_without_decrease() {
        assert_relative_eq!(initial_step(1.0, 0.5, -1.0), 1.0);
    }

    #[test]
    fn negative_beta_restarts() {
        // g_new·(g_new − g_old) = 1·(1 − 3) < 0.
        let next = next_direction(&[1.0, 0.0], &[3.0, 0.0], &[-3.0, 1.0], 1, 10);

        assert!(next.restarted);
        assert!(next.beta < 0.0);
        assert_eq!(next.d, [-1.0, 0.0]);
    }

    #[test]
    fn restarts_on_interval() {
        let g_old = [1.0, 0.0];
        let g_new = [0.0, 1.0];
        let d = [-1.0, 0.0];

        let kept = next_direction(&g_new, &g_old, &d, 3, 4);
        assert!(!kept.restarted);
        assert_relative_eq!(kept.beta, 1.0);
        assert_eq!(kept.d, [-1.0, -1.0]);

        let restarted = next_direction(&g_new, &g_old, &d, 4, 4);
        assert!(restarted.restarted);
        assert_eq!(restarted.d, [0.0, -1.0]);
    }

    #[test]
    fn restarts_when_combination_is_not_descent() {
        // β = 1, and −g_new + d points uphill.
        let next = next_direction(&[0.0, 1.0], &[1.0, 0.0], &[0.0, 5.0], 1, 10);

        assert!(next.restarted);
        assert_eq!(next.d, [0.0, -1.0]);
    }

    #[test]
    fn default_line_search_uses_tight_curvature() {
        let options = Options::default();
        assert_relative_eq!(options.line_search.c2, 0.1);
        assert_eq!(options.validate(), Ok(()));
    }
}
