//! Sequential least-squares quadratic programming (SLSQP-style).
//!
//! # Algorithm
//!
//! Each iteration linearizes the constraints at the current iterate and
//! solves the quadratic subproblem
//!
//! ```text
//! minimize    ½dᵀBd + ∇fᵀd
//! subject to  linearized equalities, inequalities, and finite bounds
//! ```
//!
//! with an active-set method. The step is then scaled back until the L1
//! merit function `f + μ·violation` shows sufficient decrease, where the
//! penalty `μ` never drops and is kept at least twice the largest multiplier.
//! `B` approximates the Hessian of the Lagrangian and is updated with the
//! Powell-damped BFGS formula, which keeps it positive definite.
//!
//! Start points and trial points outside the box bounds are projected onto
//! them; equality and inequality constraints may be violated at the start.
//!
//! # Termination
//!
//! - [`Status::Converged`] when `‖∇f − Jᵀλ‖ + violation` drops below the
//!   tolerance, using the multipliers from the most recent subproblem, or when
//!   the subproblem returns a negligible step at a feasible point
//! - [`Status::Infeasible`] when the violation stays above the tolerance
//!   without decreasing for [`Options::infeasibility_patience`] iterations
//! - [`Status::LineSearchFailed`] when the merit search fails even after
//!   resetting `B` to the identity
//! - [`Status::NumericalDegeneracy`] on NaN or infinite values
//!
//! # Observer Events
//!
//! One [`Event`] per completed iteration, carrying the violation and KKT
//! residual alongside the iterate.

mod event;
mod options;
mod qp;
mod rows;

#[cfg(test)]
mod tests;

pub use event::Event;
pub use options::Options;

use optima_core::{ConstraintSet, Objective, Observer};

use crate::{
    Action, Config, Error, LineSearchError, Solution, Status,
    error::check_start,
    evaluate::Evaluator,
    linalg::{Matrix, axpy, dot, identity, is_finite, mat_vec, matrix_is_finite, norm, sub},
};

use rows::{Row, lagrangian_gradient, linearize};

const LABEL: &str = "SLSQP";

/// Smallest merit penalty.
const MIN_PENALTY: f64 = 1e-2;

/// Relative step length below which the subproblem step counts as zero.
const NEGLIGIBLE_STEP: f64 = 1e-12;

/// Minimizes the objective subject to `constraints`, starting from `x0`.
///
/// The observer receives an [`Event`] after every completed iteration.
/// See the [module docs](self) for the termination rules.
///
/// # Errors
///
/// Returns an error if the config or options are invalid or `x0` contains a
/// non-finite value.
pub fn minimize<O, Obs, const N: usize>(
    objective: &O,
    x0: [f64; N],
    constraints: &ConstraintSet<N>,
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

    let bounds = constraints.box_bounds();
    let mut evaluator = Evaluator::new(objective);

    let mut x = bounds.clamp(&x0);
    if x != x0 {
        log::debug!("{LABEL}: start point projected onto bounds");
    }
    let mut fx = evaluator.value(&x);
    if !fx.is_finite() {
        return Ok(Solution::finish(LABEL, Status::NumericalDegeneracy, x, fx, 0, &evaluator));
    }
    let mut gx = evaluator.gradient(&x, fx, bounds);
    let mut rows = linearize(constraints, &x);
    if !is_finite(&gx) || !rows.iter().all(Row::is_finite) {
        return Ok(Solution::finish(LABEL, Status::NumericalDegeneracy, x, fx, 0, &evaluator));
    }

    let mut b: Matrix<N> = identity();
    let mut b_is_identity = true;
    let mut penalty = 0.0_f64;
    let mut violation = constraints.violation(&x);
    let mut kkt_residual = norm(&gx) + violation;
    let mut stalled = 0;

    for iter in 1..=config.max_iters {
        if kkt_residual < config.tolerance {
            return Ok(Solution::finish(LABEL, Status::Converged, x, fx, iter - 1, &evaluator));
        }

        let Some(qp) = qp::solve(&b, &gx, &rows) else {
            log::warn!("{LABEL}: singular subproblem at iteration {iter}");
            let status = Status::NumericalDegeneracy;
            return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
        };
        let d = qp.step;
        if !is_finite(&d) {
            let status = Status::NumericalDegeneracy;
            return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
        }
        let multipliers = qp.multipliers;

        let largest_multiplier = multipliers.iter().fold(0.0_f64, |m, l| m.max(l.abs()));
        penalty = penalty.max(2.0 * largest_multiplier).max(MIN_PENALTY);

        if norm(&d) <= NEGLIGIBLE_STEP * (1.0 + norm(&x)) {
            if violation <= config.tolerance {
                return Ok(Solution::finish(LABEL, Status::Converged, x, fx, iter, &evaluator));
            }
            stalled += 1;
            kkt_residual = norm(&lagrangian_gradient(&gx, &rows, &multipliers)) + violation;
            log::debug!("{LABEL} iter {iter}: no progress, violation = {violation:e}");

            let event = Event {
                iter,
                x: &x,
                objective: fx,
                violation,
                kkt_residual,
            };
            if let Some(Action::StopEarly) = observer.observe(&event) {
                let status = Status::StoppedByObserver;
                return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
            }
            if stalled >= options.infeasibility_patience {
                let status = Status::Infeasible { violation };
                return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
            }
            continue;
        }

        let merit0 = fx + penalty * violation;
        let mut slope = dot(&gx, &d) - penalty * violation;
        if !(slope < 0.0) {
            slope = -dot(&d, &mat_vec(&b, &d));
        }

        let mut f_trial = fx;
        let search = options.line_search.backtrack(merit0, slope, |alpha| {
            let trial = bounds.clamp(&axpy(&x, alpha, &d));
            f_trial = evaluator.value(&trial);
            f_trial + penalty * constraints.violation(&trial)
        });

        let alpha = match search {
            Ok((alpha, _)) => alpha,
            Err(LineSearchError::NonFinite { alpha }) => {
                log::warn!("{LABEL}: merit is NaN at step {alpha:e}");
                let status = Status::NumericalDegeneracy;
                return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
            }
            Err(error) if !b_is_identity => {
                log::warn!("{LABEL}: {error} at iteration {iter}, resetting Hessian approximation");
                b = identity();
                b_is_identity = true;
                continue;
            }
            Err(error) => {
                log::debug!("{LABEL}: {error}");
                let status = Status::LineSearchFailed;
                return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
            }
        };

        let x_new = bounds.clamp(&axpy(&x, alpha, &d));
        let f_new = f_trial;
        if !f_new.is_finite() {
            let status = Status::NumericalDegeneracy;
            return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
        }
        let g_new = evaluator.gradient(&x_new, f_new, bounds);
        let rows_new = linearize(constraints, &x_new);
        if !is_finite(&g_new) || !rows_new.iter().all(Row::is_finite) {
            let status = Status::NumericalDegeneracy;
            return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
        }

        let s = sub(&x_new, &x);
        let gl_old = lagrangian_gradient(&gx, &rows, &multipliers);
        let gl_new = lagrangian_gradient(&g_new, &rows_new, &multipliers);
        if damped_update(&mut b, &s, &sub(&gl_new, &gl_old)) {
            b_is_identity = false;
        }
        if !matrix_is_finite(&b) {
            log::warn!("{LABEL}: Hessian approximation lost finiteness, resetting");
            b = identity();
            b_is_identity = true;
        }

        let violation_new = constraints.violation(&x_new);
        if violation_new > config.tolerance && violation_new >= violation {
            stalled += 1;
        } else {
            stalled = 0;
        }

        x = x_new;
        fx = f_new;
        gx = g_new;
        rows = rows_new;
        violation = violation_new;
        kkt_residual = norm(&gl_new) + violation;

        log::debug!(
            "{LABEL} iter {iter}: f = {fx:e}, violation = {violation:e}, \
             kkt = {kkt_residual:e}, step = {alpha:e}"
        );

        let event = Event {
            iter,
            x: &x,
            objective: fx,
            violation,
            kkt_residual,
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            let status = Status::StoppedByObserver;
            return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
        }
        if stalled >= options.infeasibility_patience {
            let status = Status::Infeasible { violation };
            return Ok(Solution::finish(LABEL, status, x, fx, iter, &evaluator));
        }
    }

    let status = if kkt_residual < config.tolerance {
        Status::Converged
    } else {
        Status::MaxIters
    };
    Ok(Solution::finish(LABEL, status, x, fx, config.max_iters, &evaluator))
}

/// Minimizes the objective subject to `constraints` without observer support.
///
/// # Errors
///
/// Returns an error if the config or options are invalid or `x0` contains a
/// non-finite value.
pub fn minimize_unobserved<O, const N: usize>(
    objective: &O,
    x0: [f64; N],
    constraints: &ConstraintSet<N>,
    config: &Config,
    options: &Options,
) -> Result<Solution<N>, Error>
where
    O: Objective<N> + ?Sized,
{
    minimize(objective, x0, constraints, config, options, ())
}

/// Applies Powell's damped BFGS update to `b`.
///
/// When `sᵀy < 0.2·sᵀBs`, `y` is blended with `Bs` so that the updated
/// matrix stays positive definite. Returns `false` if the update was skipped.
fn damped_update<const N: usize>(b: &mut Matrix<N>, s: &[f64; N], y: &[f64; N]) -> bool {
    let bs = mat_vec(b, s);
    let sbs = dot(s, &bs);
    if !(sbs > 0.0) {
        return false;
    }

    let sy = dot(s, y);
    let theta = if sy >= 0.2 * sbs {
        1.0
    } else {
        0.8 * sbs / (sbs - sy)
    };
    let r: [f64; N] = std::array::from_fn(|i| theta * y[i] + (1.0 - theta) * bs[i]);
    let sr = dot(s, &r);

    for (i, row) in b.iter_mut().enumerate() {
        for (j, entry) in row.iter_mut().enumerate() {
            *entry += r[i] * r[j] / sr - bs[i] * bs[j] / sbs;
        }
    }
    true
}
