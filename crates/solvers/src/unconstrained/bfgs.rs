//! Broyden–Fletcher–Goldfarb–Shanno quasi-Newton method.
//!
//! Maintains a dense approximation `H` of the inverse Hessian, starting from
//! the identity. Each iteration searches along `−H·g` with a strong Wolfe
//! line search and applies the secant update when the curvature `sᵀy` is
//! positive. The first update rescales `H` by `sᵀy / yᵀy`.
//!
//! If the line search fails, `H` is reset to the identity and a single
//! steepest-descent retry is made before giving up with
//! [`Status::LineSearchFailed`].
//!
//! Converged when the gradient norm falls below the tolerance.

use optima_core::{Bounds, Objective, Observer};

use crate::{
    Action, Config, Error, Event, LineSearch, LineSearchError, Solution, Status,
    error::check_start,
    evaluate::Evaluator,
    linalg::{Matrix, dot, identity, is_finite, mat_vec, matrix_is_finite, norm, scale, sub},
};

use super::stop_requested;

const LABEL: &str = "BFGS";

/// Tuning options for BFGS.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Options {
    pub line_search: LineSearch,
}

/// Minimizes the objective with BFGS starting from `x0`.
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
    options.line_search.validate()?;

    let unbounded = Bounds::unbounded();
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

    let mut h = InverseHessian::new();

    for iter in 1..=config.max_iters {
        if norm(&gx) < config.tolerance {
            return Ok(Solution::finish(LABEL, Status::Converged, x, fx, iter - 1, &evaluator));
        }

        let d = h.direction(&gx);
        let mut step = options
            .line_search
            .strong_wolfe(&mut evaluator, &x, fx, &gx, &d, 1.0);

        if let Err(error) = step {
            if !h.is_identity() && !matches!(error, LineSearchError::NonFinite { .. }) {
                log::warn!("{LABEL}: {error} at iteration {iter}, resetting inverse Hessian");
                h.reset();
                let d = h.direction(&gx);
                step = options
                    .line_search
                    .strong_wolfe(&mut evaluator, &x, fx, &gx, &d, 1.0);
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

        let s = sub(&point.x, &x);
        let y = sub(&point.gradient, &gx);
        if !h.update(&s, &y) {
            log::debug!("{LABEL}: skipping update with non-positive curvature");
        }
        if !h.is_finite() {
            let status = Status::NumericalDegeneracy;
            return Ok(Solution::finish(LABEL, status, point.x, point.value, iter, &evaluator));
        }

        x = point.x;
        fx = point.value;
        gx = point.gradient;

        let gnorm = norm(&gx);
        log::debug!("{LABEL} iter {iter}: f = {fx:e}, |g| = {gnorm:e}, step = {:e}", point.alpha);

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

/// Minimizes the objective with BFGS without observer support.
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

/// Dense inverse Hessian approximation.
#[derive(Debug, Clone)]
struct InverseHessian<const N: usize> {
    h: Matrix<N>,
    is_identity: bool,
}

impl<const N: usize> InverseHessian<N> {
    fn new() -> Self {
        Self {
            h: identity(),
            is_identity: true,
        }
    }

    fn reset(&mut self) {
        *self = Self::new();
    }

    fn is_identity(&self) -> bool {
        self.is_identity
    }

    fn is_finite(&self) -> bool {
        matrix_is_finite(&self.h)
    }

    /// Returns the quasi-Newton direction `−H·g`.
    fn direction(&self, g: &[f64; N]) -> [f64; N] {
        scale(&mat_vec(&self.h, g), -1.0)
    }

    /// Applies the secant update for step `s` and gradient change `y`.
    ///
    /// Returns `false`, leaving `H` untouched, when `sᵀy ≤ 0`.
    fn update(&mut self, s: &[f64; N], y: &[f64; N]) -> bool {
        let sy = dot(s, y);
        if !(sy > 0.0) {
            return false;
        }
        if self.is_identity {
            let factor = sy / dot(y, y);
            self.h = std::array::from_fn(|i| scale(&self.h[i], factor));
        }
        update_inverse_hessian(&mut self.h, s, y, sy);
        self.is_identity = false;
        true
    }
}

/// Applies the inverse BFGS update
/// `H ← H − ρ(s·(Hy)ᵀ + (Hy)·sᵀ) + (ρ²·yᵀHy + ρ)·s·sᵀ` with `ρ = 1/sᵀy`.
fn update_inverse_hessian<const N: usize>(h: &mut Matrix<N>, s: &[f64; N], y: &[f64; N], sy: f64) {
    let rho = 1.0 / sy;
    let hy = mat_vec(h, y);
    let yhy = dot(y, &hy);
    let coeff = rho * rho * yhy + rho;
    for (i, row) in h.iter_mut().enumerate() {
        for (j, entry) in row.iter_mut().enumerate() {
            *entry += coeff * s[i] * s[j] - rho * (s[i] * hy[j] + hy[i] * s[j]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn update_satisfies_secant_equation() {
        let mut h = identity::<2>();
        let s = [0.5, -0.25];
        let y = [1.0, 0.5];
        let sy = dot(&s, &y);

        update_inverse_hessian(&mut h, &s, &y, sy);

        let hy = mat_vec(&h, &y);
        assert_relative_eq!(hy[0], s[0], epsilon = 1e-12);
        assert_relative_eq!(hy[1], s[1], epsilon = 1e-12);
        assert_relative_eq!(h[0][1], h[1][0], epsilon = 1e-12);
    }

    #[test]
    fn negative_curvature_skips_update() {
        let mut h = InverseHessian::<2>::new();

        assert!(!h.update(&[1.0, 0.0], &[-2.0, 0.5]));
        assert!(!h.update(&[1.0, 0.0], &[0.0, 3.0]));

        assert!(h.is_identity());
        assert_eq!(h.direction(&[2.0, -1.0]), [-2.0, 1.0]);
    }

    #[test]
    fn first_update_rescales_then_satisfies_secant() {
        let mut h = InverseHessian::<2>::new();
        let s = [0.5, -0.25];
        let y = [1.0, 0.5];

        assert!(h.update(&s, &y));
        assert!(!h.is_identity());

        let hy = scale(&h.direction(&y), -1.0);
        assert_relative_eq!(hy[0], s[0], epsilon = 1e-12);
        assert_relative_eq!(hy[1], s[1], epsilon = 1e-12);

        h.reset();
        assert!(h.is_identity());
    }
}
