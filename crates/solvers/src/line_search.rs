//! One-dimensional step-length selection along a search direction.
//!
//! Two strategies are provided:
//!
//! - The strong Wolfe search brackets a step by doubling and then
//!   narrows it with a safeguarded interpolation zoom until both strong Wolfe
//!   conditions hold. Used by BFGS and conjugate gradient.
//! - [`LineSearch::backtrack`] halves the step until the Armijo condition
//!   holds on an arbitrary merit function. Used by L-BFGS-B and the
//!   constrained solver.

use optima_core::{Bounds, Objective};
use thiserror::Error;

use crate::{
    ConfigError,
    evaluate::Evaluator,
    linalg::{axpy, dot},
};

/// Errors that can occur during a line search.
///
/// Solvers translate these into a [`Status`](crate::Status); they never
/// reach the caller of a `minimize` function.
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum LineSearchError {
    #[error("direction is not a descent direction (slope {slope})")]
    NotDescent { slope: f64 },

    #[error("no acceptable step found in {trials} trials")]
    Exhausted { trials: usize },

    #[error("objective is not a number at step {alpha}")]
    NonFinite { alpha: f64 },
}

/// Line search parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineSearch {
    /// Sufficient decrease constant.
    pub c1: f64,

    /// Curvature constant for the strong Wolfe condition.
    pub c2: f64,

    /// Maximum trial steps per phase (bracketing, then zoom).
    pub max_trials: usize,

    /// First trial step.
    pub initial_step: f64,
}

impl Default for LineSearch {
    fn default() -> Self {
        Self {
            c1: 1e-4,
            c2: 0.9,
            max_trials: 20,
            initial_step: 1.0,
        }
    }
}

/// A step accepted by [`LineSearch::strong_wolfe`].
#[derive(Debug, Clone, Copy)]
pub(crate) struct WolfePoint<const N: usize> {
    pub(crate) alpha: f64,
    pub(crate) x: [f64; N],
    pub(crate) value: f64,
    pub(crate) gradient: [f64; N],
}

/// Upper end of a zoom interval.
///
/// The slope is only known when the gradient was evaluated there.
#[derive(Debug, Clone, Copy)]
struct Upper {
    alpha: f64,
    value: f64,
    slope: Option<f64>,
}

impl LineSearch {
    /// Validates the line search parameters.
    ///
    /// # Errors
    ///
    /// Returns an error unless `0 < c1 < c2 < 1`, `max_trials > 0`, and the
    /// initial step is finite and positive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.c1 > 0.0 && self.c1 < self.c2 && self.c2 < 1.0) {
            return Err(ConfigError::InvalidOption {
                name: "line search constants",
                reason: "must satisfy 0 < c1 < c2 < 1",
            });
        }
        if self.max_trials == 0 {
            return Err(ConfigError::InvalidOption {
                name: "max_trials",
                reason: "must be positive",
            });
        }
        if !self.initial_step.is_finite() || self.initial_step <= 0.0 {
            return Err(ConfigError::InvalidOption {
                name: "initial_step",
                reason: "must be finite and positive",
            });
        }
        Ok(())
    }

    /// Finds a step along `d` from `x` satisfying the strong Wolfe conditions.
    ///
    /// `fx` and `gx` are the objective and gradient at `x`, and `alpha0` is
    /// the first trial step. If the zoom phase runs out of trials after some
    /// step with sufficient decrease was seen, that step is returned.
    pub(crate) fn strong_wolfe<O, const N: usize>(
        &self,
        evaluator: &mut Evaluator<'_, O, N>,
        x: &[f64; N],
        fx: f64,
        gx: &[f64; N],
        d: &[f64; N],
        alpha0: f64,
    ) -> Result<WolfePoint<N>, LineSearchError>
    where
        O: Objective<N> + ?Sized,
    {
        let slope0 = dot(gx, d);
        if slope0.is_nan() {
            return Err(LineSearchError::NonFinite { alpha: 0.0 });
        }
        if slope0 >= 0.0 {
            return Err(LineSearchError::NotDescent { slope: slope0 });
        }

        let unbounded = Bounds::unbounded();
        let mut prev = WolfePoint {
            alpha: 0.0,
            x: *x,
            value: fx,
            gradient: *gx,
        };
        let mut alpha = alpha0;

        for trial in 1..=self.max_trials {
            let xa = axpy(x, alpha, d);
            let fa = evaluator.value(&xa);
            if fa.is_nan() {
                return Err(LineSearchError::NonFinite { alpha });
            }

            if fa > fx + self.c1 * alpha * slope0 || (trial > 1 && fa >= prev.value) {
                let hi = Upper {
                    alpha,
                    value: fa,
                    slope: None,
                };
                return self.zoom(evaluator, x, fx, slope0, d, prev, hi);
            }

            let ga = evaluator.gradient(&xa, fa, &unbounded);
            let slope = dot(&ga, d);
            if slope.is_nan() {
                return Err(LineSearchError::NonFinite { alpha });
            }

            let point = WolfePoint {
                alpha,
                x: xa,
                value: fa,
                gradient: ga,
            };
            if slope.abs() <= -self.c2 * slope0 {
                return Ok(point);
            }
            if slope >= 0.0 {
                let hi = Upper {
                    alpha: prev.alpha,
                    value: prev.value,
                    slope: Some(dot(&prev.gradient, d)),
                };
                return self.zoom(evaluator, x, fx, slope0, d, point, hi);
            }

            prev = point;
            alpha *= 2.0;
        }

        Err(LineSearchError::Exhausted {
            trials: self.max_trials,
        })
    }

    /// Narrows the interval between `lo` and `hi` until a strong Wolfe step
    /// is found.
    ///
    /// Invariant: `lo` satisfies sufficient decrease and has the lowest value
    /// seen so far, and the slope at `lo` points toward `hi`.
    #[allow(clippy::too_many_arguments)]
    fn zoom<O, const N: usize>(
        &self,
        evaluator: &mut Evaluator<'_, O, N>,
        x: &[f64; N],
        fx: f64,
        slope0: f64,
        d: &[f64; N],
        mut lo: WolfePoint<N>,
        mut hi: Upper,
    ) -> Result<WolfePoint<N>, LineSearchError>
    where
        O: Objective<N> + ?Sized,
    {
        let unbounded = Bounds::unbounded();

        for _ in 0..self.max_trials {
            let width = hi.alpha - lo.alpha;
            if width.abs() <= f64::EPSILON * lo.alpha.abs().max(1.0) {
                break;
            }

            let lo_slope = dot(&lo.gradient, d);
            let guess = match hi.slope {
                Some(hi_slope) => {
                    cubic_min(lo.alpha, lo.value, lo_slope, hi.alpha, hi.value, hi_slope)
                }
                None => quadratic_min(lo.alpha, lo.value, lo_slope, hi.alpha, hi.value),
            };
            let (left, right) = (lo.alpha.min(hi.alpha), lo.alpha.max(hi.alpha));
            let margin = 0.1 * width.abs();
            let alpha = match guess {
                Some(a) if a >= left + margin && a <= right - margin => a,
                _ => 0.5 * (lo.alpha + hi.alpha),
            };

            let xa = axpy(x, alpha, d);
            let fa = evaluator.value(&xa);
            if fa.is_nan() {
                return Err(LineSearchError::NonFinite { alpha });
            }

            if fa > fx + self.c1 * alpha * slope0 || fa >= lo.value {
                hi = Upper {
                    alpha,
                    value: fa,
                    slope: None,
                };
                continue;
            }

            let ga = evaluator.gradient(&xa, fa, &unbounded);
            let slope = dot(&ga, d);
            if slope.is_nan() {
                return Err(LineSearchError::NonFinite { alpha });
            }

            let point = WolfePoint {
                alpha,
                x: xa,
                value: fa,
                gradient: ga,
            };
            if slope.abs() <= -self.c2 * slope0 {
                return Ok(point);
            }
            if slope * (hi.alpha - lo.alpha) >= 0.0 {
                hi = Upper {
                    alpha: lo.alpha,
                    value: lo.value,
                    slope: Some(lo_slope),
                };
            }
            lo = point;
        }

        if lo.alpha > 0.0 {
            log::debug!(
                "strong Wolfe zoom exhausted, accepting sufficient-decrease step {:e}",
                lo.alpha
            );
            return Ok(lo);
        }
        Err(LineSearchError::Exhausted {
            trials: self.max_trials,
        })
    }

    /// Halves the step from `initial_step` until `phi` shows sufficient
    /// decrease.
    ///
    /// `phi(α)` is the merit along the search path, `phi0` its value at zero
    /// and `slope` its directional derivative there. Returns the accepted
    /// step and the merit value at it.
    ///
    /// # Errors
    ///
    /// Fails if `slope` is not negative, if `phi` returns NaN, or if no step
    /// is accepted within `max_trials` halvings.
    pub fn backtrack<F>(
        &self,
        phi0: f64,
        slope: f64,
        mut phi: F,
    ) -> Result<(f64, f64), LineSearchError>
    where
        F: FnMut(f64) -> f64,
    {
        if slope.is_nan() || phi0.is_nan() {
            return Err(LineSearchError::NonFinite { alpha: 0.0 });
        }
        if slope >= 0.0 {
            return Err(LineSearchError::NotDescent { slope });
        }

        let mut alpha = self.initial_step;
        for _ in 0..self.max_trials {
            let value = phi(alpha);
            if value.is_nan() {
                return Err(LineSearchError::NonFinite { alpha });
            }
            if value <= phi0 + self.c1 * alpha * slope {
                return Ok((alpha, value));
            }
            alpha *= 0.5;
        }

        Err(LineSearchError::Exhausted {
            trials: self.max_trials,
        })
    }
}

/// Minimizer of the cubic matching values and slopes at `a` and `b`.
fn cubic_min(a: f64, fa: f64, ga: f64, b: f64, fb: f64, gb: f64) -> Option<f64> {
    let d1 = ga + gb - 3.0 * (fa - fb) / (a - b);
    let radicand = d1 * d1 - ga * gb;
    if radicand < 0.0 {
        return None;
    }
    let d2 = (b - a).signum() * radicand.sqrt();
    let alpha = b - (b - a) * (gb + d2 - d1) / (gb - ga + 2.0 * d2);
    alpha.is_finite().then_some(alpha)
}

/// Minimizer of the quadratic matching value and slope at `a` and value at `b`.
fn quadratic_min(a: f64, fa: f64, ga: f64, b: f64, fb: f64) -> Option<f64> {
    let w = b - a;
    let curvature = fb - fa - ga * w;
    if curvature <= 0.0 {
        return None;
    }
    let alpha = a - ga * w * w / (2.0 * curvature);
    alpha.is_finite().then_some(alpha)
}
