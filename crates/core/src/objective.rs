/// A scalar objective over `N` solver variables.
///
/// Objectives must be deterministic and free of side effects: evaluating the
/// same `x` twice yields the same value. Solvers keep their own evaluation
/// counters, so implementations never need interior mutability.
///
/// Any closure `Fn(&[f64; N]) -> f64` is an objective without a gradient.
/// Pair a closure with its analytic gradient using [`WithGradient`].
pub trait Objective<const N: usize> {
    /// Evaluates the objective at `x`.
    fn value(&self, x: &[f64; N]) -> f64;

    /// Evaluates the analytic gradient at `x`, if one is available.
    ///
    /// The default returns `None`, in which case gradient-based solvers fall
    /// back to finite differences.
    fn gradient(&self, x: &[f64; N]) -> Option<[f64; N]> {
        let _ = x;
        None
    }
}

impl<const N: usize, F> Objective<N> for F
where
    F: Fn(&[f64; N]) -> f64,
{
    fn value(&self, x: &[f64; N]) -> f64 {
        self(x)
    }
}

/// An objective closure paired with its analytic gradient.
#[derive(Debug, Clone, Copy)]
pub struct WithGradient<F, G>(pub F, pub G);

impl<const N: usize, F, G> Objective<N> for WithGradient<F, G>
where
    F: Fn(&[f64; N]) -> f64,
    G: Fn(&[f64; N]) -> [f64; N],
{
    fn value(&self, x: &[f64; N]) -> f64 {
        (self.0)(x)
    }

    fn gradient(&self, x: &[f64; N]) -> Option<[f64; N]> {
        Some((self.1)(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn sum_of_squares(x: &[f64; 2]) -> f64 {
        x[0] * x[0] + x[1] * x[1]
    }

    #[test]
    fn closure_has_no_gradient() {
        let objective = |x: &[f64; 2]| x[0] + x[1];

        assert_relative_eq!(objective.value(&[1.0, 2.0]), 3.0);
        assert!(Objective::gradient(&objective, &[1.0, 2.0]).is_none());
    }

    #[test]
    fn with_gradient_reports_both() {
        let objective = WithGradient(sum_of_squares, |x: &[f64; 2]| [2.0 * x[0], 2.0 * x[1]]);

        assert_relative_eq!(objective.value(&[1.0, -2.0]), 5.0);
        let grad = objective.gradient(&[1.0, -2.0]).expect("gradient provided");
        assert_relative_eq!(grad[0], 2.0);
        assert_relative_eq!(grad[1], -4.0);
    }
}
