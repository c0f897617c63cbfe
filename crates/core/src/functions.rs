//! Standard test objectives with analytic gradients.

use crate::Objective;

/// The two-variable Rosenbrock function `(a − x)² + b·(y − x²)²`.
///
/// The global minimum is at `(a, a²)` with value zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rosenbrock {
    pub a: f64,
    pub b: f64,
}

impl Default for Rosenbrock {
    fn default() -> Self {
        Self { a: 1.0, b: 100.0 }
    }
}

impl Objective<2> for Rosenbrock {
    fn value(&self, x: &[f64; 2]) -> f64 {
        (self.a - x[0]).powi(2) + self.b * (x[1] - x[0].powi(2)).powi(2)
    }

    fn gradient(&self, x: &[f64; 2]) -> Option<[f64; 2]> {
        let valley = x[1] - x[0].powi(2);
        Some([
            -2.0 * (self.a - x[0]) - 4.0 * self.b * x[0] * valley,
            2.0 * self.b * valley,
        ])
    }
}

/// A convex quadratic `½·Σ wᵢ·(xᵢ − cᵢ)²` with positive weights.
///
/// The minimum is at `center` with value zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quadratic<const N: usize> {
    pub weights: [f64; N],
    pub center: [f64; N],
}

impl<const N: usize> Objective<N> for Quadratic<N> {
    fn value(&self, x: &[f64; N]) -> f64 {
        x.iter()
            .zip(&self.weights)
            .zip(&self.center)
            .map(|((xi, w), c)| 0.5 * w * (xi - c).powi(2))
            .sum()
    }

    fn gradient(&self, x: &[f64; N]) -> Option<[f64; N]> {
        let mut grad = [0.0; N];
        for (i, g) in grad.iter_mut().enumerate() {
            *g = self.weights[i] * (x[i] - self.center[i]);
        }
        Some(grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn rosenbrock_minimum_is_zero() {
        let f = Rosenbrock::default();

        assert_relative_eq!(f.value(&[1.0, 1.0]), 0.0);
        let grad = f.gradient(&[1.0, 1.0]).expect("analytic gradient");
        assert_relative_eq!(grad[0], 0.0);
        assert_relative_eq!(grad[1], 0.0);
    }

    #[test]
    fn rosenbrock_gradient_at_origin() {
        let f = Rosenbrock::default();

        assert_relative_eq!(f.value(&[0.0, 0.0]), 1.0);
        let grad = f.gradient(&[0.0, 0.0]).expect("analytic gradient");
        assert_relative_eq!(grad[0], -2.0);
        assert_relative_eq!(grad[1], 0.0);
    }

    #[test]
    fn quadratic_is_centered() {
        let f = Quadratic {
            weights: [1.0, 4.0],
            center: [3.0, -1.0],
        };

        assert_relative_eq!(f.value(&[3.0, -1.0]), 0.0);
        assert_relative_eq!(f.value(&[4.0, 0.0]), 2.5);
        let grad = f.gradient(&[4.0, 0.0]).expect("analytic gradient");
        assert_relative_eq!(grad[0], 1.0);
        assert_relative_eq!(grad[1], 4.0);
    }
}
