use std::fmt;

use crate::Bounds;

type ValueFn<const N: usize> = Box<dyn Fn(&[f64; N]) -> f64 + Send + Sync>;
type GradientFn<const N: usize> = Box<dyn Fn(&[f64; N]) -> [f64; N] + Send + Sync>;

/// A single scalar constraint function with an optional analytic gradient.
///
/// Whether the constraint is an equality (`c(x) = 0`) or an inequality
/// (`c(x) ≥ 0`) is decided by where it sits in a [`ConstraintSet`].
pub struct Constraint<const N: usize> {
    value: ValueFn<N>,
    gradient: Option<GradientFn<N>>,
}

impl<const N: usize> Constraint<N> {
    /// Creates a constraint without an analytic gradient.
    pub fn new<F>(value: F) -> Self
    where
        F: Fn(&[f64; N]) -> f64 + Send + Sync + 'static,
    {
        Self {
            value: Box::new(value),
            gradient: None,
        }
    }

    /// Creates a constraint with an analytic gradient.
    pub fn with_gradient<F, G>(value: F, gradient: G) -> Self
    where
        F: Fn(&[f64; N]) -> f64 + Send + Sync + 'static,
        G: Fn(&[f64; N]) -> [f64; N] + Send + Sync + 'static,
    {
        Self {
            value: Box::new(value),
            gradient: Some(Box::new(gradient)),
        }
    }

    /// Evaluates the constraint at `x`.
    #[must_use]
    pub fn value(&self, x: &[f64; N]) -> f64 {
        (self.value)(x)
    }

    /// Evaluates the analytic gradient at `x`, if one was supplied.
    #[must_use]
    pub fn gradient(&self, x: &[f64; N]) -> Option<[f64; N]> {
        self.gradient.as_ref().map(|g| g(x))
    }
}

impl<const N: usize> fmt::Debug for Constraint<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constraint")
            .field("has_gradient", &self.gradient.is_some())
            .finish_non_exhaustive()
    }
}

/// Equality constraints, inequality constraints, and box bounds.
///
/// Equalities are satisfied when `g(x) = 0`; inequalities are satisfied when
/// `h(x) ≥ 0`. Both keep their insertion order, which solvers rely on when
/// reporting multipliers.
#[derive(Debug, Default)]
pub struct ConstraintSet<const N: usize> {
    equalities: Vec<Constraint<N>>,
    inequalities: Vec<Constraint<N>>,
    bounds: Bounds<N>,
}

impl<const N: usize> ConstraintSet<N> {
    /// Creates an empty, unbounded constraint set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            equalities: Vec::new(),
            inequalities: Vec::new(),
            bounds: Bounds::unbounded(),
        }
    }

    /// Adds an equality constraint `g(x) = 0`.
    #[must_use]
    pub fn equality(mut self, constraint: Constraint<N>) -> Self {
        self.equalities.push(constraint);
        self
    }

    /// Adds an inequality constraint `h(x) ≥ 0`.
    #[must_use]
    pub fn inequality(mut self, constraint: Constraint<N>) -> Self {
        self.inequalities.push(constraint);
        self
    }

    /// Replaces the box bounds.
    #[must_use]
    pub fn bounds(mut self, bounds: Bounds<N>) -> Self {
        self.bounds = bounds;
        self
    }

    /// Returns the equality constraints in insertion order.
    #[must_use]
    pub fn equalities(&self) -> &[Constraint<N>] {
        &self.equalities
    }

    /// Returns the inequality constraints in insertion order.
    #[must_use]
    pub fn inequalities(&self) -> &[Constraint<N>] {
        &self.inequalities
    }

    /// Returns the box bounds.
    #[must_use]
    pub fn box_bounds(&self) -> &Bounds<N> {
        &self.bounds
    }

    /// Returns the L1 constraint violation at `x`.
    ///
    /// This is `Σ|gᵢ(x)| + Σ max(0, −hⱼ(x))` plus the distance outside the box.
    #[must_use]
    pub fn violation(&self, x: &[f64; N]) -> f64 {
        let eq: f64 = self.equalities.iter().map(|g| g.value(x).abs()).sum();
        let ineq: f64 = self
            .inequalities
            .iter()
            .map(|h| (-h.value(x)).max(0.0))
            .sum();
        eq + ineq + self.bounds.excess(x)
    }

    /// Returns the largest single constraint violation at `x`.
    #[must_use]
    pub fn max_violation(&self, x: &[f64; N]) -> f64 {
        let eq = self.equalities.iter().map(|g| g.value(x).abs());
        let ineq = self.inequalities.iter().map(|h| (-h.value(x)).max(0.0));
        let bounds = self.bounds.iter().zip(x).map(|(b, &xi)| b.excess(xi));
        eq.chain(ineq).chain(bounds).fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn disk_and_line() -> ConstraintSet<2> {
        ConstraintSet::new()
            .equality(Constraint::new(|x: &[f64; 2]| x[0] + x[1] - 1.0))
            .inequality(Constraint::with_gradient(
                |x: &[f64; 2]| 2.0 - (x[0] * x[0] + x[1] * x[1]),
                |x: &[f64; 2]| [-2.0 * x[0], -2.0 * x[1]],
            ))
            .bounds(Bounds::uniform(-2.0, 2.0).expect("valid bounds"))
    }

    #[test]
    fn feasible_point_has_zero_violation() {
        let constraints = disk_and_line();

        assert_relative_eq!(constraints.violation(&[0.5, 0.5]), 0.0);
        assert_relative_eq!(constraints.max_violation(&[0.5, 0.5]), 0.0);
    }

    #[test]
    fn violation_sums_every_kind() {
        let constraints = disk_and_line();

        // x + y - 1 = 3, x² + y² = 8 (so h = -6), y exceeds the box by 0.
        let x = [2.0, 2.0];
        assert_relative_eq!(constraints.violation(&x), 9.0);
        assert_relative_eq!(constraints.max_violation(&x), 6.0);
    }

    #[test]
    fn keeps_insertion_order_and_gradients() {
        let constraints = disk_and_line();

        assert_eq!(constraints.equalities().len(), 1);
        assert_eq!(constraints.inequalities().len(), 1);
        assert!(constraints.equalities()[0].gradient(&[0.0, 0.0]).is_none());

        let grad = constraints.inequalities()[0]
            .gradient(&[1.0, 0.5])
            .expect("gradient supplied");
        assert_relative_eq!(grad[0], -2.0);
        assert_relative_eq!(grad[1], -1.0);
    }
}
