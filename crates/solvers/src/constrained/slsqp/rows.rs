use optima_core::{Bounds, Constraint, ConstraintSet};

use crate::{
    evaluate::finite_difference,
    linalg::{axpy, is_finite},
};

/// Whether a linearized row must hold with equality or as `≥ 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Kind {
    Equality,
    Inequality,
}

/// A constraint linearized at the current iterate: `value + gradientᵀd`.
#[derive(Debug, Clone, Copy)]
pub(super) struct Row<const N: usize> {
    pub(super) kind: Kind,
    pub(super) value: f64,
    pub(super) gradient: [f64; N],
}

impl<const N: usize> Row<N> {
    fn from_constraint(
        kind: Kind,
        constraint: &Constraint<N>,
        x: &[f64; N],
        bounds: &Bounds<N>,
    ) -> Self {
        let value = constraint.value(x);
        let gradient = constraint.gradient(x).unwrap_or_else(|| {
            finite_difference(x, value, bounds, |probe| constraint.value(probe))
        });
        Self {
            kind,
            value,
            gradient,
        }
    }

    fn bound(value: f64, index: usize, sign: f64) -> Self {
        let mut gradient = [0.0; N];
        gradient[index] = sign;
        Self {
            kind: Kind::Inequality,
            value,
            gradient,
        }
    }

    /// Value of the linearization after a step `d`.
    pub(super) fn predicted(&self, d: &[f64; N]) -> f64 {
        self.value + crate::linalg::dot(&self.gradient, d)
    }

    pub(super) fn is_finite(&self) -> bool {
        self.value.is_finite() && is_finite(&self.gradient)
    }
}

/// Linearizes every constraint at `x`.
///
/// Rows are ordered as equalities, inequalities, finite lower bounds, then
/// finite upper bounds. The order is stable across iterates, so row indices
/// identify multipliers from one iteration to the next.
pub(super) fn linearize<const N: usize>(
    constraints: &ConstraintSet<N>,
    x: &[f64; N],
) -> Vec<Row<N>> {
    let bounds = constraints.box_bounds();

    let equalities = constraints
        .equalities()
        .iter()
        .map(|c| Row::from_constraint(Kind::Equality, c, x, bounds));
    let inequalities = constraints
        .inequalities()
        .iter()
        .map(|c| Row::from_constraint(Kind::Inequality, c, x, bounds));
    let lower = bounds
        .iter()
        .enumerate()
        .filter(|(_, b)| b.lower().is_finite())
        .map(|(i, b)| Row::bound(x[i] - b.lower(), i, 1.0));
    let upper = bounds
        .iter()
        .enumerate()
        .filter(|(_, b)| b.upper().is_finite())
        .map(|(i, b)| Row::bound(b.upper() - x[i], i, -1.0));

    equalities.chain(inequalities).chain(lower).chain(upper).collect()
}

/// Gradient of the Lagrangian `f − λᵀc`.
pub(super) fn lagrangian_gradient<const N: usize>(
    gradient: &[f64; N],
    rows: &[Row<N>],
    multipliers: &[f64],
) -> [f64; N] {
    rows.iter()
        .zip(multipliers)
        .fold(*gradient, |acc, (row, lambda)| axpy(&acc, -lambda, &row.gradient))
}
