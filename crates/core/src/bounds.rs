use thiserror::Error;

/// Errors that can occur when constructing [`Bounds`].
#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum BoundsError {
    #[error("bound {index} is NaN")]
    Nan { index: usize },

    #[error("bound {index} has lower {lower} greater than upper {upper}")]
    Reversed { index: usize, lower: f64, upper: f64 },
}

/// A closed interval for one variable.
///
/// Either side may be infinite to leave the variable unbounded in that
/// direction. The lower side never exceeds the upper side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    lower: f64,
    upper: f64,
}

impl Bound {
    /// A bound that admits every finite value.
    pub const UNBOUNDED: Self = Self {
        lower: f64::NEG_INFINITY,
        upper: f64::INFINITY,
    };

    /// Returns the lower side.
    #[must_use]
    pub fn lower(&self) -> f64 {
        self.lower
    }

    /// Returns the upper side.
    #[must_use]
    pub fn upper(&self) -> f64 {
        self.upper
    }

    /// Returns `true` if both sides are finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lower.is_finite() && self.upper.is_finite()
    }

    /// Returns `value` moved to the nearest point of the interval.
    #[must_use]
    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.lower).min(self.upper)
    }

    /// Returns how far `value` lies outside the interval.
    #[must_use]
    pub fn excess(&self, value: f64) -> f64 {
        (self.lower - value).max(0.0) + (value - self.upper).max(0.0)
    }
}

/// Per-variable box bounds over `N` solver variables.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<const N: usize> {
    bounds: [Bound; N],
}

impl<const N: usize> Default for Bounds<N> {
    fn default() -> Self {
        Self::unbounded()
    }
}

impl<const N: usize> Bounds<N> {
    /// Creates bounds from `(lower, upper)` pairs.
    ///
    /// Use `f64::NEG_INFINITY` or `f64::INFINITY` to leave a side open.
    ///
    /// # Errors
    ///
    /// Returns an error if any side is NaN or if a lower side exceeds its
    /// upper side.
    pub fn new(pairs: [(f64, f64); N]) -> Result<Self, BoundsError> {
        let mut bounds = [Bound::UNBOUNDED; N];
        for (index, (lower, upper)) in pairs.into_iter().enumerate() {
            if lower.is_nan() || upper.is_nan() {
                return Err(BoundsError::Nan { index });
            }
            if lower > upper {
                return Err(BoundsError::Reversed {
                    index,
                    lower,
                    upper,
                });
            }
            bounds[index] = Bound { lower, upper };
        }
        Ok(Self { bounds })
    }

    /// Creates bounds that apply the same interval to every variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is invalid.
    pub fn uniform(lower: f64, upper: f64) -> Result<Self, BoundsError> {
        Self::new([(lower, upper); N])
    }

    /// Creates bounds that leave every variable free.
    #[must_use]
    pub fn unbounded() -> Self {
        Self {
            bounds: [Bound::UNBOUNDED; N],
        }
    }

    /// Returns the bound for variable `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= N`.
    #[must_use]
    pub fn get(&self, index: usize) -> Bound {
        self.bounds[index]
    }

    /// Iterates over the per-variable bounds.
    pub fn iter(&self) -> impl Iterator<Item = &Bound> {
        self.bounds.iter()
    }

    /// Returns `true` if every side of every variable is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.bounds.iter().all(Bound::is_finite)
    }

    /// Returns `true` if `x` lies inside the box.
    #[must_use]
    pub fn contains(&self, x: &[f64; N]) -> bool {
        x.iter()
            .zip(&self.bounds)
            .all(|(&xi, b)| xi >= b.lower && xi <= b.upper)
    }

    /// Projects `x` onto the box.
    #[must_use]
    pub fn clamp(&self, x: &[f64; N]) -> [f64; N] {
        let mut out = *x;
        for (xi, b) in out.iter_mut().zip(&self.bounds) {
            *xi = b.clamp(*xi);
        }
        out
    }

    /// Returns the total distance by which `x` lies outside the box.
    #[must_use]
    pub fn excess(&self, x: &[f64; N]) -> f64 {
        x.iter()
            .zip(&self.bounds)
            .map(|(&xi, b)| b.excess(xi))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn rejects_reversed_bound() {
        let result = Bounds::new([(0.0, 1.0), (2.0, -2.0)]);
        assert!(matches!(result, Err(BoundsError::Reversed { index: 1, .. })));
    }

    #[test]
    fn rejects_nan_bound() {
        let result = Bounds::new([(f64::NAN, 1.0)]);
        assert_eq!(result, Err(BoundsError::Nan { index: 0 }));
    }

    #[test]
    fn allows_one_sided_bounds() {
        let bounds = Bounds::new([(0.0, f64::INFINITY), (f64::NEG_INFINITY, 3.0)])
            .expect("valid bounds");

        assert!(!bounds.is_finite());
        assert!(bounds.contains(&[10.0, -10.0]));
        assert!(!bounds.contains(&[-1.0, 0.0]));
    }

    #[test]
    fn clamp_projects_onto_box() {
        let bounds = Bounds::<2>::uniform(-2.0, 2.0).expect("valid bounds");

        let x = bounds.clamp(&[3.0, -0.5]);

        assert_relative_eq!(x[0], 2.0);
        assert_relative_eq!(x[1], -0.5);
        assert!(bounds.is_finite());
    }

    #[test]
    fn excess_sums_distance_outside() {
        let bounds = Bounds::<2>::uniform(0.0, 1.0).expect("valid bounds");

        assert_relative_eq!(bounds.excess(&[0.5, 0.5]), 0.0);
        assert_relative_eq!(bounds.excess(&[-0.5, 1.25]), 0.75);
    }
}
