use thiserror::Error;

use crate::Method;

/// Errors that can occur when validating solver configuration.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    #[error("tolerance must be finite and positive")]
    Tolerance,

    #[error("max_iters must be positive")]
    MaxIters,

    #[error("problem must have at least one variable")]
    Dimension,

    #[error("invalid {name}: {reason}")]
    InvalidOption {
        name: &'static str,
        reason: &'static str,
    },
}

/// Convergence tolerance and iteration budget shared by every solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Tolerance compared against each solver's convergence measure.
    pub tolerance: f64,

    /// Maximum number of iterations (generations for differential evolution).
    pub max_iters: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iters: 1000,
        }
    }
}

impl Config {
    /// Validates the tolerance and iteration budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the tolerance is not finite and positive, or if
    /// the iteration budget is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(ConfigError::Tolerance);
        }
        if self.max_iters == 0 {
            return Err(ConfigError::MaxIters);
        }
        Ok(())
    }
}

/// Full configuration for one call to a `solve_*` entry point.
///
/// `method` only selects the algorithm for [`solve_unconstrained`], `seed`
/// only affects [`solve_global`], and `x0` is ignored by [`solve_global`],
/// which samples its population from the bounds.
///
/// [`solve_unconstrained`]: crate::solve_unconstrained
/// [`solve_global`]: crate::solve_global
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig<const N: usize> {
    pub method: Method,
    pub x0: [f64; N],
    pub tolerance: f64,
    pub max_iters: usize,
    pub seed: Option<u64>,
}

impl<const N: usize> SolverConfig<N> {
    /// Creates a config starting at `x0` with default tolerance and budget.
    #[must_use]
    pub fn new(x0: [f64; N]) -> Self {
        let Config {
            tolerance,
            max_iters,
        } = Config::default();
        Self {
            method: Method::default(),
            x0,
            tolerance,
            max_iters,
            seed: None,
        }
    }

    /// Returns a copy with a different method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Returns the tolerance and budget as a [`Config`].
    #[must_use]
    pub fn config(&self) -> Config {
        Config {
            tolerance: self.tolerance,
            max_iters: self.max_iters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_tolerance() {
        for tolerance in [0.0, -1e-3, f64::NAN, f64::INFINITY] {
            let config = Config {
                tolerance,
                ..Config::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::Tolerance));
        }
    }

    #[test]
    fn rejects_zero_budget() {
        let config = Config {
            max_iters: 0,
            ..Config::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MaxIters));
    }

    #[test]
    fn solver_config_carries_budget() {
        let solver_config = SolverConfig {
            tolerance: 1e-8,
            max_iters: 50,
            ..SolverConfig::new([1.0, 2.0])
        }
        .with_method(Method::NelderMead);

        assert_eq!(solver_config.method, Method::NelderMead);
        assert_eq!(
            solver_config.config(),
            Config {
                tolerance: 1e-8,
                max_iters: 50
            }
        );
    }
}
