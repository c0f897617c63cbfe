use thiserror::Error;

use crate::ConfigError;

/// Errors that prevent a solve from starting.
///
/// Algorithmic outcomes such as non-convergence or line-search failure are
/// not errors; they are reported through [`Status`](crate::Status).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("initial point has non-finite value {value} at index {index}")]
    NonFiniteStart { index: usize, value: f64 },

    #[error("variable {index} must have finite bounds on both sides")]
    UnboundedSearchSpace { index: usize },
}

/// Validates the configuration and the initial point shared by every solver.
pub(crate) fn check_start<const N: usize>(
    x0: &[f64; N],
    config: &crate::Config,
) -> Result<(), Error> {
    config.validate()?;
    if N == 0 {
        return Err(ConfigError::Dimension.into());
    }
    if let Some((index, &value)) = x0.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(Error::NonFiniteStart { index, value });
    }
    Ok(())
}
