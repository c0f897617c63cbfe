use crate::{ConfigError, LineSearch};

/// Tuning options for SLSQP.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Options {
    /// Consecutive iterations without a decrease in violation, while the
    /// violation exceeds the tolerance, before the solve reports
    /// [`Status::Infeasible`](crate::Status::Infeasible).
    pub infeasibility_patience: usize,

    /// Backtracking parameters for the merit line search.
    pub line_search: LineSearch,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            infeasibility_patience: 10,
            line_search: LineSearch::default(),
        }
    }
}

impl Options {
    /// Validates the options.
    ///
    /// # Errors
    ///
    /// Returns an error if the patience is zero or the line search
    /// parameters are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.infeasibility_patience == 0 {
            return Err(ConfigError::InvalidOption {
                name: "infeasibility_patience",
                reason: "must be positive",
            });
        }
        self.line_search.validate()
    }
}
