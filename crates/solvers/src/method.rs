use std::{fmt, str::FromStr};

use thiserror::Error;

/// The unconstrained solver families.
///
/// Dispatch from a `Method` to its algorithm is a plain `match`, so adding a
/// variant is checked at compile time everywhere a method is selected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Method {
    /// Quasi-Newton with a dense inverse Hessian approximation.
    #[default]
    Bfgs,

    /// Limited-memory quasi-Newton with box bounds.
    Lbfgsb,

    /// Nonlinear conjugate gradient (Polak–Ribière).
    ConjugateGradient,

    /// Derivative-free downhill simplex.
    NelderMead,
}

impl Method {
    /// Every method, in reporting order.
    pub const ALL: [Self; 4] = [
        Self::Bfgs,
        Self::Lbfgsb,
        Self::ConjugateGradient,
        Self::NelderMead,
    ];

    /// Returns the conventional display name of the method.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Bfgs => "BFGS",
            Self::Lbfgsb => "L-BFGS-B",
            Self::ConjugateGradient => "CG",
            Self::NelderMead => "Nelder-Mead",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Error returned when parsing an unknown method name.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown method: {0}")]
pub struct ParseMethodError(String);

impl FromStr for Method {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace(['-', '_', ' '], "").as_str() {
            "bfgs" => Ok(Self::Bfgs),
            "lbfgsb" => Ok(Self::Lbfgsb),
            "cg" | "conjugategradient" => Ok(Self::ConjugateGradient),
            "neldermead" => Ok(Self::NelderMead),
            _ => Err(ParseMethodError(s.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_conventional_names() {
        for method in Method::ALL {
            assert_eq!(method.name().parse::<Method>(), Ok(method));
        }
        assert_eq!(
            "conjugate_gradient".parse::<Method>(),
            Ok(Method::ConjugateGradient)
        );
    }

    #[test]
    fn rejects_unknown_name() {
        assert!("simulated-annealing".parse::<Method>().is_err());
    }
}
