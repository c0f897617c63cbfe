//! One-call entry points that pick default options for each solver family.

use optima_core::{Bounds, ConstraintSet, Objective};
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    Error, Method, Solution, SolverConfig,
    constrained::slsqp,
    global::differential_evolution,
    unconstrained::{bfgs, cg, lbfgsb, nelder_mead},
};

/// Seed used by [`solve_global`] when the config does not set one.
pub const DEFAULT_SEED: u64 = 42;

/// Minimizes the objective with the method named in `config`.
///
/// L-BFGS-B runs without bounds here; call
/// [`lbfgsb::minimize`](crate::unconstrained::lbfgsb::minimize) directly to
/// pass a box.
///
/// # Errors
///
/// Returns an error if the config is invalid or `config.x0` contains a
/// non-finite value.
pub fn solve_unconstrained<O, const N: usize>(
    objective: &O,
    config: &SolverConfig<N>,
) -> Result<Solution<N>, Error>
where
    O: Objective<N> + ?Sized,
{
    let x0 = config.x0;
    let base = config.config();
    match config.method {
        Method::Bfgs => bfgs::minimize_unobserved(objective, x0, &base, &bfgs::Options::default()),
        Method::Lbfgsb => lbfgsb::minimize_unobserved(
            objective,
            x0,
            &Bounds::unbounded(),
            &base,
            &lbfgsb::Options::default(),
        ),
        Method::ConjugateGradient => {
            cg::minimize_unobserved(objective, x0, &base, &cg::Options::default())
        }
        Method::NelderMead => {
            nelder_mead::minimize_unobserved(objective, x0, &base, &nelder_mead::Options::default())
        }
    }
}

/// Minimizes the objective subject to `constraints` with SLSQP.
///
/// `config.method` is ignored.
///
/// # Errors
///
/// Returns an error if the config is invalid or `config.x0` contains a
/// non-finite value.
pub fn solve_constrained<O, const N: usize>(
    objective: &O,
    constraints: &ConstraintSet<N>,
    config: &SolverConfig<N>,
) -> Result<Solution<N>, Error>
where
    O: Objective<N> + ?Sized,
{
    slsqp::minimize_unobserved(
        objective,
        config.x0,
        constraints,
        &config.config(),
        &slsqp::Options::default(),
    )
}

/// Minimizes the objective over `bounds` with differential evolution.
///
/// The generator is seeded from `config.seed`, or [`DEFAULT_SEED`] when it
/// is `None`, so repeated calls with the same config return identical
/// results. `config.x0` and `config.method` are ignored.
///
/// # Errors
///
/// Returns an error if the config is invalid or any variable lacks a finite
/// bound on either side.
pub fn solve_global<O, const N: usize>(
    objective: &O,
    bounds: &Bounds<N>,
    config: &SolverConfig<N>,
) -> Result<Solution<N>, Error>
where
    O: Objective<N> + ?Sized,
{
    let mut rng = StdRng::seed_from_u64(config.seed.unwrap_or(DEFAULT_SEED));
    differential_evolution::minimize_unobserved(
        objective,
        bounds,
        &config.config(),
        &differential_evolution::Options::default(),
        &mut rng,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use optima_core::{Constraint, functions::Rosenbrock};

    use crate::{ConfigError, Status};

    #[test]
    fn every_method_solves_rosenbrock() {
        for method in Method::ALL {
            let config = SolverConfig {
                max_iters: 5000,
                ..SolverConfig::new([-1.2, 1.0])
            }
            .with_method(method);

            let solution = solve_unconstrained(&Rosenbrock::default(), &config).unwrap();

            assert!(solution.success(), "{method} stopped with {:?}", solution.status);
            assert_relative_eq!(solution.x[0], 1.0, epsilon = 1e-2);
            assert_relative_eq!(solution.x[1], 1.0, epsilon = 1e-2);
        }
    }

    #[test]
    fn constrained_entry_point_uses_constraints() {
        let constraints = ConstraintSet::new().equality(Constraint::with_gradient(
            |x: &[f64; 2]| x[0] - 2.0 * x[1],
            |_| [1.0, -2.0],
        ));
        let objective = |x: &[f64; 2]| (x[0] - 1.0).powi(2) + (x[1] - 1.0).powi(2);

        let solution =
            solve_constrained(&objective, &constraints, &SolverConfig::new([0.0, 0.0])).unwrap();

        // Closest point to (1, 1) on the line x = 2y.
        assert_eq!(solution.status, Status::Converged);
        assert_relative_eq!(solution.x[0], 1.2, epsilon = 1e-5);
        assert_relative_eq!(solution.x[1], 0.6, epsilon = 1e-5);
    }

    #[test]
    fn global_entry_point_defaults_to_fixed_seed() {
        let bounds = Bounds::uniform(-3.0, 3.0).unwrap();
        let objective = |x: &[f64; 2]| (x[0] - 1.5).powi(2) + (x[1] + 0.5).powi(2);

        let implicit = solve_global(&objective, &bounds, &SolverConfig::new([0.0; 2])).unwrap();
        let explicit = solve_global(
            &objective,
            &bounds,
            &SolverConfig {
                seed: Some(DEFAULT_SEED),
                ..SolverConfig::new([0.0; 2])
            },
        )
        .unwrap();

        assert_eq!(implicit, explicit);
        assert_relative_eq!(implicit.x[0], 1.5, epsilon = 1e-4);
        assert_relative_eq!(implicit.x[1], -0.5, epsilon = 1e-4);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let config = SolverConfig {
            max_iters: 0,
            ..SolverConfig::new([1.0])
        };
        let result = solve_unconstrained(&|x: &[f64; 1]| x[0] * x[0], &config);

        assert_eq!(result, Err(Error::InvalidConfig(ConfigError::MaxIters)));
    }
}
