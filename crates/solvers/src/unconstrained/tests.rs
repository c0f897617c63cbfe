use approx::assert_relative_eq;

use optima_core::{Bounds, WithGradient, functions::Rosenbrock};

use crate::{Action, Config, ConfigError, Error, Event, Status};

use super::{bfgs, cg, lbfgsb, nelder_mead};

/// f(x) = ½xᵀAx − bᵀx with A = [[3, 1], [1, 2]] and b = [1, 1].
///
/// The minimizer is A⁻¹b = [0.2, 0.4].
fn coupled_quadratic() -> impl optima_core::Objective<2> {
    WithGradient(
        |x: &[f64; 2]| {
            0.5 * (3.0 * x[0] * x[0] + 2.0 * x[0] * x[1] + 2.0 * x[1] * x[1]) - x[0] - x[1]
        },
        |x: &[f64; 2]| [3.0 * x[0] + x[1] - 1.0, x[0] + 2.0 * x[1] - 1.0],
    )
}

/// Observer that records the objective at every iteration.
fn recorder(values: &mut Vec<f64>) -> impl FnMut(&Event<'_, 2>) -> Option<Action> + '_ {
    |event: &Event<'_, 2>| {
        values.push(event.objective);
        None
    }
}

fn assert_non_increasing(values: &[f64]) {
    for pair in values.windows(2) {
        assert!(pair[1] <= pair[0], "objective increased: {pair:?}");
    }
}

#[test]
fn bfgs_solves_coupled_quadratic() {
    let objective = coupled_quadratic();
    let mut values = Vec::new();

    let solution = bfgs::minimize(
        &objective,
        [5.0, -3.0],
        &Config::default(),
        &bfgs::Options::default(),
        recorder(&mut values),
    )
    .unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert!(solution.success());
    assert_relative_eq!(solution.x[0], 0.2, epsilon = 1e-6);
    assert_relative_eq!(solution.x[1], 0.4, epsilon = 1e-6);
    assert_eq!(values.len(), solution.iters);
    assert_non_increasing(&values);
    assert!(solution.grad_evals > 0);
}

#[test]
fn cg_solves_coupled_quadratic() {
    let objective = coupled_quadratic();
    let mut values = Vec::new();

    let solution = cg::minimize(
        &objective,
        [5.0, -3.0],
        &Config::default(),
        &cg::Options::default(),
        recorder(&mut values),
    )
    .unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 0.2, epsilon = 1e-6);
    assert_relative_eq!(solution.x[1], 0.4, epsilon = 1e-6);
    assert_non_increasing(&values);
}

#[test]
fn bfgs_solves_rosenbrock() {
    let solution = bfgs::minimize_unobserved(
        &Rosenbrock::default(),
        [-1.2, 1.0],
        &Config::default(),
        &bfgs::Options::default(),
    )
    .unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 1.0, epsilon = 1e-5);
    assert_relative_eq!(solution.x[1], 1.0, epsilon = 1e-5);
}

#[test]
fn cg_solves_rosenbrock() {
    let config = Config {
        tolerance: 1e-5,
        max_iters: 5000,
    };

    let solution = cg::minimize_unobserved(
        &Rosenbrock::default(),
        [-1.2, 1.0],
        &config,
        &cg::Options::default(),
    )
    .unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 1.0, epsilon = 1e-3);
    assert_relative_eq!(solution.x[1], 1.0, epsilon = 1e-3);
}

#[test]
fn lbfgsb_unbounded_with_finite_differences() {
    let rosenbrock = Rosenbrock::default();
    let value_only = |x: &[f64; 2]| optima_core::Objective::value(&rosenbrock, x);
    let config = Config {
        tolerance: 1e-4,
        ..Config::default()
    };

    let solution = lbfgsb::minimize_unobserved(
        &value_only,
        [0.0, 0.0],
        &Bounds::unbounded(),
        &config,
        &lbfgsb::Options::default(),
    )
    .unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 1.0, epsilon = 1e-2);
    assert_relative_eq!(solution.x[1], 1.0, epsilon = 1e-2);
    assert_eq!(solution.grad_evals, 0);
}

#[test]
fn lbfgsb_stops_at_active_bound() {
    let bounds = Bounds::new([(-2.0, 0.5), (-2.0, 2.0)]).unwrap();
    let mut inside = true;

    let solution = lbfgsb::minimize(
        &Rosenbrock::default(),
        [-1.0, 1.5],
        &bounds,
        &Config::default(),
        &lbfgsb::Options::default(),
        |event: &Event<'_, 2>| {
            inside &= bounds.contains(event.x);
            None
        },
    )
    .unwrap();

    assert!(inside);
    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 0.5, epsilon = 1e-6);
    assert_relative_eq!(solution.x[1], 0.25, epsilon = 1e-4);
}

#[test]
fn lbfgsb_projects_start_point() {
    let bounds = Bounds::new([(0.0, 1.0)]).unwrap();
    let objective = WithGradient(|x: &[f64; 1]| x[0], |_: &[f64; 1]| [1.0]);

    let solution = lbfgsb::minimize_unobserved(
        &objective,
        [-5.0],
        &bounds,
        &Config::default(),
        &lbfgsb::Options::default(),
    )
    .unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert_eq!(solution.iters, 0);
    assert_relative_eq!(solution.x[0], 0.0);
}

#[test]
fn nelder_mead_solves_rosenbrock_from_origin() {
    let config = Config {
        tolerance: 1e-8,
        ..Config::default()
    };

    let solution = nelder_mead::minimize_unobserved(
        &Rosenbrock::default(),
        [0.0, 0.0],
        &config,
        &nelder_mead::Options::default(),
    )
    .unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert!(solution.iters < 500, "took {} iterations", solution.iters);
    assert_relative_eq!(solution.x[0], 1.0, epsilon = 1e-3);
    assert_relative_eq!(solution.x[1], 1.0, epsilon = 1e-3);
    assert_eq!(solution.grad_evals, 0);
}

#[test]
fn observer_can_stop_early() {
    let solution = bfgs::minimize(
        &Rosenbrock::default(),
        [-1.2, 1.0],
        &Config::default(),
        &bfgs::Options::default(),
        |event: &Event<'_, 2>| (event.iter == 3).then_some(Action::StopEarly),
    )
    .unwrap();

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert_eq!(solution.iters, 3);
}

#[test]
fn budget_exhaustion_returns_best_point() {
    let config = Config {
        max_iters: 2,
        ..Config::default()
    };

    let solution = nelder_mead::minimize_unobserved(
        &Rosenbrock::default(),
        [-1.2, 1.0],
        &config,
        &nelder_mead::Options::default(),
    )
    .unwrap();

    assert_eq!(solution.status, Status::MaxIters);
    assert_eq!(solution.iters, 2);
    assert!(solution.objective <= 24.2);
}

#[test]
fn nan_objective_reports_degeneracy() {
    let objective = WithGradient(
        |x: &[f64; 1]| if x[0] < 0.5 { (x[0] - 1.0).powi(2) } else { f64::NAN },
        |x: &[f64; 1]| [2.0 * (x[0] - 1.0)],
    );

    let solution =
        bfgs::minimize_unobserved(&objective, [0.0], &Config::default(), &bfgs::Options::default())
            .unwrap();

    assert_eq!(solution.status, Status::NumericalDegeneracy);
    assert!(!solution.success());
    assert_eq!(solution.x, [0.0]);
    assert_relative_eq!(solution.objective, 1.0);
}

#[test]
fn rejects_invalid_tolerance() {
    let config = Config {
        tolerance: 0.0,
        ..Config::default()
    };

    let result = cg::minimize_unobserved(
        &Rosenbrock::default(),
        [0.0, 0.0],
        &config,
        &cg::Options::default(),
    );

    assert_eq!(result, Err(Error::InvalidConfig(ConfigError::Tolerance)));
}

#[test]
fn rejects_non_finite_start() {
    let result = nelder_mead::minimize_unobserved(
        &Rosenbrock::default(),
        [0.0, f64::INFINITY],
        &Config::default(),
        &nelder_mead::Options::default(),
    );

    assert!(matches!(
        result,
        Err(Error::NonFiniteStart { index: 1, .. })
    ));
}

/// `‖x‖²` paired with a gradient of the wrong sign, so every search
/// direction the gradient suggests goes uphill.
fn misleading_gradient() -> impl optima_core::Objective<2> {
    WithGradient(
        |x: &[f64; 2]| x[0] * x[0] + x[1] * x[1],
        |x: &[f64; 2]| [-2.0 * x[0], -2.0 * x[1]],
    )
}

#[test]
fn line_search_failure_keeps_the_start_point() {
    let objective = misleading_gradient();
    let config = Config::default();

    let results = [
        bfgs::minimize_unobserved(&objective, [1.0, 1.0], &config, &bfgs::Options::default()),
        cg::minimize_unobserved(&objective, [1.0, 1.0], &config, &cg::Options::default()),
        lbfgsb::minimize_unobserved(
            &objective,
            [1.0, 1.0],
            &Bounds::unbounded(),
            &config,
            &lbfgsb::Options::default(),
        ),
    ];

    for solution in results {
        let solution = solution.unwrap();
        assert_eq!(solution.status, Status::LineSearchFailed);
        assert!(!solution.success());
        assert_eq!(solution.x, [1.0, 1.0]);
        assert_relative_eq!(solution.objective, 2.0);
        assert_eq!(solution.iters, 1);
    }
}

#[test]
fn cg_restarting_every_iteration_still_descends() {
    let objective = coupled_quadratic();
    let mut values = Vec::new();
    let options = cg::Options {
        restart_interval: Some(1),
        ..cg::Options::default()
    };

    let solution = cg::minimize(
        &objective,
        [5.0, -3.0],
        &Config::default(),
        &options,
        recorder(&mut values),
    )
    .unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 0.2, epsilon = 1e-6);
    assert_relative_eq!(solution.x[1], 0.4, epsilon = 1e-6);
    assert_non_increasing(&values);
}

#[test]
fn lbfgsb_handles_box_narrower_than_difference_step() {
    let objective = |x: &[f64; 1]| {
        if x[0] < 1.0 {
            f64::NAN
        } else {
            (x[0] - 3.0).powi(2)
        }
    };
    let bounds = Bounds::new([(1.0, 1.0 + 1e-10)]).unwrap();

    let solution = lbfgsb::minimize_unobserved(
        &objective,
        [1.0],
        &bounds,
        &Config::default(),
        &lbfgsb::Options::default(),
    )
    .unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert!(bounds.contains(&solution.x));
}
