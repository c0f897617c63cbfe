use approx::assert_relative_eq;

use optima_core::{Bounds, Constraint, ConstraintSet, functions::Rosenbrock};

use crate::{Action, Config, Status};

use super::{Event, Options, damped_update, minimize, minimize_unobserved};

fn line_and_disk() -> ConstraintSet<2> {
    ConstraintSet::new()
        .equality(Constraint::with_gradient(
            |x: &[f64; 2]| x[0] + x[1] - 1.0,
            |_| [1.0, 1.0],
        ))
        .inequality(Constraint::with_gradient(
            |x: &[f64; 2]| 2.0 - x[0] * x[0] - x[1] * x[1],
            |x| [-2.0 * x[0], -2.0 * x[1]],
        ))
        .bounds(Bounds::uniform(-2.0, 2.0).unwrap())
}

#[test]
fn rosenbrock_on_a_line_inside_a_disk() {
    let constraints = line_and_disk();

    let solution = minimize_unobserved(
        &Rosenbrock::default(),
        [0.5, 0.5],
        &constraints,
        &Config::default(),
        &Options::default(),
    )
    .unwrap();

    let [x, y] = solution.x;
    assert_eq!(solution.status, Status::Converged);
    assert!((x + y - 1.0).abs() < 1e-6);
    assert!(x * x + y * y <= 2.0 + 1e-6);
    assert!(constraints.max_violation(&solution.x) < 1e-6);
    assert_relative_eq!(x, 0.6188, epsilon = 1e-3);
    assert_relative_eq!(y, 0.3812, epsilon = 1e-3);
}

#[test]
fn projects_onto_disk_with_finite_differences() {
    let objective = |x: &[f64; 2]| (x[0] - 2.0).powi(2) + (x[1] - 2.0).powi(2);
    let disk = |x: &[f64; 2]| 2.0 - x[0] * x[0] - x[1] * x[1];
    let constraints = ConstraintSet::new().inequality(Constraint::new(disk));

    let solution = minimize_unobserved(
        &objective,
        [0.0, 0.0],
        &constraints,
        &Config::default(),
        &Options::default(),
    )
    .unwrap();

    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 1.0, epsilon = 1e-5);
    assert_relative_eq!(solution.x[1], 1.0, epsilon = 1e-5);
    assert_eq!(solution.grad_evals, 0);
}

#[test]
fn start_outside_bounds_is_clipped() {
    let objective = |x: &[f64; 1]| (x[0] - 3.0).powi(2);
    let bounds = Bounds::new([(0.0, 1.0)]).unwrap();
    let constraints = ConstraintSet::new().bounds(bounds);
    let mut inside = true;

    let solution = minimize(
        &objective,
        [-5.0],
        &constraints,
        &Config::default(),
        &Options::default(),
        |event: &Event<'_, 1>| {
            inside &= bounds.contains(event.x);
            None
        },
    )
    .unwrap();

    assert!(inside);
    assert_eq!(solution.status, Status::Converged);
    assert_relative_eq!(solution.x[0], 1.0);
}

#[test]
fn contradictory_constraints_are_infeasible() {
    let objective = |x: &[f64; 1]| x[0] * x[0];
    let constraints = ConstraintSet::new()
        .equality(Constraint::new(|x: &[f64; 1]| x[0]))
        .inequality(Constraint::new(|x: &[f64; 1]| x[0] - 1.0));

    let solution = minimize_unobserved(
        &objective,
        [0.5],
        &constraints,
        &Config::default(),
        &Options::default(),
    )
    .unwrap();

    match solution.status {
        Status::Infeasible { violation } => assert_relative_eq!(violation, 1.0, epsilon = 1e-9),
        other => panic!("expected infeasible, got {other:?}"),
    }
    assert!(solution.iters < Config::default().max_iters);
}

#[test]
fn observer_sees_violation_and_can_stop() {
    let mut violations = Vec::new();

    let solution = minimize(
        &Rosenbrock::default(),
        [-1.5, 1.5],
        &line_and_disk(),
        &Config::default(),
        &Options::default(),
        |event: &Event<'_, 2>| {
            violations.push(event.violation);
            (violations.len() == 2).then_some(Action::StopEarly)
        },
    )
    .unwrap();

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert!(solution.iters >= 2);
    assert_eq!(violations.len(), 2);
    assert!(violations.iter().all(|v| v.is_finite() && *v >= 0.0));
}

#[test]
fn damped_update_stays_positive_definite() {
    let mut b = [[1.0, 0.0], [0.0, 1.0]];

    // Negative curvature along s would make a plain BFGS update indefinite.
    assert!(damped_update(&mut b, &[1.0, 0.0], &[-1.0, 0.0]));

    assert_relative_eq!(b[0][0], 0.2, epsilon = 1e-12);
    assert_relative_eq!(b[1][1], 1.0, epsilon = 1e-12);
}
