use optima_core::Observer;

use crate::traits::{CanStopEarly, HasObjective};

/// Stops a solve once the objective reaches a target value.
///
/// Useful when any point below a known threshold is good enough and the
/// remaining iterations would only polish it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveTarget {
    /// Objective value at or below which the solve stops.
    pub target: f64,
}

impl ObjectiveTarget {
    /// Creates an observer that stops at `target`.
    #[must_use]
    pub fn new(target: f64) -> Self {
        Self { target }
    }
}

impl<E, A> Observer<E, A> for ObjectiveTarget
where
    E: HasObjective,
    A: CanStopEarly,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        (event.objective() <= self.target).then(A::stop_early)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::History;
    use optima_core::{Bounds, functions::Rosenbrock};
    use optima_solvers::{Config, Status, global::differential_evolution, unconstrained::lbfgsb};
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn stops_gradient_solver_at_target() {
        let config = Config {
            tolerance: 1e-12,
            ..Config::default()
        };
        let solution = lbfgsb::minimize(
            &Rosenbrock::default(),
            [-1.2, 1.0],
            &Bounds::unbounded(),
            &config,
            &lbfgsb::Options::default(),
            ObjectiveTarget::new(1e-2),
        )
        .unwrap();

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert!(solution.objective <= 1e-2);
    }

    #[test]
    fn stops_differential_evolution_at_target() {
        let mut rng = StdRng::seed_from_u64(9);
        let config = Config {
            tolerance: 1e-14,
            ..Config::default()
        };

        let solution = differential_evolution::minimize(
            &Rosenbrock::default(),
            &Bounds::uniform(-2.0, 2.0).unwrap(),
            &config,
            &differential_evolution::Options::default(),
            &mut rng,
            ObjectiveTarget::new(0.5),
        )
        .unwrap();

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert!(solution.objective <= 0.5);
    }

    #[test]
    fn pairs_with_history() {
        let mut history = History::new();
        let solution = lbfgsb::minimize(
            &Rosenbrock::default(),
            [-1.2, 1.0],
            &Bounds::unbounded(),
            &Config::default(),
            &lbfgsb::Options::default(),
            (&mut history, ObjectiveTarget::new(1.0)),
        )
        .unwrap();

        assert_eq!(solution.status, Status::StoppedByObserver);
        assert_eq!(history.len(), solution.iters);
        assert!(history.records().last().is_some_and(|&(_, f)| f <= 1.0));
    }

    #[test]
    fn unreachable_target_never_stops() {
        let objective = |x: &[f64; 1]| (x[0] - 2.0).powi(2) + 1.0;
        let solution = lbfgsb::minimize(
            &objective,
            [0.0],
            &Bounds::unbounded(),
            &Config::default(),
            &lbfgsb::Options::default(),
            ObjectiveTarget::new(0.0),
        )
        .unwrap();

        assert_eq!(solution.status, Status::Converged);
    }
}
