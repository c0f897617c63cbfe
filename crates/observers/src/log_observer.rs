use log::Level;
use optima_core::Observer;

use crate::traits::{HasIteration, HasObjective};

/// Emits a `log` record with the objective every few iterations.
///
/// Records go through the `log` facade, so nothing is printed unless the
/// application installs a logger.
#[derive(Debug, Clone)]
pub struct LogObserver {
    label: String,
    level: Level,
    every: usize,
}

impl LogObserver {
    /// Creates an observer that logs every iteration at `Info` level.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            level: Level::Info,
            every: 1,
        }
    }

    /// Sets the level of the emitted records.
    #[must_use]
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Logs only iterations that are a multiple of `every`.
    ///
    /// Zero is treated as one.
    #[must_use]
    pub fn every(mut self, every: usize) -> Self {
        self.every = every.max(1);
        self
    }

    fn due(&self, iteration: usize) -> bool {
        iteration % self.every == 0
    }
}

impl<E, A> Observer<E, A> for LogObserver
where
    E: HasIteration + HasObjective,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        let iteration = event.iteration();
        if self.due(iteration) {
            log::log!(
                self.level,
                "{} iter {iteration}: f = {:e}",
                self.label,
                event.objective()
            );
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use optima_core::functions::Rosenbrock;
    use optima_solvers::{Config, Status, unconstrained::cg};

    #[test]
    fn interval_selects_multiples() {
        let observer = LogObserver::new("test").every(3);
        let due: Vec<usize> = (1..=10).filter(|&i| observer.due(i)).collect();
        assert_eq!(due, vec![3, 6, 9]);
    }

    #[test]
    fn zero_interval_logs_every_iteration() {
        let observer = LogObserver::new("test").every(0);
        assert!((1..=5).all(|i| observer.due(i)));
    }

    #[test]
    fn never_interrupts_the_solver() {
        let solution = cg::minimize(
            &Rosenbrock::default(),
            [-1.2, 1.0],
            &Config::default(),
            &cg::Options::default(),
            LogObserver::new("CG").level(Level::Debug).every(10),
        )
        .unwrap();

        assert_ne!(solution.status, Status::StoppedByObserver);
    }
}
