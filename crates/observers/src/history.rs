use optima_core::Observer;

use crate::traits::{HasIteration, HasObjective};

/// Records the objective reported at every iteration.
///
/// Pass `&mut history` to a solver to keep the record after the solve.
///
/// # Example
///
/// ```rust
/// use optima_core::functions::Rosenbrock;
/// use optima_observers::History;
/// use optima_solvers::{Config, unconstrained::bfgs};
///
/// let mut history = History::new();
/// let solution = bfgs::minimize(
///     &Rosenbrock::default(),
///     [-1.2, 1.0],
///     &Config::default(),
///     &bfgs::Options::default(),
///     &mut history,
/// )
/// .unwrap();
///
/// assert_eq!(history.len(), solution.iters);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    records: Vec<(usize, f64)>,
}

impl History {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded iterations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Recorded `(iteration, objective)` pairs in arrival order.
    #[must_use]
    pub fn records(&self) -> &[(usize, f64)] {
        &self.records
    }

    /// Iterator over the recorded objective values.
    pub fn objectives(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|&(_, objective)| objective)
    }

    /// Lowest recorded objective, ignoring NaN.
    #[must_use]
    pub fn best(&self) -> Option<f64> {
        self.objectives()
            .filter(|value| !value.is_nan())
            .reduce(f64::min)
    }

    /// Returns `true` if no recorded objective exceeds its predecessor.
    #[must_use]
    pub fn is_non_increasing(&self) -> bool {
        self.records.windows(2).all(|pair| pair[1].1 <= pair[0].1)
    }
}

impl<E, A> Observer<E, A> for History
where
    E: HasIteration + HasObjective,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self.records.push((event.iteration(), event.objective()));
        None
    }
}

/// Allows `&mut History` to be passed to solvers that take an observer by
/// value, so the record can be read after the solve completes.
impl<E, A> Observer<E, A> for &mut History
where
    E: HasIteration + HasObjective,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        (*self).observe(event)
    }
}
