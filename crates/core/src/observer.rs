/// Watches an optimization run one iteration at a time.
///
/// A solver hands every completed iteration to its observer as an event `E`.
/// Returning `Some(action)` asks the solver to act on it (usually to stop
/// early); returning `None` leaves the run alone.
///
/// Closures `FnMut(&E) -> Option<A>` are observers, `()` observes nothing,
/// and a pair `(first, second)` feeds every event to both halves.
pub trait Observer<E, A> {
    /// Observes a solver event and optionally returns a control action.
    fn observe(&mut self, event: &E) -> Option<A>;
}

/// Blanket implementation for observer closures.
impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}

/// A no-op observer that always returns `None`.
impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}

/// Both observers see every event; the first one's action wins.
impl<E, A, O1, O2> Observer<E, A> for (O1, O2)
where
    O1: Observer<E, A>,
    O2: Observer<E, A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        let first = self.0.observe(event);
        let second = self.1.observe(event);
        first.or(second)
    }
}
