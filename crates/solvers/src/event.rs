/// Actions an observer can take during an iterative solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Stop the solver early and return the best solution found so far.
    StopEarly,
}

/// Iteration event emitted by the unconstrained solvers.
///
/// One event is emitted after every completed iteration.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a, const N: usize> {
    /// Iteration counter (1-based).
    pub iter: usize,

    /// Current iterate (the best vertex for Nelder-Mead).
    pub x: &'a [f64; N],

    /// Objective value at `x`.
    pub objective: f64,

    /// The quantity the solver compares against its tolerance.
    ///
    /// This is the gradient norm for BFGS and CG, the projected gradient norm
    /// for L-BFGS-B, and the spread of vertex values for Nelder-Mead.
    pub residual: f64,
}
