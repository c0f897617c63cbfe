/// Iteration event emitted by the SLSQP solver.
#[derive(Debug, Clone, Copy)]
pub struct Event<'a, const N: usize> {
    /// Iteration counter (1-based).
    pub iter: usize,

    /// Current iterate.
    pub x: &'a [f64; N],

    /// Objective value at `x`.
    pub objective: f64,

    /// L1 constraint violation at `x`.
    pub violation: f64,

    /// `‖∇f − Jᵀλ‖ + violation` at `x`, using the latest multipliers.
    pub kkt_residual: f64,
}
