use crate::evaluate::Evaluator;

/// Why a solver stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// Converged according to the configured tolerance.
    Converged,

    /// Reached the iteration limit without converging.
    MaxIters,

    /// No admissible step length was found.
    LineSearchFailed,

    /// The constraint violation stopped decreasing while still above tolerance.
    Infeasible {
        /// Constraint violation at the reported point.
        violation: f64,
    },

    /// A NaN or infinity appeared in a value, gradient, or Hessian approximation.
    NumericalDegeneracy,

    /// Stopped early due to an observer decision.
    StoppedByObserver,
}

/// The outcome of one solve.
///
/// Every solve that gets past input validation produces a `Solution`, whether
/// or not it converged. [`Solution::status`] says why it stopped, and `x` is
/// always the best point the solver found.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<const N: usize> {
    /// Final solver status.
    pub status: Status,

    /// Best point found.
    pub x: [f64; N],

    /// Objective value at `x`.
    pub objective: f64,

    /// Iteration (or generation) count when the solver finished.
    pub iters: usize,

    /// Number of objective evaluations, including finite-difference probes.
    pub func_evals: usize,

    /// Number of analytic gradient evaluations.
    pub grad_evals: usize,
}

impl<const N: usize> Solution<N> {
    /// Returns `true` if the solver converged.
    #[must_use]
    pub fn success(&self) -> bool {
        self.status == Status::Converged
    }

    /// Builds a solution from the final iterate and the evaluation counters.
    pub(crate) fn finish<O>(
        label: &str,
        status: Status,
        x: [f64; N],
        objective: f64,
        iters: usize,
        evaluator: &Evaluator<'_, O, N>,
    ) -> Self
    where
        O: optima_core::Objective<N> + ?Sized,
    {
        let solution = Self {
            status,
            x,
            objective,
            iters,
            func_evals: evaluator.func_evals(),
            grad_evals: evaluator.grad_evals(),
        };
        solution.log(label);
        solution
    }

    fn log(&self, label: &str) {
        match self.status {
            Status::Converged | Status::StoppedByObserver => log::info!(
                "{label}: {:?} after {} iterations, f = {:e} (nfev = {}, ngev = {})",
                self.status,
                self.iters,
                self.objective,
                self.func_evals,
                self.grad_evals,
            ),
            _ => log::warn!(
                "{label}: {:?} after {} iterations, f = {:e} (nfev = {}, ngev = {})",
                self.status,
                self.iters,
                self.objective,
                self.func_evals,
                self.grad_evals,
            ),
        }
    }
}
