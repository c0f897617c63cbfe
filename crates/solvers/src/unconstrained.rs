//! Solvers for unconstrained (and box-bounded) minimization.
//!
//! # Solvers
//!
//! - [`bfgs`] — dense quasi-Newton with a strong Wolfe line search
//! - [`lbfgsb`] — limited-memory quasi-Newton that respects box bounds
//! - [`cg`] — nonlinear conjugate gradient (Polak–Ribière)
//! - [`nelder_mead`] — derivative-free downhill simplex
//!
//! Every solver has the same shape: validate the inputs, evaluate the start
//! point, then iterate until the convergence measure drops below the
//! configured tolerance or the iteration budget runs out. Each completed
//! iteration emits an [`Event`] to the observer, which may return
//! [`Action::StopEarly`].
//!
//! Gradient-based solvers use the objective's analytic gradient when it has
//! one and forward differences otherwise.

pub mod bfgs;
pub mod cg;
pub mod lbfgsb;
pub mod nelder_mead;

#[cfg(test)]
mod tests;

use optima_core::Observer;

use crate::{Action, Event};

/// Emits an iteration event and reports whether the observer asked to stop.
fn stop_requested<Obs, const N: usize>(
    observer: &mut Obs,
    iter: usize,
    x: &[f64; N],
    objective: f64,
    residual: f64,
) -> bool
where
    Obs: for<'a> Observer<Event<'a, N>, Action>,
{
    let event = Event {
        iter,
        x,
        objective,
        residual,
    };
    matches!(observer.observe(&event), Some(Action::StopEarly))
}
