//! Capability traits for cross-solver observers.
//!
//! These traits abstract over the event and action types of each solver
//! family, so one observer can watch BFGS, SLSQP, and differential evolution
//! alike.
//!
//! # Event traits
//!
//! - [`HasIteration`] — events that carry an iteration counter
//! - [`HasObjective`] — events that carry an objective value
//! - [`HasResidual`] — events that carry a convergence residual
//!
//! # Action traits
//!
//! - [`CanStopEarly`] — actions that can signal early termination
//!
//! # Example
//!
//! ```rust
//! use optima_core::Observer;
//! use optima_observers::traits::{CanStopEarly, HasResidual};
//!
//! struct GoodEnough {
//!     tolerance: f64,
//!     min_iters: usize,
//!     iter: usize,
//! }
//!
//! impl<E: HasResidual, A: CanStopEarly> Observer<E, A> for GoodEnough {
//!     fn observe(&mut self, event: &E) -> Option<A> {
//!         self.iter += 1;
//!         if self.iter >= self.min_iters && event.residual() < self.tolerance {
//!             return Some(A::stop_early());
//!         }
//!         None
//!     }
//! }
//! ```

use optima_solvers::{Action, Event, constrained::slsqp, global::differential_evolution};

/// An event that carries an iteration counter.
pub trait HasIteration {
    /// Returns the 1-based iteration (or generation) of this event.
    fn iteration(&self) -> usize;
}

/// An event that carries an objective value.
pub trait HasObjective {
    /// Returns the objective for this event.
    fn objective(&self) -> f64;
}

/// An event that carries the quantity its solver tests for convergence.
pub trait HasResidual {
    /// Returns the residual for this event.
    fn residual(&self) -> f64;
}

/// An action that can request early termination.
pub trait CanStopEarly {
    /// Returns the action that stops the solver early.
    fn stop_early() -> Self;
}

// --- Unconstrained solvers ---

impl<const N: usize> HasIteration for Event<'_, N> {
    fn iteration(&self) -> usize {
        self.iter
    }
}

impl<const N: usize> HasObjective for Event<'_, N> {
    fn objective(&self) -> f64 {
        self.objective
    }
}

impl<const N: usize> HasResidual for Event<'_, N> {
    fn residual(&self) -> f64 {
        self.residual
    }
}

// --- SLSQP ---

impl<const N: usize> HasIteration for slsqp::Event<'_, N> {
    fn iteration(&self) -> usize {
        self.iter
    }
}

impl<const N: usize> HasObjective for slsqp::Event<'_, N> {
    fn objective(&self) -> f64 {
        self.objective
    }
}

impl<const N: usize> HasResidual for slsqp::Event<'_, N> {
    fn residual(&self) -> f64 {
        self.kkt_residual
    }
}

// --- Differential evolution ---

impl<const N: usize> HasIteration for differential_evolution::Event<'_, N> {
    fn iteration(&self) -> usize {
        self.generation
    }
}

/// The objective of a generation is the best member's fitness.
impl<const N: usize> HasObjective for differential_evolution::Event<'_, N> {
    fn objective(&self) -> f64 {
        self.best.fitness
    }
}

// --- Actions ---

impl CanStopEarly for Action {
    fn stop_early() -> Self {
        Action::StopEarly
    }
}
