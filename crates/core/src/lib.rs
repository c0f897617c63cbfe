//! Core traits and types for the optima solvers.
//!
//! This crate defines the shared abstractions that solvers, observers, and
//! the comparison harness build on:
//!
//! - [`Objective`] — a scalar function of `N` variables with an optional gradient
//! - [`ConstraintSet`] — equality and inequality constraints plus [`Bounds`]
//! - [`Observer`] — receives solver events and optionally returns control actions
//! - [`functions`] — standard test objectives such as [`functions::Rosenbrock`]

mod bounds;
mod constraint;
mod objective;
mod observer;

pub mod functions;

pub use bounds::{Bound, Bounds, BoundsError};
pub use constraint::{Constraint, ConstraintSet};
pub use objective::{Objective, WithGradient};
pub use observer::Observer;
