//! Numerical optimization solvers over fixed-size vectors.
//!
//! # Families
//!
//! - [`unconstrained`] — BFGS, L-BFGS-B, nonlinear conjugate gradient, and
//!   Nelder–Mead
//! - [`constrained`] — SLSQP for equality, inequality, and bound constraints
//! - [`global`] — differential evolution over a finite box
//!
//! Each solver module exposes `minimize` (with an [`Observer`]) and
//! `minimize_unobserved`, plus an `Options` struct for algorithm-specific
//! tuning. The [`solve_unconstrained`], [`solve_constrained`], and
//! [`solve_global`] entry points run a family with default options from a
//! single [`SolverConfig`].
//!
//! # Outcomes
//!
//! `Err` is reserved for inputs that prevent a solve from starting. Once a
//! solve starts it always returns a [`Solution`] holding the best point found
//! and a [`Status`] explaining why it stopped.
//!
//! [`Observer`]: optima_core::Observer

mod config;
mod error;
mod evaluate;
mod event;
mod line_search;
mod linalg;
mod method;
mod solution;
mod solve;

pub mod constrained;
pub mod global;
pub mod unconstrained;

pub use config::{Config, ConfigError, SolverConfig};
pub use error::Error;
pub use event::{Action, Event};
pub use line_search::{LineSearch, LineSearchError};
pub use method::{Method, ParseMethodError};
pub use solution::{Solution, Status};
pub use solve::{DEFAULT_SEED, solve_constrained, solve_global, solve_unconstrained};
