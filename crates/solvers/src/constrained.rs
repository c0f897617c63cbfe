//! Solvers for problems with equality, inequality, and bound constraints.
//!
//! # Solvers
//!
//! - [`slsqp`] — sequential quadratic programming with an L1 merit line search

pub mod slsqp;
