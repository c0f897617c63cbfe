//! Solvers for global minimization over a bounded box.
//!
//! # Solvers
//!
//! - [`differential_evolution`] — population-based DE/rand/1/bin with optional
//!   local polishing

pub mod differential_evolution;
