//! Reusable observers for the Optima solvers.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! work across every solver family in `optima-solvers`.
//!
//! # Modules
//!
//! - [`traits`] — Capability traits for cross-solver observers
//!   ([`HasIteration`], [`HasObjective`], [`HasResidual`], [`CanStopEarly`])
//!
//! # Observers
//!
//! - [`History`] records the objective at every iteration.
//! - [`LogObserver`] emits a `log` record every few iterations.
//! - [`ObjectiveTarget`] stops a solve once the objective is good enough.
//!
//! [`Observer`]: optima_core::Observer
//! [`HasIteration`]: traits::HasIteration
//! [`HasObjective`]: traits::HasObjective
//! [`HasResidual`]: traits::HasResidual
//! [`CanStopEarly`]: traits::CanStopEarly

pub mod traits;

mod history;
mod log_observer;
mod target;

pub use history::History;
pub use log_observer::LogObserver;
pub use target::ObjectiveTarget;
