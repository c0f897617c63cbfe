//! Multi-start comparison harness for the unconstrained solvers.
//!
//! [`run_comparison`] solves one objective from every initial point with
//! every requested [`Method`] and collects the outcomes in a
//! [`ComparisonTable`]. A failing cell is stored as an `Err` record and never
//! stops the rest of the matrix.
//!
//! With the default `rayon` feature, [`run_comparison_parallel`] runs the
//! cells on the rayon thread pool and returns the same table.
//!
//! [`Method`]: optima_solvers::Method

mod run;
mod table;

#[cfg(feature = "rayon")]
pub use run::run_comparison_parallel;
pub use run::run_comparison;
pub use table::{ComparisonRecord, ComparisonTable};
