//! Solver boundary and reference solver for train models.
//!
//! A [`Solver`] takes an assembled `Model` and returns a [`SolveOutcome`]. The
//! reference [`NewtonSolver`] solves the square continuous system by Newton's
//! method with a finite-difference Jacobian, and enumerates assignments of
//! free binary variables (discrete splitter routing) around it.

pub mod diagnostics;
pub mod enumerate;
pub mod error;
pub mod jacobian;
pub mod newton;
pub mod problem;
pub mod solver;

pub use diagnostics::independent_constraints;
pub use enumerate::NewtonSolver;
pub use error::{SolverError, SolverResult};
pub use newton::{NewtonConfig, NewtonResult, NewtonStop};
pub use problem::ContinuousSystem;
pub use solver::{SolveOutcome, Solver, SolverOptions, TerminationStatus};
