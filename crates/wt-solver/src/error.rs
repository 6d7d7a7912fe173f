//! Error types for solver operations.

use thiserror::Error;
use wt_core::WtError;
use wt_model::ModelError;

/// Errors that prevent a solve from starting or continuing.
///
/// A solve that runs but does not converge is not an error: it is reported
/// through `SolveOutcome::status`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Too many free discrete variables: {count} (limit {limit})")]
    TooManyDiscrete { count: usize, limit: usize },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<SolverError> for WtError {
    fn from(e: SolverError) -> Self {
        match e {
            SolverError::ProblemSetup { .. } => WtError::InvalidArg {
                what: "problem setup",
            },
            SolverError::TooManyDiscrete { .. } => WtError::InvalidArg {
                what: "discrete variables",
            },
            SolverError::Numeric { .. } => WtError::InvalidArg { what: "numeric" },
            SolverError::Model(m) => m.into(),
        }
    }
}
