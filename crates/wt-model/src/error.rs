//! Error types for model construction.

use thiserror::Error;
use wt_core::{VarId, WtError};

/// Errors raised while declaring variables and constraints.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Duplicate variable name: {name}")]
    DuplicateName { name: String },

    #[error("Unknown variable {id}")]
    UnknownVariable { id: VarId },

    #[error("Non-finite value {value} for variable '{name}'")]
    NonFinite { name: String, value: f64 },

    #[error("Invalid bounds for '{name}': lower {lower} > upper {upper}")]
    InvalidBounds {
        name: String,
        lower: f64,
        upper: f64,
    },

    #[error("Value {value} outside bounds of variable '{name}'")]
    OutOfBounds { name: String, value: f64 },

    #[error("Value vector length {got} does not match variable count {expected}")]
    LengthMismatch { expected: usize, got: usize },
}

pub type ModelResult<T> = Result<T, ModelError>;

impl From<ModelError> for WtError {
    fn from(e: ModelError) -> Self {
        WtError::Invariant {
            what: e.to_string(),
        }
    }
}
