//! Error types for unit-process and junction construction.

use crate::balance::GenericEquation;
use thiserror::Error;
use wt_core::WtError;
use wt_model::ModelError;

/// Errors raised while building a unit process or junction.
///
/// Every configuration error names the unit and the offending key so it can be
/// fixed in the train configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitError {
    #[error("Unit '{unit}': missing required key '{key}'")]
    MissingKey { unit: String, key: String },

    #[error("Unit '{unit}': invalid value for '{key}' ({reason})")]
    InvalidValue {
        unit: String,
        key: String,
        reason: String,
    },

    #[error("Unit '{unit}': '{key}' names unknown constituent '{constituent}'")]
    UnknownConstituent {
        unit: String,
        key: String,
        constituent: String,
    },

    #[error("Unit '{unit}': generic equation {equation} cannot be opted out")]
    ProtectedEquation {
        unit: String,
        equation: GenericEquation,
    },

    #[error("Unit '{unit}': {equation} is constrained both generically and unit-specifically")]
    ConflictingEquation {
        unit: String,
        equation: GenericEquation,
    },

    #[error("No builder registered for unit kind '{kind}'")]
    Unregistered { kind: String },

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

pub type UnitResult<T> = Result<T, UnitError>;

impl From<UnitError> for WtError {
    fn from(e: UnitError) -> Self {
        WtError::Invariant {
            what: e.to_string(),
        }
    }
}
