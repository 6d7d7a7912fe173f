//! Error types for costing.

use thiserror::Error;
use wt_core::WtError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CostingError {
    #[error("Cost index table has no entry for year {year}")]
    MissingIndexYear { year: i32 },

    #[error("No price configured for chemical '{chemical}' (used by unit '{unit}')")]
    MissingChemicalPrice { unit: String, chemical: String },

    #[error("Invalid costing parameter {what}: {value}")]
    InvalidParameter { what: &'static str, value: f64 },

    #[error("Unit '{unit}': {what} evaluated to {value}")]
    NonFinite {
        unit: String,
        what: &'static str,
        value: f64,
    },
}

pub type CostingResult<T> = Result<T, CostingError>;

impl From<CostingError> for WtError {
    fn from(e: CostingError) -> Self {
        match e {
            CostingError::NonFinite { value, .. } => WtError::NonFinite {
                what: "cost",
                value,
            },
            other => WtError::Invariant {
                what: other.to_string(),
            },
        }
    }
}
