//! wt-core: stable foundation for watertrain.
//!
//! Contains:
//! - units (uom SI types, constructors and the canonical stream-contract units)
//! - numeric (tolerances and stream bounds)
//! - ids (stable compact IDs for graph and model objects)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{WtError, WtResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
