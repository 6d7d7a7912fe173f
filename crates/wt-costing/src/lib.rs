//! Techno-economic roll-up for treatment trains.
//!
//! Each unit carries a [`wt_units::CostRecord`]; this crate scales capital to
//! the analysis year with a [`CostIndexTable`], adds operating costs from
//! electricity and chemical use, and reports train totals including the
//! levelized cost of water.

pub mod aggregate;
pub mod error;
pub mod index;
pub mod objective;
pub mod params;

pub use aggregate::{TrainCost, UnitCost, annual_volume, cost_train, cost_unit};
pub use error::{CostingError, CostingResult};
pub use index::CostIndexTable;
pub use objective::lcow_expr;
pub use params::CostingParams;
