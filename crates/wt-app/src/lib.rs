//! Application service layer for watertrain.
//!
//! Turns train configurations into assembled networks, gates them on
//! degrees of freedom, solves them and reports streams and costs. Shared by
//! the CLI and the integration tests.

pub mod assemble;
pub mod error;
pub mod project_service;
pub mod run_service;
pub mod sweep;

pub use assemble::{ArcBlock, Network, NetworkNode, assemble, assemble_with};
pub use error::{AppError, AppResult};
pub use project_service::{TrainSummary, get_train, list_trains, load_project, validate_project};
pub use run_service::{
    RoutingReport, RunOptions, StreamReport, TrainRun, check_dof, run_train, solve_network,
};
pub use sweep::{SweepPoint, SweepSpec, run_sweep, train_at};
