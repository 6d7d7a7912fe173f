//! Error types for the wt-app service layer.

use std::path::PathBuf;

/// Application error type wrapping the backend crates' errors for the CLI.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Project error: {0}")]
    Project(String),

    #[error("Failed to read project file: {path}")]
    ProjectFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Project validation failed: {0}")]
    Validation(String),

    #[error("Train not found: {0}")]
    TrainNotFound(String),

    #[error("Unit configuration error: {0}")]
    Unit(#[from] wt_units::UnitError),

    #[error("Topology error: {0}")]
    Graph(#[from] wt_graph::GraphError),

    #[error("Model error: {0}")]
    Model(#[from] wt_model::ModelError),

    #[error(
        "Train '{train}' has {dof} degrees of freedom ({free} free variables, {equations} equations){}",
        fmt_violated(.violated)
    )]
    DegreesOfFreedom {
        train: String,
        dof: i64,
        free: usize,
        equations: usize,
        violated: Vec<String>,
    },

    #[error("Solver error: {0}")]
    Solver(String),

    #[error("Costing error: {0}")]
    Costing(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

fn fmt_violated(violated: &[String]) -> String {
    if violated.is_empty() {
        String::new()
    } else {
        format!("; violated fixed constraints: {}", violated.join(", "))
    }
}

/// Result type for wt-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<wt_project::ProjectError> for AppError {
    fn from(err: wt_project::ProjectError) -> Self {
        AppError::Project(err.to_string())
    }
}

impl From<wt_project::ValidationError> for AppError {
    fn from(err: wt_project::ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<wt_solver::SolverError> for AppError {
    fn from(err: wt_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

impl From<wt_costing::CostingError> for AppError {
    fn from(err: wt_costing::CostingError) -> Self {
        AppError::Costing(err.to_string())
    }
}
