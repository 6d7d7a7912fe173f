//! The solver boundary: what a train hands to a solver and what comes back.

use serde::Serialize;
use wt_core::{Tolerances, VarId};
use wt_model::Model;

use crate::error::SolverResult;

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// Largest acceptable constraint or bound violation.
    pub feasibility_tol: f64,
    /// Newton iteration budget per continuous solve.
    pub max_iterations: usize,
    /// Upper limit on free binaries to enumerate.
    pub max_discrete: usize,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            feasibility_tol: Tolerances::solver().abs,
            max_iterations: 100,
            max_discrete: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationStatus {
    Optimal,
    Infeasible,
    IterationLimit,
}

impl TerminationStatus {
    pub fn is_optimal(self) -> bool {
        self == TerminationStatus::Optimal
    }
}

/// Result of a solve. Non-optimal outcomes still carry the last iterate.
#[derive(Debug, Clone, PartialEq)]
pub struct SolveOutcome {
    pub status: TerminationStatus,
    /// One value per model variable, indexed by `VarId`.
    pub values: Vec<f64>,
    pub iterations: usize,
    pub residual_norm: f64,
    pub max_violation: f64,
    /// Chosen values of the free binaries.
    pub decisions: Vec<(VarId, f64)>,
    pub objective: Option<f64>,
}

impl SolveOutcome {
    pub fn value(&self, id: VarId) -> f64 {
        self.values.get(id.idx()).copied().unwrap_or(f64::NAN)
    }
}

pub trait Solver: Send + Sync {
    fn name(&self) -> &str;

    /// Solve `model` from its current values. The model is not modified.
    fn solve(&self, model: &Model, options: &SolverOptions) -> SolverResult<SolveOutcome>;
}
