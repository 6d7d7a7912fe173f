//! Degrees-of-freedom accounting.
//!
//! Discrete variables are treated as parameters of the continuous system: a
//! constraint that only touches free binaries (e.g. a one-hot routing sum) is
//! counted separately and does not enter the continuous balance.

use serde::Serialize;

use crate::model::{ConstraintClass, Model};

/// Counts reported before a model is handed to a solver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DofReport {
    pub free_continuous: usize,
    pub free_discrete: usize,
    pub fixed_variables: usize,
    /// Constraints referencing at least one free continuous variable.
    pub equality_constraints: usize,
    /// Constraints whose free variables are all discrete.
    pub discrete_constraints: usize,
    /// Constraints with no free variables at all.
    pub fixed_constraints: usize,
    /// Numerically independent continuous constraints, when computed.
    pub independent_constraints: Option<usize>,
    /// Names of fully fixed constraints that do not hold.
    pub violated_fixed: Vec<String>,
    /// Free continuous variables that no active constraint references.
    pub unconstrained: Vec<String>,
}

impl DofReport {
    pub fn degrees_of_freedom(&self) -> i64 {
        self.free_continuous as i64 - self.equality_constraints as i64
    }

    /// True when the continuous system is square and its fully fixed
    /// constraints hold. This is the gate a run must pass before solving.
    pub fn is_well_posed(&self) -> bool {
        self.degrees_of_freedom() == 0 && self.violated_fixed.is_empty()
    }

    /// Constraints found dependent at the initial point, if the rank was
    /// computed. Zero-flow streams make this nonzero on well-posed trains, so
    /// it is a diagnostic, not part of the gate.
    pub fn rank_deficit(&self) -> Option<usize> {
        self.independent_constraints
            .map(|r| self.equality_constraints.saturating_sub(r))
    }

    pub fn with_independent(mut self, rank: usize) -> Self {
        self.independent_constraints = Some(rank);
        self
    }
}

impl Model {
    /// Structural degrees-of-freedom report; fixed constraints are checked
    /// against `tol` at the current values.
    pub fn dof_report(&self, tol: f64) -> DofReport {
        let values = self.values();
        let mut equality_constraints = 0;
        let mut discrete_constraints = 0;
        let mut fixed_constraints = 0;
        let mut violated_fixed = Vec::new();
        let mut referenced = vec![false; self.num_variables()];

        for con in self.constraints() {
            match self.classify(con) {
                ConstraintClass::Continuous => {
                    equality_constraints += 1;
                    for id in con.body.vars() {
                        if let Some(slot) = referenced.get_mut(id.idx()) {
                            *slot = true;
                        }
                    }
                }
                ConstraintClass::Discrete => discrete_constraints += 1,
                ConstraintClass::Fixed => {
                    fixed_constraints += 1;
                    if con.violation(&values) > tol {
                        violated_fixed.push(con.name.clone());
                    }
                }
            }
        }

        let free_continuous = self.free_continuous();
        let unconstrained = free_continuous
            .iter()
            .filter(|id| !referenced[id.idx()])
            .filter_map(|id| self.var(*id).ok().map(|v| v.name.clone()))
            .collect();

        let free_discrete = self.free_discrete().len();
        DofReport {
            free_continuous: free_continuous.len(),
            free_discrete,
            fixed_variables: self.num_variables() - free_continuous.len() - free_discrete,
            equality_constraints,
            discrete_constraints,
            fixed_constraints,
            independent_constraints: None,
            violated_fixed,
            unconstrained,
        }
    }
}
