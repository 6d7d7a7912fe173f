//! Reference solver: Newton on the continuous system, with free binaries
//! enumerated over their feasible assignments.

use tracing::{debug, info, warn};
use wt_core::VarId;
use wt_model::{ConstraintClass, Model};

use crate::error::{SolverError, SolverResult};
use crate::newton::{NewtonConfig, NewtonStop, newton_solve};
use crate::problem::ContinuousSystem;
use crate::solver::{SolveOutcome, Solver, SolverOptions, TerminationStatus};

#[derive(Debug, Clone, Default)]
pub struct NewtonSolver {
    pub newton: NewtonConfig,
}

impl NewtonSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Solve the continuous system with every binary at its current value.
    pub fn solve_continuous(
        &self,
        model: &Model,
        options: &SolverOptions,
        decisions: Vec<(VarId, f64)>,
    ) -> SolverResult<SolveOutcome> {
        let sys = ContinuousSystem::new(model);
        sys.require_square()?;

        let config = NewtonConfig {
            max_iterations: options.max_iterations,
            abs_tol: options.feasibility_tol,
            ..self.newton.clone()
        };
        let result = newton_solve(
            sys.initial(),
            |x| sys.residual(x),
            |x| sys.project(x),
            &config,
        )?;

        let values = sys.expand(&result.x);
        let max_violation = model.max_violation(&values);
        let status = match result.stop {
            NewtonStop::Converged if max_violation <= options.feasibility_tol => {
                TerminationStatus::Optimal
            }
            NewtonStop::IterationLimit => TerminationStatus::IterationLimit,
            _ => TerminationStatus::Infeasible,
        };
        if status != TerminationStatus::Optimal {
            let r = sys.residual(&result.x)?;
            if let Some((row, residual)) = sys.worst_row(&r) {
                warn!(?status, row, residual, "Continuous solve did not converge");
            }
        }
        let objective = model.objective().map(|e| e.eval(&values));

        Ok(SolveOutcome {
            status,
            values,
            iterations: result.iterations,
            residual_norm: result.residual_norm,
            max_violation,
            decisions,
            objective,
        })
    }

    fn solve_discrete(
        &self,
        model: &Model,
        options: &SolverOptions,
        free: &[VarId],
    ) -> SolverResult<SolveOutcome> {
        let checks = model.constraints_of(ConstraintClass::Discrete);
        let base = model.values();
        let mut best: Option<SolveOutcome> = None;
        let mut fallback: Option<SolveOutcome> = None;
        let mut tried = 0usize;

        for mask in 0u64..(1u64 << free.len()) {
            let mut values = base.clone();
            let decisions: Vec<(VarId, f64)> = free
                .iter()
                .enumerate()
                .map(|(bit, id)| (*id, ((mask >> bit) & 1) as f64))
                .collect();
            for (id, v) in &decisions {
                values[id.idx()] = *v;
            }
            let admissible = checks.iter().all(|cid| {
                model
                    .constraint(*cid)
                    .is_some_and(|c| c.violation(&values) <= options.feasibility_tol)
            });
            if !admissible {
                continue;
            }

            tried += 1;
            let mut trial = model.clone();
            for (id, v) in &decisions {
                trial.fix(*id, *v)?;
            }
            let outcome = self.solve_continuous(&trial, options, decisions)?;
            debug!(mask, status = ?outcome.status, objective = ?outcome.objective, "assignment solved");

            if outcome.status.is_optimal() {
                let better = best.as_ref().is_none_or(|b| {
                    outcome.objective.unwrap_or(0.0) < b.objective.unwrap_or(0.0)
                });
                if better {
                    best = Some(outcome);
                }
                if model.objective().is_none() {
                    break;
                }
            } else if fallback
                .as_ref()
                .is_none_or(|f| outcome.max_violation < f.max_violation)
            {
                fallback = Some(outcome);
            }
        }

        info!(assignments = tried, "enumerated discrete assignments");
        if let Some(outcome) = best.or(fallback) {
            return Ok(outcome);
        }
        // No assignment satisfies the discrete constraints.
        Ok(SolveOutcome {
            status: TerminationStatus::Infeasible,
            max_violation: model.max_violation(&base),
            values: base,
            iterations: 0,
            residual_norm: f64::NAN,
            decisions: Vec::new(),
            objective: None,
        })
    }
}

impl Solver for NewtonSolver {
    fn name(&self) -> &str {
        "newton"
    }

    fn solve(&self, model: &Model, options: &SolverOptions) -> SolverResult<SolveOutcome> {
        let free = model.free_discrete();
        if free.len() > options.max_discrete.min(63) {
            return Err(SolverError::TooManyDiscrete {
                count: free.len(),
                limit: options.max_discrete,
            });
        }

        let outcome = if free.is_empty() {
            self.solve_continuous(model, options, Vec::new())?
        } else {
            self.solve_discrete(model, options, &free)?
        };

        if outcome.status.is_optimal() {
            info!(
                solver = self.name(),
                iterations = outcome.iterations,
                max_violation = outcome.max_violation,
                "solve finished"
            );
        } else {
            warn!(
                solver = self.name(),
                status = ?outcome.status,
                iterations = outcome.iterations,
                max_violation = outcome.max_violation,
                "solve did not reach a feasible point"
            );
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wt_model::{Domain, Expr, VarSpec};

    #[test]
    fn solves_a_square_nonlinear_system() {
        let mut m = Model::new();
        let f = m.add_var("f", VarSpec::new(1.0).lower(0.0)).unwrap();
        let c = m.add_var("c", VarSpec::new(1.0)).unwrap();
        m.add_equality("flow", f, 2.0);
        m.add_equality("mass", Expr::var(f) * c, 7.0);

        let out = NewtonSolver::new()
            .solve(&m, &SolverOptions::default())
            .unwrap();
        assert_eq!(out.status, TerminationStatus::Optimal);
        assert!((out.value(c) - 3.5).abs() < 1e-6);
        assert!(out.max_violation <= 1e-6);
    }

    #[test]
    fn inconsistent_fixed_constraint_is_infeasible() {
        let mut m = Model::new();
        let p = m.add_fixed("p", VarSpec::new(0.0), 1.0).unwrap();
        m.add_equality("check", p, 2.0);
        let out = NewtonSolver::new()
            .solve(&m, &SolverOptions::default())
            .unwrap();
        assert_eq!(out.status, TerminationStatus::Infeasible);
    }

    #[test]
    fn picks_cheapest_one_hot_assignment() {
        let mut m = Model::new();
        let x = m.add_var("x", VarSpec::new(0.0)).unwrap();
        let d0 = m.add_var("d0", VarSpec::new(1.0).domain(Domain::Binary)).unwrap();
        let d1 = m.add_var("d1", VarSpec::new(0.0).domain(Domain::Binary)).unwrap();
        m.add_equality("one_hot", Expr::var(d0) + d1, 1.0);
        // x = 5 on branch 0, x = 2 on branch 1
        m.add_equality("x", x, Expr::var(d0) * 5.0 + Expr::var(d1) * 2.0);
        m.set_objective(Expr::var(x));

        let out = NewtonSolver::new()
            .solve(&m, &SolverOptions::default())
            .unwrap();
        assert!(out.status.is_optimal());
        assert!((out.value(x) - 2.0).abs() < 1e-6);
        assert_eq!(out.value(d1), 1.0);
        assert_eq!(out.decisions, vec![(d0, 0.0), (d1, 1.0)]);
    }

    #[test]
    fn without_objective_first_feasible_assignment_wins() {
        let mut m = Model::new();
        let d0 = m.add_var("d0", VarSpec::new(0.0).domain(Domain::Binary)).unwrap();
        let d1 = m.add_var("d1", VarSpec::new(0.0).domain(Domain::Binary)).unwrap();
        m.add_equality("one_hot", Expr::var(d0) + d1, 1.0);
        let out = NewtonSolver::new()
            .solve(&m, &SolverOptions::default())
            .unwrap();
        assert!(out.status.is_optimal());
        assert_eq!(out.value(d0), 1.0);
        assert_eq!(out.value(d1), 0.0);
    }

    #[test]
    fn too_many_binaries_is_an_error() {
        let mut m = Model::new();
        for i in 0..3 {
            m.add_var(format!("d{i}"), VarSpec::new(0.0).domain(Domain::Binary))
                .unwrap();
        }
        let options = SolverOptions {
            max_discrete: 2,
            ..SolverOptions::default()
        };
        let err = NewtonSolver::new().solve(&m, &options).unwrap_err();
        assert!(matches!(err, SolverError::TooManyDiscrete { count: 3, .. }));
    }
}
