//! The continuous system a model presents to the Newton iteration.

use nalgebra::DVector;
use wt_core::{ConId, VarId};
use wt_model::Model;

use crate::error::{SolverError, SolverResult};

/// Free continuous variables and the constraints that reference them.
///
/// Fixed variables and free binaries keep their current model values, so the
/// system is the continuous problem for one discrete assignment.
pub struct ContinuousSystem<'a> {
    model: &'a Model,
    base: Vec<f64>,
    columns: Vec<VarId>,
    rows: Vec<ConId>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl<'a> ContinuousSystem<'a> {
    pub fn new(model: &'a Model) -> Self {
        let columns = model.free_continuous();
        let rows = model.active_constraints();
        let (lower, upper): (Vec<f64>, Vec<f64>) = columns
            .iter()
            .map(|id| {
                model.var(*id).map_or((f64::NEG_INFINITY, f64::INFINITY), |v| {
                    (
                        v.lower.unwrap_or(f64::NEG_INFINITY),
                        v.upper.unwrap_or(f64::INFINITY),
                    )
                })
            })
            .unzip();
        Self {
            model,
            base: model.values(),
            columns,
            rows,
            lower,
            upper,
        }
    }

    pub fn num_unknowns(&self) -> usize {
        self.columns.len()
    }

    pub fn num_equations(&self) -> usize {
        self.rows.len()
    }

    pub fn require_square(&self) -> SolverResult<()> {
        if self.columns.len() != self.rows.len() {
            return Err(SolverError::ProblemSetup {
                what: format!(
                    "{} free continuous variables but {} active constraints",
                    self.columns.len(),
                    self.rows.len()
                ),
            });
        }
        Ok(())
    }

    /// Current values of the unknowns.
    pub fn initial(&self) -> DVector<f64> {
        DVector::from_iterator(
            self.columns.len(),
            self.columns.iter().map(|id| self.base[id.idx()]),
        )
    }

    /// Full model value vector with the unknowns replaced by `x`.
    pub fn expand(&self, x: &DVector<f64>) -> Vec<f64> {
        let mut values = self.base.clone();
        for (id, v) in self.columns.iter().zip(x.iter()) {
            values[id.idx()] = *v;
        }
        values
    }

    /// Constraint residuals `body - target` at `x`.
    pub fn residual(&self, x: &DVector<f64>) -> SolverResult<DVector<f64>> {
        let values = self.expand(x);
        let mut r = DVector::zeros(self.rows.len());
        for (i, id) in self.rows.iter().enumerate() {
            let con = self
                .model
                .constraint(*id)
                .ok_or_else(|| SolverError::ProblemSetup {
                    what: format!("unknown constraint {id}"),
                })?;
            let v = con.residual(&values);
            if !v.is_finite() {
                return Err(SolverError::Numeric {
                    what: format!("non-finite residual in '{}'", con.name),
                });
            }
            r[i] = v;
        }
        Ok(r)
    }

    /// Clamp `x` onto the variable bounds.
    pub fn project(&self, x: &mut DVector<f64>) {
        for (i, v) in x.iter_mut().enumerate() {
            *v = v.clamp(self.lower[i], self.upper[i]);
        }
    }

    /// Name and value of the row with the largest |residual|.
    pub fn worst_row(&self, r: &DVector<f64>) -> Option<(&str, f64)> {
        let (i, v) = r
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))?;
        let con = self.model.constraint(*self.rows.get(i)?)?;
        Some((con.name.as_str(), *v))
    }
}
