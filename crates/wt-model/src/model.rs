//! The assembled variable/constraint collection.

use std::collections::HashMap;

use crate::constraint::Constraint;
use crate::error::{ModelError, ModelResult};
use crate::expr::Expr;
use crate::variable::{VarSpec, Variable};
use wt_core::{ConId, Id, VarId};

/// How a constraint participates in the square continuous system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintClass {
    /// References at least one free continuous variable.
    Continuous,
    /// Every free variable it references is discrete.
    Discrete,
    /// References no free variable; a consistency check only.
    Fixed,
}

/// A constraint whose body lies outside its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub name: String,
    pub amount: f64,
}

/// Variables, constraints and an optional objective (minimized).
///
/// Variable and constraint ids are dense indices into the backing vectors, so
/// a solution is simply a `Vec<f64>` with one entry per variable.
#[derive(Debug, Clone, Default)]
pub struct Model {
    vars: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: Option<Expr>,
    names: HashMap<String, VarId>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a variable. Names must be unique within the model.
    pub fn add_var(&mut self, name: impl Into<String>, spec: VarSpec) -> ModelResult<VarId> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(ModelError::DuplicateName { name });
        }
        if !spec.init.is_finite() {
            return Err(ModelError::NonFinite {
                name,
                value: spec.init,
            });
        }
        let (lower, upper) = spec.effective_bounds();
        if let (Some(lo), Some(hi)) = (lower, upper)
            && lo > hi
        {
            return Err(ModelError::InvalidBounds {
                name,
                lower: lo,
                upper: hi,
            });
        }

        let id = Id::from_usize(self.vars.len());
        let mut var = Variable {
            id,
            name: name.clone(),
            value: spec.init,
            lower,
            upper,
            fixed: false,
            domain: spec.domain,
        };
        var.value = var.clamp(var.value);
        self.vars.push(var);
        self.names.insert(name, id);
        Ok(id)
    }

    /// Declare a variable and fix it at `value` in one step.
    pub fn add_fixed(
        &mut self,
        name: impl Into<String>,
        spec: VarSpec,
        value: f64,
    ) -> ModelResult<VarId> {
        let id = self.add_var(name, spec)?;
        self.fix(id, value)?;
        Ok(id)
    }

    pub fn var(&self, id: VarId) -> ModelResult<&Variable> {
        self.vars
            .get(id.idx())
            .ok_or(ModelError::UnknownVariable { id })
    }

    fn var_mut(&mut self, id: VarId) -> ModelResult<&mut Variable> {
        self.vars
            .get_mut(id.idx())
            .ok_or(ModelError::UnknownVariable { id })
    }

    pub fn var_by_name(&self, name: &str) -> Option<VarId> {
        self.names.get(name).copied()
    }

    /// Fix a variable at a value. The value must be finite and within bounds.
    pub fn fix(&mut self, id: VarId, value: f64) -> ModelResult<()> {
        let var = self.var_mut(id)?;
        if !value.is_finite() {
            return Err(ModelError::NonFinite {
                name: var.name.clone(),
                value,
            });
        }
        if var.bound_violation(value) > 0.0 {
            return Err(ModelError::OutOfBounds {
                name: var.name.clone(),
                value,
            });
        }
        var.value = value;
        var.fixed = true;
        Ok(())
    }

    pub fn unfix(&mut self, id: VarId) -> ModelResult<()> {
        self.var_mut(id)?.fixed = false;
        Ok(())
    }

    /// Set the current (initial) value of a free variable, projected onto its bounds.
    pub fn set_value(&mut self, id: VarId, value: f64) -> ModelResult<()> {
        let var = self.var_mut(id)?;
        if !value.is_finite() {
            return Err(ModelError::NonFinite {
                name: var.name.clone(),
                value,
            });
        }
        if !var.fixed {
            var.value = var.clamp(value);
        }
        Ok(())
    }

    pub fn value(&self, id: VarId) -> f64 {
        self.vars.get(id.idx()).map_or(f64::NAN, |v| v.value)
    }

    pub fn is_fixed(&self, id: VarId) -> bool {
        self.vars.get(id.idx()).is_some_and(|v| v.fixed)
    }

    /// Add `lhs == rhs`, stored as `lhs - rhs` in `[0, 0]`.
    pub fn add_equality(
        &mut self,
        name: impl Into<String>,
        lhs: impl Into<Expr>,
        rhs: impl Into<Expr>,
    ) -> ConId {
        let body = lhs.into() - rhs.into();
        self.push_constraint(name.into(), body, 0.0, 0.0)
    }

    /// Add `lower <= body <= upper`.
    pub fn add_range(
        &mut self,
        name: impl Into<String>,
        body: impl Into<Expr>,
        lower: f64,
        upper: f64,
    ) -> ModelResult<ConId> {
        let name = name.into();
        if !(lower <= upper) {
            return Err(ModelError::InvalidBounds { name, lower, upper });
        }
        Ok(self.push_constraint(name, body.into(), lower, upper))
    }

    fn push_constraint(&mut self, name: String, body: Expr, lower: f64, upper: f64) -> ConId {
        let id = Id::from_usize(self.constraints.len());
        self.constraints.push(Constraint {
            id,
            name,
            body,
            lower,
            upper,
        });
        id
    }

    pub fn set_objective(&mut self, objective: Expr) {
        self.objective = Some(objective);
    }

    pub fn objective(&self) -> Option<&Expr> {
        self.objective.as_ref()
    }

    pub fn variables(&self) -> &[Variable] {
        &self.vars
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn constraint(&self, id: ConId) -> Option<&Constraint> {
        self.constraints.get(id.idx())
    }

    pub fn num_variables(&self) -> usize {
        self.vars.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Current values of all variables, indexed by `VarId`.
    pub fn values(&self) -> Vec<f64> {
        self.vars.iter().map(|v| v.value).collect()
    }

    /// Overwrite the values of all free variables (fixed ones are left alone).
    pub fn load_values(&mut self, values: &[f64]) -> ModelResult<()> {
        if values.len() != self.vars.len() {
            return Err(ModelError::LengthMismatch {
                expected: self.vars.len(),
                got: values.len(),
            });
        }
        for (var, &v) in self.vars.iter_mut().zip(values) {
            if !var.fixed {
                var.value = v;
            }
        }
        Ok(())
    }

    /// Classify a constraint against the current fixed/free partition.
    pub fn classify(&self, con: &Constraint) -> ConstraintClass {
        let mut any_free_discrete = false;
        for id in con.body.vars() {
            let Some(var) = self.vars.get(id.idx()) else {
                continue;
            };
            if var.fixed {
                continue;
            }
            if var.is_discrete() {
                any_free_discrete = true;
            } else {
                return ConstraintClass::Continuous;
            }
        }
        if any_free_discrete {
            ConstraintClass::Discrete
        } else {
            ConstraintClass::Fixed
        }
    }

    pub fn free_continuous(&self) -> Vec<VarId> {
        self.vars
            .iter()
            .filter(|v| !v.fixed && !v.is_discrete())
            .map(|v| v.id)
            .collect()
    }

    pub fn free_discrete(&self) -> Vec<VarId> {
        self.vars
            .iter()
            .filter(|v| !v.fixed && v.is_discrete())
            .map(|v| v.id)
            .collect()
    }

    /// Constraints that take part in the square continuous system.
    pub fn active_constraints(&self) -> Vec<ConId> {
        self.constraints_of(ConstraintClass::Continuous)
    }

    pub fn constraints_of(&self, class: ConstraintClass) -> Vec<ConId> {
        self.constraints
            .iter()
            .filter(|c| self.classify(c) == class)
            .map(|c| c.id)
            .collect()
    }

    /// Constraints violated by more than `tol` at `values`.
    pub fn violations(&self, values: &[f64], tol: f64) -> Vec<Violation> {
        self.constraints
            .iter()
            .filter_map(|c| {
                let amount = c.violation(values);
                (amount > tol).then(|| Violation {
                    name: c.name.clone(),
                    amount,
                })
            })
            .collect()
    }

    /// Largest constraint or bound violation at `values`.
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        let con = self
            .constraints
            .iter()
            .map(|c| c.violation(values))
            .fold(0.0, f64::max);
        let bounds = self
            .vars
            .iter()
            .map(|v| v.bound_violation(values.get(v.id.idx()).copied().unwrap_or(f64::NAN)))
            .fold(0.0, f64::max);
        con.max(bounds)
    }
}
