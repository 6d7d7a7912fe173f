//! Model variables: value, bounds, domain and fixed flag.

use serde::Serialize;
use wt_core::VarId;

/// Variable domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Domain {
    Reals,
    NonNegativeReals,
    /// Continuous on [0, 1].
    UnitInterval,
    /// Integer on {0, 1}.
    Binary,
}

impl Domain {
    fn implied_bounds(self) -> (Option<f64>, Option<f64>) {
        match self {
            Domain::Reals => (None, None),
            Domain::NonNegativeReals => (Some(0.0), None),
            Domain::UnitInterval | Domain::Binary => (Some(0.0), Some(1.0)),
        }
    }
}

/// Declaration parameters for a new variable.
#[derive(Debug, Clone, Copy)]
pub struct VarSpec {
    pub init: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub domain: Domain,
}

impl VarSpec {
    pub fn new(init: f64) -> Self {
        Self {
            init,
            lower: None,
            upper: None,
            domain: Domain::Reals,
        }
    }

    pub fn lower(mut self, lower: f64) -> Self {
        self.lower = Some(lower);
        self
    }

    pub fn upper(mut self, upper: f64) -> Self {
        self.upper = Some(upper);
        self
    }

    pub fn bounds(self, lower: f64, upper: f64) -> Self {
        self.lower(lower).upper(upper)
    }

    /// Set the domain; explicit bounds are tightened by the domain's own.
    pub fn domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    pub(crate) fn effective_bounds(&self) -> (Option<f64>, Option<f64>) {
        let (dl, du) = self.domain.implied_bounds();
        let lower = match (self.lower, dl) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        let upper = match (self.upper, du) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        (lower, upper)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub id: VarId,
    pub name: String,
    pub value: f64,
    pub lower: Option<f64>,
    pub upper: Option<f64>,
    pub fixed: bool,
    pub domain: Domain,
}

impl Variable {
    pub fn is_discrete(&self) -> bool {
        self.domain == Domain::Binary
    }

    pub fn is_free(&self) -> bool {
        !self.fixed
    }

    /// Project a candidate value onto the variable's bounds.
    pub fn clamp(&self, v: f64) -> f64 {
        let mut v = v;
        if let Some(lo) = self.lower {
            v = v.max(lo);
        }
        if let Some(hi) = self.upper {
            v = v.min(hi);
        }
        v
    }

    /// Distance by which `v` lies outside the bounds (0 when inside).
    pub fn bound_violation(&self, v: f64) -> f64 {
        let below = self.lower.map_or(0.0, |lo| (lo - v).max(0.0));
        let above = self.upper.map_or(0.0, |hi| (v - hi).max(0.0));
        below.max(above)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wt_core::Id;

    fn var(spec: VarSpec) -> Variable {
        let (lower, upper) = spec.effective_bounds();
        Variable {
            id: Id::from_index(0),
            name: "x".into(),
            value: spec.init,
            lower,
            upper,
            fixed: false,
            domain: spec.domain,
        }
    }

    #[test]
    fn domain_bounds_are_applied() {
        let v = var(VarSpec::new(0.5).domain(Domain::Binary));
        assert_eq!(v.lower, Some(0.0));
        assert_eq!(v.upper, Some(1.0));
        assert!(v.is_discrete());

        let v = var(VarSpec::new(2.0).lower(1e-12).domain(Domain::NonNegativeReals));
        assert_eq!(v.lower, Some(1e-12));
        assert_eq!(v.upper, None);
    }

    #[test]
    fn clamp_and_violation() {
        let v = var(VarSpec::new(0.5).bounds(0.0, 1.0));
        assert_eq!(v.clamp(1.5), 1.0);
        assert_eq!(v.clamp(-0.5), 0.0);
        assert!((v.bound_violation(1.25) - 0.25).abs() < 1e-12);
        assert_eq!(v.bound_violation(0.3), 0.0);
    }
}
