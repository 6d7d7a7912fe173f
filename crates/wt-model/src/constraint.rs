//! Constraints: `lower <= body <= upper` over an expression body.

use crate::expr::Expr;
use wt_core::ConId;

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub id: ConId,
    pub name: String,
    pub body: Expr,
    pub lower: f64,
    pub upper: f64,
}

impl Constraint {
    pub fn is_equality(&self) -> bool {
        self.lower == self.upper
    }

    /// Value the solver drives the body towards (band midpoint for ranges).
    pub fn target(&self) -> f64 {
        0.5 * (self.lower + self.upper)
    }

    pub fn residual(&self, values: &[f64]) -> f64 {
        self.body.eval(values) - self.target()
    }

    /// Distance by which the body lies outside `[lower, upper]`.
    pub fn violation(&self, values: &[f64]) -> f64 {
        let b = self.body.eval(values);
        if b.is_nan() {
            return f64::INFINITY;
        }
        (self.lower - b).max(b - self.upper).max(0.0)
    }
}
