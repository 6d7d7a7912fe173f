//! Structural diagnostics computed before a solve.

use crate::error::SolverResult;
use crate::jacobian::{RANK_RTOL, finite_difference_jacobian, numeric_rank};
use crate::problem::ContinuousSystem;
use wt_model::Model;

/// Number of numerically independent active constraints, from the rank of
/// the Jacobian at the model's current values.
pub fn independent_constraints(model: &Model) -> SolverResult<usize> {
    let sys = ContinuousSystem::new(model);
    if sys.num_equations() == 0 || sys.num_unknowns() == 0 {
        return Ok(0);
    }
    let jac = finite_difference_jacobian(&sys.initial(), |x| sys.residual(x), 1e-7)?;
    Ok(numeric_rank(&jac, RANK_RTOL))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wt_model::{Expr, VarSpec};

    #[test]
    fn duplicated_equation_lowers_rank() {
        let mut m = Model::new();
        let x = m.add_var("x", VarSpec::new(1.0)).unwrap();
        let y = m.add_var("y", VarSpec::new(1.0)).unwrap();
        m.add_equality("a", Expr::var(x) + y, 2.0);
        m.add_equality("b", Expr::var(x) * 2.0 + Expr::var(y) * 2.0, 4.0);
        assert_eq!(independent_constraints(&m).unwrap(), 1);

        let mut m2 = Model::new();
        let x = m2.add_var("x", VarSpec::new(1.0)).unwrap();
        let y = m2.add_var("y", VarSpec::new(1.0)).unwrap();
        m2.add_equality("a", Expr::var(x) + y, 2.0);
        m2.add_equality("b", Expr::var(x) - y, 0.0);
        assert_eq!(independent_constraints(&m2).unwrap(), 2);
    }
}
