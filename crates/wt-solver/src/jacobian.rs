//! Finite-difference Jacobians and numerical rank.

use crate::error::SolverResult;
use nalgebra::{DMatrix, DVector};

/// Forward-difference Jacobian of `f` at `x`.
///
/// The step for column j is `epsilon * max(|x[j]|, 1)`: absolute for small
/// flows and concentrations, relative for pressures.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    epsilon: f64,
) -> SolverResult<DMatrix<f64>>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
{
    let n = x.len();
    let f_x = f(x)?;
    let m = f_x.len();

    let mut jac = DMatrix::zeros(m, n);
    let mut x_perturbed = x.clone();

    for j in 0..n {
        let dx = epsilon * x[j].abs().max(1.0);
        x_perturbed[j] = x[j] + dx;
        let f_perturbed = f(&x_perturbed)?;
        x_perturbed[j] = x[j];

        let df = (f_perturbed - &f_x) / dx;
        jac.set_column(j, &df);
    }

    Ok(jac)
}

/// Relative threshold below which a singular value counts as zero. Sits above
/// the noise of a forward-difference Jacobian.
pub const RANK_RTOL: f64 = 1e-8;

/// Numerical rank: singular values above `rtol * max(σ_max, 1)`.
pub fn numeric_rank(jac: &DMatrix<f64>, rtol: f64) -> usize {
    if jac.nrows() == 0 || jac.ncols() == 0 {
        return 0;
    }
    let sv = jac.clone().svd(false, false).singular_values;
    let threshold = rtol * sv.max().max(1.0);
    sv.iter().filter(|s| **s > threshold).count()
}
