//! Newton solver with bound projection.

use crate::error::SolverResult;
use crate::jacobian::{RANK_RTOL, finite_difference_jacobian};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Newton solver configuration.
#[derive(Debug, Clone)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Converged when every |residual| is at most this
    pub abs_tol: f64,
    /// Finite difference step (relative)
    pub fd_epsilon: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            abs_tol: 1e-6,
            fd_epsilon: 1e-7,
            line_search_beta: 0.5,
            max_line_search_iters: 30,
        }
    }
}

/// How the iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewtonStop {
    Converged,
    IterationLimit,
    /// No step along the Newton or least-squares direction reduced the residual.
    Stalled,
}

/// Newton iteration result.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    /// Last iterate
    pub x: DVector<f64>,
    /// Final residual 2-norm
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
    pub stop: NewtonStop,
}

impl NewtonResult {
    pub fn converged(&self) -> bool {
        self.stop == NewtonStop::Converged
    }
}

/// Newton iteration with backtracking line search.
///
/// Trial points are projected onto the bounds through `project`. A rank
/// deficient Jacobian gets a least-squares step, which leaves undetermined
/// directions at their current values.
pub fn newton_solve<F, P>(
    x0: DVector<f64>,
    residual_fn: F,
    project: P,
    config: &NewtonConfig,
) -> SolverResult<NewtonResult>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
    P: Fn(&mut DVector<f64>),
{
    let mut x = x0;
    project(&mut x);
    let mut r = residual_fn(&x)?;
    let mut r_norm = r.norm();

    let done = |x: DVector<f64>, r: &DVector<f64>, iterations, stop| NewtonResult {
        x,
        residual_norm: r.norm(),
        iterations,
        stop,
    };

    for iter in 0..config.max_iterations {
        if max_abs(&r) <= config.abs_tol {
            return Ok(done(x, &r, iter, NewtonStop::Converged));
        }

        let jac = finite_difference_jacobian(&x, &residual_fn, config.fd_epsilon)?;
        let rhs = -&r;

        let accepted = match newton_step(&jac, &rhs) {
            Some(dx) => line_search(&x, &dx, r_norm, &residual_fn, &project, config),
            None => None,
        };

        let Some((x_new, r_new, alpha)) = accepted else {
            debug!(iteration = iter, residual = r_norm, "Newton stalled");
            return Ok(done(x, &r, iter, NewtonStop::Stalled));
        };
        x = x_new;
        r = r_new;
        r_norm = r.norm();
        debug!(iteration = iter, residual = r_norm, alpha, "Newton step");
    }

    let stop = if max_abs(&r) <= config.abs_tol {
        NewtonStop::Converged
    } else {
        NewtonStop::IterationLimit
    };
    Ok(done(x, &r, config.max_iterations, stop))
}

/// Solve `J dx = rhs`: LU when `J` is square and well conditioned, otherwise
/// a least-squares step with near-zero singular values dropped.
fn newton_step(jac: &DMatrix<f64>, rhs: &DVector<f64>) -> Option<DVector<f64>> {
    if jac.ncols() == 0 {
        return None;
    }
    let svd = jac.clone().svd(true, true);
    let eps = RANK_RTOL * svd.singular_values.max().max(1.0);
    let well_conditioned = jac.is_square() && svd.singular_values.min() > eps;

    let dx = if well_conditioned {
        jac.clone().lu().solve(rhs)?
    } else {
        svd.solve(rhs, eps).ok()?
    };
    dx.iter().all(|v| v.is_finite()).then_some(dx)
}

type Accepted = (DVector<f64>, DVector<f64>, f64);

fn line_search<F, P>(
    x: &DVector<f64>,
    dx: &DVector<f64>,
    r_norm: f64,
    residual_fn: &F,
    project: &P,
    config: &NewtonConfig,
) -> Option<Accepted>
where
    F: Fn(&DVector<f64>) -> SolverResult<DVector<f64>>,
    P: Fn(&mut DVector<f64>),
{
    let mut alpha = 1.0;
    for _ in 0..config.max_line_search_iters {
        let mut x_new = x + alpha * dx;
        project(&mut x_new);
        // Non-finite trial points count as a rejected step.
        if let Ok(r_new) = residual_fn(&x_new)
            && r_new.norm() < r_norm
        {
            return Some((x_new, r_new, alpha));
        }
        alpha *= config.line_search_beta;
    }
    None
}

/// Largest absolute entry; zero for an empty vector.
pub fn max_abs(v: &DVector<f64>) -> f64 {
    v.iter().fold(0.0, |m, x| m.max(x.abs()))
}
