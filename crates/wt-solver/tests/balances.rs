use proptest::prelude::*;
use wt_model::{Domain, Expr, Model, VarSpec};
use wt_solver::{NewtonSolver, Solver, SolverOptions, TerminationStatus, independent_constraints};

/// Separator: fixed feed, fixed recovery and removal, free products.
fn separator(flow: f64, conc: f64, recovery: f64, removal: f64) -> (Model, [wt_core::VarId; 4]) {
    let mut m = Model::new();
    let f_in = m.add_fixed("f_in", VarSpec::new(0.0).lower(0.0), flow).unwrap();
    let c_in = m.add_fixed("c_in", VarSpec::new(0.0), conc).unwrap();
    let r = m
        .add_fixed("r", VarSpec::new(0.5).domain(Domain::UnitInterval), recovery)
        .unwrap();
    let rf = m
        .add_fixed("rf", VarSpec::new(0.0).domain(Domain::UnitInterval), removal)
        .unwrap();
    let f_out = m.add_var("f_out", VarSpec::new(1.0).lower(1e-12)).unwrap();
    let f_w = m.add_var("f_w", VarSpec::new(1.0).lower(1e-12)).unwrap();
    let c_out = m.add_var("c_out", VarSpec::new(1.0)).unwrap();
    let c_w = m.add_var("c_w", VarSpec::new(1.0)).unwrap();

    m.add_equality("flow", f_in, Expr::var(f_out) + f_w);
    m.add_equality("recovery", Expr::var(r) * f_in, f_out);
    m.add_equality("removal", Expr::var(rf) * f_in * c_in, Expr::var(f_w) * c_w);
    m.add_equality(
        "mass",
        Expr::var(f_in) * c_in,
        Expr::var(f_out) * c_out + Expr::var(f_w) * c_w,
    );
    (m, [f_out, f_w, c_out, c_w])
}

#[test]
fn separator_from_a_poor_start() {
    let (m, [f_out, f_w, c_out, c_w]) = separator(4.5833, 35.0, 0.45, 0.99);
    assert_eq!(independent_constraints(&m).unwrap(), 4);

    let out = NewtonSolver::new()
        .solve(&m, &SolverOptions::default())
        .unwrap();
    assert_eq!(out.status, TerminationStatus::Optimal);
    assert!((out.value(f_out) - 0.45 * 4.5833).abs() < 1e-6);
    assert!((out.value(f_w) - 0.55 * 4.5833).abs() < 1e-6);
    assert!((out.value(c_out) - 0.01 * 35.0 / 0.45).abs() < 1e-5);
    assert!((out.value(c_w) - 0.99 * 35.0 / 0.55).abs() < 1e-5);
}

#[test]
fn outcome_leaves_model_untouched() {
    let (m, [f_out, ..]) = separator(1.0, 1.0, 0.5, 0.5);
    let before = m.values();
    let out = NewtonSolver::new()
        .solve(&m, &SolverOptions::default())
        .unwrap();
    assert!(out.status.is_optimal());
    assert_eq!(m.values(), before);
    assert_eq!(m.value(f_out), 1.0);
}

#[test]
fn iteration_budget_is_reported() {
    let (m, _) = separator(4.5833, 35.0, 0.45, 0.99);
    let options = SolverOptions {
        max_iterations: 1,
        ..SolverOptions::default()
    };
    let out = NewtonSolver::new().solve(&m, &options).unwrap();
    assert_eq!(out.status, TerminationStatus::IterationLimit);
    assert_eq!(out.values.len(), m.num_variables());
}

proptest! {
    #[test]
    fn separator_conserves_flow_and_mass(
        flow in 0.1f64..10.0,
        conc in 0.0f64..50.0,
        recovery in 0.05f64..0.95,
        removal in 0.0f64..1.0,
    ) {
        let (m, [f_out, f_w, c_out, c_w]) = separator(flow, conc, recovery, removal);
        let out = NewtonSolver::new().solve(&m, &SolverOptions::default()).unwrap();
        prop_assert!(out.status.is_optimal());
        prop_assert!((flow - out.value(f_out) - out.value(f_w)).abs() < 1e-6);
        let m_out = out.value(f_out) * out.value(c_out) + out.value(f_w) * out.value(c_w);
        prop_assert!((flow * conc - m_out).abs() < 1e-6);
    }
}
