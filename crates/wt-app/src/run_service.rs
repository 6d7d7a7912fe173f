//! Run execution: assemble, check degrees of freedom, solve, report.

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, warn};
use wt_core::{canonical, kg_per_m3};
use wt_costing::{TrainCost, cost_train, lcow_expr};
use wt_model::DofReport;
use wt_project::schema::TrainDef;
use wt_solver::{NewtonSolver, SolveOutcome, Solver, SolverOptions, TerminationStatus};
use wt_units::{PortName, StreamValues};

use crate::assemble::{Network, NetworkNode, assemble};
use crate::error::{AppError, AppResult};

/// Options for a single run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub solver: SolverOptions,
}

/// Solved state of one port, in configuration units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamReport {
    pub node: String,
    pub port: String,
    pub flow_m3_per_s: f64,
    pub concentrations_mg_per_l: BTreeMap<String, f64>,
    pub temperature_k: f64,
    pub pressure_pa: f64,
}

/// Active branch chosen for a discrete splitter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingReport {
    pub splitter: String,
    pub branch: Option<usize>,
}

/// Outcome of a run. Non-optimal solves are reported here, not as errors.
#[derive(Debug, Clone, Serialize)]
pub struct TrainRun {
    pub train_id: String,
    pub status: TerminationStatus,
    pub iterations: usize,
    pub residual_norm: f64,
    pub max_violation: f64,
    pub dof: DofReport,
    pub streams: Vec<StreamReport>,
    pub routing: Vec<RoutingReport>,
    pub product_flow_m3_per_s: f64,
    /// Present for optimal solves.
    pub costing: Option<TrainCost>,
    pub solve_time_s: f64,
}

impl TrainRun {
    pub fn stream(&self, node: &str, port: &str) -> Option<&StreamReport> {
        self.streams
            .iter()
            .find(|s| s.node == node && s.port == port)
    }
}

/// Assemble and solve a train with the reference solver.
pub fn run_train(train: &TrainDef, options: &RunOptions) -> AppResult<TrainRun> {
    let mut network = assemble(train)?;
    solve_network(&mut network, &NewtonSolver::new(), options)
}

/// Check the network is square and consistent, then solve it in place.
pub fn solve_network(
    network: &mut Network,
    solver: &dyn Solver,
    options: &RunOptions,
) -> AppResult<TrainRun> {
    let dof = check_dof(network)?;

    if dof.free_discrete > 0 {
        let objective = lcow_expr(network.units(), &network.product_flows(), &network.costing)?;
        network.model.set_objective(objective);
    }

    let started = Instant::now();
    let outcome = solver.solve(&network.model, &options.solver)?;
    let solve_time_s = started.elapsed().as_secs_f64();
    network.model.load_values(&outcome.values)?;

    if outcome.status.is_optimal() {
        info!(
            train = %network.train_id,
            solver = solver.name(),
            iterations = outcome.iterations,
            max_violation = outcome.max_violation,
            "solved train"
        );
    } else {
        warn!(
            train = %network.train_id,
            solver = solver.name(),
            status = ?outcome.status,
            max_violation = outcome.max_violation,
            "solve did not reach an optimal point"
        );
    }

    report(network, dof, &outcome, solve_time_s)
}

/// Degrees-of-freedom gate run before any solve.
pub fn check_dof(network: &Network) -> AppResult<DofReport> {
    let dof = network.dof_report()?;
    info!(
        train = %network.train_id,
        free = dof.free_continuous,
        equations = dof.equality_constraints,
        independent = ?dof.independent_constraints,
        discrete = dof.free_discrete,
        "degrees of freedom"
    );
    if !dof.is_well_posed() {
        return Err(AppError::DegreesOfFreedom {
            train: network.train_id.clone(),
            dof: dof.degrees_of_freedom(),
            free: dof.free_continuous,
            equations: dof.equality_constraints,
            violated: dof.violated_fixed.clone(),
        });
    }
    if let Some(deficit) = dof.rank_deficit()
        && deficit > 0
    {
        // Zero-flow waste streams leave their concentrations undetermined at
        // the starting point; the solver handles this with a least-squares step.
        warn!(
            train = %network.train_id,
            deficit,
            equations = dof.equality_constraints,
            "Jacobian is rank deficient at the initial point"
        );
    }
    Ok(dof)
}

fn report(
    network: &Network,
    dof: DofReport,
    outcome: &SolveOutcome,
    solve_time_s: f64,
) -> AppResult<TrainRun> {
    let values = &outcome.values;
    let mut streams = Vec::new();
    for (name, node) in network.nodes() {
        for port in node_ports(node) {
            if let Some(stream) = node.stream(port) {
                streams.push(stream_report(network, name, port, &stream.read(values)));
            }
        }
    }

    let routing = network
        .splitters()
        .filter(|s| s.is_discrete())
        .map(|s| RoutingReport {
            splitter: s.name.clone(),
            branch: s.selected_branch(values),
        })
        .collect();

    let product_flow_m3_per_s: f64 = network
        .product_flows()
        .iter()
        .map(|id| outcome.value(*id))
        .sum();

    let costing = if outcome.status.is_optimal() {
        Some(cost_train(
            network.units(),
            values,
            product_flow_m3_per_s,
            &network.costing,
        )?)
    } else {
        None
    };

    Ok(TrainRun {
        train_id: network.train_id.clone(),
        status: outcome.status,
        iterations: outcome.iterations,
        residual_norm: outcome.residual_norm,
        max_violation: outcome.max_violation,
        dof,
        streams,
        routing,
        product_flow_m3_per_s,
        costing,
        solve_time_s,
    })
}

fn node_ports(node: &NetworkNode) -> Vec<PortName> {
    match node {
        NetworkNode::Source { .. } => vec![PortName::Outlet],
        NetworkNode::Unit(_) => vec![PortName::Inlet, PortName::Outlet, PortName::Waste],
        NetworkNode::Splitter(s) => std::iter::once(PortName::Inlet)
            .chain((0..s.branches.len()).map(PortName::IndexedOutlet))
            .collect(),
        NetworkNode::Mixer(m) => (0..m.inlets.len())
            .map(PortName::IndexedInlet)
            .chain(std::iter::once(PortName::Outlet))
            .collect(),
        NetworkNode::Product { .. } => vec![PortName::Inlet],
    }
}

fn stream_report(network: &Network, node: &str, port: PortName, v: &StreamValues) -> StreamReport {
    StreamReport {
        node: node.to_string(),
        port: port.to_string(),
        flow_m3_per_s: v.flow_vol,
        concentrations_mg_per_l: network
            .constituents
            .iter()
            .zip(&v.conc_mass)
            .map(|(c, kg)| (c.to_string(), canonical::conc_mg_per_l(kg_per_m3(*kg))))
            .collect(),
        temperature_k: v.temperature,
        pressure_pa: v.pressure,
    }
}
