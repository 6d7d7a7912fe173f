//! Parameter sweeps: one independent network per point, solved in parallel.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};
use wt_project::schema::{NodeKind, TrainDef};
use wt_solver::TerminationStatus;
use wt_units::ParamValue;

use crate::error::{AppError, AppResult};
use crate::run_service::{RunOptions, run_train};

/// A unit option varied across a sweep.
#[derive(Debug, Clone)]
pub struct SweepSpec {
    /// Id of a `unit` node.
    pub node: String,
    /// Numeric option key, e.g. `water_recovery`.
    pub key: String,
    pub values: Vec<f64>,
}

impl SweepSpec {
    pub fn water_recovery(node: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            node: node.into(),
            key: "water_recovery".to_string(),
            values,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SweepPoint {
    pub value: f64,
    /// `None` when the point failed before solving.
    pub status: Option<TerminationStatus>,
    pub product_flow_m3_per_s: Option<f64>,
    pub lcow_per_m3: Option<f64>,
    pub error: Option<String>,
}

/// Copy of `train` with the swept option set to `value`.
pub fn train_at(train: &TrainDef, spec: &SweepSpec, value: f64) -> AppResult<TrainDef> {
    let mut train = train.clone();
    let node = train
        .nodes
        .iter_mut()
        .find(|n| n.id == spec.node)
        .ok_or_else(|| AppError::InvalidInput(format!("no node '{}' to sweep", spec.node)))?;
    match &mut node.kind {
        NodeKind::Unit { config, .. } => {
            config.insert(spec.key.clone(), ParamValue::Number(value));
            Ok(train)
        }
        other => Err(AppError::InvalidInput(format!(
            "node '{}' is a {}, only unit options can be swept",
            spec.node,
            other.type_name()
        ))),
    }
}

/// Run every point. A point that fails to assemble or solve is recorded;
/// only a bad sweep target is an error.
pub fn run_sweep(train: &TrainDef, spec: &SweepSpec, options: &RunOptions) -> AppResult<Vec<SweepPoint>> {
    train_at(train, spec, spec.values.first().copied().unwrap_or(0.0))?;

    let points: Vec<SweepPoint> = spec
        .values
        .par_iter()
        .map(|&value| {
            let result = train_at(train, spec, value).and_then(|t| run_train(&t, options));
            match result {
                Ok(run) => SweepPoint {
                    value,
                    status: Some(run.status),
                    product_flow_m3_per_s: Some(run.product_flow_m3_per_s),
                    lcow_per_m3: run.costing.and_then(|c| c.lcow_per_m3),
                    error: None,
                },
                Err(err) => {
                    warn!(train = %train.id, key = %spec.key, value, error = %err, "sweep point failed");
                    SweepPoint {
                        value,
                        status: None,
                        product_flow_m3_per_s: None,
                        lcow_per_m3: None,
                        error: Some(err.to_string()),
                    }
                }
            }
        })
        .collect();

    let optimal = points
        .iter()
        .filter(|p| p.status.is_some_and(TerminationStatus::is_optimal))
        .count();
    info!(train = %train.id, points = points.len(), optimal, "sweep finished");
    Ok(points)
}
