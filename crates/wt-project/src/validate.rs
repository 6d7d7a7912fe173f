//! Structural validation of a project before assembly.
//!
//! Topology (connection counts, cycles) is checked by the graph layer at
//! assembly; this pass catches references and values that do not need a graph.

use std::collections::HashSet;

use wt_units::{Constituents, PortName, SplitterMode};

use crate::schema::{EdgeDef, NodeDef, NodeKind, PortRef, Project, TrainDef};

pub const LATEST_VERSION: u32 = 1;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid port {port}: {reason}")]
    InvalidPort { port: String, reason: String },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

pub fn validate_project(project: &Project) -> Result<(), ValidationError> {
    if project.version == 0 || project.version > LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: project.version,
        });
    }

    let mut train_ids = HashSet::new();
    for train in &project.trains {
        if !train_ids.insert(&train.id) {
            return Err(ValidationError::DuplicateId {
                id: train.id.clone(),
                context: "trains".to_string(),
            });
        }
        validate_train(train)?;
    }
    Ok(())
}

pub fn validate_train(train: &TrainDef) -> Result<(), ValidationError> {
    let constituents =
        Constituents::new(train.constituents.iter()).map_err(|e| ValidationError::InvalidValue {
            field: format!("train '{}' constituents", train.id),
            value: format!("{:?}", train.constituents),
            reason: e.to_string(),
        })?;

    let mut node_ids = HashSet::new();
    for node in &train.nodes {
        if !node_ids.insert(&node.id) {
            return Err(ValidationError::DuplicateId {
                id: node.id.clone(),
                context: format!("train '{}' nodes", train.id),
            });
        }
        validate_node(node, &constituents)?;
    }

    for edge in &train.edges {
        validate_edge(train, edge)?;
    }

    train
        .costing
        .validate()
        .map_err(|e| ValidationError::InvalidValue {
            field: format!("train '{}' costing", train.id),
            value: train.costing.analysis_year.to_string(),
            reason: e.to_string(),
        })?;
    Ok(())
}

fn invalid(node: &NodeDef, field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: format!("{}.{}", node.id, field),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_node(node: &NodeDef, constituents: &Constituents) -> Result<(), ValidationError> {
    match &node.kind {
        NodeKind::Source {
            flow_m3_per_s,
            concentrations_mg_per_l,
            temperature_k,
            pressure_pa,
        } => {
            if !(flow_m3_per_s.is_finite() && *flow_m3_per_s > 0.0) {
                return Err(invalid(node, "flow_m3_per_s", flow_m3_per_s, "must be positive"));
            }
            for (name, c) in concentrations_mg_per_l {
                if constituents.index_of(name).is_none() {
                    return Err(ValidationError::MissingReference {
                        id: name.clone(),
                        context: format!("source '{}' concentrations", node.id),
                    });
                }
                if !(c.is_finite() && *c >= 0.0) {
                    return Err(invalid(node, "concentrations_mg_per_l", c, "must be nonnegative"));
                }
            }
            if !(wt_units::stream::T_MIN_K..=wt_units::stream::T_MAX_K).contains(temperature_k) {
                return Err(invalid(node, "temperature_k", temperature_k, "outside liquid range"));
            }
            if !(pressure_pa.is_finite() && *pressure_pa >= 0.0) {
                return Err(invalid(node, "pressure_pa", pressure_pa, "must be nonnegative"));
            }
        }
        NodeKind::Unit { .. } | NodeKind::Product => {}
        NodeKind::Splitter {
            outlets,
            ratios,
            selected,
        } => {
            if *outlets < 2 {
                return Err(invalid(node, "outlets", outlets, "a splitter needs at least 2 outlets"));
            }
            if !ratios.is_empty() && ratios.len() != *outlets {
                return Err(invalid(
                    node,
                    "ratios",
                    ratios.len(),
                    "need one ratio per outlet",
                ));
            }
            let ratios = splitter_ratios(*outlets, ratios);
            SplitterMode::from_ratios(&node.id, &ratios, *selected).map_err(|e| {
                ValidationError::InvalidValue {
                    field: format!("{}.ratios", node.id),
                    value: format!("{ratios:?}"),
                    reason: e.to_string(),
                }
            })?;
        }
        NodeKind::Mixer { inlets } => {
            if *inlets < 2 {
                return Err(invalid(node, "inlets", inlets, "a mixer needs at least 2 inlets"));
            }
        }
    }
    Ok(())
}

/// Configured ratios, with an empty list standing for discrete placeholders.
pub fn splitter_ratios(outlets: usize, ratios: &[Option<f64>]) -> Vec<Option<f64>> {
    if ratios.is_empty() {
        vec![Some(wt_units::splitter::DISCRETE_PLACEHOLDER); outlets]
    } else {
        ratios.to_vec()
    }
}

/// Ports a node of this kind exposes.
pub fn node_has_port(kind: &NodeKind, port: PortName) -> bool {
    match (kind, port) {
        (NodeKind::Source { .. }, PortName::Outlet) => true,
        (NodeKind::Unit { .. }, PortName::Inlet | PortName::Outlet | PortName::Waste) => true,
        (NodeKind::Splitter { .. }, PortName::Inlet) => true,
        (NodeKind::Splitter { outlets, .. }, PortName::IndexedOutlet(i)) => i < *outlets,
        (NodeKind::Mixer { inlets }, PortName::IndexedInlet(i)) => i < *inlets,
        (NodeKind::Mixer { .. }, PortName::Outlet) => true,
        (NodeKind::Product, PortName::Inlet) => true,
        _ => false,
    }
}

fn resolve_port<'a>(
    train: &'a TrainDef,
    port: &PortRef,
) -> Result<(&'a NodeDef, PortName), ValidationError> {
    let node = train
        .node(&port.node)
        .ok_or_else(|| ValidationError::MissingReference {
            id: port.node.clone(),
            context: format!("train '{}' edges", train.id),
        })?;
    let name = PortName::parse(&port.port).ok_or_else(|| ValidationError::InvalidPort {
        port: port.to_string(),
        reason: "expected inlet, outlet, waste, inlet[i] or outlet[i]".to_string(),
    })?;
    if !node_has_port(&node.kind, name) {
        return Err(ValidationError::InvalidPort {
            port: port.to_string(),
            reason: format!("a {} node has no such port", node.kind.type_name()),
        });
    }
    Ok((node, name))
}

fn validate_edge(train: &TrainDef, edge: &EdgeDef) -> Result<(), ValidationError> {
    let (_, from) = resolve_port(train, &edge.from)?;
    let (to_node, to) = resolve_port(train, &edge.to)?;
    if from.is_inlet() {
        return Err(ValidationError::InvalidPort {
            port: edge.from.to_string(),
            reason: "an edge must start at an outlet or waste port".to_string(),
        });
    }
    if !to.is_inlet() {
        return Err(ValidationError::InvalidPort {
            port: edge.to.to_string(),
            reason: "an edge must end at an inlet port".to_string(),
        });
    }
    if edge.recycle && !matches!(to_node.kind, NodeKind::Mixer { .. }) {
        return Err(ValidationError::InvalidPort {
            port: edge.to.to_string(),
            reason: "recycle edges must enter a mixer inlet".to_string(),
        });
    }
    Ok(())
}
