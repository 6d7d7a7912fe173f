//! Train configuration schema.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use wt_core::constants::{P_ATM_PA, T_AMBIENT_K};
use wt_costing::CostingParams;
use wt_units::{UnitConfig, UnitKind};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub version: u32,
    pub name: String,
    #[serde(default)]
    pub trains: Vec<TrainDef>,
}

impl Project {
    pub fn train(&self, id: &str) -> Option<&TrainDef> {
        self.trains.iter().find(|t| t.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainDef {
    pub id: String,
    pub name: String,
    /// Train-wide constituent set; every stream carries one concentration per entry.
    pub constituents: Vec<String>,
    #[serde(default)]
    pub nodes: Vec<NodeDef>,
    #[serde(default)]
    pub edges: Vec<EdgeDef>,
    #[serde(default)]
    pub costing: CostingParams,
}

impl TrainDef {
    pub fn node(&self, id: &str) -> Option<&NodeDef> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDef {
    pub id: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Feed water with fully specified state.
    Source {
        flow_m3_per_s: f64,
        #[serde(default)]
        concentrations_mg_per_l: BTreeMap<String, f64>,
        #[serde(default = "default_temperature")]
        temperature_k: f64,
        #[serde(default = "default_pressure")]
        pressure_pa: f64,
    },
    Unit {
        unit: UnitKind,
        #[serde(default)]
        config: UnitConfig,
    },
    /// `ratios` left empty, or all equal to the 1.0 placeholder, selects
    /// discrete routing. A `null` ratio is left free.
    Splitter {
        outlets: usize,
        #[serde(default)]
        ratios: Vec<Option<f64>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        selected: Option<usize>,
    },
    Mixer {
        inlets: usize,
    },
    Product,
}

fn default_temperature() -> f64 {
    T_AMBIENT_K
}

fn default_pressure() -> f64 {
    P_ATM_PA
}

impl NodeKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Source { .. } => "source",
            NodeKind::Unit { .. } => "unit",
            NodeKind::Splitter { .. } => "splitter",
            NodeKind::Mixer { .. } => "mixer",
            NodeKind::Product => "product",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeDef {
    pub from: PortRef,
    pub to: PortRef,
    /// Closes a loop back into a mixer inlet.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub recycle: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortRef {
    pub node: String,
    /// `inlet`, `outlet`, `waste`, `inlet[i]` or `outlet[i]`.
    pub port: String,
}

impl PortRef {
    pub fn new(node: impl Into<String>, port: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            port: port.into(),
        }
    }
}

impl std::fmt::Display for PortRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.node, self.port)
    }
}
