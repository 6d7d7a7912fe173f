//! Network assembly: from a `TrainDef` to one `Model`.
//!
//! The topology is built and validated first so nodes can be declared in
//! topological order, each seeded from its upstream neighbours' estimates.
//! Arcs are then realized as component-wise stream equalities.

use std::collections::HashMap;

use tracing::{debug, info};
use wt_core::{ConId, PortId, Tolerances, VarId, canonical, k, m3ps, mg_per_l, pa};
use wt_costing::CostingParams;
use wt_graph::{Graph, GraphBuilder, PortKind};
use wt_model::{DofReport, Model};
use wt_project::schema::{NodeKind, TrainDef};
use wt_project::{splitter_ratios, validate_train};
use wt_solver::independent_constraints;
use wt_units::stream::{declare_stream, equate_streams};
use wt_units::{
    Constituents, Mixer, PortName, Registry, Splitter, SplitterMode, StreamValues, StreamVars,
    UnitProcess, UnitSpec,
};

use crate::error::{AppError, AppResult};

/// Initial flow guessed for a recycle stream before its source is built.
const RECYCLE_FLOW_GUESS: f64 = 1e-6;

/// A built node: the streams it owns and the equations it attached.
#[derive(Debug, Clone)]
pub enum NetworkNode {
    Source { outlet: StreamVars },
    Unit(UnitProcess),
    Splitter(Splitter),
    Mixer(Mixer),
    Product { inlet: StreamVars },
}

impl NetworkNode {
    pub fn stream(&self, port: PortName) -> Option<&StreamVars> {
        match (self, port) {
            (NetworkNode::Source { outlet }, PortName::Outlet) => Some(outlet),
            (NetworkNode::Unit(unit), port) => unit.stream(port),
            (NetworkNode::Splitter(s), PortName::Inlet) => Some(&s.inlet),
            (NetworkNode::Splitter(s), PortName::IndexedOutlet(i)) => s.branches.get(i),
            (NetworkNode::Mixer(m), PortName::IndexedInlet(i)) => m.inlets.get(i),
            (NetworkNode::Mixer(m), PortName::Outlet) => Some(&m.outlet),
            (NetworkNode::Product { inlet }, PortName::Inlet) => Some(inlet),
            _ => None,
        }
    }
}

/// The equalities realizing one arc.
#[derive(Debug, Clone)]
pub struct ArcBlock {
    pub from: String,
    pub to: String,
    pub recycle: bool,
    pub constraints: Vec<ConId>,
}

/// An assembled train.
#[derive(Debug, Clone)]
pub struct Network {
    pub train_id: String,
    pub constituents: Constituents,
    pub model: Model,
    pub costing: CostingParams,
    graph: Graph,
    names: Vec<String>,
    nodes: Vec<NetworkNode>,
    port_names: Vec<PortName>,
    arcs: Vec<ArcBlock>,
}

impl Network {
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn arcs(&self) -> &[ArcBlock] {
        &self.arcs
    }

    /// Nodes with their configured ids, in configuration order.
    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NetworkNode)> {
        self.names.iter().map(String::as_str).zip(&self.nodes)
    }

    pub fn node(&self, id: &str) -> Option<&NetworkNode> {
        let idx = self.names.iter().position(|n| n == id)?;
        self.nodes.get(idx)
    }

    pub fn stream(&self, node: &str, port: PortName) -> Option<&StreamVars> {
        self.node(node)?.stream(port)
    }

    /// Current values of a node's port.
    pub fn stream_values(&self, node: &str, port: PortName) -> Option<StreamValues> {
        let values = self.model.values();
        self.stream(node, port).map(|s| s.read(&values))
    }

    pub fn units(&self) -> impl Iterator<Item = &UnitProcess> {
        self.nodes.iter().filter_map(|n| match n {
            NetworkNode::Unit(u) => Some(u),
            _ => None,
        })
    }

    pub fn unit(&self, id: &str) -> Option<&UnitProcess> {
        match self.node(id)? {
            NetworkNode::Unit(u) => Some(u),
            _ => None,
        }
    }

    pub fn splitters(&self) -> impl Iterator<Item = &Splitter> {
        self.nodes.iter().filter_map(|n| match n {
            NetworkNode::Splitter(s) => Some(s),
            _ => None,
        })
    }

    /// Inlet flow variables of every product node.
    pub fn product_flows(&self) -> Vec<VarId> {
        self.nodes
            .iter()
            .filter_map(|n| match n {
                NetworkNode::Product { inlet } => Some(inlet.flow_vol),
                _ => None,
            })
            .collect()
    }

    /// Degrees-of-freedom report including the Jacobian rank at the initial point.
    pub fn dof_report(&self) -> AppResult<DofReport> {
        let report = self.model.dof_report(Tolerances::solver().abs);
        let rank = independent_constraints(&self.model)?;
        Ok(report.with_independent(rank))
    }

    /// Name of a port for arc labels, e.g. `coag.outlet`.
    fn port_label(&self, port: PortId) -> String {
        let node = self
            .graph
            .port(port)
            .and_then(|p| self.names.get(p.node.idx()))
            .map_or("?", String::as_str);
        match self.port_names.get(port.idx()) {
            Some(name) => format!("{node}.{name}"),
            None => format!("{node}.<port {port}>"),
        }
    }
}

/// Assemble a train with the standard unit registry.
pub fn assemble(train: &TrainDef) -> AppResult<Network> {
    assemble_with(train, &Registry::standard())
}

pub fn assemble_with(train: &TrainDef, registry: &Registry) -> AppResult<Network> {
    validate_train(train)?;
    let constituents = Constituents::new(train.constituents.iter())?;

    let (graph, port_names, port_ids) = build_topology(train, registry)?;

    let mut model = Model::new();
    let mut built: Vec<Option<NetworkNode>> = vec![None; train.nodes.len()];
    let mut estimates: HashMap<PortId, StreamValues> = HashMap::new();

    for &node_id in graph.topological_order() {
        let idx = node_id.idx();
        let def = &train.nodes[idx];
        let ports = &port_ids[idx];
        let name = def.id.as_str();

        let inlet_init = |port: PortName| -> StreamValues {
            ports
                .get(&port)
                .and_then(|p| graph.arc_at(*p))
                .filter(|arc| !arc.recycle)
                .and_then(|arc| estimates.get(&arc.from).cloned())
                .unwrap_or_else(|| {
                    StreamValues::ambient(constituents.len()).with_flow(RECYCLE_FLOW_GUESS)
                })
        };

        let node = match &def.kind {
            NodeKind::Source {
                flow_m3_per_s,
                concentrations_mg_per_l,
                temperature_k,
                pressure_pa,
            } => {
                let values = StreamValues {
                    flow_vol: canonical::flow(m3ps(*flow_m3_per_s)),
                    conc_mass: constituents
                        .iter()
                        .map(|c| {
                            let mg_l = concentrations_mg_per_l.get(c).copied().unwrap_or(0.0);
                            canonical::conc(mg_per_l(mg_l))
                        })
                        .collect(),
                    temperature: canonical::temperature(k(*temperature_k)),
                    pressure: canonical::pressure(pa(*pressure_pa)),
                };
                let outlet =
                    declare_stream(&mut model, name, PortName::Outlet, &constituents, &values)?;
                outlet.fix(&mut model, &values)?;
                NetworkNode::Source { outlet }
            }
            NodeKind::Unit { unit, config } => {
                let inlet = inlet_init(PortName::Inlet);
                NetworkNode::Unit(registry.build(
                    &mut model,
                    UnitSpec {
                        name,
                        kind: *unit,
                        config,
                        constituents: &constituents,
                        inlet: &inlet,
                    },
                )?)
            }
            NodeKind::Splitter {
                outlets,
                ratios,
                selected,
            } => {
                let mode =
                    SplitterMode::from_ratios(name, &splitter_ratios(*outlets, ratios), *selected)?;
                let inlet = inlet_init(PortName::Inlet);
                NetworkNode::Splitter(Splitter::build(
                    &mut model,
                    name,
                    &constituents,
                    &mode,
                    &inlet,
                )?)
            }
            NodeKind::Mixer { inlets } => {
                let inits: Vec<StreamValues> = (0..*inlets)
                    .map(|i| inlet_init(PortName::IndexedInlet(i)))
                    .collect();
                NetworkNode::Mixer(Mixer::build(&mut model, name, &constituents, &inits)?)
            }
            NodeKind::Product => {
                let init = inlet_init(PortName::Inlet);
                let inlet = declare_stream(&mut model, name, PortName::Inlet, &constituents, &init)?;
                NetworkNode::Product { inlet }
            }
        };

        let values = model.values();
        for (port, port_id) in ports {
            if port.is_inlet() {
                continue;
            }
            if let Some(stream) = node.stream(*port) {
                estimates.insert(*port_id, stream.read(&values));
            }
        }
        debug!(node = name, kind = def.kind.type_name(), "declared node");
        built[idx] = Some(node);
    }

    let nodes = built
        .into_iter()
        .zip(&train.nodes)
        .map(|(node, def)| {
            node.ok_or_else(|| AppError::Validation(format!("node '{}' was not built", def.id)))
        })
        .collect::<AppResult<Vec<_>>>()?;

    let mut network = Network {
        train_id: train.id.clone(),
        constituents,
        model,
        costing: train.costing.clone(),
        graph,
        names: train.nodes.iter().map(|n| n.id.clone()).collect(),
        nodes,
        port_names,
        arcs: Vec::new(),
    };
    connect_arcs(&mut network)?;

    info!(
        train = %network.train_id,
        variables = network.model.num_variables(),
        constraints = network.model.num_constraints(),
        arcs = network.arcs.len(),
        "assembled train"
    );
    Ok(network)
}

type PortMap = HashMap<PortName, PortId>;

/// Declare graph nodes and ports per node kind, connect the edges and
/// validate the topology.
fn build_topology(
    train: &TrainDef,
    registry: &Registry,
) -> AppResult<(Graph, Vec<PortName>, Vec<PortMap>)> {
    let mut builder = GraphBuilder::new();
    let mut port_names = Vec::new();
    let mut port_ids: Vec<PortMap> = Vec::with_capacity(train.nodes.len());

    for def in &train.nodes {
        let node = builder.add_node(def.id.clone());
        let mut ports = PortMap::new();
        let mut add = |name: PortName, kind: PortKind, terminal: bool, recycle: bool| {
            let id = if terminal {
                builder.add_terminal_port(node, kind)
            } else {
                builder.add_port(node, kind)
            };
            if recycle {
                builder.allow_recycle(id);
            }
            port_names.push(name);
            ports.insert(name, id);
        };
        match &def.kind {
            NodeKind::Source { .. } => add(PortName::Outlet, PortKind::Outlet, false, false),
            NodeKind::Unit { unit, .. } => {
                let terminal_outlet = registry.entry(*unit)?.terminal_outlet;
                add(PortName::Inlet, PortKind::Inlet, false, false);
                add(PortName::Outlet, PortKind::Outlet, terminal_outlet, false);
                add(PortName::Waste, PortKind::Waste, true, false);
            }
            NodeKind::Splitter { outlets, .. } => {
                add(PortName::Inlet, PortKind::Inlet, false, false);
                for i in 0..*outlets {
                    add(PortName::IndexedOutlet(i), PortKind::Outlet, false, false);
                }
            }
            NodeKind::Mixer { inlets } => {
                for i in 0..*inlets {
                    add(PortName::IndexedInlet(i), PortKind::Inlet, false, true);
                }
                add(PortName::Outlet, PortKind::Outlet, false, false);
            }
            NodeKind::Product => add(PortName::Inlet, PortKind::Inlet, false, false),
        }
        port_ids.push(ports);
    }

    let lookup = |node: &str, port: &str| -> AppResult<PortId> {
        let idx = train
            .nodes
            .iter()
            .position(|n| n.id == node)
            .ok_or_else(|| AppError::Validation(format!("unknown node '{node}'")))?;
        PortName::parse(port)
            .and_then(|p| port_ids[idx].get(&p).copied())
            .ok_or_else(|| AppError::Validation(format!("node '{node}' has no port '{port}'")))
    };
    for edge in &train.edges {
        let from = lookup(&edge.from.node, &edge.from.port)?;
        let to = lookup(&edge.to.node, &edge.to.port)?;
        if edge.recycle {
            builder.connect_recycle(from, to);
        } else {
            builder.connect(from, to);
        }
    }

    let graph = builder.build()?;
    Ok((graph, port_names, port_ids))
}

/// One equality block per arc.
fn connect_arcs(network: &mut Network) -> AppResult<()> {
    let arcs = network.graph.arcs().to_vec();
    for arc in arcs {
        let from = network.port_label(arc.from);
        let to = network.port_label(arc.to);
        let stream = |port: PortId| -> AppResult<StreamVars> {
            let p = network
                .graph
                .port(port)
                .ok_or(wt_graph::GraphError::IdNotFound { what: "port" })?;
            network
                .nodes
                .get(p.node.idx())
                .zip(network.port_names.get(port.idx()))
                .and_then(|(node, name)| node.stream(*name))
                .cloned()
                .ok_or_else(|| AppError::Validation(format!("no stream behind port {port}")))
        };
        let a = stream(arc.from)?;
        let b = stream(arc.to)?;
        let name = format!("{from}->{to}");
        let constraints =
            equate_streams(&mut network.model, &name, &a, &b, &network.constituents);
        debug!(arc = %name, recycle = arc.recycle, "connected arc");
        network.arcs.push(ArcBlock {
            from,
            to,
            recycle: arc.recycle,
            constraints,
        });
    }
    Ok(())
}
