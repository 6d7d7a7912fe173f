//! Core graph data structures.

use std::fmt;
use wt_core::{ArcId, NodeId, PortId};

/// Role of a port on its node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PortKind {
    /// Water enters the node.
    Inlet,
    /// Treated water (or a splitter branch) leaves the node.
    Outlet,
    /// Rejected water leaves the node.
    Waste,
}

impl PortKind {
    /// Whether water leaves the node through this port.
    pub fn is_upstream_end(self) -> bool {
        matches!(self, PortKind::Outlet | PortKind::Waste)
    }
}

impl fmt::Display for PortKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PortKind::Inlet => "inlet",
            PortKind::Outlet => "outlet",
            PortKind::Waste => "waste",
        };
        f.write_str(s)
    }
}

/// A node of the train: a source, unit process, junction or product sink.
///
/// Nodes hold no stream data; the stream variables live in the model and are
/// looked up through the port ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
}

/// A port attaches one stream to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Port {
    pub id: PortId,
    pub node: NodeId,
    pub kind: PortKind,
    /// Position among the node's ports of the same kind.
    pub slot: usize,
    /// May be left without an arc (train boundary).
    pub terminal: bool,
    /// May receive a recycle arc.
    pub accepts_recycle: bool,
}

/// A directed stream connection from an outlet/waste port to an inlet port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arc {
    pub id: ArcId,
    pub from: PortId,
    pub to: PortId,
    /// Explicit recycle; excluded from the acyclicity requirement.
    pub recycle: bool,
}

/// The graph: a validated, immutable train topology.
///
/// The graph stores:
/// - All nodes, ports and arcs in vectors (indexed by their IDs).
/// - Compact adjacency: for each node, which ports it owns.
/// - For each port, the arc attached to it (at most one).
/// - A topological order of the nodes over non-recycle arcs.
#[derive(Debug, Clone)]
pub struct Graph {
    pub(crate) nodes: Vec<Node>,
    pub(crate) ports: Vec<Port>,
    pub(crate) arcs: Vec<Arc>,

    /// Node i's ports are in node_ports[node_port_offsets[i]..node_port_offsets[i+1]].
    pub(crate) node_port_offsets: Vec<usize>,
    pub(crate) node_ports: Vec<PortId>,

    pub(crate) port_arc: Vec<Option<ArcId>>,
    pub(crate) topo_order: Vec<NodeId>,
}

impl Graph {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn ports(&self) -> &[Port] {
        &self.ports
    }

    pub fn arcs(&self) -> &[Arc] {
        &self.arcs
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.idx())
    }

    pub fn port(&self, id: PortId) -> Option<&Port> {
        self.ports.get(id.idx())
    }

    pub fn arc(&self, id: ArcId) -> Option<&Arc> {
        self.arcs.get(id.idx())
    }

    /// Ports owned by a node, in declaration order.
    pub fn node_ports(&self, node_id: NodeId) -> &[PortId] {
        let idx = node_id.idx();
        if idx >= self.nodes.len() {
            return &[];
        }
        let start = self.node_port_offsets[idx];
        let end = self.node_port_offsets[idx + 1];
        &self.node_ports[start..end]
    }

    /// The arc attached to a port, if any.
    pub fn arc_at(&self, port: PortId) -> Option<&Arc> {
        self.port_arc
            .get(port.idx())
            .copied()
            .flatten()
            .and_then(|a| self.arc(a))
    }

    /// Nodes ordered so every non-recycle arc runs forward.
    pub fn topological_order(&self) -> &[NodeId] {
        &self.topo_order
    }

    /// Human-readable port label, `node.kind[slot]`.
    pub fn port_label(&self, port: PortId) -> String {
        match self.port(port) {
            Some(p) => port_label(&self.nodes, p),
            None => format!("<port {}>", port),
        }
    }
}

pub(crate) fn port_label(nodes: &[Node], port: &Port) -> String {
    let node = nodes
        .get(port.node.idx())
        .map_or("<unknown>", |n| n.name.as_str());
    format!("{}.{}[{}]", node, port.kind, port.slot)
}
