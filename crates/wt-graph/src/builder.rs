//! Incremental graph builder.

use std::collections::HashMap;
use wt_core::{ArcId, NodeId, PortId};

use crate::error::GraphResult;
use crate::graph::{Arc, Graph, Node, Port, PortKind};
use crate::validate;

/// Builder for constructing a train topology incrementally.
///
/// Use `add_node`, `add_port` and `connect` to build up the graph,
/// then call `build()` to validate and freeze it into an immutable `Graph`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Node>,
    ports: Vec<Port>,
    arcs: Vec<Arc>,
}

impl GraphBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the graph and return its ID.
    pub fn add_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId::from_usize(self.nodes.len());
        self.nodes.push(Node {
            id,
            name: name.into(),
        });
        id
    }

    /// Add a port that must carry exactly one arc.
    pub fn add_port(&mut self, node: NodeId, kind: PortKind) -> PortId {
        self.push_port(node, kind, false)
    }

    /// Add a port that may be left unconnected (a train boundary).
    pub fn add_terminal_port(&mut self, node: NodeId, kind: PortKind) -> PortId {
        self.push_port(node, kind, true)
    }

    fn push_port(&mut self, node: NodeId, kind: PortKind, terminal: bool) -> PortId {
        let id = PortId::from_usize(self.ports.len());
        let slot = self
            .ports
            .iter()
            .filter(|p| p.node == node && p.kind == kind)
            .count();
        self.ports.push(Port {
            id,
            node,
            kind,
            slot,
            terminal,
            accepts_recycle: false,
        });
        id
    }

    /// Allow a port to receive a recycle arc.
    pub fn allow_recycle(&mut self, port: PortId) {
        if let Some(p) = self.ports.get_mut(port.idx()) {
            p.accepts_recycle = true;
        }
    }

    /// Connect an outlet/waste port to an inlet port.
    pub fn connect(&mut self, from: PortId, to: PortId) -> ArcId {
        self.push_arc(from, to, false)
    }

    /// Connect with an explicit recycle arc.
    pub fn connect_recycle(&mut self, from: PortId, to: PortId) -> ArcId {
        self.push_arc(from, to, true)
    }

    fn push_arc(&mut self, from: PortId, to: PortId, recycle: bool) -> ArcId {
        let id = ArcId::from_usize(self.arcs.len());
        self.arcs.push(Arc {
            id,
            from,
            to,
            recycle,
        });
        id
    }

    /// Build and validate the graph, returning an immutable `Graph`.
    ///
    /// Validation covers references, arc direction, connection counts,
    /// recycle targets and acyclicity, in that order.
    pub fn build(self) -> GraphResult<Graph> {
        validate::validate_structure(&self.nodes, &self.ports, &self.arcs)?;
        let port_arc = validate::validate_connections(&self.nodes, &self.ports, &self.arcs)?;
        let topo_order = validate::topological_order(&self.nodes, &self.ports, &self.arcs)?;

        let (node_port_offsets, node_ports) = Self::build_adjacency(&self.nodes, &self.ports);

        Ok(Graph {
            nodes: self.nodes,
            ports: self.ports,
            arcs: self.arcs,
            node_port_offsets,
            node_ports,
            port_arc,
            topo_order,
        })
    }

    /// Build compact adjacency lists: for each node, collect its ports.
    fn build_adjacency(nodes: &[Node], ports: &[Port]) -> (Vec<usize>, Vec<PortId>) {
        let mut node_to_ports: HashMap<NodeId, Vec<PortId>> = HashMap::new();
        for port in ports {
            node_to_ports.entry(port.node).or_default().push(port.id);
        }

        for ports_list in node_to_ports.values_mut() {
            ports_list.sort_by_key(|p| p.index());
        }

        let mut offsets = Vec::with_capacity(nodes.len() + 1);
        let mut flat_ports = Vec::new();
        offsets.push(0);

        for node in nodes {
            if let Some(ports_list) = node_to_ports.get(&node.id) {
                flat_ports.extend_from_slice(ports_list);
            }
            offsets.push(flat_ports.len());
        }

        (offsets, flat_ports)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_assigns_slots_per_kind() {
        let mut builder = GraphBuilder::new();
        let mixer = builder.add_node("mixer");
        let a = builder.add_port(mixer, PortKind::Inlet);
        let b = builder.add_port(mixer, PortKind::Inlet);
        let out = builder.add_port(mixer, PortKind::Outlet);

        assert_eq!(builder.ports[a.idx()].slot, 0);
        assert_eq!(builder.ports[b.idx()].slot, 1);
        assert_eq!(builder.ports[out.idx()].slot, 0);
    }

    #[test]
    fn builder_build_simple() {
        let mut builder = GraphBuilder::new();
        let src = builder.add_node("source");
        let unit = builder.add_node("dosing");
        let src_out = builder.add_port(src, PortKind::Outlet);
        let unit_in = builder.add_port(unit, PortKind::Inlet);
        builder.add_terminal_port(unit, PortKind::Outlet);
        builder.add_terminal_port(unit, PortKind::Waste);
        builder.connect(src_out, unit_in);

        let graph = builder.build().unwrap();
        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.ports().len(), 4);
        assert_eq!(graph.arcs().len(), 1);
        assert_eq!(graph.node_ports(unit).len(), 3);
        assert_eq!(graph.arc_at(unit_in).map(|a| a.from), Some(src_out));
        assert_eq!(graph.topological_order(), &[src, unit]);
    }
}
