//! Graph validation logic.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use wt_core::{ArcId, NodeId, PortId};

use crate::error::{GraphError, GraphResult};
use crate::graph::{port_label, Arc, Node, Port, PortKind};

/// Validate references and arc direction.
pub(crate) fn validate_structure(nodes: &[Node], ports: &[Port], arcs: &[Arc]) -> GraphResult<()> {
    for port in ports {
        if port.node.idx() >= nodes.len() {
            return Err(GraphError::InvalidNodeRef {
                port: port.id,
                node: port.node,
            });
        }
    }

    for arc in arcs {
        for end in [arc.from, arc.to] {
            if end.idx() >= ports.len() {
                return Err(GraphError::InvalidPortRef {
                    arc: arc.id,
                    port: end,
                });
            }
        }
        let from = &ports[arc.from.idx()];
        let to = &ports[arc.to.idx()];
        if !from.kind.is_upstream_end() || to.kind != PortKind::Inlet {
            return Err(GraphError::InvalidArc {
                from: port_label(nodes, from),
                to: port_label(nodes, to),
            });
        }
        if arc.recycle && !to.accepts_recycle {
            return Err(GraphError::RecycleTarget {
                port: port_label(nodes, to),
            });
        }
    }

    Ok(())
}

/// Check every port carries the right number of arcs; return port -> arc.
pub(crate) fn validate_connections(
    nodes: &[Node],
    ports: &[Port],
    arcs: &[Arc],
) -> GraphResult<Vec<Option<ArcId>>> {
    let mut port_arc: Vec<Option<ArcId>> = vec![None; ports.len()];

    for arc in arcs {
        for end in [arc.from, arc.to] {
            let slot = &mut port_arc[end.idx()];
            if slot.is_some() {
                return Err(GraphError::ConnectedTwice {
                    port: port_label(nodes, &ports[end.idx()]),
                });
            }
            *slot = Some(arc.id);
        }
    }

    for port in ports {
        if !port.terminal && port_arc[port.id.idx()].is_none() {
            return Err(GraphError::Unconnected {
                port: port_label(nodes, port),
            });
        }
    }

    Ok(port_arc)
}

/// Topological order over non-recycle arcs; a cycle is an error.
pub(crate) fn topological_order(
    nodes: &[Node],
    ports: &[Port],
    arcs: &[Arc],
) -> GraphResult<Vec<NodeId>> {
    let mut dag: DiGraph<NodeId, PortId> = DiGraph::with_capacity(nodes.len(), arcs.len());
    let indices: Vec<NodeIndex> = nodes.iter().map(|n| dag.add_node(n.id)).collect();

    for arc in arcs.iter().filter(|a| !a.recycle) {
        let from = ports[arc.from.idx()].node;
        let to = ports[arc.to.idx()].node;
        dag.add_edge(indices[from.idx()], indices[to.idx()], arc.to);
    }

    toposort(&dag, None)
        .map(|order| order.into_iter().map(|ix| dag[ix]).collect())
        .map_err(|cycle| {
            let node = dag[cycle.node_id()];
            GraphError::Cycle {
                node: nodes[node.idx()].name.clone(),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wt_core::Id;

    fn node(i: u32, name: &str) -> Node {
        Node {
            id: Id::from_index(i),
            name: name.into(),
        }
    }

    fn port(i: u32, node: u32, kind: PortKind) -> Port {
        Port {
            id: Id::from_index(i),
            node: Id::from_index(node),
            kind,
            slot: 0,
            terminal: false,
            accepts_recycle: false,
        }
    }

    fn arc(i: u32, from: u32, to: u32) -> Arc {
        Arc {
            id: Id::from_index(i),
            from: Id::from_index(from),
            to: Id::from_index(to),
            recycle: false,
        }
    }

    #[test]
    fn validate_empty_graph() {
        assert!(validate_structure(&[], &[], &[]).is_ok());
        assert!(topological_order(&[], &[], &[]).unwrap().is_empty());
    }

    #[test]
    fn invalid_node_ref() {
        let nodes = vec![node(0, "a")];
        let ports = vec![port(0, 99, PortKind::Inlet)];
        let err = validate_structure(&nodes, &ports, &[]).unwrap_err();
        assert!(matches!(err, GraphError::InvalidNodeRef { .. }));
    }

    #[test]
    fn inlet_to_inlet_is_rejected() {
        let nodes = vec![node(0, "a"), node(1, "b")];
        let ports = vec![port(0, 0, PortKind::Inlet), port(1, 1, PortKind::Inlet)];
        let err = validate_structure(&nodes, &ports, &[arc(0, 0, 1)]).unwrap_err();
        assert_eq!(
            err,
            GraphError::InvalidArc {
                from: "a.inlet[0]".into(),
                to: "b.inlet[0]".into()
            }
        );
    }

    #[test]
    fn two_arcs_into_one_inlet() {
        let nodes = vec![node(0, "a"), node(1, "b"), node(2, "c")];
        let ports = vec![
            port(0, 0, PortKind::Outlet),
            port(1, 1, PortKind::Outlet),
            port(2, 2, PortKind::Inlet),
        ];
        let arcs = vec![arc(0, 0, 2), arc(1, 1, 2)];
        let err = validate_connections(&nodes, &ports, &arcs).unwrap_err();
        assert_eq!(
            err,
            GraphError::ConnectedTwice {
                port: "c.inlet[0]".into()
            }
        );
    }

    #[test]
    fn cycle_is_detected() {
        let nodes = vec![node(0, "a"), node(1, "b")];
        let ports = vec![
            port(0, 0, PortKind::Outlet),
            port(1, 1, PortKind::Inlet),
            port(2, 1, PortKind::Outlet),
            port(3, 0, PortKind::Inlet),
        ];
        let arcs = vec![arc(0, 0, 1), arc(1, 2, 3)];
        let err = topological_order(&nodes, &ports, &arcs).unwrap_err();
        assert!(matches!(err, GraphError::Cycle { .. }));
    }
}
