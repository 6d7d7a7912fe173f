//! Graph-specific error types.

use thiserror::Error;
use wt_core::{ArcId, NodeId, PortId, WtError};

/// Topology construction and validation errors.
///
/// Port-level errors carry the port label (`node.kind[slot]`) so the offending
/// connection can be found in the configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Port {port} refers to non-existent node {node}")]
    InvalidNodeRef { port: PortId, node: NodeId },

    #[error("Arc {arc} refers to non-existent port {port}")]
    InvalidPortRef { arc: ArcId, port: PortId },

    #[error("Arc {from} -> {to} must run from an outlet or waste port into an inlet port")]
    InvalidArc { from: String, to: String },

    /// A port that must carry exactly one arc carries none.
    #[error("Port {port} is not connected")]
    Unconnected { port: String },

    #[error("Port {port} is connected more than once")]
    ConnectedTwice { port: String },

    /// Only mixer inlets accept an added recycle contribution.
    #[error("Recycle arc into {port} is not allowed; recycles must enter a mixer inlet")]
    RecycleTarget { port: String },

    /// Non-recycle arcs form a cycle through this node.
    #[error("Train contains a cycle through '{node}' without an explicit recycle arc")]
    Cycle { node: String },

    #[error("{what} not found")]
    IdNotFound { what: &'static str },
}

pub type GraphResult<T> = Result<T, GraphError>;

impl From<GraphError> for WtError {
    fn from(err: GraphError) -> Self {
        WtError::Invariant {
            what: err.to_string(),
        }
    }
}
