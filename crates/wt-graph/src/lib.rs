//! wt-graph: topology layer for watertrain.
//!
//! Provides:
//! - Core graph data structures (Node, Port, Arc, Graph)
//! - Incremental graph builder with validation
//! - Topological ordering over non-recycle arcs
//!
//! # Example
//!
//! ```
//! use wt_graph::{GraphBuilder, PortKind};
//!
//! let mut builder = GraphBuilder::new();
//! let source = builder.add_node("source");
//! let filter = builder.add_node("filter");
//! let out = builder.add_port(source, PortKind::Outlet);
//! let inlet = builder.add_port(filter, PortKind::Inlet);
//! builder.add_terminal_port(filter, PortKind::Outlet);
//! builder.add_terminal_port(filter, PortKind::Waste);
//! builder.connect(out, inlet);
//! let graph = builder.build().unwrap();
//!
//! assert_eq!(graph.nodes().len(), 2);
//! assert_eq!(graph.arcs().len(), 1);
//! ```

pub mod builder;
pub mod error;
pub mod graph;
pub(crate) mod validate;

// Re-exports for ergonomics
pub use builder::GraphBuilder;
pub use error::{GraphError, GraphResult};
pub use graph::{Arc, Graph, Node, Port, PortKind};
