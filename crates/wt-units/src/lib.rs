//! Unit processes and junctions for water treatment trains.
//!
//! Every port carries a full stream (flow, concentrations, temperature,
//! pressure). Unit processes get a standard set of balance equations from
//! [`balance`]; each kind in the [`registry`] may replace some of them with
//! its own physics. Splitters and mixers join units into a train.

pub mod balance;
pub mod config;
pub mod cost;
pub mod error;
pub mod mixer;
pub mod processes;
pub mod registry;
pub mod splitter;
pub mod stream;
pub mod unit;

pub use balance::{EquationSet, GenericEquation};
pub use config::{ConfigView, ParamValue, UnitConfig};
pub use cost::{CostCurve, CostRecord};
pub use error::{UnitError, UnitResult};
pub use mixer::Mixer;
pub use registry::{Registry, RegistryEntry, UnitContext, UnitKind, UnitSpec};
pub use splitter::{Routing, Splitter, SplitterMode};
pub use stream::{Constituents, PortName, StreamInit, StreamValues, StreamVars};
pub use unit::{InitOverrides, UnitProcess};
