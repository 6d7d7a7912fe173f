//! wt-model: the assembled variable/constraint system.
//!
//! A `Model` is what the network assembler produces and what a solver consumes:
//! - variables with bounds, domains and a fixed flag
//! - constraints `lower <= body <= upper` over `Expr` bodies
//! - an optional objective
//! - degrees-of-freedom accounting over the free continuous variables
//!
//! # Example
//!
//! ```
//! use wt_model::{Expr, Model, VarSpec};
//!
//! let mut model = Model::new();
//! let f_in = model.add_fixed("in.flow_vol", VarSpec::new(1.0), 2.0).unwrap();
//! let f_out = model.add_var("out.flow_vol", VarSpec::new(1.0)).unwrap();
//! let r = model.add_fixed("water_recovery", VarSpec::new(1.0), 0.9).unwrap();
//! model.add_equality("recovery", Expr::var(r) * f_in, f_out);
//!
//! assert_eq!(model.dof_report(1e-8).degrees_of_freedom(), 0);
//! ```

pub mod constraint;
pub mod dof;
pub mod error;
pub mod expr;
pub mod model;
pub mod variable;

pub use constraint::Constraint;
pub use dof::DofReport;
pub use error::{ModelError, ModelResult};
pub use expr::Expr;
pub use model::{ConstraintClass, Model, Violation};
pub use variable::{Domain, VarSpec, Variable};
