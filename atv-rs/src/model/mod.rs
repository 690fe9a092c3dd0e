//! Declarative compartmental models.
//!
//! A model is a list of strata (each with compartments, required attributes
//! and edges between its own compartments) plus a list of meta edges that
//! couple strata, e.g. maturation of offspring into adults or births driven by
//! adult population. [`ModelBuilder`] resolves names into a flat [`Model`]
//! that simulators evaluate.
mod branch;
mod builder;
mod catalog;
mod compartment;
mod compiled;
mod expr;
mod stratum;

pub use branch::*;
pub use builder::*;
pub use catalog::*;
pub use compartment::*;
pub use compiled::*;
pub use expr::*;
pub use stratum::*;

pub(crate) use branch::check_probability;
