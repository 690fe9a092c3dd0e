//! Offspring/adult compartmental model of ranavirus (ATV) transmission in
//! salamander ponds, plus the swab-data tools used to look at field
//! incidence.
//!
//! The model side is declarative: strata, compartments and rate expressions
//! are plain data assembled by [`model::ModelBuilder`] and consumed by any
//! [`sim::Simulator`]. The incidence side turns raw swab records into running
//! cumulative proportions of positive tests.
pub mod config;
pub mod error;
pub mod incidence;
pub mod io;
pub mod model;
pub mod params;
pub mod prelude;
pub mod sim;
pub mod utils;

pub use crate::error::{Error, Result};

/// Basic representation of time. This crate assumes time is measured in days
/// counted from the start of a time frame.
pub type Time = u32;

/// Base Real type used by this crate. Uses an alias to easily change precision
/// if necessary.
pub type Real = f64;

/// Number of individuals in a compartment.
pub type Count = u64;

pub(crate) const INF: Real = Real::INFINITY;
pub(crate) const NAN: Real = Real::NAN;
