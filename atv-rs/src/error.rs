use crate::{params::ParamKey, Real, Time};
use thiserror::Error;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building models, resolving parameters, loading data or
/// running simulations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("duplicate stratum '{0}'")]
    DuplicateStratum(String),

    #[error("duplicate compartment '{compartment}' in stratum '{stratum}'")]
    DuplicateCompartment { stratum: String, compartment: String },

    #[error("unknown stratum '{0}'")]
    UnknownStratum(String),

    #[error("unknown compartment '{compartment}' in stratum '{stratum}'")]
    UnknownCompartment { stratum: String, compartment: String },

    #[error("edge of stratum '{stratum}' references '{symbol}' outside its stratum")]
    ForeignReference { stratum: String, symbol: String },

    #[error("invalid edge {label}: {reason}")]
    InvalidEdge { label: String, reason: &'static str },

    #[error("rate of {label} references undeclared attribute '{key}'")]
    UndeclaredAttribute { label: String, key: ParamKey },

    #[error("invalid parameter key '{0}'")]
    InvalidParamKey(String),

    #[error("missing value for parameter '{0}'")]
    MissingParam(ParamKey),

    #[error("invalid value for parameter '{key}': {reason}")]
    InvalidParam { key: ParamKey, reason: String },

    #[error("parameter '{key}' has shape {found:?}, expected {expected:?}")]
    ParamShape {
        key: ParamKey,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("probability '{name}' = {value} is outside [0, 1]")]
    InvalidProbability { name: &'static str, value: Real },

    #[error(
        "maturation branch probabilities exceed 1: p_chronic = {p_chronic}, p_disease_death = {p_disease_death}"
    )]
    BranchProbability {
        p_chronic: Real,
        p_disease_death: Real,
    },

    #[error("rate of {label} evaluated to {value} at location {location}, day {day}")]
    InvalidRate {
        label: String,
        location: usize,
        day: Time,
        value: Real,
    },

    #[error("invalid infection seed: {0}")]
    InvalidSeed(String),

    #[error("stratum '{stratum}' has {found} population entries, scope has {expected} locations")]
    PopulationMismatch {
        stratum: String,
        expected: usize,
        found: usize,
    },

    #[error("scope has no locations")]
    EmptyScope,

    #[error("time frame must span at least one day")]
    EmptyTimeFrame,

    #[error("sampling error: {0}")]
    Sampling(String),
}
