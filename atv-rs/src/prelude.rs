//! Commonly used types, re-exported for glob import.
pub use crate::config::{ModelConfig, SimConfig, SwabConfig};
pub use crate::error::{Error, Result};
pub use crate::incidence::{CumulativePoint, IncidenceOptions};
pub use crate::io::{Sites, SwabRecord};
pub use crate::model::{
    AttributeKind, Expr, MaturationBranch, Model, ModelBuilder, ModelOptions, ModelVersion, Node,
    Stratum,
};
pub use crate::params::{AttributeValue, ParamKey, Params};
pub use crate::sim::{
    run_ensemble, ChainBinomial, EnsembleSummary, Initializer, LogReporter, Output, Reporter,
    Scenario, ScenarioBuilder, Scope, Simulator, TimeFrame,
};
pub use crate::{Count, Real, Time};
