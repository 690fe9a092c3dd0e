//! Scenarios and simulators.
//!
//! A [`Scenario`] bundles a model with its locations, time window, resolved
//! parameters and initial state. Any [`Simulator`] can consume it; the crate
//! ships [`ChainBinomial`], a daily stochastic stepper without movement.
mod engine;
mod ensemble;
mod init;
mod output;
mod reporter;
mod scenario;
mod scope;

pub use engine::*;
pub use ensemble::*;
pub use init::*;
pub use output::*;
pub use reporter::*;
pub use scenario::*;
pub use scope::*;

#[cfg(test)]
pub(crate) fn test_scenario(version: crate::model::ModelVersion, days: u32) -> Scenario {
    test_scenario_with(version, days, crate::model::default_params())
}

/// Three locations with 100, 50 and 150 individuals (40% adults) and five
/// infected offspring at the last one.
#[cfg(test)]
pub(crate) fn test_scenario_with(
    version: crate::model::ModelVersion,
    days: u32,
    params: crate::params::Params,
) -> Scenario {
    use crate::model::{MaturationBranch, ModelOptions, ModelVersion};
    use chrono::NaiveDate;

    let model = ModelOptions::new(version, MaturationBranch::new(0.3, 0.2).unwrap())
        .build()
        .unwrap();
    let scope = Scope::new(vec!["p1".into(), "p2".into(), "p3".into()]).unwrap();
    let tf = TimeFrame::of(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), days).unwrap();
    let adult = match version {
        ModelVersion::V1 => "R",
        _ => "R_a",
    };
    ScenarioBuilder::new(model, scope, tf)
        .params(params)
        .stratum(
            "offspring",
            vec![60, 30, 90],
            Initializer::SingleLocation {
                location: 2,
                seed_size: 5,
            },
        )
        .stratum(
            "adult",
            vec![40, 20, 60],
            Initializer::NoInfection {
                initial_compartment: adult.to_string(),
            },
        )
        .build()
        .unwrap()
}
