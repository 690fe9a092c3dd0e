use super::{Initializer, Scope, TimeFrame};
use crate::{
    model::Model,
    params::{Params, ResolvedParams},
    Count, Error, Result,
};
use getset::Getters;
use log::{debug, info, warn};
use ndarray::{prelude::*, s};

/// Everything a simulator needs for one run: the model, where and when it
/// runs, resolved parameter values and the initial state.
///
/// Scenarios are immutable once built and may be shared between threads.
#[derive(Debug, Clone, Getters)]
#[getset(get = "pub")]
pub struct Scenario {
    model: Model,
    scope: Scope,
    time_frame: TimeFrame,
    params: ResolvedParams,
    /// Initial population, indexed by (location, compartment).
    initial: Array2<Count>,
}

/// Per-stratum initial population and initializer.
#[derive(Debug, Clone)]
struct StratumInit {
    name: String,
    population: Vec<Count>,
    init: Initializer,
}

/// Assembles a [`Scenario`], validating populations and parameters.
#[derive(Debug, Clone)]
pub struct ScenarioBuilder {
    model: Model,
    scope: Scope,
    time_frame: TimeFrame,
    params: Params,
    strata: Vec<StratumInit>,
}

impl ScenarioBuilder {
    pub fn new(model: Model, scope: Scope, time_frame: TimeFrame) -> Self {
        ScenarioBuilder {
            model,
            scope,
            time_frame,
            params: Params::new(),
            strata: vec![],
        }
    }

    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Set the per-location population of a stratum and how it starts out.
    pub fn stratum(mut self, name: &str, population: Vec<Count>, init: Initializer) -> Self {
        self.strata.push(StratumInit {
            name: name.to_string(),
            population,
            init,
        });
        self
    }

    pub fn build(self) -> Result<Scenario> {
        let n = self.scope.len();
        let mut initial = Array2::zeros((n, self.model.n_compartments()));

        for st in self.strata.iter() {
            let range = self.model.stratum_compartments(&st.name)?;
            if st.population.len() != n {
                return Err(Error::PopulationMismatch {
                    stratum: st.name.clone(),
                    expected: n,
                    found: st.population.len(),
                });
            }
            let names: Vec<String> = self.model.compartments()[range.clone()]
                .iter()
                .map(|c| c.def().name().clone())
                .collect();
            let block = st.init.apply(&st.name, &names, &st.population)?;
            initial
                .slice_mut(s![.., range.start..range.end])
                .assign(&block);
        }
        for info in self.model.strata() {
            if !self.strata.iter().any(|st| &st.name == info.name()) {
                warn!("no population given for stratum '{}', starting empty", info.name());
            }
        }

        let params = self
            .params
            .resolve(self.model.attributes(), self.time_frame.days(), n)?;
        debug!(
            "resolved parameters: {}",
            params
                .keys()
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        info!(
            "scenario: {} locations, {} days from {}, {} individuals",
            n,
            self.time_frame.days(),
            self.time_frame.start(),
            initial.sum()
        );

        Ok(Scenario {
            model: self.model,
            scope: self.scope,
            time_frame: self.time_frame,
            params,
            initial,
        })
    }
}
