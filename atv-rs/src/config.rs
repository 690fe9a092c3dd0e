//! TOML configuration of the two binaries.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! placeholder setup. Dates are written as quoted strings, e.g.
//! `start_date = "2020-01-01"`.
//!
//! ```toml
//! sites = "data/sites.csv"
//! duration_days = 365
//! replicates = 20
//!
//! [model]
//! version = "v2"
//! p_chronic = 0.25
//!
//! [params]
//! "offspring::beta" = 0.45
//! "meta::p_vert" = [0.5, 0.6, 0.7]
//! ```
use crate::{
    incidence::IncidenceOptions,
    io::Sites,
    model::{default_params, MaturationBranch, ModelOptions, ModelVersion, ADULT, OFFSPRING},
    params::Params,
    sim::{replicate_seeds, split_populations, Initializer, Scenario, ScenarioBuilder, Scope, TimeFrame},
    Real, Result, Time,
};
use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Choice of model version and maturation branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub version: ModelVersion,
    pub p_chronic: Real,
    pub p_disease_death: Real,
    pub mature_susceptible: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            version: ModelVersion::V3,
            p_chronic: 0.30,
            p_disease_death: 0.20,
            mature_susceptible: false,
        }
    }
}

impl ModelConfig {
    /// Validate the branch probabilities the chosen version uses and return
    /// the model options. v1 has no branch and v2 no disease death, so the
    /// unused values are not checked.
    pub fn options(&self) -> Result<ModelOptions> {
        let branch = match self.version {
            ModelVersion::V1 => MaturationBranch::default(),
            ModelVersion::V2 => {
                if self.p_disease_death > 0.0 {
                    warn!(
                        "model v2 has no disease death at maturation; ignoring p_disease_death = {}",
                        self.p_disease_death
                    );
                }
                MaturationBranch::chronic_only(self.p_chronic)?
            }
            ModelVersion::V3 => MaturationBranch::new(self.p_chronic, self.p_disease_death)?,
        };
        Ok(ModelOptions::new(self.version, branch).with_mature_susceptible(self.mature_susceptible))
    }
}

/// Configuration of a simulation run (`sim.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Site table with `site_id,n_salamanders,initial_infected`.
    pub sites: PathBuf,
    pub start_date: NaiveDate,
    pub duration_days: Time,
    pub seed: u64,
    pub replicates: usize,
    /// Fraction of each site's population that starts as adults.
    pub adult_frac: Real,
    /// Index of the site whose offspring are seeded with infections.
    pub seed_location: usize,
    pub output: PathBuf,
    pub verbose: bool,
    pub model: ModelConfig,
    /// Overrides of the default parameter values.
    pub params: Params,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            sites: PathBuf::from("data/basicTestData.csv"),
            start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN),
            duration_days: 200,
            seed: 5,
            replicates: 1,
            adult_frac: 0.40,
            seed_location: 2,
            output: PathBuf::from("sim_output.csv"),
            verbose: false,
            model: ModelConfig::default(),
            params: Params::new(),
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("reading configuration from {}", path.display());
        SimConfig::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Default parameter values with the configured overrides applied.
    pub fn params(&self) -> Params {
        let mut params = default_params();
        params.merge(&self.params);
        params
    }

    pub fn time_frame(&self) -> Result<TimeFrame> {
        TimeFrame::of(self.start_date, self.duration_days)
    }

    pub fn seeds(&self) -> Vec<u64> {
        replicate_seeds(self.seed, self.replicates.max(1))
    }

    /// Build the scenario for the given sites.
    ///
    /// Each site's population is split into adults and offspring. Adults
    /// start uninfected; offspring at `seed_location` start with that site's
    /// `initial_infected` count in I.
    pub fn scenario(&self, sites: &Sites) -> Result<Scenario> {
        let options = self.model.options()?;
        let model = options.build()?;
        let scope = Scope::new(sites.ids().clone())?;
        let (adults, offspring) = split_populations(sites.totals(), self.adult_frac)?;
        let seed_size = sites
            .infected()
            .get(self.seed_location)
            .copied()
            .unwrap_or(0);
        let adult_compartment = match options.version() {
            ModelVersion::V1 => "R",
            ModelVersion::V2 | ModelVersion::V3 => "R_a",
        };

        ScenarioBuilder::new(model, scope, self.time_frame()?)
            .params(self.params())
            .stratum(
                OFFSPRING,
                offspring,
                Initializer::SingleLocation {
                    location: self.seed_location,
                    seed_size,
                },
            )
            .stratum(
                ADULT,
                adults,
                Initializer::NoInfection {
                    initial_compartment: adult_compartment.to_string(),
                },
            )
            .build()
    }
}

/// Configuration of the incidence tool (`swabs.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwabConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub by_region: bool,
    #[serde(flatten)]
    pub incidence: IncidenceOptions,
}

impl Default for SwabConfig {
    fn default() -> Self {
        SwabConfig {
            input: PathBuf::from("SwabData_SFE_total_copynumb_region.csv"),
            output: PathBuf::from("cumulative_incidence.csv"),
            by_region: false,
            incidence: IncidenceOptions::default(),
        }
    }
}

impl SwabConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("reading configuration from {}", path.display());
        SwabConfig::from_toml_str(&fs::read_to_string(path)?)
    }
}
