//! The offspring/adult salamander models.
//!
//! Three successive versions share the same offspring stratum:
//!
//! * `v1`: adults are a single compartment R; infected offspring mature into R.
//! * `v2`: adults are split into cleared (R_a) and chronic carriers (R_c);
//!   maturation of infected offspring branches on `p_chronic`.
//! * `v3`: maturation branches three ways: disease death, chronic carrier or
//!   clearance.
//!
//! Births are driven by adult population in all versions, with vertical
//! transmission deciding whether a newborn is susceptible or infected.
use super::{
    attr, pop, AttributeKind, CompartmentRef, Expr, MaturationBranch, Model, ModelBuilder, Node,
    Stratum, Symbol,
};
use crate::{
    params::{ParamKey, Params},
    Real, Result,
};
use getset::CopyGetters;
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

pub const OFFSPRING: &str = "offspring";
pub const ADULT: &str = "adult";

// Placeholder parameter values
const BETA: Real = 0.30;
const DEATH_RATE: Real = 1.0 / (365.0 * 3.0);
const MATURE_RATE: Real = 1.0 / 60.0;
const BIRTH_RATE: Real = 1.0 / 120.0;
const P_VERT: Real = 0.60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelVersion {
    V1,
    V2,
    V3,
}

impl Default for ModelVersion {
    fn default() -> Self {
        ModelVersion::V3
    }
}

impl Display for ModelVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelVersion::V1 => write!(f, "v1"),
            ModelVersion::V2 => write!(f, "v2"),
            ModelVersion::V3 => write!(f, "v3"),
        }
    }
}

/// Choices that select one concrete model.
#[derive(Debug, Clone, Copy, PartialEq, Default, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct ModelOptions {
    version: ModelVersion,
    branch: MaturationBranch,
    /// Let uninfected offspring mature directly into cleared adults. This
    /// extension is not part of any of the three versions and is off by
    /// default.
    mature_susceptible: bool,
}

impl ModelOptions {
    pub fn new(version: ModelVersion, branch: MaturationBranch) -> Self {
        ModelOptions {
            version,
            branch,
            mature_susceptible: false,
        }
    }

    pub fn with_mature_susceptible(mut self, value: bool) -> Self {
        self.mature_susceptible = value;
        self
    }

    /// Build the model.
    pub fn build(&self) -> Result<Model> {
        build_model(self)
    }
}

/// Offspring: susceptible and infected juveniles that do not move.
pub fn offspring_stratum() -> Stratum {
    let st = Stratum::new(OFFSPRING)
        .compartment("S", "susceptible offspring")
        .compartment("I", "infected offspring")
        .requires("beta", AttributeKind::Rate, "offspring transmission rate")
        .requires("death_rate", AttributeKind::Rate, "offspring mortality rate");

    let (s, i) = (st.pop("S"), st.pop("I"));
    let (beta, mu) = (st.attr("beta"), st.attr("death_rate"));
    let (ns, ni) = (st.node("S"), st.node("I"));

    // density dependent transmission inside the offspring pool
    let n = Expr::constant(1.0).max(s.clone() + i.clone());
    let transmission = beta * s.clone() * i.clone() / n;

    st.edge(ns.clone(), ni.clone(), transmission)
        .edge(ns, Node::Death, mu.clone() * s)
        .edge(ni, Node::Death, mu * i)
}

/// Adults: infection status is fixed at maturation, only deaths happen here.
pub fn adult_stratum(version: ModelVersion) -> Stratum {
    let mut st = Stratum::new(ADULT).mobile(true);
    st = match version {
        ModelVersion::V1 => st.compartment("R", "adult salamanders"),
        ModelVersion::V2 | ModelVersion::V3 => st
            .compartment("R_a", "cleared adults")
            .compartment("R_c", "chronic carrier adults"),
    };
    st = st.requires("death_rate", AttributeKind::Rate, "adult mortality rate");

    let names: Vec<String> = st.compartments().iter().map(|c| c.name().clone()).collect();
    for name in names {
        let rate = st.attr("death_rate") * st.pop(&name);
        let from = st.node(&name);
        st = st.edge(from, Node::Death, rate);
    }
    st
}

fn node(stratum: &str, compartment: &str) -> Node<CompartmentRef> {
    Node::Compartment(CompartmentRef::new(stratum, compartment))
}

/// Build one of the salamander models.
pub fn build_model(options: &ModelOptions) -> Result<Model> {
    let version = options.version();
    let mut builder = ModelBuilder::new()
        .stratum(offspring_stratum())
        .stratum(adult_stratum(version))
        .meta_requires("mature_rate", AttributeKind::Rate, "offspring maturation rate")
        .meta_requires("birth_rate", AttributeKind::Rate, "births per adult per day")
        .meta_requires("p_vert", AttributeKind::Probability, "vertical transmission probability");

    let mature: Expr<Symbol> = attr(ParamKey::meta("mature_rate"));
    let birth: Expr<Symbol> = attr(ParamKey::meta("birth_rate"));
    let p_vert: Expr<Symbol> = attr(ParamKey::meta("p_vert"));
    let i = pop(OFFSPRING, "I");
    let (s_node, i_node) = (node(OFFSPRING, "S"), node(OFFSPRING, "I"));

    let (adults, cleared) = match version {
        ModelVersion::V1 => {
            builder = builder.meta_edge(
                i_node.clone(),
                node(ADULT, "R"),
                mature.clone() * i.clone(),
            );
            (pop(ADULT, "R"), node(ADULT, "R"))
        }
        ModelVersion::V2 => {
            if options.branch().p_disease_death() > 0.0 {
                warn!(
                    "model v2 has no disease death at maturation; ignoring p_disease_death = {}",
                    options.branch().p_disease_death()
                );
            }
            let branch = MaturationBranch::chronic_only(options.branch().p_chronic())?;
            builder = builder
                .meta_edge(
                    i_node.clone(),
                    node(ADULT, "R_c"),
                    branch.p_chronic() * mature.clone() * i.clone(),
                )
                .meta_edge(
                    i_node.clone(),
                    node(ADULT, "R_a"),
                    branch.p_clear() * mature.clone() * i.clone(),
                );
            (adult_total(), node(ADULT, "R_a"))
        }
        ModelVersion::V3 => {
            let branch = options.branch();
            builder = builder
                .meta_edge(
                    i_node.clone(),
                    Node::Death,
                    branch.p_disease_death() * mature.clone() * i.clone(),
                )
                .meta_edge(
                    i_node.clone(),
                    node(ADULT, "R_c"),
                    branch.p_chronic() * mature.clone() * i.clone(),
                )
                .meta_edge(
                    i_node.clone(),
                    node(ADULT, "R_a"),
                    branch.p_clear() * mature.clone() * i.clone(),
                );
            (adult_total(), node(ADULT, "R_a"))
        }
    };

    if options.mature_susceptible() {
        builder = builder.meta_edge(
            s_node.clone(),
            cleared,
            mature.clone() * pop(OFFSPRING, "S"),
        );
    }

    // births split into S and I offspring via vertical transmission
    builder = builder
        .meta_edge(
            Node::Birth,
            s_node,
            (1.0 - p_vert.clone()) * birth.clone() * adults.clone(),
        )
        .meta_edge(Node::Birth, i_node, p_vert * birth * adults);

    builder.build()
}

/// Adult population driving births, floored at 1.
fn adult_total() -> Expr<Symbol> {
    Expr::constant(1.0).max(pop(ADULT, "R_a") + pop(ADULT, "R_c"))
}

/// Placeholder parameter values used when a configuration leaves them out.
pub fn default_params() -> Params {
    let mut params = Params::new();
    params
        .set(ParamKey::stratum(OFFSPRING, "beta"), BETA)
        .set(ParamKey::stratum(OFFSPRING, "death_rate"), DEATH_RATE)
        .set(ParamKey::stratum(ADULT, "death_rate"), DEATH_RATE)
        .set(ParamKey::meta("mature_rate"), MATURE_RATE)
        .set(ParamKey::meta("birth_rate"), BIRTH_RATE)
        .set(ParamKey::meta("p_vert"), P_VERT);
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::AttributeValue;
    use assert_approx_eq::assert_approx_eq;

    fn attributes(model: &Model, params: &Params) -> Vec<Real> {
        model
            .attributes()
            .iter()
            .map(|a| match params.get(a.key()) {
                Some(AttributeValue::Scalar(x)) => *x,
                other => panic!("unexpected {:?}", other),
            })
            .collect()
    }

    fn v3() -> Model {
        ModelOptions::new(ModelVersion::V3, MaturationBranch::new(0.30, 0.20).unwrap())
            .build()
            .unwrap()
    }

    fn rate(model: &Model, label: &str, pops: &[Real], attrs: &[Real]) -> Real {
        let k = model
            .transition_labels()
            .iter()
            .position(|l| l == label)
            .unwrap_or_else(|| panic!("no transition {}", label));
        model.transitions()[k].eval(pops, attrs)
    }

    #[test]
    fn versions_declare_expected_compartments() {
        let labels = |v| {
            ModelOptions::new(v, MaturationBranch::default())
                .build()
                .unwrap()
                .compartment_labels()
        };
        assert_eq!(labels(ModelVersion::V1), vec!["S_offspring", "I_offspring", "R_adult"]);
        assert_eq!(
            labels(ModelVersion::V3),
            vec!["S_offspring", "I_offspring", "R_a_adult", "R_c_adult"]
        );
    }

    #[test]
    fn transmission_vanishes_without_susceptibles_or_infected() {
        let model = v3();
        let attrs = attributes(&model, &default_params());
        assert_eq!(rate(&model, "S_offspring->I_offspring", &[0.0, 5.0, 10.0, 0.0], &attrs), 0.0);
        assert_eq!(rate(&model, "S_offspring->I_offspring", &[5.0, 0.0, 10.0, 0.0], &attrs), 0.0);

        let zero = rate(&model, "S_offspring->I_offspring", &[0.0, 0.0, 0.0, 0.0], &attrs);
        assert!(zero.is_finite());
        assert_eq!(zero, 0.0);

        // beta * S * I / (S + I)
        let r = rate(&model, "S_offspring->I_offspring", &[3.0, 1.0, 0.0, 0.0], &attrs);
        assert_approx_eq!(r, 0.30 * 3.0 / 4.0);
    }

    #[test]
    fn birth_population_is_floored_at_one() {
        let model = v3();
        let attrs = attributes(&model, &default_params());
        let r = rate(&model, "BIRTH->S_offspring", &[0.0, 0.0, 0.0, 0.0], &attrs);
        assert_approx_eq!(r, (1.0 - P_VERT) * BIRTH_RATE);
        let r = rate(&model, "BIRTH->I_offspring", &[0.0, 0.0, 3.0, 2.0], &attrs);
        assert_approx_eq!(r, P_VERT * BIRTH_RATE * 5.0);
    }

    #[test]
    fn v1_births_scale_with_adults_without_floor() {
        let model = ModelOptions::new(ModelVersion::V1, MaturationBranch::default())
            .build()
            .unwrap();
        let attrs = attributes(&model, &default_params());
        // S, I, R
        assert_eq!(rate(&model, "BIRTH->S_offspring", &[4.0, 2.0, 0.0], &attrs), 0.0);
        assert_eq!(rate(&model, "BIRTH->I_offspring", &[4.0, 2.0, 0.0], &attrs), 0.0);
        let r = rate(&model, "BIRTH->S_offspring", &[0.0, 0.0, 10.0], &attrs);
        assert_approx_eq!(r, (1.0 - P_VERT) * BIRTH_RATE * 10.0);
        let r = rate(&model, "BIRTH->I_offspring", &[0.0, 0.0, 10.0], &attrs);
        assert_approx_eq!(r, P_VERT * BIRTH_RATE * 10.0);

        let r = rate(&model, "I_offspring->R_adult", &[0.0, 12.0, 0.0], &attrs);
        assert_approx_eq!(r, MATURE_RATE * 12.0);
        assert!(!model.transition_labels().iter().any(|l| l == "S_offspring->R_adult"));
    }

    #[test]
    fn v1_susceptible_maturation_targets_adults() {
        let model = ModelOptions::new(ModelVersion::V1, MaturationBranch::default())
            .with_mature_susceptible(true)
            .build()
            .unwrap();
        let attrs = attributes(&model, &default_params());
        let r = rate(&model, "S_offspring->R_adult", &[9.0, 0.0, 0.0], &attrs);
        assert_approx_eq!(r, MATURE_RATE * 9.0);
    }

    #[test]
    fn v2_splits_maturation_on_p_chronic() {
        let model = ModelOptions::new(ModelVersion::V2, MaturationBranch::chronic_only(0.30).unwrap())
            .build()
            .unwrap();
        let attrs = attributes(&model, &default_params());
        // S, I, R_a, R_c
        let pops = [0.0, 12.0, 0.0, 0.0];
        let chronic = rate(&model, "I_offspring->R_c_adult", &pops, &attrs);
        let clear = rate(&model, "I_offspring->R_a_adult", &pops, &attrs);
        assert_approx_eq!(chronic, 0.30 * MATURE_RATE * 12.0);
        assert_approx_eq!(clear, 0.70 * MATURE_RATE * 12.0);
        let deaths = model
            .transition_labels()
            .iter()
            .filter(|l| l.as_str() == "I_offspring->DEATH")
            .count();
        assert_eq!(deaths, 1, "only natural death leaves I in v2");
        let r = rate(&model, "I_offspring->DEATH", &pops, &attrs);
        assert_approx_eq!(r, DEATH_RATE * 12.0);
    }

    #[test]
    fn v2_births_are_floored_at_one() {
        let model = ModelOptions::new(ModelVersion::V2, MaturationBranch::chronic_only(0.30).unwrap())
            .build()
            .unwrap();
        let attrs = attributes(&model, &default_params());
        let r = rate(&model, "BIRTH->I_offspring", &[0.0, 0.0, 0.0, 0.0], &attrs);
        assert_approx_eq!(r, P_VERT * BIRTH_RATE);
        let r = rate(&model, "BIRTH->S_offspring", &[0.0, 0.0, 4.0, 3.0], &attrs);
        assert_approx_eq!(r, (1.0 - P_VERT) * BIRTH_RATE * 7.0);
    }

    #[test]
    fn maturation_branches_add_up() {
        let model = v3();
        let attrs = attributes(&model, &default_params());
        let pops = [0.0, 12.0, 0.0, 0.0];
        let death = rate(&model, "I_offspring->DEATH", &pops, &attrs);
        let chronic = rate(&model, "I_offspring->R_c_adult", &pops, &attrs);
        let clear = rate(&model, "I_offspring->R_a_adult", &pops, &attrs);
        assert_approx_eq!(death, 0.20 * MATURE_RATE * 12.0);
        assert_approx_eq!(chronic, 0.30 * MATURE_RATE * 12.0);
        assert_approx_eq!(clear, 0.50 * MATURE_RATE * 12.0);
        assert_approx_eq!(death + chronic + clear, MATURE_RATE * 12.0);
    }

    #[test]
    fn rates_are_finite_and_non_negative() {
        for version in [ModelVersion::V1, ModelVersion::V2, ModelVersion::V3].iter() {
            let model = ModelOptions::new(*version, MaturationBranch::new(0.3, 0.2).unwrap())
                .with_mature_susceptible(true)
                .build()
                .unwrap();
            let attrs = attributes(&model, &default_params());
            let grid = [0.0, 1.0, 2.0, 7.0, 150.0, 1e6];
            let n = model.n_compartments();
            let mut pops = vec![0.0; n];
            for k in 0..grid.len().pow(n as u32) {
                let mut rest = k;
                for p in pops.iter_mut() {
                    *p = grid[rest % grid.len()];
                    rest /= grid.len();
                }
                for (label, r) in model.transition_labels().iter().zip(model.rates(&pops, &attrs)) {
                    assert!(r.is_finite() && r >= 0.0, "{} = {} at {:?}", label, r, pops);
                }
            }
        }
    }

    #[test]
    fn susceptible_maturation_is_opt_in() {
        let model = v3();
        assert!(!model.transition_labels().contains(&"S_offspring->R_a_adult".to_string()));

        let model = ModelOptions::new(ModelVersion::V3, MaturationBranch::default())
            .with_mature_susceptible(true)
            .build()
            .unwrap();
        assert!(model.transition_labels().contains(&"S_offspring->R_a_adult".to_string()));
    }
}
