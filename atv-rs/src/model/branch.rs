use crate::{Error, Real, Result};
use getset::CopyGetters;
use serde::Serialize;

/// Slack allowed when checking that branch probabilities do not exceed 1.
const BRANCH_TOLERANCE: Real = 1e-12;

/// Fate of infected offspring at maturation.
///
/// An infected juvenile that matures either dies of disease, becomes a chronic
/// carrier adult or clears the infection. The first two probabilities are
/// configured; the clearance probability is whatever is left, and it is only
/// ever computed from a validated pair.
#[derive(Debug, Clone, Copy, PartialEq, CopyGetters, Serialize)]
#[getset(get_copy = "pub")]
pub struct MaturationBranch {
    p_chronic: Real,
    p_disease_death: Real,
}

impl MaturationBranch {
    /// Validate and create a new branch.
    ///
    /// Fails if any probability is outside [0, 1] or if they add up to more
    /// than 1.
    pub fn new(p_chronic: Real, p_disease_death: Real) -> Result<Self> {
        check_probability("p_chronic", p_chronic)?;
        check_probability("p_disease_death", p_disease_death)?;
        if p_chronic + p_disease_death > 1.0 + BRANCH_TOLERANCE {
            return Err(Error::BranchProbability {
                p_chronic,
                p_disease_death,
            });
        }
        Ok(MaturationBranch {
            p_chronic,
            p_disease_death,
        })
    }

    /// Two-way branch: chronic carrier or cleared.
    pub fn chronic_only(p_chronic: Real) -> Result<Self> {
        Self::new(p_chronic, 0.0)
    }

    /// Probability that a maturing infected juvenile clears the infection.
    pub fn p_clear(&self) -> Real {
        (1.0 - (self.p_chronic + self.p_disease_death)).max(0.0)
    }
}

impl Default for MaturationBranch {
    fn default() -> Self {
        MaturationBranch {
            p_chronic: 0.0,
            p_disease_death: 0.0,
        }
    }
}

pub(crate) fn check_probability(name: &'static str, value: Real) -> Result<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(Error::InvalidProbability { name, value })
    }
}
