use crate::{model::check_probability, Count, Error, Real, Result};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

/// Split a location's total population into (adults, offspring).
///
/// Adults are `floor(total * adult_frac)` and offspring the rest, so both
/// parts always add up to the total.
pub fn split_population(total: Count, adult_frac: Real) -> Result<(Count, Count)> {
    check_probability("adult_frac", adult_frac)?;
    let adults = ((total as Real * adult_frac).floor() as Count).min(total);
    Ok((adults, total - adults))
}

/// Split every entry of totals, returning (adults, offspring) vectors.
pub fn split_populations(totals: &[Count], adult_frac: Real) -> Result<(Vec<Count>, Vec<Count>)> {
    let mut adults = Vec::with_capacity(totals.len());
    let mut offspring = Vec::with_capacity(totals.len());
    for &n in totals {
        let (a, o) = split_population(n, adult_frac)?;
        adults.push(a);
        offspring.push(o);
    }
    Ok((adults, offspring))
}

/// How a stratum's per-location population is laid out over its compartments
/// at the start of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Initializer {
    /// Everyone starts in the named compartment.
    NoInfection { initial_compartment: String },
    /// Everyone starts in the first compartment except for seed_size
    /// individuals at one location, which start in the second.
    SingleLocation { location: usize, seed_size: Count },
    /// Like SingleLocation, with a seed at every location.
    Explicit { infected: Vec<Count> },
}

impl Initializer {
    /// Distribute population over compartments, returning a
    /// (location, compartment) array.
    pub fn apply(
        &self,
        stratum: &str,
        compartments: &[String],
        population: &[Count],
    ) -> Result<Array2<Count>> {
        let n = population.len();
        let mut out = Array2::zeros((n, compartments.len()));
        match self {
            Initializer::NoInfection {
                initial_compartment,
            } => {
                let c = compartments
                    .iter()
                    .position(|x| x == initial_compartment)
                    .ok_or_else(|| Error::UnknownCompartment {
                        stratum: stratum.to_string(),
                        compartment: initial_compartment.clone(),
                    })?;
                out.column_mut(c).assign(&ArrayView1::from(population));
            }
            Initializer::SingleLocation {
                location,
                seed_size,
            } => {
                if *location >= n {
                    return Err(Error::InvalidSeed(format!(
                        "location {} is outside a scope of {} locations",
                        location, n
                    )));
                }
                let mut seeds = vec![0; n];
                seeds[*location] = *seed_size;
                seed(stratum, compartments, population, &seeds, &mut out)?;
            }
            Initializer::Explicit { infected } => {
                if infected.len() != n {
                    return Err(Error::InvalidSeed(format!(
                        "{} seeds given for {} locations",
                        infected.len(),
                        n
                    )));
                }
                seed(stratum, compartments, population, infected, &mut out)?;
            }
        }
        Ok(out)
    }
}

fn seed(
    stratum: &str,
    compartments: &[String],
    population: &[Count],
    seeds: &[Count],
    out: &mut Array2<Count>,
) -> Result<()> {
    if compartments.len() < 2 {
        return Err(Error::InvalidSeed(format!(
            "stratum '{}' has no compartment to seed infections into",
            stratum
        )));
    }
    for (loc, (&pop, &k)) in population.iter().zip(seeds).enumerate() {
        if k > pop {
            return Err(Error::InvalidSeed(format!(
                "seed of {} exceeds the population of {} at location {}",
                k, pop, loc
            )));
        }
        out[(loc, 0)] = pop - k;
        out[(loc, 1)] = k;
    }
    Ok(())
}
