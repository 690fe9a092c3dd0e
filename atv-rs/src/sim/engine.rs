use super::{Output, Reporter, Scenario};
use crate::{
    model::{Model, Node},
    utils::{binomial, exit_probability, poisson},
    Count, Error, Real, Result, Time,
};
use log::{debug, info};
use ndarray::prelude::*;
use rand::Rng;

/// Something that can run a [`Scenario`] forward in time.
///
/// Randomness is always injected, so a simulator seeded with the same value
/// reproduces the same output.
pub trait Simulator {
    /// Run scenario, calling reporter at the end of every day.
    fn run_with<R, P>(&self, scenario: &Scenario, rng: &mut R, reporter: &mut P) -> Result<Output>
    where
        R: Rng,
        P: Reporter;

    fn run<R: Rng>(&self, scenario: &Scenario, rng: &mut R) -> Result<Output> {
        self.run_with(scenario, rng, &mut ())
    }
}

/// Daily chain-binomial stepper.
///
/// For each location, rates are evaluated on the populations at the start of
/// the day. Each compartment loses `Binomial(n, 1 - exp(-h))` individuals with
/// `h` the summed rate of its outgoing transitions divided by `n`, and those
/// leavers are split among the transitions by sequential binomial draws in
/// proportion to their rates. Births are Poisson with the birth rate as mean.
/// Locations are independent; nobody moves between them.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChainBinomial;

impl Simulator for ChainBinomial {
    fn run_with<R, P>(&self, scenario: &Scenario, rng: &mut R, reporter: &mut P) -> Result<Output>
    where
        R: Rng,
        P: Reporter,
    {
        let model = scenario.model();
        let tf = scenario.time_frame();
        let (n_loc, n_comp) = scenario.initial().dim();
        info!(
            "running {} days over {} locations ({} compartments, {} transitions)",
            tf.days(),
            n_loc,
            n_comp,
            model.n_transitions()
        );

        let mut output = Output::new(scenario);
        let mut state = scenario.initial().clone();
        let mut events = Array2::<Count>::zeros((n_loc, model.n_transitions()));
        let mut pops = vec![0.0; n_comp];
        let mut rates = Vec::with_capacity(model.n_transitions());

        for day in 0..tf.duration_days() {
            events.fill(0);
            for loc in 0..n_loc {
                for (p, &n) in pops.iter_mut().zip(state.row(loc).iter()) {
                    *p = n as Real;
                }
                let attrs = scenario.params().at(day as usize, loc).to_vec();
                model.rates_into(&pops, &attrs, &mut rates);
                check_rates(model, &rates, loc, day)?;
                let counts = state.row(loc).to_vec();
                sample_events(model, &counts, &rates, rng, events.row_mut(loc))?;
            }
            apply_events(model, &mut state, &events);
            debug!(
                "day {}: {} individuals, {} events",
                day,
                state.sum(),
                events.sum()
            );
            output.record(day, &state, &events);
            reporter.process(day, &state, &events);
        }

        info!("finished at {} with {} individuals", tf.end(), state.sum());
        Ok(output)
    }
}

fn check_rates(model: &Model, rates: &[Real], location: usize, day: Time) -> Result<()> {
    for (t, &value) in model.transitions().iter().zip(rates) {
        if !value.is_finite() || value < 0.0 {
            return Err(Error::InvalidRate {
                label: t.label().clone(),
                location,
                day,
                value,
            });
        }
    }
    Ok(())
}

/// Draw the number of occurrences of every transition at one location.
fn sample_events<R: Rng>(
    model: &Model,
    counts: &[Count],
    rates: &[Real],
    rng: &mut R,
    mut out: ArrayViewMut1<Count>,
) -> Result<()> {
    for (c, outflows) in model.outflows().iter().enumerate() {
        let n = counts[c];
        let total: Real = outflows.iter().map(|&k| rates[k]).sum();
        if n == 0 || total <= 0.0 {
            continue;
        }
        let mut left = binomial(n, exit_probability(total, n), rng)?;
        let mut remaining_rate = total;
        for (i, &k) in outflows.iter().enumerate() {
            if left == 0 {
                break;
            }
            let x = if i + 1 == outflows.len() || remaining_rate <= 0.0 {
                left
            } else {
                binomial(left, (rates[k] / remaining_rate).min(1.0), rng)?
            };
            out[k] = x;
            left -= x;
            remaining_rate -= rates[k];
        }
    }
    for &k in model.births() {
        out[k] = poisson(rates[k], rng)?;
    }
    Ok(())
}

fn apply_events(model: &Model, state: &mut Array2<Count>, events: &Array2<Count>) {
    for (loc, row) in events.outer_iter().enumerate() {
        for (t, &x) in model.transitions().iter().zip(row.iter()) {
            if x == 0 {
                continue;
            }
            if let Node::Compartment(i) = *t.from() {
                state[(loc, i)] -= x;
            }
            if let Node::Compartment(j) = *t.to() {
                state[(loc, j)] += x;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{default_params, AttributeKind, ModelBuilder, ModelVersion, Stratum};
    use crate::params::{ParamKey, Params};
    use crate::sim::{test_scenario, test_scenario_with, Initializer, ScenarioBuilder, Scope, TimeFrame};
    use chrono::NaiveDate;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn seeded_runs_are_reproducible() {
        let sc = test_scenario(ModelVersion::V3, 60);
        let a = ChainBinomial.run(&sc, &mut SmallRng::seed_from_u64(5)).unwrap();
        let b = ChainBinomial.run(&sc, &mut SmallRng::seed_from_u64(5)).unwrap();
        assert_eq!(a.compartments(), b.compartments());
        assert_eq!(a.events(), b.events());
        assert_eq!(a.days(), 60);
    }

    #[test]
    fn counts_balance_with_events() {
        for &version in [ModelVersion::V1, ModelVersion::V2, ModelVersion::V3].iter() {
            let sc = test_scenario(version, 100);
            let out = ChainBinomial.run(&sc, &mut SmallRng::seed_from_u64(11)).unwrap();
            let model = sc.model();
            let mut expected = sc.initial().mapv(|x| x as i64);
            for day in 0..out.days() {
                for loc in 0..sc.scope().len() {
                    for (k, t) in model.transitions().iter().enumerate() {
                        let x = out.events()[(day, loc, k)] as i64;
                        if let Node::Compartment(i) = *t.from() {
                            expected[(loc, i)] -= x;
                        }
                        if let Node::Compartment(j) = *t.to() {
                            expected[(loc, j)] += x;
                        }
                    }
                }
                let found = out.compartments().index_axis(Axis(0), day).mapv(|x| x as i64);
                assert_eq!(found, expected);
            }
        }
    }

    #[test]
    fn infection_stays_where_seeded_without_vertical_transmission() {
        let mut params = default_params();
        params.set(ParamKey::meta("p_vert"), 0.0);
        let sc = test_scenario_with(ModelVersion::V3, 30, params);
        let out = ChainBinomial.run(&sc, &mut SmallRng::seed_from_u64(3)).unwrap();
        let infected = out.compartment_series("I_offspring").unwrap();
        // nobody moves between locations
        assert!(infected.column(0).iter().all(|&x| x == 0));
        assert!(infected.column(1).iter().all(|&x| x == 0));
    }

    #[test]
    fn reporter_sees_every_day() {
        let sc = test_scenario(ModelVersion::V2, 15);
        let mut days = vec![];
        let mut reporter = |day: Time, _: &Array2<Count>, _: &Array2<Count>| days.push(day);
        ChainBinomial
            .run_with(&sc, &mut SmallRng::seed_from_u64(1), &mut reporter)
            .unwrap();
        assert_eq!(days, (0..15).collect::<Vec<_>>());
    }

    #[test]
    fn negative_rate_is_fatal() {
        let st = Stratum::new("x")
            .compartment("A", "")
            .compartment("B", "")
            .requires("k", AttributeKind::Probability, "");
        let (a, b) = (st.node("A"), st.node("B"));
        let rate = (st.attr("k") - 1.0) * st.pop("A");
        let model = ModelBuilder::new().stratum(st.edge(a, b, rate)).build().unwrap();

        let mut params = Params::new();
        params.set(ParamKey::stratum("x", "k"), 0.5);
        let sc = ScenarioBuilder::new(
            model,
            Scope::new(vec!["p".into()]).unwrap(),
            TimeFrame::of(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(), 3).unwrap(),
        )
        .params(params)
        .stratum(
            "x",
            vec![10],
            Initializer::NoInfection {
                initial_compartment: "A".into(),
            },
        )
        .build()
        .unwrap();

        let err = ChainBinomial
            .run(&sc, &mut SmallRng::seed_from_u64(1))
            .unwrap_err();
        match err {
            Error::InvalidRate { label, day, .. } => {
                assert_eq!(label, "A_x->B_x");
                assert_eq!(day, 0);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }
}
