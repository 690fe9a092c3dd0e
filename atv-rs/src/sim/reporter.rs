use crate::{Count, Time};
use log::info;
use ndarray::prelude::*;

pub type ReporterList = Vec<(usize, Box<dyn Reporter>)>;

/// Trait that implements a method that inspects the simulation state after
/// each day and performs some action like collecting statistics, logging
/// progress, etc.
///
/// Closures taking `(day, state, events)` can be used as reporters. The state
/// is indexed by (location, compartment) and events by (location, transition).
pub trait Reporter {
    fn process(&mut self, day: Time, state: &Array2<Count>, events: &Array2<Count>);
}

/////////////////////////////////////////////////////////////////////////////
// Reporter instances
/////////////////////////////////////////////////////////////////////////////

impl<F> Reporter for F
where
    F: FnMut(Time, &Array2<Count>, &Array2<Count>),
{
    fn process(&mut self, day: Time, state: &Array2<Count>, events: &Array2<Count>) {
        self(day, state, events)
    }
}

impl Reporter for () {
    fn process(&mut self, _day: Time, _state: &Array2<Count>, _events: &Array2<Count>) {}
}

impl<R1, R2> Reporter for (R1, R2)
where
    R1: Reporter,
    R2: Reporter,
{
    fn process(&mut self, day: Time, state: &Array2<Count>, events: &Array2<Count>) {
        self.0.process(day, state, events);
        self.1.process(day, state, events);
    }
}

impl<R1, R2, R3> Reporter for (R1, R2, R3)
where
    R1: Reporter,
    R2: Reporter,
    R3: Reporter,
{
    fn process(&mut self, day: Time, state: &Array2<Count>, events: &Array2<Count>) {
        self.0.process(day, state, events);
        self.1.process(day, state, events);
        self.2.process(day, state, events);
    }
}

impl Reporter for ReporterList {
    fn process(&mut self, day: Time, state: &Array2<Count>, events: &Array2<Count>) {
        for (every, r) in self.iter_mut() {
            if *every > 0 && day as usize % *every == 0 {
                r.process(day, state, events);
            }
        }
    }
}

/// Logs compartment totals over all locations every few days.
#[derive(Debug, Clone)]
pub struct LogReporter {
    every: Time,
    labels: Vec<String>,
}

impl LogReporter {
    pub fn new(every: Time, labels: Vec<String>) -> Self {
        LogReporter {
            every: every.max(1),
            labels,
        }
    }
}

impl Reporter for LogReporter {
    fn process(&mut self, day: Time, state: &Array2<Count>, _events: &Array2<Count>) {
        if day % self.every != 0 {
            return;
        }
        let totals = state.sum_axis(Axis(0));
        let line = self
            .labels
            .iter()
            .zip(totals.iter())
            .map(|(l, n)| format!("{}={}", l, n))
            .collect::<Vec<_>>()
            .join(" ");
        info!("day {:>4}: {}", day, line);
    }
}
