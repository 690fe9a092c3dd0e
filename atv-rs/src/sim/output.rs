use super::{Scenario, TimeFrame};
use crate::{
    utils::{PointStatsAcc, Stats},
    Count, Result, Time,
};
use getset::Getters;
use ndarray::{prelude::*, s};
use std::{fs::File, io, path::Path};

/// Daily record of one simulation run.
#[derive(Debug, Clone, PartialEq, Getters)]
#[getset(get = "pub")]
pub struct Output {
    compartment_labels: Vec<String>,
    transition_labels: Vec<String>,
    location_ids: Vec<String>,
    time_frame: TimeFrame,
    /// State before the first day, indexed by (location, compartment).
    initial: Array2<Count>,
    /// End-of-day counts, indexed by (day, location, compartment).
    compartments: Array3<Count>,
    /// Events that happened during each day, indexed by
    /// (day, location, transition).
    events: Array3<Count>,
}

impl Output {
    /// Empty output sized for scenario.
    pub fn new(scenario: &Scenario) -> Self {
        let model = scenario.model();
        let days = scenario.time_frame().days();
        let n_loc = scenario.scope().len();
        Output {
            compartment_labels: model.compartment_labels(),
            transition_labels: model.transition_labels(),
            location_ids: scenario.scope().ids().clone(),
            time_frame: *scenario.time_frame(),
            initial: scenario.initial().clone(),
            compartments: Array3::zeros((days, n_loc, model.n_compartments())),
            events: Array3::zeros((days, n_loc, model.n_transitions())),
        }
    }

    /// Store the state at the end of day and the events that led to it.
    pub fn record(&mut self, day: Time, state: &Array2<Count>, events: &Array2<Count>) {
        let t = day as usize;
        self.compartments.slice_mut(s![t, .., ..]).assign(state);
        self.events.slice_mut(s![t, .., ..]).assign(events);
    }

    pub fn days(&self) -> usize {
        self.compartments.dim().0
    }

    /// Compartment totals over all locations at the end of day.
    pub fn totals(&self, day: usize) -> Array1<Count> {
        self.compartments
            .index_axis(Axis(0), day)
            .sum_axis(Axis(0))
    }

    /// Compartment totals over all locations at the end of the run.
    pub fn final_totals(&self) -> Array1<Count> {
        match self.days() {
            0 => self.initial.sum_axis(Axis(0)),
            n => self.totals(n - 1),
        }
    }

    /// Daily counts of one compartment, indexed by (day, location).
    pub fn compartment_series(&self, label: &str) -> Option<Array2<Count>> {
        let c = self.compartment_labels.iter().position(|l| l == label)?;
        Some(self.compartments.slice(s![.., .., c]).to_owned())
    }

    /// Write one row per day and location with compartment counts followed
    /// by event counts.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec!["day".to_string(), "date".into(), "location".into()];
        header.extend(self.compartment_labels.iter().cloned());
        header.extend(self.transition_labels.iter().map(|l| format!("events:{}", l)));
        wtr.write_record(&header)?;

        for t in 0..self.days() {
            let date = self.time_frame.date(t as Time).to_string();
            for (n, id) in self.location_ids.iter().enumerate() {
                let mut row = vec![t.to_string(), date.clone(), id.clone()];
                row.extend(self.compartments.slice(s![t, n, ..]).iter().map(|x| x.to_string()));
                row.extend(self.events.slice(s![t, n, ..]).iter().map(|x| x.to_string()));
                wtr.write_record(&row)?;
            }
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn save_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        self.write_csv(File::create(path)?)
    }

    /// Return a CSV string with the content of write_csv.
    pub fn render_csv(&self) -> Result<String> {
        let mut buf = vec![];
        self.write_csv(&mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Summary of every column over all days and locations: sum, mean, std,
    /// min and max.
    pub fn column_report(&self) -> String {
        let mut out = String::new();
        let columns = self
            .compartment_labels
            .iter()
            .enumerate()
            .map(|(c, l)| (l.clone(), self.compartments.slice(s![.., .., c])))
            .chain(
                self.transition_labels
                    .iter()
                    .enumerate()
                    .map(|(k, l)| (format!("events:{}", l), self.events.slice(s![.., .., k]))),
            );
        for (label, col) in columns {
            let mut acc = PointStatsAcc::new();
            acc.add_many(col.iter().map(|&x| x as f64));
            out.push_str(&format!(
                "{:<36} sum={:<10} {}\n",
                label,
                acc.total(),
                acc.stats()
            ));
        }
        out
    }
}
