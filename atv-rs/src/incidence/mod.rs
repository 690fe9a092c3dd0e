//! Cumulative incidence of positive swab tests.
//!
//! Tests of one sample type are grouped by year (and optionally region). For
//! every distinct collection date the running number of positive tests is
//! divided by the number of tests taken over the whole year, giving a curve
//! that ends at the annual prevalence. Dates are moved to a common reference
//! year so that curves of different years can be overlaid.
use crate::{io::SwabRecord, Count, Real, Result};
use chrono::{Datelike, NaiveDate};
use getset::CopyGetters;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io,
    path::Path,
};

/// Selection and grouping choices for the incidence tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncidenceOptions {
    pub sample_type: String,
    pub excluded_years: Vec<i32>,
    pub reference_year: i32,
    /// Regions reported in region mode. Empty means every region present.
    pub regions: Vec<u32>,
}

impl Default for IncidenceOptions {
    fn default() -> Self {
        IncidenceOptions {
            sample_type: "S".to_string(),
            excluded_years: vec![2021],
            reference_year: 2020,
            regions: vec![1, 2, 3, 4],
        }
    }
}

/// Running counts at one collection date.
#[derive(Debug, Clone, PartialEq, CopyGetters, Serialize)]
#[getset(get_copy = "pub")]
pub struct CumulativePoint {
    region: Option<u32>,
    year: i32,
    date: NaiveDate,
    aligned_date: NaiveDate,
    cumulative_total: Count,
    cumulative_positive: Count,
    proportion_infected: Real,
}

/// Positive fraction, or 0 when there are no tests.
pub fn proportion(positive: Count, total: Count) -> Real {
    if total == 0 {
        0.0
    } else {
        positive as Real / total as Real
    }
}

/// Running sums of daily counts.
pub fn cumulate(daily: &[Count]) -> Vec<Count> {
    daily
        .iter()
        .scan(0, |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

/// Same day and month in another year. 29 February becomes 28 February when
/// the target year is not a leap year.
pub fn align_date(date: NaiveDate, year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, date.month(), 28))
        .unwrap_or(date)
}

/// Dated tests of the selected sample type.
pub fn select<'a>(records: &'a [SwabRecord], sample_type: &str) -> Vec<&'a SwabRecord> {
    let selected: Vec<_> = records
        .iter()
        .filter(|r| r.sample_type().as_deref() == Some(sample_type))
        .collect();
    let undated = selected.iter().filter(|r| r.collection_date().is_none()).count();
    if undated > 0 {
        warn!("ignoring {} '{}' tests without a valid date", undated, sample_type);
    }
    selected
        .into_iter()
        .filter(|r| r.collection_date().is_some())
        .collect()
}

/// Number of tests per calendar year.
pub fn tests_per_year(tests: &[&SwabRecord]) -> BTreeMap<i32, Count> {
    let mut totals = BTreeMap::new();
    for d in tests.iter().filter_map(|r| r.collection_date()) {
        *totals.entry(d.year()).or_insert(0) += 1;
    }
    totals
}

/// Cumulative points per year over all regions.
pub fn cumulative_by_year(records: &[SwabRecord], opts: &IncidenceOptions) -> Vec<CumulativePoint> {
    let tests = select(records, &opts.sample_type);
    let totals = tests_per_year(&tests);
    log_totals(&totals);
    series(&tests, None, &totals, opts)
}

/// Cumulative points per region and year. Denominators are still the yearly
/// totals over all regions.
pub fn cumulative_by_region(records: &[SwabRecord], opts: &IncidenceOptions) -> Vec<CumulativePoint> {
    let tests = select(records, &opts.sample_type);
    let totals = tests_per_year(&tests);
    log_totals(&totals);
    let regions: Vec<u32> = if opts.regions.is_empty() {
        tests
            .iter()
            .filter_map(|r| r.region())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    } else {
        opts.regions.clone()
    };

    let mut out = vec![];
    for region in regions {
        let in_region: Vec<&SwabRecord> = tests
            .iter()
            .copied()
            .filter(|r| r.region() == Some(region))
            .collect();
        out.extend(series(&in_region, Some(region), &totals, opts));
    }
    out
}

fn log_totals(totals: &BTreeMap<i32, Count>) {
    for (year, n) in totals {
        info!("{}: {} tests", year, n);
    }
}

fn series(
    tests: &[&SwabRecord],
    region: Option<u32>,
    totals: &BTreeMap<i32, Count>,
    opts: &IncidenceOptions,
) -> Vec<CumulativePoint> {
    // year -> date -> positives on that date
    let mut by_year: BTreeMap<i32, BTreeMap<NaiveDate, Count>> = BTreeMap::new();
    for r in tests {
        if let Some(date) = r.collection_date() {
            *by_year
                .entry(date.year())
                .or_default()
                .entry(date)
                .or_insert(0) += r.is_positive() as Count;
        }
    }

    let mut out = vec![];
    for (year, days) in by_year {
        if opts.excluded_years.contains(&year) {
            continue;
        }
        let total = totals.get(&year).copied().unwrap_or(0);
        let daily: Vec<Count> = days.values().copied().collect();
        for (date, positive) in days.keys().zip(cumulate(&daily)) {
            out.push(CumulativePoint {
                region,
                year,
                date: *date,
                aligned_date: align_date(*date, opts.reference_year),
                cumulative_total: total,
                cumulative_positive: positive,
                proportion_infected: proportion(positive, total),
            });
        }
    }
    out
}

/// Last point of every (region, year) group.
pub fn final_points(points: &[CumulativePoint]) -> Vec<CumulativePoint> {
    let mut last: BTreeMap<(Option<u32>, i32), &CumulativePoint> = BTreeMap::new();
    for p in points {
        last.insert((p.region, p.year), p);
    }
    last.into_iter().map(|(_, p)| p.clone()).collect()
}

/// Column names of [`CumulativePoint`] in CSV output.
const POINT_HEADER: [&str; 7] = [
    "region",
    "year",
    "date",
    "aligned_date",
    "cumulative_total",
    "cumulative_positive",
    "proportion_infected",
];

/// Write points as CSV. The header is written even when there are no points.
pub fn write_points<W: io::Write>(points: &[CumulativePoint], writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    if points.is_empty() {
        wtr.write_record(&POINT_HEADER)?;
    }
    for p in points {
        wtr.serialize(p)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn save_points(points: &[CumulativePoint], path: impl AsRef<Path>) -> Result<()> {
    write_points(points, File::create(path)?)
}

/// Text table of final statistics.
pub fn render_final_stats(points: &[CumulativePoint]) -> String {
    let mut out = format!(
        "{:>6} {:>6} {:>16} {:>19} {:>19}\n",
        "region", "year", "cumulative_total", "cumulative_positive", "proportion_infected"
    );
    for p in final_points(points) {
        let region = p.region.map_or("-".to_string(), |r| r.to_string());
        out.push_str(&format!(
            "{:>6} {:>6} {:>16} {:>19} {:>19.4}\n",
            region, p.year, p.cumulative_total, p.cumulative_positive, p.proportion_infected
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::read_swabs;
    use assert_approx_eq::assert_approx_eq;

    const SWABS: &str = "\
collection_date,CT,type,region
2019-05-01,30,S,1
2019-05-01,0,S,1
2019-05-02,,S,2
2019-05-03,25,S,2
2019-05-03,22,S,1
2019-05-03,28,T,1
2020-06-10,0,S,1
2020-06-11,33,S,3
2021-04-01,20,S,1
bad-date,20,S,1
";

    fn records() -> Vec<SwabRecord> {
        read_swabs(SWABS.as_bytes()).unwrap()
    }

    #[test]
    fn cumulates_daily_counts() {
        assert_eq!(cumulate(&[1, 0, 2]), vec![1, 1, 3]);
        assert!(cumulate(&[]).is_empty());
    }

    #[test]
    fn proportion_of_empty_total_is_zero() {
        assert_eq!(proportion(3, 0), 0.0);
        assert_approx_eq!(proportion(1, 4), 0.25);
    }

    #[test]
    fn aligns_dates_to_reference_year() {
        let d = NaiveDate::from_ymd_opt(2019, 8, 15).unwrap();
        assert_eq!(align_date(d, 2020), NaiveDate::from_ymd_opt(2020, 8, 15).unwrap());
        let leap = NaiveDate::from_ymd_opt(2020, 2, 29).unwrap();
        assert_eq!(align_date(leap, 2019), NaiveDate::from_ymd_opt(2019, 2, 28).unwrap());
    }

    #[test]
    fn by_year_uses_annual_denominator() {
        let recs = records();
        let tests = select(&recs, "S");
        let totals = tests_per_year(&tests);
        assert_eq!(totals.get(&2019), Some(&5));
        assert_eq!(totals.get(&2020), Some(&2));
        assert_eq!(totals.get(&2021), Some(&1));

        let points = cumulative_by_year(&recs, &IncidenceOptions::default());
        assert_eq!(points.len(), 5);
        assert!(points.iter().all(|p| p.year() != 2021));
        let pos: Vec<Count> = points.iter().map(|p| p.cumulative_positive()).collect();
        assert_eq!(pos, vec![1, 1, 3, 0, 1]);
        assert_approx_eq!(points[2].proportion_infected(), 3.0 / 5.0);
        assert_eq!(points[4].aligned_date(), NaiveDate::from_ymd_opt(2020, 6, 11).unwrap());

        let finals = final_points(&points);
        assert_eq!(finals.len(), 2);
        assert_approx_eq!(finals[1].proportion_infected(), 0.5);
    }

    #[test]
    fn by_region_keeps_global_denominator() {
        let points = cumulative_by_region(&records(), &IncidenceOptions::default());
        let region1: Vec<&CumulativePoint> =
            points.iter().filter(|p| p.region() == Some(1)).collect();
        assert_eq!(region1.len(), 3);
        assert_eq!(region1[1].cumulative_positive(), 2);
        assert_eq!(region1[1].cumulative_total(), 5);
        assert!(points.iter().all(|p| p.region() != Some(4)));

        let opts = IncidenceOptions {
            regions: vec![],
            ..Default::default()
        };
        let all = cumulative_by_region(&records(), &opts);
        assert_eq!(all.len(), points.len());
    }

    #[test]
    fn writes_csv_with_header() {
        let points = cumulative_by_year(&records(), &IncidenceOptions::default());
        let mut buf = vec![];
        write_points(&points, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("region,year,date,aligned_date,cumulative_total,cumulative_positive,proportion_infected")
        );
        assert_eq!(lines.next(), Some(",2019,2019-05-01,2020-05-01,5,1,0.2"));
        assert!(render_final_stats(&points).contains("2020"));
    }

    #[test]
    fn empty_output_keeps_header() {
        let mut buf = vec![];
        write_points(&[], &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "region,year,date,aligned_date,cumulative_total,cumulative_positive,proportion_infected\n"
        );
    }
}
