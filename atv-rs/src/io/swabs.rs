use crate::{Real, Result};
use chrono::{NaiveDate, NaiveDateTime};
use getset::{CopyGetters, Getters};
use log::{debug, info, warn};
use serde::Deserialize;
use std::{fs::File, io, path::Path};

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%m/%d/%y",
    "%Y/%m/%d",
    "%d-%b-%Y",
    "%Y%m%d",
];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M"];

/// Row as it appears in the file. Every column is optional text.
#[derive(Debug, Default, Deserialize)]
struct RawSwab {
    #[serde(default)]
    collection_date: Option<String>,
    #[serde(default, rename = "CT")]
    ct: Option<String>,
    #[serde(default, rename = "type")]
    sample_type: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

/// A swab test with unparsable values coerced to missing.
#[derive(Debug, Clone, PartialEq, Default, Getters, CopyGetters)]
pub struct SwabRecord {
    #[getset(get_copy = "pub")]
    collection_date: Option<NaiveDate>,
    #[getset(get_copy = "pub")]
    ct: Option<Real>,
    #[getset(get = "pub")]
    sample_type: Option<String>,
    #[getset(get_copy = "pub")]
    region: Option<u32>,
}

impl SwabRecord {
    pub fn new(
        collection_date: Option<NaiveDate>,
        ct: Option<Real>,
        sample_type: Option<&str>,
        region: Option<u32>,
    ) -> Self {
        SwabRecord {
            collection_date,
            ct,
            sample_type: sample_type.map(str::to_string),
            region,
        }
    }

    /// A test is positive when CT is present and greater than zero.
    pub fn is_positive(&self) -> bool {
        matches!(self.ct, Some(ct) if ct > 0.0)
    }

    fn from_raw(raw: RawSwab) -> Self {
        SwabRecord {
            collection_date: raw.collection_date.as_deref().and_then(parse_date),
            ct: raw.ct.as_deref().and_then(parse_number),
            sample_type: raw
                .sample_type
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            region: raw.region.as_deref().and_then(parse_region),
        }
    }
}

/// Parse a date in any of the common layouts found in field sheets.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}

fn parse_number(s: &str) -> Option<Real> {
    s.trim().parse::<Real>().ok().filter(|x| x.is_finite())
}

fn parse_region(s: &str) -> Option<u32> {
    let x = parse_number(s)?;
    if x >= 0.0 && x.fract() == 0.0 && x <= u32::MAX as Real {
        Some(x as u32)
    } else {
        None
    }
}

/// Read swab records from CSV data with a header line.
///
/// Columns other than `collection_date`, `CT`, `type` and `region` are
/// ignored and missing ones read as missing. Rows that cannot be read at all
/// are skipped and counted in a warning.
pub fn read_swabs<R: io::Read>(reader: R) -> Result<Vec<SwabRecord>> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut records = vec![];
    let mut skipped = 0;
    for (i, row) in rdr.deserialize::<RawSwab>().enumerate() {
        match row {
            Ok(raw) => records.push(SwabRecord::from_raw(raw)),
            Err(e) => {
                debug!("skipping swab row {}: {}", i + 1, e);
                skipped += 1;
            }
        }
    }
    if skipped > 0 {
        warn!("skipped {} malformed swab rows", skipped);
    }
    Ok(records)
}

pub fn load_swabs(path: impl AsRef<Path>) -> Result<Vec<SwabRecord>> {
    let path = path.as_ref();
    let records = read_swabs(File::open(path)?)?;
    info!("loaded {} swab records from {}", records.len(), path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_dates_leniently() {
        assert_eq!(parse_date("2019-06-03"), Some(date(2019, 6, 3)));
        assert_eq!(parse_date("6/3/2019"), Some(date(2019, 6, 3)));
        assert_eq!(parse_date("2019-06-03 10:30:00"), Some(date(2019, 6, 3)));
        assert_eq!(parse_date("03-Jun-2019"), Some(date(2019, 6, 3)));
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("2019-02-30"), None);
    }

    #[test]
    fn coerces_bad_values_to_missing() {
        let data = "\
sample_id,collection_date,CT,type,region,notes
a,2019-06-03,31.5,S,2,ok
b,bogus,NA,S,x,
c,2020-07-01,,T,3.0,
d,2020-07-02,0,S,,
";
        let recs = read_swabs(data.as_bytes()).unwrap();
        assert_eq!(recs.len(), 4);
        assert_eq!(
            recs[0],
            SwabRecord::new(Some(date(2019, 6, 3)), Some(31.5), Some("S"), Some(2))
        );
        assert!(recs[0].is_positive());
        assert_eq!(recs[1], SwabRecord::new(None, None, Some("S"), None));
        assert!(!recs[1].is_positive());
        assert_eq!(recs[2].region(), Some(3));
        assert_eq!(recs[2].sample_type().as_deref(), Some("T"));
        assert!(!recs[3].is_positive());
    }

    #[test]
    fn missing_columns_read_as_missing() {
        let data = "collection_date,type\n2020-01-05,S\n";
        let recs = read_swabs(data.as_bytes()).unwrap();
        assert_eq!(recs[0].ct(), None);
        assert_eq!(recs[0].region(), None);
        assert_eq!(recs[0].collection_date(), Some(date(2020, 1, 5)));
    }
}
