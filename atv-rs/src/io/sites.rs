use crate::{Count, Error, Result};
use getset::Getters;
use log::info;
use serde::{Deserialize, Serialize};
use std::{fs::File, io, path::Path};

/// One row of the site table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteRow {
    pub site_id: String,
    pub n_salamanders: Count,
    #[serde(default)]
    pub initial_infected: Count,
}

/// Site table: location ids with total population and initially infected
/// individuals, in file order.
#[derive(Debug, Clone, PartialEq, Default, Getters)]
#[getset(get = "pub")]
pub struct Sites {
    ids: Vec<String>,
    totals: Vec<Count>,
    infected: Vec<Count>,
}

impl Sites {
    pub fn from_rows(rows: impl IntoIterator<Item = SiteRow>) -> Self {
        let mut sites = Sites::default();
        for row in rows {
            sites.ids.push(row.site_id);
            sites.totals.push(row.n_salamanders);
            sites.infected.push(row.initial_infected);
        }
        sites
    }

    /// Read sites from CSV data with a header line. Any malformed row is an
    /// error.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let rows = rdr
            .deserialize()
            .collect::<std::result::Result<Vec<SiteRow>, csv::Error>>()?;
        if rows.is_empty() {
            return Err(Error::EmptyScope);
        }
        Ok(Sites::from_rows(rows))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let sites = Sites::from_reader(File::open(path)?)?;
        info!("loaded {} sites from {}", sites.len(), path.display());
        Ok(sites)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
