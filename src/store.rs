use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::{RawSaleRow, RecordError, SaleRecord, ZipCode};

/// The location of the published dataset
pub const DEFAULT_SOURCE: &str = "https://raw.githubusercontent.com/wulannw/NYCdataset/main/NYCTeam10.json";

/// Possible errors to occur while loading the dataset
///
/// All of these are fatal, there is nothing to show without data.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to fetch the dataset")]
    Http(#[from] reqwest::Error),
    #[error("Failed to read the dataset")]
    Io(#[from] std::io::Error),
    #[error("The dataset is not a JSON object with a `Sheet1` array")]
    Json(#[from] serde_json::Error),
    #[error("Row {row} of the dataset is malformed")]
    Record {
        row: usize,
        #[source]
        source: RecordError,
    },
}

/// How to deal with rows that cannot be turned into a [`SaleRecord`]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RowPolicy {
    /// Drop the row and keep loading
    #[default]
    Skip,
    /// Abort loading
    Strict,
}

/// Statistics of a single load
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// The number of rows in the source
    pub rows: usize,
    /// The number of rows that were dropped, together with the reason
    pub rejected: Vec<(usize, RecordError)>,
}

#[derive(serde::Deserialize)]
struct Sheet {
    #[serde(rename = "Sheet1")]
    rows: Vec<RawSaleRow>,
}

/// The full, parsed dataset
///
/// The store is loaded once and never changes afterwards. Record order is
/// the order of the source.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<SaleRecord>,
    stats: LoadStats,
}

impl RecordStore {
    /// Creates a store from already parsed records
    pub fn new(records: Vec<SaleRecord>) -> Self {
        Self {
            stats: LoadStats {
                rows: records.len(),
                rejected: Vec::new(),
            },
            records,
        }
    }

    /// Loads the dataset from either an `http(s)://` URL or a local file
    pub fn load(source: &str, policy: RowPolicy) -> Result<Self, LoadError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::fetch(source, policy)
        } else {
            Self::from_path(source, policy)
        }
    }

    /// Fetches the dataset with a single GET request
    pub fn fetch(url: &str, policy: RowPolicy) -> Result<Self, LoadError> {
        tracing::info!(url, "fetching dataset");
        let body = reqwest::blocking::get(url)?
            .error_for_status()?
            .text()?;

        Self::from_json(&body, policy)
    }

    pub fn from_path(path: impl AsRef<Path>, policy: RowPolicy) -> Result<Self, LoadError> {
        tracing::info!(path = %path.as_ref().display(), "reading dataset");
        let file = std::fs::File::open(path)?;

        Self::from_reader(std::io::BufReader::new(file), policy)
    }

    pub fn from_reader(mut reader: impl Read, policy: RowPolicy) -> Result<Self, LoadError> {
        let mut json = String::new();
        reader.read_to_string(&mut json)?;

        Self::from_json(&json, policy)
    }

    /// Parses the `{"Sheet1": [...]}` document
    pub fn from_json(json: &str, policy: RowPolicy) -> Result<Self, LoadError> {
        let sheet: Sheet = serde_json::from_str(json)?;
        let mut stats = LoadStats {
            rows: sheet.rows.len(),
            rejected: Vec::new(),
        };
        let mut records = Vec::with_capacity(sheet.rows.len());

        for (row, raw) in sheet.rows.into_iter().enumerate() {
            match SaleRecord::try_from(raw) {
                Ok(record) => records.push(record),
                Err(source) if policy == RowPolicy::Strict => {
                    return Err(LoadError::Record { row, source });
                }
                Err(error) => {
                    tracing::warn!(row, %error, "dropping malformed row");
                    stats.rejected.push((row, error));
                }
            }
        }

        tracing::debug!(rows = stats.rows, rejected = stats.rejected.len(), "dataset loaded");

        Ok(Self { records, stats })
    }

    /// All records, in source order
    pub fn records(&self) -> &[SaleRecord] {
        &self.records
    }

    pub fn stats(&self) -> &LoadStats {
        &self.stats
    }

    /// The distinct borough names, in order of first appearance
    pub fn boroughs(&self) -> Vec<&str> {
        distinct(self.records.iter().map(SaleRecord::borough_name))
    }

    /// The distinct zip codes, in order of first appearance
    pub fn zip_codes(&self) -> Vec<&ZipCode> {
        distinct(self.records.iter().map(SaleRecord::zip_code))
    }
}

pub(crate) fn distinct<T>(items: impl Iterator<Item = T>) -> Vec<T>
    where T: Eq + std::hash::Hash + Copy
{
    let mut seen = HashSet::new();
    items
        .filter(|item| seen.insert(*item))
        .collect()
}
