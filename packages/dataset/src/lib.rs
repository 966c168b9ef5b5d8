#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV loading for the advertising location dataset.
//!
//! The dataset is a row-per-location CSV with a header row. Identity,
//! position, type and price columns are required; every other known numeric
//! column is optional, both as a whole (absent from the header) and per row
//! (empty cell). Unknown columns are ignored.

pub mod paths;

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::{Path, PathBuf};

use adspecta_location_models::{LocationRecord, NumericColumn};

/// Header of the training label column.
pub const LABEL_COLUMN: &str = "avg_monthly_impressions";

/// Columns every dataset must provide.
pub const REQUIRED_COLUMNS: &[&str] = &["id", "name", "lat", "lng", "type", "price_per_month"];

/// Errors that can occur while loading the dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// The dataset file does not exist.
    #[error("Adspace CSV not found: {}", .0.display())]
    NotFound(PathBuf),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("Dataset is missing required column '{0}'")]
    MissingColumn(String),
}

/// The full set of candidate locations loaded from one CSV file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationDataset {
    /// Numeric columns present in the header row.
    pub available: BTreeSet<NumericColumn>,
    /// Whether the header contains the training label column.
    pub has_label_column: bool,
    /// One record per valid row, in file order.
    pub records: Vec<LocationRecord>,
}

impl LocationDataset {
    /// Builds a dataset from records, treating every numeric column as
    /// available.
    #[must_use]
    pub fn from_records(records: Vec<LocationRecord>) -> Self {
        Self {
            available: NumericColumn::all().iter().copied().collect(),
            has_label_column: records.iter().any(|r| r.avg_monthly_impressions.is_some()),
            records,
        }
    }

    /// Loads the dataset from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::NotFound`] if the file does not exist, or any
    /// error from [`Self::from_reader`].
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        if !path.exists() {
            return Err(DatasetError::NotFound(path.to_path_buf()));
        }

        let file = std::fs::File::open(path)?;
        let dataset = Self::from_reader(file)?;

        log::debug!(
            "Loaded {} locations from {}",
            dataset.records.len(),
            path.display()
        );

        Ok(dataset)
    }

    /// Parses the dataset from any CSV source.
    ///
    /// Rows with a missing or malformed required field are skipped with a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Csv`] if the CSV is malformed, or
    /// [`DatasetError::MissingColumn`] if a required column is absent.
    pub fn from_reader(reader: impl Read) -> Result<Self, DatasetError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_owned).collect();
        let layout = HeaderLayout::resolve(&headers)?;

        let mut records = Vec::new();
        let mut skipped = 0_usize;

        for (line, result) in reader.records().enumerate() {
            let row = result?;
            if let Some(record) = layout.parse_row(&row, line + 2) {
                records.push(record);
            } else {
                skipped += 1;
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {skipped} dataset rows with missing required fields");
        }

        let mut available: BTreeSet<NumericColumn> =
            layout.numeric.iter().map(|(_, column)| *column).collect();
        available.insert(NumericColumn::PricePerMonth);

        Ok(Self {
            available,
            has_label_column: layout.label.is_some(),
            records,
        })
    }

    /// Returns `true` if the label column is absent or entirely empty.
    #[must_use]
    pub fn labels_missing(&self) -> bool {
        !self.has_label_column
            || self
                .records
                .iter()
                .all(|r| r.avg_monthly_impressions.is_none())
    }
}

/// Column indexes resolved from the header row.
struct HeaderLayout {
    id: usize,
    name: usize,
    lat: usize,
    lng: usize,
    category: usize,
    price: usize,
    numeric: Vec<(usize, NumericColumn)>,
    label: Option<usize>,
}

impl HeaderLayout {
    fn resolve(headers: &[String]) -> Result<Self, DatasetError> {
        let index: BTreeMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.as_str(), i))
            .collect();

        let required = |name: &str| {
            index
                .get(name)
                .copied()
                .ok_or_else(|| DatasetError::MissingColumn(name.to_owned()))
        };

        let numeric = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| h.parse::<NumericColumn>().ok().map(|c| (i, c)))
            .filter(|(_, c)| *c != NumericColumn::PricePerMonth)
            .collect();

        Ok(Self {
            id: required("id")?,
            name: required("name")?,
            lat: required("lat")?,
            lng: required("lng")?,
            category: required("type")?,
            price: required("price_per_month")?,
            numeric,
            label: index.get(LABEL_COLUMN).copied(),
        })
    }

    fn parse_row(&self, row: &csv::StringRecord, line: usize) -> Option<LocationRecord> {
        let text = |i: usize| row.get(i).filter(|s| !s.is_empty());

        let Some(id) = text(self.id) else {
            log::warn!("Dataset line {line}: missing id");
            return None;
        };
        let (Some(lat), Some(lng)) = (
            text(self.lat).and_then(parse_number),
            text(self.lng).and_then(parse_number),
        ) else {
            log::warn!("Dataset line {line} (id {id}): missing or invalid coordinates");
            return None;
        };
        let Some(price_per_month) = text(self.price).and_then(parse_number) else {
            log::warn!("Dataset line {line} (id {id}): missing or invalid price_per_month");
            return None;
        };
        let Some(category) = text(self.category) else {
            log::warn!("Dataset line {line} (id {id}): missing type");
            return None;
        };

        let mut attributes = BTreeMap::new();
        for (i, column) in &self.numeric {
            let Some(raw) = text(*i) else {
                continue;
            };
            match parse_number(raw) {
                Some(value) => {
                    attributes.insert(*column, value);
                }
                None if is_null_token(raw) => {}
                None => log::debug!("Dataset line {line}: ignoring non-numeric {column} '{raw}'"),
            }
        }

        Some(LocationRecord {
            id: id.to_owned(),
            name: text(self.name).unwrap_or_default().to_owned(),
            lat,
            lng,
            category: category.to_owned(),
            price_per_month,
            attributes,
            avg_monthly_impressions: self.label.and_then(text).and_then(parse_number),
        })
    }
}

/// Parses a numeric cell. Booleans map to 1/0; null tokens and `NaN` are
/// treated as missing.
fn parse_number(raw: &str) -> Option<f64> {
    if raw.eq_ignore_ascii_case("true") {
        return Some(1.0);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Some(0.0);
    }
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn is_null_token(raw: &str) -> bool {
    ["nan", "null", "none", "na", "n/a"]
        .iter()
        .any(|token| raw.eq_ignore_ascii_case(token))
}
