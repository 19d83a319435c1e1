//! Reimbursement dataset loading.
//!
//! Accepts English headers (`code,name,quantity,manufacturer,unit_price`) or the
//! NHI Chinese headers. Only the name and quantity columns are required.

use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use thiserror::Error;

use crate::export::UTF8_BOM;
use crate::models::{parse_unit_price, DrugRecord};

/// Dataset loading errors.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("Invalid quantity {value:?} in data row {row}")]
    InvalidQuantity { row: usize, value: String },
}

pub type DatasetResult<T> = Result<T, DatasetError>;

// Accepted header names per column, most preferred first.
const CODE_HEADERS: &[&str] = &["code", "藥品代碼"];
const NAME_HEADERS: &[&str] = &["name", "藥品名稱"];
const QUANTITY_HEADERS: &[&str] = &["quantity", "數量"];
const MANUFACTURER_HEADERS: &[&str] = &["manufacturer", "製造廠名稱", "藥商名稱", "藥商"];
const UNIT_PRICE_HEADERS: &[&str] = &["unit_price", "支付價", "單價"];

/// Column positions resolved from the header row.
///
/// A field may be backed by several columns (NHI files carry both a maker and a
/// dealer column); the first non-empty cell in preference order wins.
#[derive(Debug)]
struct ColumnMap {
    code: Vec<usize>,
    name: Vec<usize>,
    quantity: Vec<usize>,
    manufacturer: Vec<usize>,
    unit_price: Vec<usize>,
}

impl ColumnMap {
    fn from_headers(headers: &StringRecord) -> DatasetResult<Self> {
        let columns = Self {
            code: find_columns(headers, CODE_HEADERS),
            name: find_columns(headers, NAME_HEADERS),
            quantity: find_columns(headers, QUANTITY_HEADERS),
            manufacturer: find_columns(headers, MANUFACTURER_HEADERS),
            unit_price: find_columns(headers, UNIT_PRICE_HEADERS),
        };

        if columns.name.is_empty() {
            return Err(DatasetError::MissingColumn("name"));
        }
        if columns.quantity.is_empty() {
            return Err(DatasetError::MissingColumn("quantity"));
        }
        if columns.code.is_empty() {
            tracing::debug!("dataset has no code column");
        }
        if columns.manufacturer.is_empty() {
            tracing::debug!("dataset has no manufacturer column");
        }
        if columns.unit_price.is_empty() {
            tracing::debug!("dataset has no unit price column");
        }
        Ok(columns)
    }
}

/// Indexes of every column whose header is in `names`, ordered by preference.
fn find_columns(headers: &StringRecord, names: &[&str]) -> Vec<usize> {
    names
        .iter()
        .flat_map(|name| headers.iter().position(|h| h == *name))
        .collect()
}

/// First non-empty cell among `columns`.
fn cell<'r>(record: &'r StringRecord, columns: &[usize]) -> Option<&'r str> {
    columns
        .iter()
        .filter_map(|&index| record.get(index))
        .find(|value| !value.is_empty())
}

/// In-memory dataset snapshot. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<DrugRecord>,
}

impl Dataset {
    /// Wrap already-parsed records.
    pub fn new(records: Vec<DrugRecord>) -> Self {
        Self { records }
    }

    /// Load a CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> DatasetResult<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let dataset = Self::from_reader(file)?;
        tracing::info!(
            path = %path.as_ref().display(),
            records = dataset.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Parse CSV text.
    pub fn from_csv_str(csv: &str) -> DatasetResult<Self> {
        Self::from_reader(csv.as_bytes())
    }

    /// Parse CSV from any reader. A leading UTF-8 signature is skipped.
    pub fn from_reader<R: Read>(mut reader: R) -> DatasetResult<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let data = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);

        let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(data);

        let columns = ColumnMap::from_headers(csv_reader.headers()?)?;

        let mut records = Vec::new();
        let mut coerced_prices = 0usize;

        for (index, row) in csv_reader.records().enumerate() {
            let row = row?;
            let row_number = index + 1;

            let raw_quantity = cell(&row, &columns.quantity).unwrap_or_default();
            let quantity = parse_quantity(raw_quantity).ok_or_else(|| {
                DatasetError::InvalidQuantity {
                    row: row_number,
                    value: raw_quantity.to_string(),
                }
            })?;

            let raw_price = cell(&row, &columns.unit_price);
            let unit_price = raw_price.and_then(parse_unit_price);
            if unit_price.is_none() && raw_price.is_some() {
                coerced_prices += 1;
            }

            records.push(DrugRecord {
                code: cell(&row, &columns.code).unwrap_or_default().to_string(),
                name: cell(&row, &columns.name).map(str::to_string),
                quantity,
                manufacturer: cell(&row, &columns.manufacturer)
                    .unwrap_or_default()
                    .to_string(),
                unit_price,
            });
        }

        if coerced_prices > 0 {
            tracing::warn!(rows = coerced_prices, "unparseable unit prices treated as unknown");
        }

        Ok(Self { records })
    }

    pub fn records(&self) -> &[DrugRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<DrugRecord>> for Dataset {
    fn from(records: Vec<DrugRecord>) -> Self {
        Self::new(records)
    }
}

fn parse_quantity(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|q| q.is_finite() && *q >= 0.0)
}
