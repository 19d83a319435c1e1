//! Reimbursement dataset records.

use serde::{Deserialize, Serialize};

/// One row of the reimbursement dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrugRecord {
    /// Drug code (identifier)
    pub code: String,
    /// Drug display name, the match target. `None` never matches a query.
    pub name: Option<String>,
    /// Usage quantity (non-negative)
    pub quantity: f64,
    /// Manufacturer name (empty when unknown)
    pub manufacturer: String,
    /// Unit price; `None` when the source value was missing or not a valid number
    pub unit_price: Option<f64>,
}

impl DrugRecord {
    /// Create a new record with required fields and an unknown price.
    pub fn new(code: impl Into<String>, name: impl Into<String>, quantity: f64) -> Self {
        Self {
            code: code.into(),
            name: Some(name.into()),
            quantity,
            manufacturer: String::new(),
            unit_price: None,
        }
    }

    /// Set the manufacturer.
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = manufacturer.into();
        self
    }

    /// Set the unit price. Invalid prices (negative, NaN, infinite) are stored as unknown.
    pub fn with_unit_price(mut self, price: f64) -> Self {
        self.unit_price = valid_price(price);
        self
    }

    /// Unit price if it is a usable non-negative number.
    pub fn known_unit_price(&self) -> Option<f64> {
        self.unit_price.and_then(valid_price)
    }

    /// Drug name used as a grouping key (empty when missing).
    pub fn name_key(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Parse a raw unit price cell.
///
/// Non-numeric text ("N/A", "-", ""), negative and non-finite values all become `None`.
/// Thousands separators are accepted.
pub fn parse_unit_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().and_then(valid_price)
}

fn valid_price(price: f64) -> Option<f64> {
    (price.is_finite() && price >= 0.0).then_some(price)
}
