//! Aggregate view models.
//!
//! Rows carry no sequence number; numbering is assigned when a view is presented or exported.

use serde::{Deserialize, Serialize};

/// Per-record detail row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailRow {
    pub code: String,
    pub name: String,
    pub manufacturer: String,
    /// Usage quantity, rounded to one decimal
    pub quantity: f64,
    /// Unit price if known
    pub unit_price: Option<f64>,
    /// quantity × unit price, rounded to one decimal; `None` when the price is unknown
    pub total: Option<f64>,
    /// Percentage of the view's total quantity
    pub quantity_share: f64,
    /// Percentage of the view's known cost; `None` when the price is unknown
    pub cost_share: Option<f64>,
}

/// Rollup row for one drug name or manufacturer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RollupRow {
    /// Grouping key (drug name or manufacturer)
    pub key: String,
    /// Number of detail rows in the group
    pub row_count: usize,
    /// Summed usage quantity
    pub quantity: f64,
    /// Summed known line totals (0.0 when every price is unknown)
    pub total: f64,
    /// Rows whose price was unknown and excluded from `total`
    pub unknown_price_rows: usize,
    /// Percentage of the view's total quantity
    pub quantity_share: f64,
    /// Percentage of the view's total cost
    pub cost_share: f64,
}

impl RollupRow {
    /// Whether `total` leaves out rows with an unknown price.
    pub fn has_unknown_prices(&self) -> bool {
        self.unknown_price_rows > 0
    }
}

/// Field a rollup groups by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Grouping {
    DrugName,
    Manufacturer,
}

impl Grouping {
    /// Column label for the grouping key.
    pub fn key_label(&self) -> &'static str {
        match self {
            Grouping::DrugName => "name",
            Grouping::Manufacturer => "manufacturer",
        }
    }
}

/// Per-record view, in input order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetailView {
    pub rows: Vec<DetailRow>,
}

impl DetailView {
    pub fn total_quantity(&self) -> f64 {
        self.rows.iter().map(|r| r.quantity).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.rows.iter().filter_map(|r| r.total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Grouped view, ordered by key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RollupView {
    pub grouping: Grouping,
    pub rows: Vec<RollupRow>,
}

impl RollupView {
    pub fn empty(grouping: Grouping) -> Self {
        Self {
            grouping,
            rows: Vec::new(),
        }
    }

    pub fn total_quantity(&self) -> f64 {
        self.rows.iter().map(|r| r.quantity).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.rows.iter().map(|r| r.total).sum()
    }

    /// Find the row for a grouping key.
    pub fn row(&self, key: &str) -> Option<&RollupRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The three views computed for one query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateViews {
    pub detail: DetailView,
    pub by_name: RollupView,
    pub by_manufacturer: RollupView,
}

impl AggregateViews {
    pub fn empty() -> Self {
        Self {
            detail: DetailView::default(),
            by_name: RollupView::empty(Grouping::DrugName),
            by_manufacturer: RollupView::empty(Grouping::Manufacturer),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detail.is_empty()
    }
}
