//! Drug Usage Core Library
//!
//! Ingredient name resolution and usage aggregation over a national health-insurance
//! reimbursement dataset.
//!
//! # Architecture
//!
//! ```text
//! Query text → Normalization → Exact/Alias Lookup ──hit──┐
//!                                     │ miss             │
//!                               Fuzzy Match ──accept─────┤
//!                                     │ reject           │
//!                              Literal Fallback ─────────┤
//!                                                        ▼
//!                                              Canonical term
//!                                                        │
//!                                  Record Filter (substring, case-insensitive)
//!                                                        │
//!                                               Aggregation Engine
//!                                                        │
//!                             ┌──────────────────────────┼──────────────────────────┐
//!                             ▼                          ▼                          ▼
//!                        Detail view              By-name rollup         By-manufacturer rollup
//!                                                        │
//!                                               CSV / JSON export
//! ```
//!
//! # Core Principle
//!
//! **Resolution never fails on unknown input.** Anything the alias table cannot resolve is
//! searched literally; an empty result is a normal outcome.
//!
//! # Modules
//!
//! - [`models`]: Domain types (DrugRecord, ResolvedQuery, aggregate rows and views)
//! - [`resolver`]: Alias table and name resolver (exact, alias, fuzzy, literal)
//! - [`filter`]: Record filter
//! - [`aggregate`]: Detail view and rollups
//! - [`export`]: CSV and JSON export
//! - [`dataset`]: CSV dataset loader
//! - [`engine`]: End-to-end query pipeline

pub mod aggregate;
pub mod dataset;
pub mod engine;
pub mod export;
pub mod filter;
pub mod models;
pub mod resolver;

// Re-export commonly used types
pub use aggregate::aggregate;
pub use dataset::Dataset;
pub use engine::{QueryEngine, QueryOutcome};
pub use export::{export_csv, QueryReport, ViewKind};
pub use filter::filter_records;
pub use models::{
    AggregateViews, DetailRow, DetailView, DrugRecord, Grouping, ResolutionMethod, ResolvedQuery,
    RollupRow, RollupView, ScoredCandidate,
};
pub use resolver::{AliasTable, Resolver, ResolverConfig};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::Arc;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum DrugUsageError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Dataset error: {0}")]
    DatasetError(String),

    #[error("Alias table error: {0}")]
    AliasTableError(String),

    #[error("Export error: {0}")]
    ExportError(String),
}

impl From<resolver::ResolverError> for DrugUsageError {
    fn from(e: resolver::ResolverError) -> Self {
        DrugUsageError::InvalidInput(e.to_string())
    }
}

impl From<dataset::DatasetError> for DrugUsageError {
    fn from(e: dataset::DatasetError) -> Self {
        DrugUsageError::DatasetError(e.to_string())
    }
}

impl From<resolver::AliasTableError> for DrugUsageError {
    fn from(e: resolver::AliasTableError) -> Self {
        DrugUsageError::AliasTableError(e.to_string())
    }
}

impl From<export::ExportError> for DrugUsageError {
    fn from(e: export::ExportError) -> Self {
        DrugUsageError::ExportError(e.to_string())
    }
}

impl From<serde_json::Error> for DrugUsageError {
    fn from(e: serde_json::Error) -> Self {
        DrugUsageError::ExportError(e.to_string())
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Load a dataset file and an optional alias table file.
///
/// Without an alias table path the built-in table is used.
#[uniffi::export]
pub fn open_engine(
    dataset_path: String,
    alias_path: Option<String>,
    match_threshold: Option<f64>,
) -> Result<Arc<DrugUsageCore>, DrugUsageError> {
    let dataset = Dataset::from_path(&dataset_path)?;
    let aliases = match alias_path {
        Some(path) => AliasTable::from_path(path)?,
        None => AliasTable::builtin(),
    };
    DrugUsageCore::build(dataset, aliases, match_threshold)
}

/// Build an engine from in-memory CSV and alias JSON (for testing).
#[uniffi::export]
pub fn open_engine_from_str(
    dataset_csv: String,
    alias_json: Option<String>,
    match_threshold: Option<f64>,
) -> Result<Arc<DrugUsageCore>, DrugUsageError> {
    let dataset = Dataset::from_csv_str(&dataset_csv)?;
    let aliases = match alias_json {
        Some(json) => AliasTable::from_json_str(&json)?,
        None => AliasTable::builtin(),
    };
    DrugUsageCore::build(dataset, aliases, match_threshold)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Read-only engine and dataset snapshot, shareable across threads.
#[derive(uniffi::Object)]
pub struct DrugUsageCore {
    engine: QueryEngine,
    dataset: Dataset,
}

impl DrugUsageCore {
    fn build(
        dataset: Dataset,
        aliases: AliasTable,
        match_threshold: Option<f64>,
    ) -> Result<Arc<Self>, DrugUsageError> {
        let config = match_threshold
            .map(|match_threshold| ResolverConfig { match_threshold })
            .unwrap_or_default();
        Ok(Arc::new(Self {
            engine: QueryEngine::with_config(aliases, config)?,
            dataset,
        }))
    }
}

#[uniffi::export]
impl DrugUsageCore {
    /// Number of records in the loaded dataset.
    pub fn record_count(&self) -> u64 {
        self.dataset.len() as u64
    }

    /// Resolve query text to a canonical term.
    pub fn resolve(&self, text: String) -> Result<FfiResolvedQuery, DrugUsageError> {
        Ok(self.engine.resolve(&text)?.into())
    }

    /// Ranked "did you mean" suggestions.
    pub fn candidates(&self, text: String, limit: u32) -> Vec<FfiScoredCandidate> {
        self.engine
            .candidates(&text, limit as usize)
            .into_iter()
            .map(|c| c.into())
            .collect()
    }

    /// Run a query and return all three views.
    pub fn query(&self, text: String) -> Result<FfiQueryResult, DrugUsageError> {
        Ok(self.engine.query(&text, &self.dataset)?.into())
    }

    /// Run a query and export one view as CSV bytes.
    pub fn export_csv(&self, text: String, view: FfiViewKind) -> Result<Vec<u8>, DrugUsageError> {
        let outcome = self.engine.query(&text, &self.dataset)?;
        Ok(outcome.export_csv(view.into())?)
    }

    /// Run a query and export the full report as JSON.
    pub fn export_json(&self, text: String) -> Result<String, DrugUsageError> {
        let outcome = self.engine.query(&text, &self.dataset)?;
        Ok(outcome.report().to_json()?)
    }

    /// Suggested download file name for a view.
    pub fn export_file_name(&self, text: String, view: FfiViewKind) -> Result<String, DrugUsageError> {
        let resolved = self.engine.resolve(&text)?;
        Ok(export::export_file_name(&resolved.term, view.into()))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe view selector.
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiViewKind {
    Detail,
    ByName,
    ByManufacturer,
}

impl From<FfiViewKind> for ViewKind {
    fn from(kind: FfiViewKind) -> Self {
        match kind {
            FfiViewKind::Detail => ViewKind::Detail,
            FfiViewKind::ByName => ViewKind::ByName,
            FfiViewKind::ByManufacturer => ViewKind::ByManufacturer,
        }
    }
}

/// FFI-safe resolved query.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiResolvedQuery {
    pub term: String,
    pub original: Option<String>,
    pub method: String,
    pub matched: Option<String>,
    pub score: Option<f64>,
}

impl From<ResolvedQuery> for FfiResolvedQuery {
    fn from(resolved: ResolvedQuery) -> Self {
        let (method, matched, score) = match resolved.method {
            ResolutionMethod::Exact => ("exact", None, None),
            ResolutionMethod::Alias { alias } => ("alias", Some(alias), None),
            ResolutionMethod::Fuzzy { matched, score } => ("fuzzy", Some(matched), Some(score)),
            ResolutionMethod::Literal => ("literal", None, None),
        };
        Self {
            term: resolved.term,
            original: resolved.original,
            method: method.to_string(),
            matched,
            score,
        }
    }
}

/// FFI-safe scored candidate.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiScoredCandidate {
    pub canonical: String,
    pub matched: String,
    pub score: f64,
}

impl From<ScoredCandidate> for FfiScoredCandidate {
    fn from(candidate: ScoredCandidate) -> Self {
        Self {
            canonical: candidate.canonical,
            matched: candidate.matched,
            score: candidate.score,
        }
    }
}

/// FFI-safe detail row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDetailRow {
    pub code: String,
    pub name: String,
    pub manufacturer: String,
    pub quantity: f64,
    pub unit_price: Option<f64>,
    pub total: Option<f64>,
    pub quantity_share: f64,
    pub cost_share: Option<f64>,
}

impl From<DetailRow> for FfiDetailRow {
    fn from(row: DetailRow) -> Self {
        Self {
            code: row.code,
            name: row.name,
            manufacturer: row.manufacturer,
            quantity: row.quantity,
            unit_price: row.unit_price,
            total: row.total,
            quantity_share: row.quantity_share,
            cost_share: row.cost_share,
        }
    }
}

/// FFI-safe rollup row.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRollupRow {
    pub key: String,
    pub row_count: u64,
    pub quantity: f64,
    pub total: f64,
    pub unknown_price_rows: u64,
    pub quantity_share: f64,
    pub cost_share: f64,
}

impl From<RollupRow> for FfiRollupRow {
    fn from(row: RollupRow) -> Self {
        Self {
            key: row.key,
            row_count: row.row_count as u64,
            quantity: row.quantity,
            total: row.total,
            unknown_price_rows: row.unknown_price_rows as u64,
            quantity_share: row.quantity_share,
            cost_share: row.cost_share,
        }
    }
}

/// FFI-safe query result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiQueryResult {
    pub resolved: FfiResolvedQuery,
    pub detail: Vec<FfiDetailRow>,
    pub by_name: Vec<FfiRollupRow>,
    pub by_manufacturer: Vec<FfiRollupRow>,
}

impl From<QueryOutcome> for FfiQueryResult {
    fn from(outcome: QueryOutcome) -> Self {
        Self {
            resolved: outcome.resolved.into(),
            detail: outcome.views.detail.rows.into_iter().map(|r| r.into()).collect(),
            by_name: outcome.views.by_name.rows.into_iter().map(|r| r.into()).collect(),
            by_manufacturer: outcome
                .views
                .by_manufacturer
                .rows
                .into_iter()
                .map(|r| r.into())
                .collect(),
        }
    }
}
