//! Export functionality for query results.

mod delimited;
mod report;

pub use delimited::*;
pub use report::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::AggregateViews;

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Buffer flush error: {0}")]
    Flush(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Which aggregate view to export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewKind {
    Detail,
    ByName,
    ByManufacturer,
}

impl ViewKind {
    /// File name suffix for the view.
    pub fn suffix(&self) -> &'static str {
        match self {
            ViewKind::Detail => "detail",
            ViewKind::ByName => "summary",
            ViewKind::ByManufacturer => "by_manufacturer",
        }
    }
}

/// Borrow one of the three views as an exportable table.
pub fn select_view(views: &AggregateViews, kind: ViewKind) -> &dyn ExportView {
    match kind {
        ViewKind::Detail => &views.detail,
        ViewKind::ByName => &views.by_name,
        ViewKind::ByManufacturer => &views.by_manufacturer,
    }
}

/// Download file name, `{term}_{suffix}.csv`, with path separators replaced.
pub fn export_file_name(term: &str, kind: ViewKind) -> String {
    let safe: String = term
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    format!("{}_{}.csv", safe, kind.suffix())
}
