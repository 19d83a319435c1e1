//! JSON report of a complete query.

use serde::{Deserialize, Serialize};

use crate::models::{AggregateViews, ResolvedQuery};

/// Full query result for JSON download.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryReport {
    /// Export metadata
    pub metadata: ReportMetadata,
    /// How the query was resolved
    pub resolved: ResolvedQuery,
    /// Detail and rollup views
    pub views: AggregateViews,
}

/// Report metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportMetadata {
    /// Query text as entered
    pub query: String,
    /// Number of matched records
    pub matched_records: usize,
    /// Report timestamp (RFC 3339)
    pub generated_at: String,
}

impl QueryReport {
    /// Build a report stamped with the current time.
    pub fn new(query: &str, resolved: ResolvedQuery, views: AggregateViews) -> Self {
        Self {
            metadata: ReportMetadata {
                query: query.to_string(),
                matched_records: views.detail.rows.len(),
                generated_at: chrono::Utc::now().to_rfc3339(),
            },
            resolved,
            views,
        }
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
