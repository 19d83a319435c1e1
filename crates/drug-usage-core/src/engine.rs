//! Query pipeline: resolve → filter → aggregate.

use serde::{Deserialize, Serialize};

use crate::aggregate::aggregate;
use crate::dataset::Dataset;
use crate::export::{export_csv, export_file_name, select_view, ExportResult, QueryReport, ViewKind};
use crate::filter::filter_records;
use crate::models::{AggregateViews, ResolvedQuery, ScoredCandidate};
use crate::resolver::{AliasTable, Resolver, ResolverConfig, ResolverResult};

/// Result of one query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryOutcome {
    /// Query text as entered
    pub query: String,
    pub resolved: ResolvedQuery,
    pub views: AggregateViews,
}

impl QueryOutcome {
    /// Whether no record matched.
    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Suggested download name for a view, e.g. `ibuprofen_summary.csv`.
    pub fn export_file_name(&self, kind: ViewKind) -> String {
        export_file_name(&self.resolved.term, kind)
    }

    /// Export a view as CSV bytes.
    pub fn export_csv(&self, kind: ViewKind) -> ExportResult<Vec<u8>> {
        export_csv(select_view(&self.views, kind))
    }

    /// Build a JSON report of the whole outcome.
    pub fn report(&self) -> QueryReport {
        QueryReport::new(&self.query, self.resolved.clone(), self.views.clone())
    }
}

/// Stateless query engine. Holds only read-only configuration.
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    resolver: Resolver,
}

impl QueryEngine {
    /// Create an engine with the default threshold.
    pub fn new(aliases: AliasTable) -> Self {
        Self {
            resolver: Resolver::new(aliases),
        }
    }

    /// Create an engine with explicit resolver configuration.
    pub fn with_config(aliases: AliasTable, config: ResolverConfig) -> ResolverResult<Self> {
        Ok(Self {
            resolver: Resolver::with_config(aliases, config)?,
        })
    }

    /// Resolve query text without touching the dataset.
    pub fn resolve(&self, text: &str) -> ResolverResult<ResolvedQuery> {
        self.resolver.resolve(text)
    }

    /// "Did you mean" suggestions for query text.
    pub fn candidates(&self, text: &str, limit: usize) -> Vec<ScoredCandidate> {
        self.resolver.candidates(text, limit)
    }

    /// Run the full pipeline against a dataset snapshot.
    pub fn query(&self, text: &str, dataset: &Dataset) -> ResolverResult<QueryOutcome> {
        let resolved = self.resolver.resolve(text)?;
        let matched = filter_records(&resolved.term, dataset.records());
        let views = aggregate(matched);

        Ok(QueryOutcome {
            query: text.to_string(),
            resolved,
            views,
        })
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }
}
