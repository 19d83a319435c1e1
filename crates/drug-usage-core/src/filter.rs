//! Record filter: case-insensitive substring match on drug name.

use crate::models::DrugRecord;

/// Select records whose name contains `term`, ignoring case.
///
/// Comparison uses Unicode lower-casing, so scripts without case (CJK) compare as-is.
/// Records without a name never match. Input order is preserved.
pub fn filter_records<'a>(term: &str, records: &'a [DrugRecord]) -> Vec<&'a DrugRecord> {
    let needle = term.to_lowercase();
    let matched: Vec<&DrugRecord> = records
        .iter()
        .filter(|r| {
            r.name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        })
        .collect();

    tracing::debug!(term, scanned = records.len(), matched = matched.len(), "filtered records");
    matched
}
