//! Alias table: canonical ingredient names and their known synonyms.
//!
//! Handles:
//! - Brand names (advil→ibuprofen, lipitor→atorvastatin)
//! - Translations (布洛芬→ibuprofen, 二甲雙胍→metformin)
//! - Alternative international names (paracetamol→acetaminophen)

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Alias table loading errors.
#[derive(Error, Debug)]
pub enum AliasTableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type AliasTableResult<T> = Result<T, AliasTableError>;

/// Mapping from canonical name to its aliases.
///
/// Canonical names iterate in lexicographic order, aliases in insertion order.
/// All lookups are case-insensitive. When two canonical names claim the same
/// alias, the first canonical name in iteration order owns it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Vec<String>>", into = "BTreeMap<String, Vec<String>>")]
pub struct AliasTable {
    entries: BTreeMap<String, Vec<String>>,
    /// lower-cased canonical name → canonical name
    canonical_index: HashMap<String, String>,
    /// lower-cased alias → canonical name
    alias_index: HashMap<String, String>,
}

/// Result of an exact table lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum AliasHit<'a> {
    Canonical(&'a str),
    Alias { canonical: &'a str, alias: &'a str },
}

impl AliasTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a table from a JSON object `{ "canonical": ["alias", ...] }`.
    pub fn from_json_str(json: &str) -> AliasTableResult<Self> {
        let map: BTreeMap<String, Vec<String>> = serde_json::from_str(json)?;
        Ok(map.into())
    }

    /// Load a table from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> AliasTableResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let table = Self::from_json_str(&json)?;
        tracing::info!(
            path = %path.as_ref().display(),
            canonical_names = table.len(),
            "loaded alias table"
        );
        Ok(table)
    }

    /// Add a canonical name with aliases, merging into an existing entry.
    ///
    /// Blank names and aliases are ignored, as are aliases the entry already has.
    pub fn insert<I, S>(&mut self, canonical: &str, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let canonical = canonical.trim();
        if canonical.is_empty() {
            return;
        }
        let existing_key = self.canonical_index.get(&canonical.to_lowercase()).cloned();
        let entry = self
            .entries
            .entry(existing_key.unwrap_or_else(|| canonical.to_string()))
            .or_default();

        for alias in aliases {
            let alias = alias.as_ref().trim();
            if alias.is_empty() {
                continue;
            }
            let lower = alias.to_lowercase();
            if !entry.iter().any(|a| a.to_lowercase() == lower) {
                entry.push(alias.to_string());
            }
        }

        self.reindex();
    }

    /// Look up a normalized (trimmed, lower-cased) name. Canonical names win over aliases.
    pub fn lookup(&self, normalized: &str) -> Option<AliasHit<'_>> {
        if let Some((canonical, _)) = self.entry_for(self.canonical_index.get(normalized)) {
            return Some(AliasHit::Canonical(canonical));
        }
        let (canonical, aliases) = self.entry_for(self.alias_index.get(normalized))?;
        let alias = aliases.iter().find(|a| a.to_lowercase() == normalized)?;
        Some(AliasHit::Alias { canonical, alias })
    }

    /// Canonical name for a name or alias, case-insensitive.
    pub fn canonical_for(&self, name: &str) -> Option<&str> {
        match self.lookup(&name.trim().to_lowercase())? {
            AliasHit::Canonical(c) => Some(c),
            AliasHit::Alias { canonical, .. } => Some(canonical),
        }
    }

    /// Aliases of a canonical name.
    pub fn aliases(&self, canonical: &str) -> Option<&[String]> {
        let key = self.canonical_index.get(&canonical.trim().to_lowercase())?;
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Flat candidate list: each canonical name followed by its aliases.
    ///
    /// Yields `(candidate, canonical)` pairs. Aliases owned by an earlier canonical
    /// name are skipped so every candidate resolves to a single canonical name.
    pub fn candidates(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().flat_map(move |(canonical, aliases)| {
            std::iter::once((canonical.as_str(), canonical.as_str())).chain(
                aliases
                    .iter()
                    .filter(move |a| {
                        self.alias_index.get(&a.to_lowercase()) == Some(canonical)
                    })
                    .map(move |a| (a.as_str(), canonical.as_str())),
            )
        })
    }

    /// Canonical names in iteration order.
    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of canonical names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_for(&self, key: Option<&String>) -> Option<(&str, &[String])> {
        let (canonical, aliases) = self.entries.get_key_value(key?)?;
        Some((canonical.as_str(), aliases.as_slice()))
    }

    fn reindex(&mut self) {
        self.canonical_index.clear();
        self.alias_index.clear();
        for (canonical, aliases) in &self.entries {
            self.canonical_index
                .entry(canonical.to_lowercase())
                .or_insert_with(|| canonical.clone());
            for alias in aliases {
                self.alias_index
                    .entry(alias.to_lowercase())
                    .or_insert_with(|| canonical.clone());
            }
        }
    }

    /// Default table of common outpatient ingredients.
    pub fn builtin() -> Self {
        let mut table = Self::new();

        // Analgesics / NSAIDs
        table.insert("ibuprofen", ["布洛芬", "advil", "motrin"]);
        table.insert(
            "acetaminophen",
            ["乙醯胺酚", "普拿疼", "paracetamol", "panadol", "tylenol"],
        );
        table.insert("aspirin", ["阿斯匹靈", "acetylsalicylic acid"]);
        table.insert("celecoxib", ["希樂葆", "celebrex"]);
        table.insert("diclofenac", ["待克菲那", "voltaren"]);

        // Cardiovascular
        table.insert("amlodipine", ["脈優", "norvasc"]);
        table.insert("atorvastatin", ["立普妥", "lipitor"]);
        table.insert("rosuvastatin", ["冠脂妥", "crestor"]);
        table.insert("clopidogrel", ["保栓通", "plavix"]);
        table.insert("losartan", ["cozaar"]);
        table.insert("warfarin", ["coumadin"]);

        // Metabolic
        table.insert("metformin", ["二甲雙胍", "庫魯化", "glucophage"]);
        table.insert("levothyroxine", ["eltroxin", "thyroxine"]);

        // GI
        table.insert("esomeprazole", ["耐適恩", "nexium"]);
        table.insert("omeprazole", ["losec"]);

        // Anti-infectives
        table.insert("amoxicillin", ["安莫西林", "amoxil"]);

        table
    }
}

impl From<BTreeMap<String, Vec<String>>> for AliasTable {
    fn from(map: BTreeMap<String, Vec<String>>) -> Self {
        let mut table = Self::new();
        for (canonical, aliases) in map {
            table.insert(&canonical, aliases);
        }
        table
    }
}

impl From<AliasTable> for BTreeMap<String, Vec<String>> {
    fn from(table: AliasTable) -> Self {
        table.entries
    }
}
