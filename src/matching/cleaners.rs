// src/matching/cleaners.rs
//! Character-level cleaning of raw name fields.
//!
//! Every helper accepts any [`FieldValue`] and passes non-text values through
//! untouched, so the pipeline never stops on a malformed row.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::Path;

use crate::models::FieldValue;

/// Literal fragments stripped from claimant last names, applied in order.
pub const INTERNAL_ABBREVIATIONS: [&str; 6] = [
    "F/K/A",
    "(MAIDEN",
    "(FKA",
    "(PREVIOUSLY",
    "(MAIDEN NAME",
    "(DECEASED) C/O",
];

/// Generational and professional suffixes that may trail a last name.
///
/// Iteration order is the row order of the reference file and decides which
/// suffix is stripped first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuffixTable {
    entries: Vec<(String, String)>,
}

impl SuffixTable {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Loads the table from a CSV file with a header row and
    /// `suffix,description` columns. Rows without a description are skipped.
    pub fn load_from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading suffix table from {}", path.display());
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .with_context(|| format!("Failed to open suffix table {}", path.display()))?;

        let mut entries = Vec::new();
        for (line_no, row) in reader.records().enumerate() {
            let row = row.with_context(|| {
                format!("Failed to read row {} of suffix table {}", line_no + 2, path.display())
            })?;
            let suffix = row.get(0).unwrap_or_default();
            let description = row.get(1).unwrap_or_default();
            if description.is_empty() {
                debug!("Suffix table row {} has no description, skipping", line_no + 2);
                continue;
            }
            if suffix.is_empty() {
                warn!(
                    "Suffix table row {} has an empty suffix ('{}'), skipping",
                    line_no + 2,
                    description
                );
                continue;
            }
            entries.push((suffix.to_string(), description.to_string()));
        }

        info!("Loaded {} suffixes", entries.len());
        Ok(Self { entries })
    }

    pub fn suffixes(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(suffix, _)| suffix.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Drops every ASCII punctuation character.
pub fn remove_punctuation(value: &FieldValue) -> FieldValue {
    value.map_text(|s| s.chars().filter(|c| !c.is_ascii_punctuation()).collect())
}

/// Drops every whitespace character, including those inside the value.
pub fn remove_whitespace(value: &FieldValue) -> FieldValue {
    value.map_text(|s| s.chars().filter(|c| !c.is_whitespace()).collect())
}

/// Strips trailing `" <suffix>"` occurrences, trying each table entry once in
/// table order. The separating space is left behind for `remove_whitespace`.
pub fn remove_suffixes(value: &FieldValue, table: &SuffixTable) -> FieldValue {
    value.map_text(|s| {
        let mut name = s.to_string();
        for suffix in table.suffixes() {
            let pattern = format!(" {}", suffix);
            if name.ends_with(&pattern) {
                name.truncate(name.len() - suffix.len());
            }
        }
        name
    })
}

/// Removes alias markers such as `F/K/A` (exact, case-sensitive).
pub fn remove_internal_abbreviations(value: &FieldValue) -> FieldValue {
    value.map_text(|s| {
        INTERNAL_ABBREVIATIONS
            .iter()
            .fold(s.to_string(), |acc, abbreviation| acc.replace(abbreviation, ""))
    })
}
