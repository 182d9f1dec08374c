// Catalog loading for handlehunt
// Reads WhatsMyName-format JSON and narrows it to the batch handed to the scanner

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::CatalogError;
use crate::models::RuleRecord;

/// Parsed site catalog.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub sites: Vec<RuleRecord>,
}

/// Records chosen for one batch.
#[derive(Debug, Clone)]
pub struct Selection {
    pub records: Vec<RuleRecord>,
    /// Records matching the filter before truncation.
    pub matched: usize,
}

impl Selection {
    pub fn truncated(&self) -> bool {
        self.records.len() < self.matched
    }
}

/// Trait for catalog sources
pub trait CatalogParser {
    fn parse(&self, path: &Path) -> Result<Catalog, CatalogError>;
}

/// WhatsMyName `wmn-data.json` parser.
pub struct WmnJsonParser;

impl CatalogParser for WmnJsonParser {
    fn parse(&self, path: &Path) -> Result<Catalog, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Catalog::from_json(&content)
    }
}

impl Catalog {
    pub fn from_json(content: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Sorted category names; derived from the sites if none are declared.
    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<String> = if self.categories.is_empty() {
            self.sites.iter().map(|s| s.category.clone()).collect()
        } else {
            self.categories.iter().cloned().collect()
        };
        set.into_iter().collect()
    }

    /// Filter by category (empty = all), then keep the first `max_sites` in catalog order.
    pub fn select(&self, selected: &HashSet<String>, max_sites: usize) -> Selection {
        let matching: Vec<&RuleRecord> = self
            .sites
            .iter()
            .filter(|s| selected.is_empty() || selected.contains(&s.category))
            .collect();
        let matched = matching.len();
        let records = matching.into_iter().take(max_sites).cloned().collect();
        Selection { records, matched }
    }
}
