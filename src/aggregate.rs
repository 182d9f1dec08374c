// Result aggregation for handlehunt
// Splits finished results and groups hits by category

use std::collections::HashMap;

use chrono::Local;

use crate::models::{ScanReport, ScanResult};

/// Results split by outcome.
#[derive(Debug, Default)]
pub struct Partition<'a> {
    pub found: Vec<&'a ScanResult>,
    pub not_found: Vec<&'a ScanResult>,
    pub errored: Vec<&'a ScanResult>,
}

pub fn partition(results: &[ScanResult]) -> Partition<'_> {
    let mut parts = Partition::default();
    for result in results {
        if result.is_error() {
            parts.errored.push(result);
        } else if result.found {
            parts.found.push(result);
        } else {
            parts.not_found.push(result);
        }
    }
    parts
}

/// Group hits by category. Group order is unspecified; sites keep their input order.
pub fn group_by_category(found: &[&ScanResult]) -> HashMap<String, Vec<ScanResult>> {
    let mut groups: HashMap<String, Vec<ScanResult>> = HashMap::new();
    for result in found {
        groups
            .entry(result.category.clone())
            .or_default()
            .push((*result).clone());
    }
    groups
}

/// Build the batch report from the complete result sequence.
pub fn aggregate(target: &str, results: Vec<ScanResult>, skipped: usize) -> ScanReport {
    let parts = partition(&results);
    let by_category = group_by_category(&parts.found);
    let total_found = parts.found.len();
    let total_evaluated = parts.found.len() + parts.not_found.len();
    let total_errors = parts.errored.len();

    ScanReport {
        target: target.to_string(),
        total_evaluated,
        total_found,
        total_errors,
        skipped,
        by_category,
        results,
        selected_categories: Vec::new(),
        timestamp: Local::now(),
    }
}
