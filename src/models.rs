// Core data models for handlehunt

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ProbeError;

/// Token replaced by the target identifier in URI and body templates.
pub const PLACEHOLDER: &str = "{account}";

/// Category used when a rule does not declare one.
pub const UNKNOWN_CATEGORY: &str = "unknown";

/// Site name used when a rule does not declare one.
pub const UNKNOWN_SITE: &str = "Unknown";

/// Supported HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Method {
    GET,
    POST,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::GET => write!(f, "GET"),
            Method::POST => write!(f, "POST"),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
        }
    }
}

fn default_category() -> String {
    UNKNOWN_CATEGORY.to_string()
}

fn default_name() -> String {
    UNKNOWN_SITE.to_string()
}

// Catalog entries sometimes carry explicit nulls; treat them like absent fields.
fn category_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_category))
}

fn name_or_unknown<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_name))
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// One catalog entry: how to probe a site and read its answer.
///
/// Field names on the wire follow the WhatsMyName catalog (`uri_check`, `e_code`, ...).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RuleRecord {
    #[serde(default = "default_name", deserialize_with = "name_or_unknown")]
    pub name: String,
    #[serde(rename = "cat", default = "default_category", deserialize_with = "category_or_unknown")]
    pub category: String,
    #[serde(rename = "uri_check", default, deserialize_with = "null_as_empty")]
    pub uri_template: String,
    #[serde(rename = "post_body", default)]
    pub body_template: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(rename = "e_code", default)]
    pub expect_code: Option<u16>,
    #[serde(rename = "e_string", default)]
    pub expect_string: Option<String>,
    #[serde(rename = "m_code", default)]
    pub missing_code: Option<u16>,
    #[serde(rename = "m_string", default)]
    pub missing_string: Option<String>,
}

impl RuleRecord {
    /// Minimal GET rule with no decision fields.
    pub fn new(name: &str, category: &str, uri_template: &str) -> Self {
        Self {
            name: name.to_string(),
            category: category.to_string(),
            uri_template: uri_template.to_string(),
            ..Default::default()
        }
    }

    /// POST when the rule carries a non-empty body template.
    pub fn method(&self) -> Method {
        match self.body_template.as_deref() {
            Some(body) if !body.is_empty() => Method::POST,
            _ => Method::GET,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        self.uri_template.contains(PLACEHOLDER)
    }

    // Empty strings in the catalog mean "not set".
    pub fn expect_string(&self) -> Option<&str> {
        self.expect_string.as_deref().filter(|s| !s.is_empty())
    }

    pub fn missing_string(&self) -> Option<&str> {
        self.missing_string.as_deref().filter(|s| !s.is_empty())
    }
}

/// A fully resolved request, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeRequest {
    pub method: Method,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

/// Outcome of probing one site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult {
    pub name: String,
    pub category: String,
    pub url: String,
    pub status: Option<u16>,
    pub found: bool,
    pub error: Option<ProbeError>,
}

impl ScanResult {
    pub fn checked(rule: &RuleRecord, url: String, status: u16, found: bool) -> Self {
        Self {
            name: rule.name.clone(),
            category: rule.category.clone(),
            url,
            status: Some(status),
            found,
            error: None,
        }
    }

    pub fn failed(rule: &RuleRecord, url: String, error: ProbeError) -> Self {
        Self {
            name: rule.name.clone(),
            category: rule.category.clone(),
            url,
            status: None,
            found: false,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Found and not errored.
    pub fn is_hit(&self) -> bool {
        self.found && self.error.is_none()
    }
}

/// Aggregate of one batch.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub target: String,
    pub total_evaluated: usize,
    pub total_found: usize,
    pub total_errors: usize,
    /// Records skipped before dispatch because their template was malformed.
    pub skipped: usize,
    pub by_category: HashMap<String, Vec<ScanResult>>,
    pub results: Vec<ScanResult>,
    pub selected_categories: Vec<String>,
    pub timestamp: DateTime<Local>,
}

impl ScanReport {
    pub fn category_count(&self) -> usize {
        self.by_category.len()
    }

    /// Found groups with categories and sites sorted for presentation.
    pub fn sorted_categories(&self) -> Vec<(&str, Vec<&ScanResult>)> {
        let mut groups: Vec<(&str, Vec<&ScanResult>)> = self
            .by_category
            .iter()
            .map(|(cat, sites)| {
                let mut sites: Vec<&ScanResult> = sites.iter().collect();
                sites.sort_by(|a, b| a.name.cmp(&b.name));
                (cat.as_str(), sites)
            })
            .collect();
        groups.sort_by(|a, b| a.0.cmp(b.0));
        groups
    }

    pub fn with_selected_categories(mut self, mut categories: Vec<String>) -> Self {
        categories.sort();
        self.selected_categories = categories;
        self
    }
}
