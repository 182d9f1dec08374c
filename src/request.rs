// Request builder for handlehunt
// Resolves a rule template into a concrete request; no I/O

use std::collections::BTreeMap;

use crate::error::MalformedRule;
use crate::models::{ProbeRequest, RuleRecord, PLACEHOLDER};

/// Browser-like headers sent when a rule does not supply its own.
pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
    (
        "User-Agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36",
    ),
    ("Accept", "text/html"),
];

pub fn default_headers() -> BTreeMap<String, String> {
    DEFAULT_HEADERS
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Substitute `target` into the rule's templates.
///
/// Every occurrence of the placeholder is replaced, in both the URI and the body.
/// A URI template without the placeholder yields `MalformedRule` and must not be sent.
pub fn build_request(rule: &RuleRecord, target: &str) -> Result<ProbeRequest, MalformedRule> {
    if !rule.is_well_formed() {
        return Err(MalformedRule {
            name: rule.name.clone(),
        });
    }

    let url = rule.uri_template.replace(PLACEHOLDER, target);
    let body = rule
        .body_template
        .as_deref()
        .filter(|b| !b.is_empty())
        .map(|b| b.replace(PLACEHOLDER, target));
    let headers = if rule.headers.is_empty() {
        default_headers()
    } else {
        rule.headers.clone()
    };

    Ok(ProbeRequest {
        method: rule.method(),
        url,
        headers,
        body,
    })
}
