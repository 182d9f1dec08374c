// Verdict engine for handlehunt
// Decides whether an account exists from a site's HTTP status and response body

use crate::models::RuleRecord;

/// Status codes the fallback treats as "account absent".
pub const FALLBACK_MISSING_STATUSES: &[u16] = &[404, 410, 403, 400];

/// Which branch of the decision policy produced a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    ExpectCode,
    MissingCode,
    MissingString,
    Fallback,
}

/// Apply the rule's decision policy to an observed response.
///
/// Branches are tried in a fixed order and the first applicable one wins:
/// 1. `expect_code` matches the status: found unless `expect_string` is set and absent from the body
/// 2. `missing_code` matches the status: not found
/// 3. `missing_string` occurs in the body: not found
/// 4. otherwise found unless the status is 404, 410, 403 or 400
///
/// A positive content match therefore beats any "missing" signal.
/// The fallback reports sites that answer 200 for every username as hits.
pub fn evaluate_policy(rule: &RuleRecord, status: u16, body: &str) -> (Policy, bool) {
    if rule.expect_code == Some(status) {
        let found = match rule.expect_string() {
            Some(expected) => body.contains(expected),
            None => true,
        };
        return (Policy::ExpectCode, found);
    }

    if rule.missing_code == Some(status) {
        return (Policy::MissingCode, false);
    }

    if let Some(missing) = rule.missing_string() {
        if body.contains(missing) {
            return (Policy::MissingString, false);
        }
    }

    (Policy::Fallback, !FALLBACK_MISSING_STATUSES.contains(&status))
}

pub fn decide_verdict(rule: &RuleRecord, status: u16, body: &str) -> bool {
    evaluate_policy(rule, status, body).1
}
