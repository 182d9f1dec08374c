/// Integration tests for the scanner against a local stub server
/// Covers verdicts over HTTP, error classification, skipping and concurrency bounds
mod common;

use common::{Canned, StubServer};
use handlehunt::config::ScanConfig;
use handlehunt::error::ProbeError;
use handlehunt::models::{RuleRecord, ScanReport, ScanResult};
use handlehunt::scanner::{ProgressObserver, Scanner};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn fast_config(concurrency: usize) -> ScanConfig {
    ScanConfig {
        concurrency,
        timeout: Duration::from_millis(2000),
    }
}

fn rule(server: &StubServer, name: &str, category: &str, path: &str) -> RuleRecord {
    RuleRecord::new(name, category, &server.url(path))
}

fn result<'a>(report: &'a ScanReport, name: &str) -> &'a ScanResult {
    report
        .results
        .iter()
        .find(|r| r.name == name)
        .unwrap_or_else(|| panic!("no result for {}", name))
}

#[tokio::test]
async fn verdicts_follow_rule_policy() {
    let server = StubServer::start().await;
    server.route("/expect/alice", Canned::new(200, "user profile page... not found elsewhere"));
    server.route("/wrongstring/alice", Canned::new(200, "<html>login</html>"));
    server.route("/mstring/alice", Canned::new(200, "Sorry, this page isn't available"));
    server.route("/fallback-ok/alice", Canned::new(200, "hello"));
    server.route("/fallback-gone/alice", Canned::new(410, "gone"));

    let mut expect = rule(&server, "Expect", "social", "/expect/{account}");
    expect.expect_code = Some(200);
    expect.expect_string = Some("profile".to_string());
    expect.missing_string = Some("not found".to_string());

    let mut wrong = rule(&server, "WrongString", "social", "/wrongstring/{account}");
    wrong.expect_code = Some(200);
    wrong.expect_string = Some("\"username\"".to_string());

    let mut mstring = rule(&server, "MissingString", "social", "/mstring/{account}");
    mstring.missing_string = Some("isn't available".to_string());

    let records = vec![
        expect,
        wrong,
        mstring,
        rule(&server, "FallbackOk", "misc", "/fallback-ok/{account}"),
        rule(&server, "FallbackGone", "misc", "/fallback-gone/{account}"),
    ];

    let report = Scanner::new(fast_config(3)).scan("alice", &records).await.unwrap();

    assert!(result(&report, "Expect").found);
    assert!(!result(&report, "WrongString").found);
    assert!(!result(&report, "MissingString").found);
    assert!(result(&report, "FallbackOk").found);
    assert!(!result(&report, "FallbackGone").found);
    assert_eq!(result(&report, "FallbackGone").status, Some(410));
    assert_eq!(report.total_evaluated, 5);
    assert_eq!(report.total_errors, 0);
    assert_eq!(report.total_found, 2);
}

#[tokio::test]
async fn missing_code_rule_over_http() {
    // Redirects are followed by the client, so use a non-redirect status here
    let server = StubServer::start().await;
    server.route("/mcode/bob", Canned::new(406, ""));
    let mut r = rule(&server, "MissingCode", "social", "/mcode/{account}");
    r.missing_code = Some(406);

    let report = Scanner::new(fast_config(1)).scan("bob", &[r]).await.unwrap();
    assert!(!report.results[0].found);
    assert_eq!(report.results[0].status, Some(406));
}

#[tokio::test]
async fn post_rules_send_substituted_body_and_headers() {
    let server = StubServer::start().await;
    let mut r = rule(&server, "Api", "coding", "/api/lookup?u={account}");
    server.route("/api/lookup?u=carol", Canned::new(200, "{\"exists\":true}"));
    r.body_template = Some("{\"name\":\"{account}\"}".to_string());
    r.headers
        .insert("Content-Type".to_string(), "application/json".to_string());
    r.expect_code = Some(200);
    r.expect_string = Some("\"exists\":true".to_string());

    let report = Scanner::new(fast_config(2)).scan("carol", &[r]).await.unwrap();
    assert!(report.results[0].found);

    let seen = server.requests();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].method, "POST");
    assert_eq!(seen[0].path, "/api/lookup?u=carol");
    assert_eq!(seen[0].body, "{\"name\":\"carol\"}");
    assert_eq!(seen[0].headers["content-type"], "application/json");
}

#[tokio::test]
async fn default_headers_are_browser_like() {
    let server = StubServer::start().await;
    server.route("/u/dave", Canned::new(200, "ok"));
    let r = rule(&server, "Plain", "misc", "/u/{account}");

    Scanner::new(fast_config(1)).scan("dave", &[r]).await.unwrap();

    let seen = server.requests();
    assert!(seen[0].headers["user-agent"].starts_with("Mozilla/5.0"));
    assert_eq!(seen[0].headers["accept"], "text/html");
    assert_eq!(seen[0].method, "GET");
}

#[tokio::test]
async fn slow_site_times_out_without_affecting_siblings() {
    let server = StubServer::start().await;
    server.route("/slow/erin", Canned::new(200, "late").delayed(Duration::from_secs(3)));
    server.route("/fast/erin", Canned::new(200, "profile"));

    let records = vec![
        rule(&server, "Slow", "social", "/slow/{account}"),
        rule(&server, "Fast", "social", "/fast/{account}"),
    ];
    let config = ScanConfig {
        concurrency: 2,
        timeout: Duration::from_millis(300),
    };
    let report = Scanner::new(config).scan("erin", &records).await.unwrap();

    let slow = result(&report, "Slow");
    assert_eq!(slow.error, Some(ProbeError::Timeout));
    assert!(!slow.found);
    assert_eq!(slow.status, None);
    assert!(result(&report, "Fast").found);
    assert_eq!(report.total_errors, 1);
    assert_eq!(report.total_found, 1);
    assert_eq!(report.total_evaluated, 1);
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let r = RuleRecord::new(
        "Closed",
        "misc",
        &format!("http://127.0.0.1:{}/{{account}}", port),
    );

    let report = Scanner::new(fast_config(1)).scan("frank", &[r]).await.unwrap();
    match &report.results[0].error {
        Some(ProbeError::Network(msg)) => assert!(msg.chars().count() <= 50),
        other => panic!("expected network error, got {:?}", other),
    }
    assert_eq!(report.total_errors, 1);
    assert_eq!(report.total_evaluated, 0);
}

#[tokio::test]
async fn malformed_rules_are_never_requested() {
    let server = StubServer::start().await;
    server.route("/u/grace", Canned::new(200, "ok"));
    server.route("/static", Canned::new(200, "ok"));

    let records = vec![
        rule(&server, "Good", "misc", "/u/{account}"),
        rule(&server, "NoPlaceholder", "misc", "/static"),
    ];
    let report = Scanner::new(fast_config(2)).scan("grace", &records).await.unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.total_evaluated + report.total_errors, 1);
    assert!(server.requests().iter().all(|s| s.path != "/static"));
}

#[tokio::test]
async fn in_flight_never_exceeds_limit() {
    for limit in [1usize, 3, 10] {
        let server = StubServer::start().await;
        let mut records = Vec::new();
        for i in 0..25 {
            let path = format!("/site{}/heidi", i);
            server.route(&path, Canned::new(200, "ok").delayed(Duration::from_millis(20)));
            records.push(rule(&server, &format!("Site{}", i), "misc", &format!("/site{}/{{account}}", i)));
        }

        let report = Scanner::new(fast_config(limit)).scan("heidi", &records).await.unwrap();

        assert!(
            server.peak() <= limit,
            "peak {} exceeded limit {}",
            server.peak(),
            limit
        );
        assert_eq!(report.results.len(), 25);
        assert_eq!(report.total_evaluated, 25);
    }
}

#[tokio::test]
async fn empty_batch_completes() {
    let report = Scanner::new(fast_config(5)).scan("ivan", &[]).await.unwrap();
    assert_eq!(report.total_evaluated, 0);
    assert_eq!(report.total_errors, 0);
    assert!(report.results.is_empty());
}

#[tokio::test]
async fn results_keep_catalog_order_and_group_hits() {
    let server = StubServer::start().await;
    // Earlier sites answer later so completion order differs from catalog order
    server.route("/a/judy", Canned::new(200, "x").delayed(Duration::from_millis(150)));
    server.route("/b/judy", Canned::new(200, "x").delayed(Duration::from_millis(75)));
    server.route("/c/judy", Canned::new(200, "x"));
    server.route("/d/judy", Canned::new(404, "x"));

    let records = vec![
        rule(&server, "A", "social", "/a/{account}"),
        rule(&server, "B", "gaming", "/b/{account}"),
        rule(&server, "C", "social", "/c/{account}"),
        rule(&server, "D", "social", "/d/{account}"),
    ];
    let report = Scanner::new(fast_config(4)).scan("judy", &records).await.unwrap();

    let names: Vec<&str> = report.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B", "C", "D"]);
    assert_eq!(report.by_category.len(), 2);
    assert_eq!(report.by_category["social"].len(), 2);
    assert_eq!(report.by_category["gaming"].len(), 1);
    assert_eq!(report.total_found, 3);
    assert!(report.total_found <= report.total_evaluated);
}

struct Recorder(Mutex<Vec<(usize, usize)>>);

impl ProgressObserver for Recorder {
    fn on_progress(&self, completed: usize, total: usize) {
        self.0.lock().unwrap().push((completed, total));
    }
}

#[tokio::test]
async fn progress_reaches_completion() {
    let server = StubServer::start().await;
    let mut records = Vec::new();
    for i in 0..12 {
        server.route(&format!("/p{}/kim", i), Canned::new(200, "ok"));
        records.push(rule(&server, &format!("P{}", i), "misc", &format!("/p{}/{{account}}", i)));
    }
    let recorder = Arc::new(Recorder(Mutex::new(Vec::new())));

    Scanner::new(fast_config(4))
        .with_progress(recorder.clone())
        .scan("kim", &records)
        .await
        .unwrap();

    let events = recorder.0.lock().unwrap();
    assert_eq!(events.last(), Some(&(12, 12)));
    assert!(events.windows(2).all(|w| w[0].0 < w[1].0));
}
