// Scan orchestration for handlehunt
// Builds requests, fans probes out on a task set, and joins them before aggregating

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::{Id, JoinSet};
use tracing::{debug, info, warn};

use crate::aggregate::aggregate;
use crate::config::ScanConfig;
use crate::engine::ProbeEngine;
use crate::error::{ProbeError, ScanError};
use crate::models::{RuleRecord, ScanReport, ScanResult};
use crate::request::build_request;

/// Receives advisory progress updates while a batch runs.
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize);
}

/// Emits roughly every tenth of the batch, plus at completion.
struct ProgressTracker {
    observer: Option<Arc<dyn ProgressObserver>>,
    completed: usize,
    total: usize,
    step: usize,
}

impl ProgressTracker {
    fn new(observer: Option<Arc<dyn ProgressObserver>>, total: usize) -> Self {
        Self {
            observer,
            completed: 0,
            total,
            step: (total / 10).max(1),
        }
    }

    fn advance(&mut self) {
        self.completed += 1;
        if let Some(observer) = &self.observer {
            if self.completed % self.step == 0 || self.completed == self.total {
                observer.on_progress(self.completed, self.total);
            }
        }
    }
}

/// What a spawned probe was working on, kept so a failed task still yields a result.
struct Dispatched {
    index: usize,
    rule: RuleRecord,
    url: String,
}

/// Join every task, turning task failures into errored results for their own site.
///
/// Results come back in catalog order.
async fn join_dispatched(
    mut tasks: JoinSet<Result<ScanResult, ScanError>>,
    mut dispatched: HashMap<Id, Dispatched>,
    tracker: &mut ProgressTracker,
) -> Vec<ScanResult> {
    let mut collected: Vec<(usize, ScanResult)> = Vec::with_capacity(dispatched.len());
    while let Some(joined) = tasks.join_next_with_id().await {
        let (id, outcome) = match joined {
            Ok((id, outcome)) => (id, outcome.map_err(|e| e.to_string())),
            Err(e) => (e.id(), Err(e.to_string())),
        };
        let Some(unit) = dispatched.remove(&id) else {
            continue;
        };
        let result = match outcome {
            Ok(result) => result,
            Err(message) => {
                warn!(site = %unit.rule.name, url = %unit.url, "probe task failed: {}", message);
                ScanResult::failed(&unit.rule, unit.url, ProbeError::network(message))
            }
        };
        collected.push((unit.index, result));
        tracker.advance();
    }

    // Completion order is arbitrary; hand results back in catalog order.
    collected.sort_by_key(|(index, _)| *index);
    collected.into_iter().map(|(_, r)| r).collect()
}

/// Runs one batch of probes for one target.
pub struct Scanner {
    config: ScanConfig,
    progress: Option<Arc<dyn ProgressObserver>>,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    pub fn with_progress(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.progress = Some(observer);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Probe every well-formed record and aggregate the results.
    ///
    /// Records without a placeholder are skipped before dispatch. Every dispatched probe
    /// finishes (with a verdict or a classified error) before the report is built.
    /// The HTTP client lives only for this call.
    pub async fn scan(&self, target: &str, records: &[RuleRecord]) -> Result<ScanReport, ScanError> {
        let engine = Arc::new(ProbeEngine::new(&self.config)?);
        info!(
            account = target,
            records = records.len(),
            concurrency = self.config.concurrency,
            timeout_secs = self.config.timeout.as_secs(),
            "starting batch"
        );

        let mut tasks = JoinSet::new();
        let mut dispatched = HashMap::new();
        let mut skipped = 0usize;
        for (index, rule) in records.iter().enumerate() {
            let request = match build_request(rule, target) {
                Ok(request) => request,
                Err(skip) => {
                    debug!("skipping: {}", skip);
                    skipped += 1;
                    continue;
                }
            };
            let url = request.url.clone();
            let engine = engine.clone();
            let task_rule = rule.clone();
            let handle = tasks.spawn(async move { engine.probe(&task_rule, request).await });
            dispatched.insert(
                handle.id(),
                Dispatched {
                    index,
                    rule: rule.clone(),
                    url,
                },
            );
        }

        let dispatched_count = tasks.len();
        let mut tracker = ProgressTracker::new(self.progress.clone(), dispatched_count);
        let results = join_dispatched(tasks, dispatched, &mut tracker).await;

        let report = aggregate(target, results, skipped);
        info!(
            account = target,
            dispatched = dispatched_count,
            skipped,
            found = report.total_found,
            errors = report.total_errors,
            peak_in_flight = engine.controller().peak_in_flight(),
            "batch finished"
        );
        Ok(report)
    }
}
