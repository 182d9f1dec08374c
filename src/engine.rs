// Async HTTP engine for handlehunt
// Uses reqwest and tokio; every probe is gated by the concurrency controller

use reqwest::Client;
use tracing::{debug, warn};

use crate::config::ScanConfig;
use crate::error::{ProbeError, ScanError};
use crate::limiter::ConcurrencyController;
use crate::models::{ProbeRequest, RuleRecord, ScanResult};
use crate::verdict::evaluate_policy;

/// HTTP client plus admission control for one batch.
pub struct ProbeEngine {
    pub client: Client,
    controller: ConcurrencyController,
}

impl ProbeEngine {
    /// Build the batch client. Failure here is fatal to the batch.
    pub fn new(config: &ScanConfig) -> Result<Self, ScanError> {
        let controller = ConcurrencyController::new(config.concurrency, config.timeout)?;
        // Targets are third-party sites, often with broken certificates.
        let client = Client::builder()
            .pool_max_idle_per_host(config.concurrency)
            .connect_timeout(config.timeout)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| ScanError::BatchFailure(e.to_string()))?;
        Ok(Self { client, controller })
    }

    pub fn controller(&self) -> &ConcurrencyController {
        &self.controller
    }

    /// Send one request and read the whole body, bounded by the per-request timeout.
    pub async fn send(&self, request: &ProbeRequest) -> Result<(u16, String), ProbeError> {
        let timeout = self.controller.timeout();
        let mut req = self
            .client
            .request(request.method.into(), &request.url)
            .timeout(timeout);
        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }

        let exchange = async {
            let resp = req.send().await?;
            let status = resp.status().as_u16();
            let body = resp.text().await?;
            Ok::<_, reqwest::Error>((status, body))
        };

        match tokio::time::timeout(timeout, exchange).await {
            Ok(Ok(observed)) => Ok(observed),
            Ok(Err(e)) => Err(ProbeError::from(e)),
            Err(_) => Err(ProbeError::Timeout),
        }
    }

    /// Probe one site. Request failures become errored results, never `Err`.
    pub async fn probe(&self, rule: &RuleRecord, request: ProbeRequest) -> Result<ScanResult, ScanError> {
        let _slot = self.controller.acquire().await?;
        debug!(site = %rule.name, method = %request.method, url = %request.url, "probing");

        let result = match self.send(&request).await {
            Ok((status, body)) => {
                let (policy, found) = evaluate_policy(rule, status, &body);
                debug!(site = %rule.name, status, ?policy, found, "verdict");
                ScanResult::checked(rule, request.url, status, found)
            }
            Err(err) => {
                warn!(site = %rule.name, url = %request.url, "probe failed: {}", err);
                ScanResult::failed(rule, request.url, err)
            }
        };
        Ok(result)
    }
}
