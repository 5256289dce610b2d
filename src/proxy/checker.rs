//! Proxy checker: validation, dispatch and classification of a single check

use crate::error::CheckError;
use crate::proxy::classifier::classify;
use crate::proxy::geo::DEFAULT_TARGET_URL;
use crate::proxy::models::{ProbeOutcome, ProxyEndpoint};
use crate::proxy::transport::Transport;
use crate::proxy::validator::CheckRequest;
use std::time::{Duration, Instant};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Default timeout for the whole probe in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Shortest probe timeout accepted by the builder
pub const MIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Configuration for proxy checks
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Wall-clock bound for the whole probe
    pub timeout: Duration,
    /// Bound for establishing the connection to the proxy
    pub connect_timeout: Duration,
    /// Geolocation endpoint requested through the proxy
    pub target_url: String,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            target_url: DEFAULT_TARGET_URL.to_string(),
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the probe timeout, clamped to [`MIN_TIMEOUT`]; the connect timeout
    /// never exceeds it
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let timeout = timeout.max(MIN_TIMEOUT);
        self.timeout = timeout;
        self.connect_timeout = self.connect_timeout.min(timeout);
        self
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout.max(MIN_TIMEOUT).min(self.timeout);
        self
    }

    pub fn with_target_url(mut self, url: String) -> Self {
        self.target_url = url;
        self
    }
}

/// Checks one proxy per call; holds nothing but its configuration
#[derive(Debug, Clone, Default)]
pub struct ProxyChecker {
    config: CheckerConfig,
}

impl ProxyChecker {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    /// Validate a raw request and check the proxy it describes
    ///
    /// Validation errors are returned before any network activity.
    pub async fn check(&self, request: &CheckRequest) -> Result<ProbeOutcome, CheckError> {
        let endpoint = request.validate()?;
        Ok(self.check_endpoint(&endpoint).await)
    }

    /// Probe a validated endpoint once
    pub async fn check_endpoint(&self, endpoint: &ProxyEndpoint) -> ProbeOutcome {
        let span = info_span!(
            "proxy_check",
            check_id = %Uuid::new_v4(),
            protocol = %endpoint.protocol,
            proxy = %endpoint.address(),
        );

        async {
            let transport = Transport::for_endpoint(endpoint);
            let start = Instant::now();
            let outcome = classify(transport.probe(&self.config).await);
            let elapsed_ms = start.elapsed().as_millis() as u64;

            match &outcome {
                ProbeOutcome::Success(location) => info!(
                    elapsed_ms,
                    exit_ip = location.ip.as_deref().unwrap_or("-"),
                    "proxy is working"
                ),
                ProbeOutcome::Failure(failure) => warn!(
                    elapsed_ms,
                    kind = ?failure.kind,
                    reason = %failure.message,
                    "proxy check failed"
                ),
            }

            outcome
        }
        .instrument(span)
        .await
    }
}
