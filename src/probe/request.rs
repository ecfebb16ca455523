// src/probe/request.rs
// =============================================================================
// This module owns outbound requests.
//
// Three pieces live here:
// - Requester: the capability trait for "perform one HTTP GET". The real
//   implementation wraps reqwest; tests swap in a fake.
// - HttpRequester: two pre-built immutable reqwest clients (verifying and
//   certificate-trusting). Which one serves a URL is decided per request from
//   plain configuration - no client is ever reconfigured after construction.
// - ProbeRequest: one prepared GET against one URL. Execution never panics
//   and never loses an outcome: whatever happens becomes a ProbeResult.
//
// Security policy (deliberate, for probing only): a URL without the https
// scheme - or any URL when --insecure is set - is served by the trusting
// client, which skips certificate verification. This keeps self-signed and
// staging endpoints probeable. It is not a recommendation for production
// traffic.
// =============================================================================

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::redirect::Policy;
use tokio::sync::mpsc;
use url::Url;

use super::error::ProbeError;
use super::result::ProbeResult;

/// Per-request timeout applied when the CLI does not override it
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// Follow up to this many redirects before reporting a redirect loop
const REDIRECT_LIMIT: usize = 5;

const SCHEME_SECURE: &str = "https";

// Plain configuration for building a requester
//
// Replaces any notion of mutating a shared client mid-run: the two clients
// are built once from these values and never touched again.
#[derive(Debug, Clone, Copy)]
pub struct RequesterSettings {
    /// Skip certificate verification for every request, not just non-https ones
    pub insecure: bool,
    /// Timeout applied to each individual request
    pub timeout: Duration,
}

impl Default for RequesterSettings {
    fn default() -> Self {
        RequesterSettings {
            insecure: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

// The capability every probe executes against
//
// A Requester must be safe to share across concurrent dispatches; all our
// implementations are read-only after construction.
#[async_trait]
pub trait Requester: Send + Sync {
    /// Performs one HTTP GET and returns the response or a classified error
    async fn get(&self, url: &Url) -> Result<reqwest::Response, ProbeError>;
}

// The reqwest-backed Requester used by the CLI
pub struct HttpRequester {
    /// Standard client, full certificate verification
    verifying: reqwest::Client,
    /// Client that accepts invalid certificates (self-signed, expired, ...)
    trusting: reqwest::Client,
    /// When set, every request uses the trusting client
    force_insecure: bool,
}

impl HttpRequester {
    /// Builds both clients up front from the given settings
    pub fn new(settings: RequesterSettings) -> Result<Self> {
        let verifying = reqwest::Client::builder()
            .timeout(settings.timeout)
            .redirect(Policy::limited(REDIRECT_LIMIT))
            .build()
            .context("failed to build verifying HTTP client")?;

        let trusting = reqwest::Client::builder()
            .timeout(settings.timeout)
            .redirect(Policy::limited(REDIRECT_LIMIT))
            .danger_accept_invalid_certs(true)
            .build()
            .context("failed to build certificate-trusting HTTP client")?;

        Ok(HttpRequester {
            verifying,
            trusting,
            force_insecure: settings.insecure,
        })
    }

    // The scheme/security policy in one place
    //
    // Non-https URLs get the trusting client: the scheme already opted out of
    // verified transport, so an http:// resource on an https page must not
    // fail the whole page probe on certificate grounds after a redirect.
    fn serves_insecurely(&self, url: &Url) -> bool {
        self.force_insecure || url.scheme() != SCHEME_SECURE
    }

    fn client_for(&self, url: &Url) -> &reqwest::Client {
        if self.serves_insecurely(url) {
            &self.trusting
        } else {
            &self.verifying
        }
    }
}

#[async_trait]
impl Requester for HttpRequester {
    async fn get(&self, url: &Url) -> Result<reqwest::Response, ProbeError> {
        let response = self.client_for(url).get(url.clone()).send().await?;
        Ok(response)
    }
}

// One prepared GET against one URL
//
// URL validation happens eagerly here. A bad URL does not make construction
// fail - it is remembered and surfaces as the result's error on exec, so the
// dispatcher can treat every discovered resource uniformly.
pub struct ProbeRequest {
    requester: Arc<dyn Requester>,
    target: Result<Url, ProbeError>,
    raw_url: String,
}

// A probe outcome plus optionally captured response data
//
// Only the base page probe captures headers and body; resource probes keep
// just the ProbeResult.
pub struct ProbeExchange {
    pub result: ProbeResult,
    pub headers: Option<HeaderMap>,
    pub body: Option<String>,
}

impl ProbeRequest {
    /// Prepares a GET for the given URL, sharing the given requester
    pub fn get(url: &str, requester: Arc<dyn Requester>) -> Self {
        let target = prepare_url(url);
        ProbeRequest {
            requester,
            target,
            raw_url: url.to_string(),
        }
    }

    /// Executes the request and returns its outcome; never fails outright
    pub async fn exec(&self) -> ProbeResult {
        self.run(false).await.result
    }

    /// Executes the request, additionally retaining headers and body text
    pub async fn exec_capture(&self) -> ProbeExchange {
        self.run(true).await
    }

    /// Executes the request and sends its single result on the channel
    ///
    /// The channel belongs to the caller: this never closes it and sends
    /// exactly once. A dropped receiver means the collector was torn down,
    /// in which case the result has nowhere to go and is discarded.
    pub async fn exec_async(self, tx: mpsc::Sender<ProbeResult>) {
        let result = self.exec().await;
        let _ = tx.send(result).await;
    }

    async fn run(&self, capture: bool) -> ProbeExchange {
        let url = match &self.target {
            Ok(url) => url,
            Err(error) => {
                // The request was never buildable; report that instead of an
                // ambiguous status.
                return ProbeExchange {
                    result: ProbeResult::failed(
                        self.raw_url.clone(),
                        error.clone(),
                        Duration::ZERO,
                    ),
                    headers: None,
                    body: None,
                };
            }
        };

        let start = Instant::now();
        let sent = self.requester.get(url).await;
        // Timing covers dispatch up to response headers (or failure); body
        // download is a separate concern of the capturing caller.
        let timing = start.elapsed();

        match sent {
            Ok(response) => {
                let status = response.status().as_u16();
                let headers = if capture {
                    Some(response.headers().clone())
                } else {
                    None
                };
                let body = if capture {
                    response.text().await.ok()
                } else {
                    None
                };

                ProbeExchange {
                    result: ProbeResult::completed(url.to_string(), status, timing),
                    headers,
                    body,
                }
            }
            Err(error) => ProbeExchange {
                result: ProbeResult::failed(url.to_string(), error, timing),
                headers: None,
                body: None,
            },
        }
    }
}

// Validates a raw URL into a probe target
//
// Blank input means the request was never really configured; anything that
// parses but is not plain HTTP(S) cannot be probed either.
fn prepare_url(raw: &str) -> Result<Url, ProbeError> {
    if raw.trim().is_empty() {
        return Err(ProbeError::NotConfigured);
    }

    let url = Url::parse(raw).map_err(|e| ProbeError::configuration(raw, e.to_string()))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ProbeError::configuration(
            raw,
            format!("unsupported scheme '{}'", other),
        )),
    }
}
