// src/probe/page.rs
// =============================================================================
// This module orchestrates a full page probe.
//
// Sequence:
// 1. Execute the base request (capturing headers and body).
// 2. If the base request failed, abort right away - no resource is resolved.
// 3. Extract every href/src reference from the body, resolve each against
//    the base URL, and dispatch all of them (N >= 0) on a fresh collector
//    sharing the same requester.
// 4. wait() for the collector, then derive the aggregate report.
//
// The base request completing strictly before any dispatch is guaranteed by
// this sequence, not by the collector.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::header::HeaderMap;
use url::Url;

use super::collector::{ResourceCollector, ResultSet};
use super::extract::{extract_resource_urls, resolve_resource_url};
use super::request::{ProbeRequest, Requester};
use super::result::ProbeResult;

// Aggregate outcome of one page probe
pub struct PageReport {
    /// Outcome of the base document request
    pub base: ProbeResult,
    /// Response headers of the base document (for --show-headers)
    pub headers: Option<HeaderMap>,
    /// Every resource request's outcome, partitioned
    pub resources: ResultSet,
}

impl PageReport {
    /// The successful resource request with the longest timing, if any
    pub fn longest_successful(&self) -> Option<&ProbeResult> {
        self.resources.longest_successful()
    }

    /// Estimated total page load time
    ///
    /// Base timing plus the longest successful resource request - resources
    /// load concurrently, so the slowest one dominates. With no successful
    /// resource this is the base timing alone.
    pub fn total_estimate(&self) -> Duration {
        let longest = self
            .longest_successful()
            .map(|result| result.timing)
            .unwrap_or(Duration::ZERO);
        self.base.timing + longest
    }
}

// Probes a page: base document first, then all of its embedded resources
//
// A base-request failure aborts the probe and surfaces immediately.
// Resource-level failures never do - they are collected as errored results.
pub async fn probe_page(url: &str, requester: Arc<dyn Requester>) -> Result<PageReport> {
    let base_request = ProbeRequest::get(url, requester.clone());
    let exchange = base_request.exec_capture().await;

    if let Some(error) = &exchange.result.error {
        return Err(error.clone().into());
    }

    // The base result's URL is the one that was actually probed; resolve
    // resource references against it.
    let base_url = Url::parse(&exchange.result.url)?;
    let body = exchange.body.unwrap_or_default();

    let mut collector = ResourceCollector::new();
    for raw in extract_resource_urls(&body) {
        let resolved = resolve_resource_url(&base_url, &raw);
        collector.dispatch(requester.clone(), &resolved);
    }

    let resources = collector.wait().await?;

    Ok(PageReport {
        base: exchange.result,
        headers: exchange.headers,
        resources,
    })
}
