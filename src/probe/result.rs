// src/probe/result.rs
// =============================================================================
// This module defines the record of one finished probe.
//
// A ProbeResult is immutable once built. It captures:
// - which URL was requested
// - the HTTP status (None when no response was obtained at all)
// - how long the request took (monotonic clock, dispatch to completion)
// - the error, if the request did not complete successfully
//
// The error field is authoritative: a result with error.is_some() counts as
// errored even if some status metadata happened to be captured first.
// =============================================================================

use std::time::Duration;

use serde::{Serialize, Serializer};

use super::error::ProbeError;

// The outcome of a single probed request
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    /// The resolved, absolute URL that was requested
    pub url: String,
    /// HTTP status code; None means no response was obtained
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// Time from dispatch to completion
    #[serde(serialize_with = "serialize_millis", rename = "timing_ms")]
    pub timing: Duration,
    /// Present iff the request did not complete successfully
    ///
    /// serde(flatten) merges the tagged error fields into this record;
    /// None simply contributes nothing to the output.
    #[serde(flatten)]
    pub error: Option<ProbeError>,
}

impl ProbeResult {
    /// Builds a successful result from a received response status
    pub fn completed(url: String, status: u16, timing: Duration) -> Self {
        ProbeResult {
            url,
            status: Some(status),
            timing,
            error: None,
        }
    }

    /// Builds an errored result; status stays None (no response obtained)
    pub fn failed(url: String, error: ProbeError, timing: Duration) -> Self {
        ProbeResult {
            url,
            status: None,
            timing,
            error: Some(error),
        }
    }

    /// True when the request completed without error
    ///
    /// The error field decides this, not the status code: a 404 is still a
    /// completed request, while a timeout is not.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Human-readable one-liner for console output
    ///
    /// Successful: "  142ms  200 - https://example.com/app.js"
    /// Errored:    "  error requesting [ https://example.com/app.js ]: ..."
    pub fn summary(&self) -> String {
        match &self.error {
            None => format!(
                "{:>6}ms {:>5} - {}",
                self.timing.as_millis(),
                self.status.map_or_else(|| "-".to_string(), |s| s.to_string()),
                self.url,
            ),
            Some(err) => format!("error requesting [ {} ]: {}", self.url, err),
        }
    }
}

// Serializes a Duration as whole milliseconds for --json output
fn serialize_millis<S: Serializer>(timing: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(timing.as_millis() as u64)
}
