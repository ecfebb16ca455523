// src/probe/error.rs
// =============================================================================
// This module defines the error taxonomy for probing.
//
// Three things can go wrong with a probe:
// - Configuration: the request was never buildable (bad URL, non-HTTP scheme)
// - Transport: the request went out but failed (DNS, connect, timeout, TLS)
// - NotConfigured: exec was called on a request that was never prepared
//
// Extraction parse problems are NOT here on purpose: resource extraction is
// best-effort and recovers locally, so a parse issue never becomes an error
// value (see probe/extract.rs).
//
// Every variant carries plain owned data (no reqwest::Error inside) so that
// results stay Clone + Serialize and tests can fabricate any failure mode.
// =============================================================================

use serde::Serialize;
use thiserror::Error;

// Broad classification of a transport failure
//
// Mirrors the failure modes reqwest can report. Knowing the kind lets the
// summary output say "timed out" instead of dumping a full error chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Request exceeded the client timeout
    Timeout,
    /// Hostname could not be resolved
    Dns,
    /// TCP connection could not be established
    Connect,
    /// TLS handshake / certificate verification failed
    Tls,
    /// Redirect limit exceeded (redirect loop)
    TooManyRedirects,
    /// Anything else
    Other,
}

// The probe error type
//
// `error.is_some()` on a ProbeResult is authoritative: whatever status
// metadata coexists with one of these, the probe counts as errored.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ProbeError {
    /// The request could never be built from the given URL
    #[error("cannot build request for '{url}': {message}")]
    Configuration { url: String, message: String },

    /// The request was sent but did not complete successfully
    #[error("request failed: {message}")]
    Transport { kind: TransportKind, message: String },

    /// Exec was called without a prepared request
    #[error("request not configured, check the probe url")]
    NotConfigured,
}

impl ProbeError {
    /// Configuration error for a URL that failed to parse or validate
    pub fn configuration(url: &str, message: impl Into<String>) -> Self {
        ProbeError::Configuration {
            url: url.to_string(),
            message: message.into(),
        }
    }

    /// Transport error with an explicit kind (used by tests and adapters)
    pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        ProbeError::Transport {
            kind,
            message: message.into(),
        }
    }
}

// Classifies a reqwest error into our taxonomy
//
// reqwest reports timeouts and redirect loops directly; DNS and TLS failures
// only show up in the error text, so we sniff for them the same way the
// status categorizer in link checkers does.
impl From<reqwest::Error> for ProbeError {
    fn from(error: reqwest::Error) -> Self {
        let message = error.to_string();

        let kind = if error.is_timeout() {
            TransportKind::Timeout
        } else if error.is_redirect() {
            TransportKind::TooManyRedirects
        } else if error.is_connect() {
            if message.contains("dns") {
                TransportKind::Dns
            } else {
                TransportKind::Connect
            }
        } else if message.contains("certificate") || message.contains("ssl") {
            TransportKind::Tls
        } else {
            TransportKind::Other
        };

        ProbeError::Transport { kind, message }
    }
}
