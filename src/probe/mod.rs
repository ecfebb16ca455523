// src/probe/mod.rs
// =============================================================================
// This module contains all probing logic.
//
// Submodules:
// - error: the typed probe error taxonomy
// - result: the immutable record of one finished request
// - request: the Requester capability and prepared GET requests
// - extract: resource discovery in fetched HTML bodies
// - collector: the concurrent dispatch / result aggregation engine
// - page: orchestration of a full page probe over the pieces above
//
// This file (mod.rs) is the module root - it re-exports the public API the
// rest of the application uses.
// =============================================================================

mod collector;
mod error;
mod extract;
mod page;
mod request;
mod result;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export the items the rest of the application uses so callers can write
// `probe::ProbeRequest` instead of `probe::request::ProbeRequest`
pub use page::{probe_page, PageReport};
pub use request::{HttpRequester, ProbeRequest, Requester, RequesterSettings};
