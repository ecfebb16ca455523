// src/probe/testutil.rs
// =============================================================================
// Test-only fakes for the probe modules.
//
// FakeRequester satisfies the Requester trait without touching the network.
// It serves a default canned response and supports per-URL routing so a page
// test can hand out HTML for the base document while failing selected
// resources. Responses are fabricated through http::Response, which reqwest
// accepts via From.
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::error::{ProbeError, TransportKind};
use super::request::Requester;

// What the fake should answer for a matching URL
#[derive(Clone)]
enum CannedResponse {
    Ok {
        status: u16,
        body: String,
        content_type: Option<&'static str>,
    },
    Fail {
        kind: TransportKind,
        message: String,
    },
}

pub(crate) struct FakeRequester {
    default: CannedResponse,
    // (url substring, response) pairs checked in order before the default
    routes: Vec<(String, CannedResponse)>,
    delay: Option<Duration>,
    hits: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl FakeRequester {
    /// Always answers with the given status and plain body
    pub fn ok(status: u16, body: &str) -> Self {
        Self::with_default(CannedResponse::Ok {
            status,
            body: body.to_string(),
            content_type: None,
        })
    }

    /// Always answers with the given status and an HTML body
    pub fn ok_html(status: u16, body: &str) -> Self {
        Self::with_default(CannedResponse::Ok {
            status,
            body: body.to_string(),
            content_type: Some("text/html"),
        })
    }

    /// Always fails with the given transport error
    pub fn failing(kind: TransportKind, message: &str) -> Self {
        Self::with_default(CannedResponse::Fail {
            kind,
            message: message.to_string(),
        })
    }

    fn with_default(default: CannedResponse) -> Self {
        FakeRequester {
            default,
            routes: Vec::new(),
            delay: None,
            hits: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// URLs containing `url_part` fail with the given transport error
    pub fn route_fail(mut self, url_part: &str, kind: TransportKind) -> Self {
        self.routes.push((
            url_part.to_string(),
            CannedResponse::Fail {
                kind,
                message: format!("simulated {:?} failure", kind),
            },
        ));
        self
    }

    /// Adds a fixed artificial latency to every answered request
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// How many requests reached this fake
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// The URLs this fake was asked for, in arrival order
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }

    fn response_for(&self, url: &Url) -> CannedResponse {
        let target = url.as_str();
        for (part, response) in &self.routes {
            if target.contains(part.as_str()) {
                return response.clone();
            }
        }
        self.default.clone()
    }
}

#[async_trait]
impl Requester for FakeRequester {
    async fn get(&self, url: &Url) -> Result<reqwest::Response, ProbeError> {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.response_for(url) {
            CannedResponse::Fail { kind, message } => Err(ProbeError::transport(kind, message)),
            CannedResponse::Ok {
                status,
                body,
                content_type,
            } => {
                let mut builder = http::Response::builder().status(status);
                if let Some(content_type) = content_type {
                    builder = builder.header("content-type", content_type);
                }
                let response = builder.body(body).expect("fake response must build");
                Ok(reqwest::Response::from(response))
            }
        }
    }
}
