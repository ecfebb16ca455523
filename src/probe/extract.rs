// src/probe/extract.rs
// =============================================================================
// This module discovers resource references in a fetched HTML body.
//
// We use the `scraper` crate (html5ever underneath) to parse the document
// and collect the value of every `href` and `src` attribute, on any element,
// in document order. Nothing is filtered or de-duplicated here: if a page
// references the same stylesheet twice, we report it twice, just like a
// browser would request it.
//
// Extraction is best-effort by construction: html5ever recovers from
// malformed markup instead of failing, so a truncated or broken document
// yields whatever references were still recognizable - never an error.
// =============================================================================

use scraper::{Html, Selector};
use url::Url;

// Returns every href/src attribute value in the body, in document order
//
// The returned strings are raw attribute values; resolving them against the
// page URL is the caller's job (see resolve_resource_url).
pub fn extract_resource_urls(body: &str) -> Vec<String> {
    let document = Html::parse_document(body);

    // Constant selector, known valid - a panic here would be a programmer
    // error, not an input error.
    let selector = Selector::parse("[href], [src]").unwrap();

    let mut resources = Vec::new();
    for element in document.select(&selector) {
        // An element can carry both attributes; keep both, href first.
        if let Some(href) = element.value().attr("href") {
            resources.push(href.to_string());
        }
        if let Some(src) = element.value().attr("src") {
            resources.push(src.to_string());
        }
    }

    resources
}

// Resolves a raw attribute value against the page it came from
//
// Absolute URLs pass through untouched; relative ones are joined against the
// base the way a browser resolves them. A value we cannot make sense of is
// returned verbatim: the dispatcher will still probe it and record a
// configuration error, so no discovered resource is ever silently dropped.
pub fn resolve_resource_url(base: &Url, raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => url.to_string(),
        Err(_) => match base.join(raw) {
            Ok(url) => url.to_string(),
            Err(_) => raw.to_string(),
        },
    }
}
