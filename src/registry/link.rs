//! `Link` header pagination
//!
//! Registries are supposed to send RFC 5988 links such as
//!
//! ```text
//! <http://registry.example.com/v2/_catalog?n=5&last=tag5>; type="application/json"; rel="next"
//! ```
//!
//! but in the wild the angle brackets are sometimes missing (quay.io) and the
//! `rel` value is not always quoted, so matching is deliberately permissive.

use crate::error::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::{HeaderMap, LINK};
use url::Url;

static NEXT_LINK_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#" *<?([^;>]+)>? *(?:;[^;]*)*; *rel="?(?i:next)\b"?"#)
        .expect("Invalid next link regex")
});

/// Resolve the next page URL from the `Link` headers of a response.
///
/// Every header value may hold several comma separated links. The first link
/// carrying `rel=next` wins and is resolved against `base`. `Ok(None)` means
/// there are no more pages.
pub fn next_link(base: &str, headers: &HeaderMap) -> Result<Option<String>> {
    for value in headers.get_all(LINK) {
        let Ok(value) = value.to_str() else {
            continue;
        };

        if let Some(reference) = find_next_reference(value) {
            let resolved = Url::parse(base)?.join(reference)?;
            return Ok(Some(resolved.to_string()));
        }
    }

    Ok(None)
}

/// The raw URL reference of the `rel=next` link within one header value
fn find_next_reference(value: &str) -> Option<&str> {
    value.split(',').find_map(|segment| {
        NEXT_LINK_PATTERN
            .captures(segment)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
    })
}
