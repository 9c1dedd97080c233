//! Cleaning of untrusted feed fields.
//!
//! Both functions are pure: a malformed value is a data-quality outcome
//! (`None`), never an error.

use url::Url;

/// Clean a free-text field from the feed.
///
/// Strips C0 control characters and DEL, trims surrounding whitespace, and
/// collapses an empty result to `None`.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    let stripped: String = raw
        .chars()
        .filter(|c| !matches!(c, '\u{00}'..='\u{1f}' | '\u{7f}'))
        .collect();
    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Validate and canonicalize a URL field from the feed.
///
/// Accepts absolute http/https URLs with a host; anything else is `None`.
/// The returned string is the `url` crate's canonical serialization
/// (lowercased scheme and host, default port elided), which is what the
/// store uses as the dedup identity.
pub fn clean_url(raw: Option<&str>) -> Option<String> {
    let raw = raw?.trim();
    let url = Url::parse(raw).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str()?;
    Some(url.into())
}
