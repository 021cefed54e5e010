//! Minimal relative-reference resolution against a page origin.
//!
//! This is plain string joining, not RFC 3986 resolution: no dot segments
//! are collapsed and path-relative references are treated as root-relative.

/// `scheme://host` of `url`, i.e. its first three `/`-delimited segments.
pub fn origin_of(url: &str) -> String {
    url.split('/').take(3).collect::<Vec<_>>().join("/")
}

pub fn is_absolute(candidate: &str) -> bool {
    candidate.starts_with("http://") || candidate.starts_with("https://")
}

pub fn resolve(candidate: &str, base_origin: &str) -> String {
    if is_absolute(candidate) {
        return candidate.to_string();
    }
    format!(
        "{}/{}",
        base_origin.trim_end_matches('/'),
        candidate.trim_start_matches('/')
    )
}
