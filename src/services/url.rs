//! URL policy for stored bookmarks.
//!
//! Bookmarks persist their url without scheme and without trailing slashes.
//! Validation always runs against an absolute url: when the input carries no
//! scheme, `https://` is assumed. The same policy applies to create and edit.

use url::Url;

use crate::types::errors::FormError;

const SCHEMES: [&str; 2] = ["https://", "http://"];

/// Validates `input` and returns the form that is persisted.
pub fn normalize_url(input: &str) -> Result<String, FormError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FormError::EmptyUrl);
    }

    let absolute = if has_scheme(trimmed) {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&absolute).map_err(|e| FormError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(FormError::UnsupportedScheme(other.to_string())),
    }
    if parsed.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(FormError::InvalidUrl(trimmed.to_string()));
    }

    let stored = strip_scheme(trimmed).trim_end_matches('/');
    if stored.is_empty() {
        return Err(FormError::InvalidUrl(trimmed.to_string()));
    }
    Ok(stored.to_string())
}

/// Re-adds a scheme for display and navigation.
pub fn display_url(stored: &str) -> String {
    if has_web_scheme(stored) {
        stored.to_string()
    } else {
        format!("https://{}", stored)
    }
}

/// Whether `s` begins with a `scheme://` prefix. A `://` later in the path or
/// query does not count.
fn has_scheme(s: &str) -> bool {
    match s.find("://") {
        Some(end) => {
            let scheme = &s[..end];
            scheme.chars().next().map(|c| c.is_ascii_alphabetic()).unwrap_or(false)
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}

fn starts_with_scheme(s: &str, scheme: &str) -> bool {
    s.get(..scheme.len())
        .map(|prefix| prefix.eq_ignore_ascii_case(scheme))
        .unwrap_or(false)
}

fn has_web_scheme(s: &str) -> bool {
    SCHEMES.iter().any(|scheme| starts_with_scheme(s, scheme))
}

fn strip_scheme(s: &str) -> &str {
    SCHEMES
        .iter()
        .find(|scheme| starts_with_scheme(s, scheme))
        .map(|scheme| &s[scheme.len()..])
        .unwrap_or(s)
}
