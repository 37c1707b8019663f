//! Shared field checks used by the typed inputs.

use crate::error::ValidationErrors;

pub(crate) fn required(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(field, "is required");
    }
}

pub(crate) fn max_chars(errors: &mut ValidationErrors, field: &'static str, value: &str, max: usize) {
    if value.chars().count() > max {
        errors.push(field, format!("must be at most {max} characters"));
    }
}

/// Empty is allowed; anything else must be an absolute http(s) URL.
pub(crate) fn optional_url(errors: &mut ValidationErrors, field: &'static str, value: &str) {
    if !value.is_empty() && !is_http_url(value) {
        errors.push(field, "must be an http(s) URL");
    }
}

pub(crate) fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.contains(char::is_whitespace))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_url() {
        assert!(is_http_url("https://res.cloudinary.com/demo/image.png"));
        assert!(is_http_url("http://example.com"));
        assert!(!is_http_url("ftp://example.com"));
        assert!(!is_http_url("https://"));
        assert!(!is_http_url("https://bad host"));
    }
}
