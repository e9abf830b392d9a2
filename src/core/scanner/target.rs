// src/core/scanner/target.rs

use url::Url;

use crate::error::{Result, ScanError};

/// Prefixes `https://` when the input carries no scheme.
///
/// `http://` and `https://` are recognized in any letter case. Any other
/// explicit scheme (`ftp://`, `file://`, ...) is a validation error rather
/// than being folded into the host.
pub fn normalize_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ScanError::Validation("URL must not be empty".into()));
    }
    if has_prefix_ignore_case(trimmed, "http://") || has_prefix_ignore_case(trimmed, "https://") {
        return Ok(trimmed.to_string());
    }
    match trimmed.split_once("://") {
        Some((scheme, _)) if is_scheme(scheme) => {
            Err(ScanError::Validation(format!("unsupported scheme '{scheme}', only http and https can be scanned")))
        }
        _ => Ok(format!("https://{trimmed}")),
    }
}

fn has_prefix_ignore_case(s: &str, prefix: &str) -> bool {
    s.get(..prefix.len()).is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// RFC 3986 scheme syntax: a letter, then letters, digits, `+`, `-` or `.`.
fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// A normalized scan target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    url: Url,
    normalized: String,
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = normalize_url(raw)?;
        let url = Url::parse(&normalized)
            .map_err(|e| ScanError::Validation(format!("'{}' is not a valid URL: {}", raw.trim(), e)))?;
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ScanError::Validation(format!("'{}' has no host", raw.trim())));
        }
        Ok(Self { url, normalized })
    }

    /// The URL as the caller gave it, scheme added if needed.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or_default()
    }

    /// `host[:port]`, the port only when it was given explicitly and differs
    /// from the scheme default.
    pub fn netloc(&self) -> String {
        match self.url.port() {
            Some(port) => format!("{}:{}", self.host(), port),
            None => self.host().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_domain_gets_https() {
        assert_eq!(normalize_url("example.com").unwrap(), "https://example.com");
        assert_eq!(normalize_url("  example.com/path ").unwrap(), "https://example.com/path");
    }

    #[test]
    fn existing_scheme_is_kept() {
        assert_eq!(normalize_url("http://example.com").unwrap(), "http://example.com");
        assert_eq!(normalize_url("https://example.com").unwrap(), "https://example.com");
    }

    #[test]
    fn scheme_match_ignores_case() {
        assert_eq!(normalize_url("HTTP://Example.com/x").unwrap(), "HTTP://Example.com/x");
        let target = Target::parse("HTTP://Example.com/x").unwrap();
        assert_eq!(target.url().scheme(), "http");
        assert_eq!(target.host(), "example.com");
        assert_eq!(target.netloc(), "example.com");

        let target = Target::parse("HttpS://example.com").unwrap();
        assert_eq!(target.url().scheme(), "https");
        assert_eq!(target.host(), "example.com");
    }

    #[test]
    fn other_schemes_are_rejected() {
        for raw in ["ftp://files.example.com", "file:///etc/passwd", "ws://example.com", "git+ssh://host/repo"] {
            assert!(matches!(normalize_url(raw), Err(ScanError::Validation(_))), "{raw}");
            assert!(matches!(Target::parse(raw), Err(ScanError::Validation(_))), "{raw}");
        }
    }

    #[test]
    fn path_containing_a_scheme_is_not_mistaken_for_one() {
        let target = Target::parse("example.com/redirect?to=https://other.org").unwrap();
        assert_eq!(target.host(), "example.com");
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(normalize_url("   "), Err(ScanError::Validation(_))));
    }

    #[test]
    fn netloc_includes_explicit_port() {
        let target = Target::parse("example.com:8443/login").unwrap();
        assert_eq!(target.as_str(), "https://example.com:8443/login");
        assert_eq!(target.host(), "example.com");
        assert_eq!(target.netloc(), "example.com:8443");

        let default_port = Target::parse("https://example.com:443").unwrap();
        assert_eq!(default_port.netloc(), "example.com");
    }

    #[test]
    fn garbage_is_a_validation_error() {
        assert!(matches!(Target::parse("https://"), Err(ScanError::Validation(_))));
        assert!(matches!(Target::parse("exa mple.com"), Err(ScanError::Validation(_))));
    }
}
