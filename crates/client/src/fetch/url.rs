//! URL canonicalization against the worker's origin.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a request URL as a page under `origin` would issue it.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative references (`./x`, `/x`, `x`) against `origin`
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
///
/// Absolute URLs on other origins are returned as-is (minus fragment); it is
/// up to the caller to decide whether to intercept them.
pub fn canonicalize(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let lowered = host.to_lowercase();
        if lowered != host {
            parsed
                .set_host(Some(&lowered))
                .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
        }
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://easycal.example/").unwrap()
    }

    #[test]
    fn test_canonicalize_relative_path() {
        let url = canonicalize(&origin(), "./tools/timber/sawn-timber.html").unwrap();
        assert_eq!(url.as_str(), "https://easycal.example/tools/timber/sawn-timber.html");
    }

    #[test]
    fn test_canonicalize_absolute_path() {
        let url = canonicalize(&origin(), "/css/style.css").unwrap();
        assert_eq!(url.path(), "/css/style.css");
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize(&origin(), "https://EASYCAL.example/index.html").unwrap();
        assert_eq!(url.host_str(), Some("easycal.example"));
        assert!(same_origin(&url, &origin()));
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize(&origin(), "/dashboard.html#tools").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/dashboard.html");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize(&origin(), "/payment.html?plan=year&ref=a").unwrap();
        assert_eq!(url.query(), Some("plan=year&ref=a"));
    }

    #[test]
    fn test_canonicalize_trim_whitespace() {
        let url = canonicalize(&origin(), "  /index.html  ").unwrap();
        assert_eq!(url.as_str(), "https://easycal.example/index.html");
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize(&origin(), "file:///etc/passwd");
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(canonicalize(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_cross_origin_kept_but_detectable() {
        let url = canonicalize(&origin(), "https://fonts.example/font.woff2").unwrap();
        assert!(!same_origin(&url, &origin()));
    }

    #[test]
    fn test_different_port_is_different_origin() {
        let a = Url::parse("http://localhost:8080/").unwrap();
        let b = Url::parse("http://localhost:9090/").unwrap();
        assert!(!same_origin(&a, &b));
    }
}
