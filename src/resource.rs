use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ResourceParseError {
    #[error("Invalid URL '{value}': {message}. Hint: include http(s):// and ensure the URL is well-formed.")]
    InvalidUrl { value: String, message: String },
}

const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "file"];

/// Validates the capture target before any browser is started.
///
/// Accepts absolute `http`, `https` and `file` URLs. Web URLs must name a host.
pub fn parse_page_url(value: &str) -> Result<Url, ResourceParseError> {
    let trimmed = value.trim();
    let url = Url::parse(trimmed).map_err(|e| ResourceParseError::InvalidUrl {
        value: value.to_string(),
        message: e.to_string(),
    })?;

    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(ResourceParseError::InvalidUrl {
            value: value.to_string(),
            message: format!(
                "unsupported scheme '{}' (expected one of {})",
                url.scheme(),
                SUPPORTED_SCHEMES.join(", ")
            ),
        });
    }

    if url.scheme() != "file" && url.host_str().map_or(true, str::is_empty) {
        return Err(ResourceParseError::InvalidUrl {
            value: value.to_string(),
            message: "missing host".to_string(),
        });
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_web_urls() {
        let url = parse_page_url("https://example.com/articles?page=2").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));

        let local = parse_page_url("http://localhost:8080/").unwrap();
        assert_eq!(local.port(), Some(8080));
    }

    #[test]
    fn accepts_file_urls() {
        let url = parse_page_url("file:///tmp/page.html").unwrap();
        assert_eq!(url.scheme(), "file");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert!(parse_page_url("  https://example.com  ").is_ok());
    }

    #[test]
    fn rejects_relative_input() {
        let err = parse_page_url("example.com").unwrap_err();
        assert!(err.to_string().contains("Invalid URL 'example.com'"));
    }

    #[test]
    fn rejects_unsupported_scheme() {
        let err = parse_page_url("ftp://example.com/file").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'ftp'"));
    }

    #[test]
    fn rejects_plain_words() {
        assert!(parse_page_url("not a url").is_err());
        assert!(parse_page_url("").is_err());
    }
}
