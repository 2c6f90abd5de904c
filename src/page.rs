//! Title lookup for a single URL, used by the `add` command.

use crate::sanitize::sanitize_title;
use regex::Regex;
use reqwest::blocking::Client;
use std::sync::LazyLock;
use std::time::Duration;

/// Title used when the page has none.
pub const MISSING_TITLE: &str = "[Title not found]";

/// Separator replacing line breaks inside multi-line titles.
const LINE_SEPARATOR: &str = " \u{2022} ";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

static TITLE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<title[^>]*>(.*?)</title\s*>").expect("title regex is valid")
});

/// Errors while looking up a page.
#[derive(Debug)]
pub enum FetchError {
    /// The text does not look like a web URL.
    NotAUrl(String),
    /// The request failed or returned an error status.
    Request { url: String, reason: String },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::NotAUrl(text) => write!(f, "Not a URL: {}", text),
            FetchError::Request { url, reason } => write!(f, "Failed to fetch {}: {}", url, reason),
        }
    }
}

impl std::error::Error for FetchError {}

/// Accepts text that starts with `http`, trimmed.
pub fn parse_url(text: &str) -> Result<String, FetchError> {
    let text = text.trim();
    if text.starts_with("http") {
        Ok(text.to_string())
    } else {
        Err(FetchError::NotAUrl(text.to_string()))
    }
}

/// Downloads `url` and returns its normalized title.
pub fn fetch_title(url: &str) -> Result<String, FetchError> {
    let request_failed = |reason: String| FetchError::Request {
        url: url.to_string(),
        reason,
    };

    let client = Client::builder()
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| request_failed(e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| request_failed(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(request_failed(format!("HTTP {}", status.as_u16())));
    }
    let html = response.text().map_err(|e| request_failed(e.to_string()))?;

    Ok(title_from_html(&html))
}

/// Extracts and normalizes the `<title>` of an HTML document.
pub fn title_from_html(html: &str) -> String {
    let Some(raw) = TITLE_TAG.captures(html).and_then(|c| c.get(1)) else {
        return MISSING_TITLE.to_string();
    };
    let decoded = quick_xml::escape::unescape(raw.as_str())
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.as_str().to_string());

    let title = normalize_title(&decoded);
    if title.is_empty() {
        MISSING_TITLE.to_string()
    } else {
        title
    }
}

/// Joins the non-blank lines of a title with a bullet, then sanitizes.
pub fn normalize_title(title: &str) -> String {
    let joined = title
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(LINE_SEPARATOR);
    sanitize_title(&joined)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url() {
        assert_eq!(parse_url("  https://a.io\n").unwrap(), "https://a.io");
        assert!(matches!(parse_url("hello"), Err(FetchError::NotAUrl(_))));
    }

    #[test]
    fn test_title_from_html() {
        let html = "<html><head><TITLE lang=\"en\">Why Rust?</TITLE></head></html>";
        assert_eq!(title_from_html(html), "Why Rust");
    }

    #[test]
    fn test_title_entities_decoded() {
        let html = "<title>Tom &amp; Jerry &#8212; Wiki</title>";
        assert_eq!(title_from_html(html), "Tom & Jerry - Wiki");
    }

    #[test]
    fn test_multiline_title_joined() {
        let html = "<title>\n  Release notes\n\n  Project | Docs\n</title>";
        assert_eq!(title_from_html(html), "Release notes \u{2022} Project - Docs");
    }

    #[test]
    fn test_missing_title() {
        assert_eq!(title_from_html("<html></html>"), MISSING_TITLE);
        assert_eq!(title_from_html("<title>  </title>"), MISSING_TITLE);
    }
}
