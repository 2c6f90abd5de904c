//! Reader for `.webloc` bookmark payloads.
//!
//! A `.webloc` file is a property list holding a dictionary with a single
//! `URL` string. macOS writes either the XML flavor or the binary
//! (`bplist00`) flavor; `plist` detects and reads both.

use plist::Value;
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// File extension of a bookmark shortcut (matched case-sensitively).
pub const WEBLOC_EXTENSION: &str = "webloc";

const URL_KEY: &str = "URL";

/// Errors raised while decoding a bookmark payload.
#[derive(Debug)]
pub enum PayloadError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The payload is not a well-formed property list.
    Plist(plist::Error),
    /// The top-level object is not a dictionary.
    NotADictionary,
    /// The dictionary holds no non-empty `URL` string.
    MissingUrl,
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayloadError::Io(e) => write!(f, "could not read file: {}", e),
            PayloadError::Plist(e) => write!(f, "malformed property list: {}", e),
            PayloadError::NotADictionary => write!(f, "property list is not a dictionary"),
            PayloadError::MissingUrl => write!(f, "no URL entry in bookmark"),
        }
    }
}

impl std::error::Error for PayloadError {}

impl From<plist::Error> for PayloadError {
    fn from(e: plist::Error) -> Self {
        PayloadError::Plist(e)
    }
}

pub type PayloadResult<T> = Result<T, PayloadError>;

/// Reads the stored target URL out of a bookmark file.
pub fn read_url(path: &Path) -> PayloadResult<String> {
    let data = fs::read(path).map_err(PayloadError::Io)?;
    parse_url(&data)
}

/// Decodes the URL from raw payload bytes in either plist flavor.
pub fn parse_url(data: &[u8]) -> PayloadResult<String> {
    let value = Value::from_reader(Cursor::new(data))?;
    let dict = value.into_dictionary().ok_or(PayloadError::NotADictionary)?;

    dict.get(URL_KEY)
        .and_then(Value::as_string)
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
        .ok_or(PayloadError::MissingUrl)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plist::Dictionary;

    fn xml_webloc(url: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
	<key>URL</key>
	<string>{}</string>
</dict>
</plist>
"#,
            url
        )
    }

    fn binary_webloc(url: &str) -> Vec<u8> {
        let mut dict = Dictionary::new();
        dict.insert(URL_KEY.to_string(), Value::String(url.to_string()));
        let mut data = Vec::new();
        Value::Dictionary(dict)
            .to_writer_binary(&mut data)
            .expect("Failed to encode binary plist");
        data
    }

    #[test]
    fn test_parse_xml_webloc() {
        let xml = xml_webloc("https://github.com/foo/bar?utm=1");
        assert_eq!(
            parse_url(xml.as_bytes()).unwrap(),
            "https://github.com/foo/bar?utm=1"
        );
    }

    #[test]
    fn test_parse_xml_unescapes_entities() {
        let xml = xml_webloc("https://a.io/?x=1&amp;y=2");
        assert_eq!(parse_url(xml.as_bytes()).unwrap(), "https://a.io/?x=1&y=2");
    }

    #[test]
    fn test_parse_xml_ignores_other_keys() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"><dict>
    <key>Name</key><string>not it</string>
    <key>URL</key><string>https://example.com</string>
</dict></plist>"#;
        assert_eq!(parse_url(xml.as_bytes()).unwrap(), "https://example.com");
    }

    #[test]
    fn test_parse_xml_without_url_fails() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"><dict><key>Name</key><string>x</string></dict></plist>"#;
        assert!(matches!(parse_url(xml.as_bytes()), Err(PayloadError::MissingUrl)));
    }

    #[test]
    fn test_parse_non_dictionary_fails() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0"><string>https://a.io</string></plist>"#;
        assert!(matches!(parse_url(xml.as_bytes()), Err(PayloadError::NotADictionary)));
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_url(b"\xff\xfe\x00garbage").is_err());
        assert!(parse_url(b"").is_err());
    }

    #[test]
    fn test_parse_binary_webloc() {
        let data = binary_webloc("https://a.io/some/long/path?with=query");
        assert!(data.starts_with(b"bplist00"));
        assert_eq!(
            parse_url(&data).unwrap(),
            "https://a.io/some/long/path?with=query"
        );
    }

    #[test]
    fn test_parse_truncated_binary_fails() {
        let data = binary_webloc("https://a.io");
        let cut = &data[..data.len() - 20];
        assert!(parse_url(cut).is_err());
    }
}
