//! Title and URL normalization.
//!
//! Bookmark titles come straight from filenames, which tend to carry whatever
//! punctuation the page title had. [`sanitize_title`] folds those into a
//! canonical form that is safe to use as a filename stem and stable enough to
//! match tag rules against.
//!
//! # Examples
//!
//! ```
//! use bookmark_tagger::sanitize::{clean_url, sanitize_title};
//!
//! assert_eq!(sanitize_title("Deep Learning: A Primer?"), "Deep Learning: A Primer");
//! assert_eq!(clean_url("https://github.com/foo/bar?utm=1"), "https://github.com/foo/bar");
//! ```

/// Quote characters folded into a plain apostrophe.
const QUOTE_CHARS: [char; 5] = ['\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '"'];

/// Characters folded into a hyphen (em-dash, pipe, asterisk).
const DASH_CHARS: [char; 3] = ['\u{2014}', '|', '*'];

const ELLIPSIS: char = '\u{2026}';

/// Normalizes a free-text title.
///
/// Rules, in order: drop `?`, fold smart quotes into `'`, expand `…` into
/// `...`, fold em-dash, `|` and `*` into `-`, then trim surrounding whitespace.
/// The function is idempotent.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());

    for ch in title.chars() {
        match ch {
            '?' => {}
            c if QUOTE_CHARS.contains(&c) => out.push('\''),
            ELLIPSIS => out.push_str("..."),
            c if DASH_CHARS.contains(&c) => out.push('-'),
            c => out.push(c),
        }
    }

    out.trim().to_string()
}

/// Strips the query string: everything from the first `?` onward.
pub fn clean_url(url: &str) -> &str {
    match url.find('?') {
        Some(idx) => &url[..idx],
        None => url,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_marks_removed() {
        assert_eq!(
            sanitize_title("Deep Learning: A Primer?"),
            "Deep Learning: A Primer"
        );
        assert_eq!(sanitize_title("Why? How? When?"), "Why How When");
    }

    #[test]
    fn test_smart_quotes_become_apostrophes() {
        assert_eq!(
            sanitize_title("\u{2018}Quoted\u{2019} and \u{201C}double\u{201D} \"plain\""),
            "'Quoted' and 'double' 'plain'"
        );
    }

    #[test]
    fn test_ellipsis_expanded() {
        assert_eq!(sanitize_title("Wait for it\u{2026}"), "Wait for it...");
    }

    #[test]
    fn test_dashes_pipes_asterisks() {
        assert_eq!(
            sanitize_title("Rust \u{2014} the book | chapter *one*"),
            "Rust - the book - chapter -one-"
        );
    }

    #[test]
    fn test_trims_whitespace() {
        assert_eq!(sanitize_title("   padded title \t"), "padded title");
        // trailing '?' removal exposes whitespace that must be trimmed too
        assert_eq!(sanitize_title("Is it ? "), "Is it");
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let samples = [
            "",
            "?",
            "  \u{2026}?\u{2014}|*  ",
            "Deep Learning: A Primer?",
            "\u{201C}What\u{2019}s new?\u{201D} \u{2014} a blog | Home",
            "already clean",
        ];
        for sample in samples {
            let once = sanitize_title(sample);
            assert_eq!(sanitize_title(&once), once, "not idempotent for {sample:?}");
            assert!(!once.contains(['?', '\u{2026}', '\u{2014}', '|', '*', '\u{2018}', '\u{2019}']));
        }
    }

    #[test]
    fn test_clean_url_strips_query() {
        assert_eq!(
            clean_url("https://github.com/foo/bar?utm=1"),
            "https://github.com/foo/bar"
        );
        assert_eq!(clean_url("https://a.io/?x=1?y=2"), "https://a.io/");
    }

    #[test]
    fn test_clean_url_without_query_is_unchanged() {
        assert_eq!(clean_url("https://example.com/page"), "https://example.com/page");
        assert_eq!(clean_url(""), "");
    }
}
