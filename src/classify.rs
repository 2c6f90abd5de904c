//! Rule-based tag classification.
//!
//! A [`TagClassifier`] holds two rule sets: keyword rules tested against a
//! title and url rules tested against a URL. Every matching rule contributes
//! its name to the result; the result is a set, so rule order never shows
//! up in the output.
//!
//! # Examples
//!
//! ```
//! use bookmark_tagger::classify::{TagClassifier, TagRule};
//! use bookmark_tagger::config::UrlMatch;
//! use regex::RegexBuilder;
//!
//! let rule = |name: &str, pattern: &str| {
//!     TagRule::new(name, RegexBuilder::new(pattern).case_insensitive(true).build().unwrap())
//! };
//! let classifier = TagClassifier::new(
//!     vec![rule("deep_learning", "deep learning")],
//!     vec![rule("github", "github")],
//!     UrlMatch::Clean,
//! );
//!
//! let tags = classifier.classify("Deep Learning: A Primer", "https://github.com/foo/bar");
//! assert_eq!(tags.to_string(), "deep_learning github");
//! ```

use crate::config::UrlMatch;
use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;

/// A named pattern. The name is the tag emitted on match.
#[derive(Debug, Clone)]
pub struct TagRule {
    name: String,
    pattern: Regex,
}

impl TagRule {
    /// Creates a rule. The regex is used as given, so callers compile it
    /// case-insensitively.
    pub fn new(name: impl Into<String>, pattern: Regex) -> Self {
        Self {
            name: name.into(),
            pattern,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, haystack: &str) -> bool {
        self.pattern.is_match(haystack)
    }
}

/// Deduplicated, sorted set of tags attached to one bookmark.
///
/// Its `Display` form is the tags string: names sorted and joined by a single
/// space, empty for an untagged bookmark.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(BTreeSet<String>);

impl TagSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }
}

impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for tag in &self.0 {
            if !first {
                f.write_str(" ")?;
            }
            f.write_str(tag)?;
            first = false;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Evaluates keyword and url rules against a title/URL pair.
#[derive(Debug, Clone)]
pub struct TagClassifier {
    keyword_rules: Vec<TagRule>,
    url_rules: Vec<TagRule>,
    url_match: UrlMatch,
}

impl TagClassifier {
    pub fn new(keyword_rules: Vec<TagRule>, url_rules: Vec<TagRule>, url_match: UrlMatch) -> Self {
        Self {
            keyword_rules,
            url_rules,
            url_match,
        }
    }

    /// Which URL the url rules expect to be handed.
    pub fn url_match(&self) -> UrlMatch {
        self.url_match
    }

    /// Overrides the configured URL choice (command-line flag).
    pub fn with_url_match(mut self, url_match: UrlMatch) -> Self {
        self.url_match = url_match;
        self
    }

    pub fn keyword_rule_count(&self) -> usize {
        self.keyword_rules.len()
    }

    pub fn url_rule_count(&self) -> usize {
        self.url_rules.len()
    }

    /// Returns the union of all keyword rules matching `title` and all url
    /// rules matching `url`. No match yields an empty set.
    pub fn classify(&self, title: &str, url: &str) -> TagSet {
        let keyword_hits = self
            .keyword_rules
            .iter()
            .filter(|rule| rule.matches(title));
        let url_hits = self.url_rules.iter().filter(|rule| rule.matches(url));

        keyword_hits
            .chain(url_hits)
            .map(|rule| rule.name.clone())
            .collect()
    }

    /// Picks the URL the url rules see, according to [`UrlMatch`].
    pub fn classify_urls(&self, title: &str, clean_url: &str, raw_url: &str) -> TagSet {
        let url = match self.url_match {
            UrlMatch::Clean => clean_url,
            UrlMatch::Raw => raw_url,
        };
        self.classify(title, url)
    }
}
