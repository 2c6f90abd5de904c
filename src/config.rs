//! Tag rule configuration.
//!
//! Rules are two ordered mappings of `tag name -> regex`: keyword rules are
//! matched against bookmark titles, url rules against bookmark URLs. They are
//! read once at startup and compiled into a [`TagClassifier`].
//!
//! # Configuration File Format
//!
//! ```toml
//! [options]
//! url_match = "clean"   # or "raw"
//!
//! [keywords]
//! deep_learning = "deep learning"
//! rust = "\\brust\\b"
//!
//! [urls]
//! github = "github\\.com"
//! ```
//!
//! The older layout of two JSON files (`tag_keywords.json`, `tag_urls.json`),
//! each a flat object of name to pattern, is still accepted.

use crate::classify::{TagClassifier, TagRule};
use regex::RegexBuilder;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Local rule file looked up in the working directory.
pub const LOCAL_RULES_FILE: &str = ".bookmark-tagger.toml";
/// Legacy keyword rules file.
pub const LEGACY_KEYWORDS_FILE: &str = "tag_keywords.json";
/// Legacy url rules file.
pub const LEGACY_URLS_FILE: &str = "tag_urls.json";

/// Errors that can occur while loading tag rules. All of them are fatal.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// An explicitly requested rule file does not exist.
    ConfigNotFound(PathBuf),
    /// No rule file was found in any of the searched locations.
    NoRuleFile { searched: Vec<PathBuf> },
    /// Invalid TOML/JSON syntax or structure.
    ConfigInvalid { path: PathBuf, reason: String },
    /// A rule pattern failed to compile.
    InvalidRegexPattern {
        /// The tag the rule would emit.
        rule: String,
        /// The pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// A tag name is empty or contains whitespace, so it could not be
    /// told apart inside a space-joined tags string.
    InvalidTagName { name: String },
    /// IO error while reading a rule file.
    IoError { path: PathBuf, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Rule file not found: {}", path.display())
            }
            ConfigError::NoRuleFile { searched } => {
                let paths: Vec<String> = searched.iter().map(|p| p.display().to_string()).collect();
                write!(f, "No tag rules found (looked for: {})", paths.join(", "))
            }
            ConfigError::ConfigInvalid { path, reason } => {
                write!(f, "Invalid rule file {}: {}", path.display(), reason)
            }
            ConfigError::InvalidRegexPattern {
                rule,
                pattern,
                reason,
            } => {
                write!(
                    f,
                    "Invalid regex pattern '{}' for tag '{}': {}",
                    pattern, rule, reason
                )
            }
            ConfigError::InvalidTagName { name } => {
                write!(
                    f,
                    "Invalid tag name '{}': must be non-empty without whitespace",
                    name
                )
            }
            ConfigError::IoError { path, reason } => {
                write!(f, "IO error reading {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Which URL the url rules are matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlMatch {
    /// The URL with its query string removed.
    #[default]
    Clean,
    /// The URL exactly as stored in the bookmark.
    Raw,
}

/// Ordered `name -> pattern` mapping, preserving file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleMap(pub Vec<(String, String)>);

impl RuleMap {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for RuleMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RuleMapVisitor;

        impl<'de> Visitor<'de> for RuleMapVisitor {
            type Value = RuleMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a table of tag name to regex pattern")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RuleMap, A::Error> {
                let mut rules = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, pattern)) = access.next_entry::<String, String>()? {
                    rules.push((name, pattern));
                }
                Ok(RuleMap(rules))
            }
        }

        deserializer.deserialize_map(RuleMapVisitor)
    }
}

/// Options section of the rule file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleOptions {
    #[serde(default)]
    pub url_match: UrlMatch,
}

/// Tag rule configuration as read from disk.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub options: RuleOptions,

    /// Rules matched against titles.
    #[serde(default)]
    pub keywords: RuleMap,

    /// Rules matched against URLs.
    #[serde(default)]
    pub urls: RuleMap,
}

impl RuleConfig {
    /// Load rules, searching the default locations when no path is given.
    ///
    /// Search order:
    /// 1. `config_path`, if provided
    /// 2. `.bookmark-tagger.toml` in the current directory
    /// 3. `~/.config/bookmark-tagger/rules.toml`
    /// 4. `tag_keywords.json` + `tag_urls.json` in the current directory
    ///
    /// # Errors
    ///
    /// `ConfigNotFound` for a missing explicit path, `NoRuleFile` when no
    /// default location has rules.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let home = std::env::var_os("HOME").map(PathBuf::from);
        Self::load_from(config_path, &cwd, home.as_deref())
    }

    /// Same as [`RuleConfig::load`] with explicit search roots.
    pub fn load_from(
        config_path: Option<&Path>,
        cwd: &Path,
        home: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_file(path);
        }

        let mut searched = Vec::new();

        let local = cwd.join(LOCAL_RULES_FILE);
        if local.exists() {
            return Self::load_toml(&local);
        }
        searched.push(local);

        if let Some(home) = home {
            let home_config = home
                .join(".config")
                .join("bookmark-tagger")
                .join("rules.toml");
            if home_config.exists() {
                return Self::load_toml(&home_config);
            }
            searched.push(home_config);
        }

        let keywords = cwd.join(LEGACY_KEYWORDS_FILE);
        let urls = cwd.join(LEGACY_URLS_FILE);
        if keywords.exists() || urls.exists() {
            return Self::load_json_pair(&keywords, &urls);
        }
        searched.push(keywords);
        searched.push(urls);

        Err(ConfigError::NoRuleFile { searched })
    }

    /// Load an explicitly named file, TOML or a single JSON object with
    /// `keywords`/`urls` keys, chosen by extension.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            let content = read(path)?;
            serde_json::from_str(&content).map_err(|e| invalid(path, e))
        } else {
            Self::load_toml(path)
        }
    }

    fn load_toml(path: &Path) -> Result<Self, ConfigError> {
        let content = read(path)?;
        toml::from_str(&content).map_err(|e| invalid(path, e))
    }

    /// Load the legacy layout: two flat JSON objects. Both files must exist.
    pub fn load_json_pair(keywords_path: &Path, urls_path: &Path) -> Result<Self, ConfigError> {
        let mut maps = Vec::with_capacity(2);
        for path in [keywords_path, urls_path] {
            if !path.exists() {
                return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
            }
            let content = read(path)?;
            let map: RuleMap = serde_json::from_str(&content).map_err(|e| invalid(path, e))?;
            maps.push(map);
        }
        let urls = maps.pop().unwrap_or_default();
        let keywords = maps.pop().unwrap_or_default();

        Ok(Self {
            options: RuleOptions::default(),
            keywords,
            urls,
        })
    }

    /// Compile every pattern case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns the first pattern that fails to compile.
    pub fn compile(self) -> Result<TagClassifier, ConfigError> {
        let keyword_rules = compile_rules(&self.keywords)?;
        let url_rules = compile_rules(&self.urls)?;
        Ok(TagClassifier::new(
            keyword_rules,
            url_rules,
            self.options.url_match,
        ))
    }
}

fn compile_rules(map: &RuleMap) -> Result<Vec<TagRule>, ConfigError> {
    map.0
        .iter()
        .map(|(name, pattern)| {
            if name.is_empty() || name.chars().any(char::is_whitespace) {
                return Err(ConfigError::InvalidTagName { name: name.clone() });
            }
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map(|regex| TagRule::new(name.clone(), regex))
                .map_err(|e| ConfigError::InvalidRegexPattern {
                    rule: name.clone(),
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
        })
        .collect()
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

fn invalid(path: &Path, e: impl fmt::Display) -> ConfigError {
    ConfigError::ConfigInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    }
}
