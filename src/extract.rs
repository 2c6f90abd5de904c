//! Bookmark extraction from a folder of `.webloc` files.
//!
//! Each shortcut becomes a [`BookmarkRecord`]: the sanitized filename stem as
//! title, the stored URL, and the URL without its query string. When renaming
//! is enabled the file on disk is renamed to match the sanitized title, so the
//! emitted title always names the file that actually exists.
//!
//! Renaming is split into [`LinkExtractor::propose_rename`] (pure) and
//! [`LinkExtractor::apply_rename`] (touches the filesystem) so that the two
//! halves can be used separately.

use crate::sanitize::{clean_url, sanitize_title};
use crate::webloc::{self, PayloadError, WEBLOC_EXTENSION};
use glob::{MatchOptions, Pattern};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Highest numeric suffix tried when a rename target is taken.
const MAX_RENAME_SUFFIX: usize = 999;

/// One bookmark shortcut on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookmarkRecord {
    /// Sanitized title; equals the file stem once renaming has run.
    pub title: String,
    /// URL exactly as stored in the file.
    pub raw_url: String,
    /// `raw_url` truncated at the first `?`.
    pub clean_url: String,
    /// The backing file, after any rename.
    pub path: PathBuf,
}

/// A rename the extractor wants to perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Errors for a single bookmark file (or the folder listing itself).
#[derive(Debug)]
pub enum ExtractionError {
    /// The source folder could not be listed.
    ListFailed { folder: PathBuf, reason: String },
    /// The bookmark payload could not be read or parsed.
    Unreadable { path: PathBuf, source: PayloadError },
    /// Renaming the file failed.
    RenameFailed {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    /// Every candidate rename target is already taken.
    RenameExhausted { from: PathBuf },
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListFailed { folder, reason } => {
                write!(f, "Failed to list {}: {}", folder.display(), reason)
            }
            Self::Unreadable { path, source } => {
                write!(f, "Skipping {}: {}", path.display(), source)
            }
            Self::RenameFailed { from, to, source } => {
                write!(
                    f,
                    "Failed to rename {} to {}: {}",
                    from.display(),
                    to.display(),
                    source
                )
            }
            Self::RenameExhausted { from } => {
                write!(f, "No free name to rename {} to", from.display())
            }
        }
    }
}

impl std::error::Error for ExtractionError {}

pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Outcome of extracting a whole folder.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// Records in listing order.
    pub records: Vec<BookmarkRecord>,
    /// Files that were skipped, with the reason.
    pub failures: Vec<ExtractionError>,
    /// Renames that were applied.
    pub renames: Vec<RenamePlan>,
}

/// Reads bookmark records out of a folder.
#[derive(Debug, Clone, Copy)]
pub struct LinkExtractor {
    rename: bool,
}

impl Default for LinkExtractor {
    fn default() -> Self {
        Self { rename: true }
    }
}

impl LinkExtractor {
    /// `rename` controls whether files are renamed to their sanitized title.
    pub fn new(rename: bool) -> Self {
        Self { rename }
    }

    /// Lists `*.webloc` files directly inside `folder`, sorted by path.
    ///
    /// The extension match is case-sensitive.
    pub fn list_bookmarks(folder: &Path) -> ExtractionResult<Vec<PathBuf>> {
        let list_failed = |reason: String| ExtractionError::ListFailed {
            folder: folder.to_path_buf(),
            reason,
        };

        let meta = fs::metadata(folder).map_err(|e| list_failed(e.to_string()))?;
        if !meta.is_dir() {
            return Err(list_failed("not a directory".to_string()));
        }
        let folder_str = folder
            .to_str()
            .ok_or_else(|| list_failed("path is not valid UTF-8".to_string()))?;

        let pattern = format!(
            "{}/*.{}",
            Pattern::escape(folder_str.trim_end_matches('/')),
            WEBLOC_EXTENSION
        );
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        let entries = glob::glob_with(&pattern, options).map_err(|e| list_failed(e.to_string()))?;

        let mut files = Vec::new();
        for entry in entries {
            match entry {
                Ok(path) => {
                    let is_webloc = path
                        .extension()
                        .is_some_and(|ext| ext == WEBLOC_EXTENSION);
                    if is_webloc && path.is_file() {
                        files.push(path);
                    }
                }
                Err(e) => debug!("unreadable entry under {}: {}", folder.display(), e),
            }
        }
        files.sort();
        Ok(files)
    }

    /// Returns the rename that would make the filename match its sanitized
    /// title, or `None` when it already does.
    pub fn propose_rename(path: &Path) -> Option<RenamePlan> {
        let stem = path.file_stem()?.to_string_lossy();
        let title = sanitize_title(&stem);
        if title == stem || title.is_empty() {
            return None;
        }
        Some(RenamePlan {
            from: path.to_path_buf(),
            to: path.with_file_name(format!("{}.{}", title, WEBLOC_EXTENSION)),
        })
    }

    /// The rename [`LinkExtractor::apply_rename`] would perform, without
    /// touching the disk. Paths in `claimed` count as taken, so a preview of
    /// several files sees the targets handed out before it.
    pub fn resolve_rename(
        plan: &RenamePlan,
        claimed: &HashSet<PathBuf>,
    ) -> ExtractionResult<RenamePlan> {
        let taken = |path: &Path| path.exists() || claimed.contains(path);
        let target = free_target(&plan.to, taken).ok_or_else(|| ExtractionError::RenameExhausted {
            from: plan.from.clone(),
        })?;
        Ok(RenamePlan {
            from: plan.from.clone(),
            to: target,
        })
    }

    /// Performs a rename, never overwriting an existing file.
    ///
    /// When the target is taken, ` (2)`, ` (3)`, ... is appended to the stem
    /// until a free name is found. Returns the rename actually performed.
    pub fn apply_rename(plan: &RenamePlan) -> ExtractionResult<RenamePlan> {
        let target = Self::resolve_rename(plan, &HashSet::new())?.to;

        fs::rename(&plan.from, &target).map_err(|e| ExtractionError::RenameFailed {
            from: plan.from.clone(),
            to: target.clone(),
            source: e,
        })?;

        Ok(RenamePlan {
            from: plan.from.clone(),
            to: target,
        })
    }

    /// Reads a record without touching the filesystem.
    pub fn read_record(path: &Path) -> ExtractionResult<BookmarkRecord> {
        let raw_url = webloc::read_url(path).map_err(|source| ExtractionError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        // a stem that sanitizes to nothing still yields a record, just never a rename
        Ok(BookmarkRecord {
            title: sanitize_title(&stem),
            clean_url: clean_url(&raw_url).to_string(),
            raw_url,
            path: path.to_path_buf(),
        })
    }

    /// Reads one file and, if enabled, renames it to its sanitized title.
    ///
    /// A file that cannot be read is never renamed.
    pub fn extract_file(
        &self,
        path: &Path,
    ) -> ExtractionResult<(BookmarkRecord, Option<RenamePlan>)> {
        let mut record = Self::read_record(path)?;
        if !self.rename {
            return Ok((record, None));
        }

        let Some(plan) = Self::propose_rename(path) else {
            return Ok((record, None));
        };
        let applied = Self::apply_rename(&plan)?;
        if let Some(stem) = applied.to.file_stem() {
            record.title = stem.to_string_lossy().into_owned();
        }
        record.path = applied.to.clone();
        debug!("renamed {} -> {}", applied.from.display(), applied.to.display());

        Ok((record, Some(applied)))
    }

    /// Extracts every bookmark in `folder`. Per-file failures are collected
    /// in the report; only a folder that cannot be listed is an error.
    pub fn extract(&self, folder: &Path) -> ExtractionResult<ExtractionReport> {
        let files = Self::list_bookmarks(folder)?;
        let mut report = ExtractionReport::default();
        for file in files {
            self.extract_into(&file, &mut report);
        }
        Ok(report)
    }

    /// Extracts one file into `report`.
    pub fn extract_into(&self, path: &Path, report: &mut ExtractionReport) {
        match self.extract_file(path) {
            Ok((record, rename)) => {
                report.records.push(record);
                report.renames.extend(rename);
            }
            Err(e) => report.failures.push(e),
        }
    }
}

fn free_target(wanted: &Path, taken: impl Fn(&Path) -> bool) -> Option<PathBuf> {
    if !taken(wanted) {
        return Some(wanted.to_path_buf());
    }
    let stem = wanted.file_stem()?.to_string_lossy().into_owned();
    (2..=MAX_RENAME_SUFFIX)
        .map(|n| wanted.with_file_name(format!("{} ({}).{}", stem, n, WEBLOC_EXTENSION)))
        .find(|candidate| !taken(candidate))
}
