//! Command-line interface module for bookmark-tagger.
//!
//! This module handles:
//! - Argument parsing
//! - Choosing between extracting a folder, retagging a CSV and adding one URL
//! - Orchestrating extract → classify → save → upload
//! - Reporting skipped files and untagged rows

use crate::classify::TagClassifier;
use crate::config::{RuleConfig, UrlMatch};
use crate::dataset::{BookmarkTable, DatasetBuilder, TAGS_COLUMN, TITLE_COLUMN, URL_COLUMN};
use crate::extract::{ExtractionReport, LinkExtractor};
use crate::output::OutputFormatter;
use crate::page;
use crate::persist::{self, DEFAULT_OUTPUT, PersistError};
use crate::sanitize::clean_url;
use crate::sync::{Prompt, SyncTarget, UploadOutcome, upload};
use clap::{ArgAction, Parser};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Tag a folder of .webloc bookmarks into a sorted CSV.
#[derive(Debug, Parser)]
#[command(name = "bookmark-tagger", version, about)]
pub struct Cli {
    /// Folder of .webloc files, or a previously exported .csv to retag.
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Output CSV file.
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Tag rule file (TOML, or JSON with `keywords` and `urls`).
    #[arg(short, long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Match url rules against the URL including its query string.
    #[arg(long)]
    pub raw_url_match: bool,

    /// Do not rename bookmark files to their sanitized titles.
    #[arg(long)]
    pub no_rename: bool,

    /// Leave the `Original url` column out of the export.
    #[arg(long)]
    pub drop_original_url: bool,

    /// Show what would happen without renaming, writing or uploading.
    #[arg(long)]
    pub dry_run: bool,

    /// Upload without asking for confirmation.
    #[arg(short, long)]
    pub yes: bool,

    /// Never upload, even when remote sync is configured.
    #[arg(long)]
    pub no_upload: bool,

    /// Tag a single URL (fetching its page title) instead of a folder.
    #[arg(long, value_name = "URL", conflicts_with = "dry_run")]
    pub add: Option<String>,

    /// More diagnostics on stderr (repeatable).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// What to do, decided from `--add` and the source path's extension.
    pub fn command(&self) -> TagCommand {
        if let Some(url) = &self.add {
            TagCommand::Add { url: url.clone() }
        } else if persist::is_table_path(&self.path) {
            TagCommand::Retag {
                table: self.path.clone(),
            }
        } else {
            TagCommand::Extract {
                folder: self.path.clone(),
            }
        }
    }

    pub fn options(&self) -> RunOptions {
        RunOptions {
            output: self.output.clone(),
            rules: self.rules.clone(),
            url_match: self.raw_url_match.then_some(UrlMatch::Raw),
            rename: !self.no_rename,
            keep_original_url: !self.drop_original_url,
            dry_run: self.dry_run,
            upload: !self.no_upload,
        }
    }
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagCommand {
    /// Extract, tag and export a folder of bookmarks.
    Extract { folder: PathBuf },
    /// Re-run classification over an exported table.
    Retag { table: PathBuf },
    /// Tag a single URL.
    Add { url: String },
}

/// Settings shared by every command.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub output: PathBuf,
    /// Explicit rule file; `None` searches the default locations.
    pub rules: Option<PathBuf>,
    /// Overrides the rule file's `url_match` option.
    pub url_match: Option<UrlMatch>,
    pub rename: bool,
    pub keep_original_url: bool,
    pub dry_run: bool,
    pub upload: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output: PathBuf::from(DEFAULT_OUTPUT),
            rules: None,
            url_match: None,
            rename: true,
            keep_original_url: true,
            dry_run: false,
            upload: true,
        }
    }
}

/// What a run did, for callers and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Bookmark files found in the folder.
    pub files_found: usize,
    /// Rows in the final table.
    pub rows: usize,
    /// Files skipped because they could not be extracted.
    pub skipped: usize,
    /// Files renamed to their sanitized title.
    pub renamed: usize,
    /// Rows with an empty tag set.
    pub untagged: usize,
    /// Where the table was written, if it was.
    pub written: Option<PathBuf>,
    /// Result of the upload step, if it ran without error.
    pub upload: Option<UploadOutcome>,
}

/// Runs one command end to end.
///
/// Only fatal problems are returned as `Err`: unusable tag rules, a source
/// folder that cannot be listed, or a source table that cannot be read.
/// Skipped files, a rejected output path and remote failures are reported
/// and the run carries on.
///
/// # Examples
///
/// ```no_run
/// use bookmark_tagger::cli::{RunOptions, TagCommand, run_cli};
/// use bookmark_tagger::sync::{NullSyncTarget, TerminalPrompt};
/// use std::path::PathBuf;
///
/// let command = TagCommand::Extract { folder: PathBuf::from("/path/to/bookmarks") };
/// match run_cli(command, &RunOptions::default(), &NullSyncTarget, &TerminalPrompt) {
///     Ok(summary) => println!("{} rows", summary.rows),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// ```
pub fn run_cli(
    command: TagCommand,
    options: &RunOptions,
    sync: &dyn SyncTarget,
    prompt: &dyn Prompt,
) -> Result<RunSummary, String> {
    let classifier = load_classifier(options)?;

    match command {
        TagCommand::Extract { folder } => extract_folder(&folder, options, &classifier, sync, prompt),
        TagCommand::Retag { table } => retag_table(&table, options, &classifier),
        TagCommand::Add { url } => add_url(&url, options, &classifier, sync, prompt),
    }
}

/// Loads and compiles the tag rules, applying the command-line override.
pub fn load_classifier(options: &RunOptions) -> Result<TagClassifier, String> {
    let config = RuleConfig::load(options.rules.as_deref())
        .map_err(|e| format!("Error loading tag rules: {}", e))?;
    let mut classifier = config
        .compile()
        .map_err(|e| format!("Error compiling tag rules: {}", e))?;
    if let Some(url_match) = options.url_match {
        classifier = classifier.with_url_match(url_match);
    }
    info!(
        "loaded {} keyword rules and {} url rules",
        classifier.keyword_rule_count(),
        classifier.url_rule_count()
    );
    Ok(classifier)
}

/// Extracts a folder, tags it, saves it and offers an upload.
///
/// This function:
/// 1. Lists the `.webloc` files in the folder
/// 2. Reads each one, renaming it to its sanitized title unless disabled
/// 3. Classifies every record and sorts the table by tags
/// 4. Writes the CSV and reports untagged rows
/// 5. Uploads the rows if a remote target is configured and confirmed
fn extract_folder(
    folder: &Path,
    options: &RunOptions,
    classifier: &TagClassifier,
    sync: &dyn SyncTarget,
    prompt: &dyn Prompt,
) -> Result<RunSummary, String> {
    if options.dry_run {
        OutputFormatter::dry_run_notice(&format!("Analyzing bookmarks in: {}", folder.display()));
    } else {
        OutputFormatter::info(&format!("Reading bookmarks in: {}", folder.display()));
    }

    let files = LinkExtractor::list_bookmarks(folder).map_err(|e| e.to_string())?;
    let mut summary = RunSummary {
        files_found: files.len(),
        ..Default::default()
    };

    if files.is_empty() {
        OutputFormatter::warning(&format!("No files found in {}", folder.display()));
        return Ok(summary);
    }

    let report = if options.dry_run {
        preview_files(&files, options.rename)
    } else {
        extract_files(&files, LinkExtractor::new(options.rename))
    };

    for rename in &report.renames {
        OutputFormatter::plain(&format!(
            "  {} -> {}",
            file_name(&rename.from),
            file_name(&rename.to)
        ));
    }
    for failure in &report.failures {
        OutputFormatter::error(&failure.to_string());
    }
    summary.renamed = report.renames.len();
    summary.skipped = report.failures.len();

    if report.records.is_empty() {
        OutputFormatter::warning("No readable bookmarks; nothing to export.");
        return Ok(summary);
    }

    let table = DatasetBuilder::new(classifier, options.keep_original_url).build(&report.records);
    summary.rows = table.len();
    summary.untagged = table.untagged_count();

    if options.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Would export {} bookmarks to {}",
            table.len(),
            options.output.display()
        ));
        OutputFormatter::untagged_report(&table);
        OutputFormatter::success("Dry run complete. No files were modified.");
        return Ok(summary);
    }

    summary.written = save_table(&table, &options.output);
    OutputFormatter::untagged_report(&table);

    // the local file is the source of truth; never upload what was not saved
    if options.upload && summary.written.is_some() {
        summary.upload = upload_rows(table.rows(), sync, prompt);
    }

    Ok(summary)
}

fn extract_files(files: &[PathBuf], extractor: LinkExtractor) -> ExtractionReport {
    let pb = OutputFormatter::create_progress_bar(files.len() as u64);
    let mut report = ExtractionReport::default();
    for file in files {
        pb.set_message(file_name(file));
        extractor.extract_into(file, &mut report);
        pb.inc(1);
    }
    pb.finish_and_clear();
    report
}

/// Reads every file without touching the disk. Renames are resolved the way
/// a real run would resolve them, collision suffixes included.
pub fn preview_files(files: &[PathBuf], rename: bool) -> ExtractionReport {
    let mut report = ExtractionReport::default();
    let mut claimed = HashSet::new();
    for file in files {
        let mut record = match LinkExtractor::read_record(file) {
            Ok(record) => record,
            Err(e) => {
                report.failures.push(e);
                continue;
            }
        };
        let Some(plan) = LinkExtractor::propose_rename(file).filter(|_| rename) else {
            report.records.push(record);
            continue;
        };
        match LinkExtractor::resolve_rename(&plan, &claimed) {
            Ok(resolved) => {
                if let Some(stem) = resolved.to.file_stem() {
                    record.title = stem.to_string_lossy().into_owned();
                }
                claimed.insert(resolved.to.clone());
                report.renames.push(resolved);
                report.records.push(record);
            }
            Err(e) => report.failures.push(e),
        }
    }
    report
}

/// Loads an exported table, re-tags it and writes it to the output path.
fn retag_table(
    source: &Path,
    options: &RunOptions,
    classifier: &TagClassifier,
) -> Result<RunSummary, String> {
    OutputFormatter::info(&format!("Retagging: {}", source.display()));

    let table = persist::load(source).map_err(|e| format!("Error reading table: {}", e))?;
    let table = DatasetBuilder::new(classifier, options.keep_original_url)
        .retag(table)
        .map_err(|e| format!("Error retagging {}: {}", source.display(), e))?;

    let mut summary = RunSummary {
        rows: table.len(),
        untagged: table.untagged_count(),
        ..Default::default()
    };

    if options.dry_run {
        OutputFormatter::dry_run_notice(&format!(
            "Would write {} retagged rows to {}",
            table.len(),
            options.output.display()
        ));
    } else {
        summary.written = save_table(&table, &options.output);
    }
    OutputFormatter::untagged_report(&table);

    Ok(summary)
}

/// Tags one URL and offers to append it to the remote sheet.
fn add_url(
    text: &str,
    options: &RunOptions,
    classifier: &TagClassifier,
    sync: &dyn SyncTarget,
    prompt: &dyn Prompt,
) -> Result<RunSummary, String> {
    let url = page::parse_url(text).map_err(|e| e.to_string())?;
    OutputFormatter::info(&format!("Looking up: {}", url));

    let title = page::fetch_title(&url).map_err(|e| e.to_string())?;
    Ok(add_bookmark(&url, title, options, classifier, sync, prompt))
}

/// Classifies a single bookmark whose title is already known and, unless
/// `options.upload` is off, offers it to `sync` as one row.
pub fn add_bookmark(
    url: &str,
    title: String,
    options: &RunOptions,
    classifier: &TagClassifier,
    sync: &dyn SyncTarget,
    prompt: &dyn Prompt,
) -> RunSummary {
    let tags = classifier.classify_urls(&title, clean_url(url), url);
    OutputFormatter::bookmark(&tags.to_string(), &title, url);

    let table = BookmarkTable::new(
        vec![
            TAGS_COLUMN.to_string(),
            TITLE_COLUMN.to_string(),
            URL_COLUMN.to_string(),
        ],
        vec![vec![tags.to_string(), title, url.to_string()]],
    );

    RunSummary {
        rows: 1,
        untagged: table.untagged_count(),
        upload: if options.upload {
            upload_rows(table.rows(), sync, prompt)
        } else {
            None
        },
        ..Default::default()
    }
}

/// Saves the table, reporting failures. Returns the path on success.
fn save_table(table: &BookmarkTable, output: &Path) -> Option<PathBuf> {
    match persist::save(table, output) {
        Ok(()) => {
            OutputFormatter::success(&format!(
                "Exported {} bookmarks (sorted by tags) to {}",
                table.len(),
                output.display()
            ));
            Some(output.to_path_buf())
        }
        Err(e @ PersistError::UnsupportedFormat { .. }) => {
            OutputFormatter::error(&e.to_string());
            None
        }
        Err(e) => {
            OutputFormatter::error(&format!("Could not write table: {}", e));
            None
        }
    }
}

fn upload_rows(
    rows: &[Vec<String>],
    sync: &dyn SyncTarget,
    prompt: &dyn Prompt,
) -> Option<UploadOutcome> {
    match upload(rows, sync, prompt) {
        Ok(outcome) => {
            match &outcome {
                UploadOutcome::Disabled => debug!("remote sync not configured"),
                UploadOutcome::NothingToUpload => debug!("no rows to upload"),
                UploadOutcome::Declined => OutputFormatter::plain("Upload skipped."),
                UploadOutcome::Appended { start_row, rows } => OutputFormatter::success(
                    &format!("Appended {} rows to {} at row {}", rows, sync.describe(), start_row + 1),
                ),
            }
            Some(outcome)
        }
        Err(e) => {
            OutputFormatter::error(&format!("{} (local file is unaffected)", e));
            None
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
