//! Output formatting and styling module.
//!
//! All user-facing console output goes through [`OutputFormatter`], so
//! styling stays consistent across the extract, retag and add commands.

use crate::dataset::{BookmarkTable, TAGS_COLUMN, TITLE_COLUMN};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Widest title shown in the untagged report before truncation.
const MAX_TITLE_WIDTH: usize = 80;

/// Manages all CLI output with consistent styling and formatting.
///
/// - Success messages (green with ✓)
/// - Error messages (red with ✗, on stderr)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - A progress bar for the extraction batch
/// - The untagged-rows report
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use bookmark_tagger::output::OutputFormatter;
    /// OutputFormatter::success("Exported 42 bookmarks");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar over `total` bookmark files.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Lists untagged rows (tags and title) followed by their count, so they
    /// can be curated by hand.
    pub fn untagged_report(table: &BookmarkTable) {
        let untagged = table.untagged();
        let title_col = table.column_index(TITLE_COLUMN);

        Self::header("----- Untagged -----");
        if untagged.is_empty() {
            Self::success("Every bookmark has at least one tag");
        }
        for row in &untagged {
            let title = title_col.map(|c| row[c].as_str()).unwrap_or("");
            println!("  {}", truncate(title, MAX_TITLE_WIDTH));
        }

        let count = untagged.len().to_string();
        let count = if untagged.is_empty() {
            count.green()
        } else {
            count.yellow()
        };
        println!("Untagged rows: {} of {}", count.bold(), table.len());
    }

    /// Prints a tags/title/url triple for a single bookmark.
    pub fn bookmark(tags: &str, title: &str, url: &str) {
        let tags = if tags.is_empty() { "(none)" } else { tags };
        println!("  {:<6} {}", format!("{}:", TAGS_COLUMN).bold(), tags.green());
        println!("  {:<6} {}", "title:".bold(), title);
        println!("  {:<6} {}", "url:".bold(), url.cyan());
    }
}

/// Shortens `text` to at most `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
