//! The tagged bookmark table.
//!
//! [`DatasetBuilder`] turns extracted records into a [`BookmarkTable`]: every
//! row is classified, its tag set rendered as the tags string, and the rows
//! stably sorted by that string. The same builder can re-tag a table loaded
//! from a previous export, leaving every column other than `tags` untouched.

use crate::classify::{TagClassifier, TagSet};
use crate::config::UrlMatch;
use crate::extract::BookmarkRecord;
use crate::sanitize::clean_url;

pub const TAGS_COLUMN: &str = "tags";
pub const TITLE_COLUMN: &str = "Title";
pub const URL_COLUMN: &str = "url";
pub const ORIGINAL_URL_COLUMN: &str = "Original url";

/// Errors raised when a loaded table cannot be re-tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    /// A column needed for classification is absent.
    MissingColumn(&'static str),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::MissingColumn(name) => {
                write!(f, "Table has no '{}' column", name)
            }
        }
    }
}

impl std::error::Error for DatasetError {}

/// One classified bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedRow {
    pub tags: TagSet,
    pub title: String,
    /// The cleaned URL.
    pub url: String,
    /// The URL as stored in the bookmark.
    pub original_url: String,
}

/// Header plus rows of strings, the unit that gets persisted.
///
/// Every row has exactly as many cells as there are columns.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookmarkTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl BookmarkTable {
    /// Builds a table. Short rows are padded with empty cells; a row longer
    /// than the header widens the header with unnamed columns, so no cell is
    /// ever dropped.
    pub fn new(mut columns: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).fold(columns.len(), usize::max);
        columns.resize(width, String::new());
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell of `row` under column `name`, if both exist.
    pub fn cell(&self, row: usize, name: &str) -> Option<&str> {
        let col = self.column_index(name)?;
        self.rows.get(row).map(|r| r[col].as_str())
    }

    /// Rows whose tags string is empty.
    pub fn untagged(&self) -> Vec<&[String]> {
        match self.column_index(TAGS_COLUMN) {
            Some(col) => self
                .rows
                .iter()
                .filter(|row| row[col].trim().is_empty())
                .map(Vec::as_slice)
                .collect(),
            None => self.rows.iter().map(Vec::as_slice).collect(),
        }
    }

    pub fn untagged_count(&self) -> usize {
        self.untagged().len()
    }

    /// Stable sort on the tags string; equal strings keep their order.
    pub fn sort_by_tags(&mut self) {
        if let Some(col) = self.column_index(TAGS_COLUMN) {
            self.rows.sort_by(|a, b| a[col].cmp(&b[col]));
        }
    }

    /// Puts an empty `tags` column first when the table has none.
    fn ensure_tags_column(&mut self) -> usize {
        if let Some(col) = self.column_index(TAGS_COLUMN) {
            return col;
        }
        self.columns.insert(0, TAGS_COLUMN.to_string());
        for row in &mut self.rows {
            row.insert(0, String::new());
        }
        0
    }
}

/// Classifies records or existing tables.
pub struct DatasetBuilder<'a> {
    classifier: &'a TagClassifier,
    keep_original_url: bool,
}

impl<'a> DatasetBuilder<'a> {
    /// `keep_original_url` adds the `Original url` column to built tables.
    pub fn new(classifier: &'a TagClassifier, keep_original_url: bool) -> Self {
        Self {
            classifier,
            keep_original_url,
        }
    }

    /// Output columns of [`DatasetBuilder::build`].
    pub fn columns(&self) -> Vec<String> {
        let mut columns = vec![
            TAGS_COLUMN.to_string(),
            TITLE_COLUMN.to_string(),
            URL_COLUMN.to_string(),
        ];
        if self.keep_original_url {
            columns.push(ORIGINAL_URL_COLUMN.to_string());
        }
        columns
    }

    /// Classifies one record.
    pub fn tag_record(&self, record: &BookmarkRecord) -> TaggedRow {
        TaggedRow {
            tags: self
                .classifier
                .classify_urls(&record.title, &record.clean_url, &record.raw_url),
            title: record.title.clone(),
            url: record.clean_url.clone(),
            original_url: record.raw_url.clone(),
        }
    }

    /// Builds the sorted, projected table from freshly extracted records.
    pub fn build(&self, records: &[BookmarkRecord]) -> BookmarkTable {
        let rows = records
            .iter()
            .map(|record| {
                let row = self.tag_record(record);
                let mut cells = vec![row.tags.to_string(), row.title, row.url];
                if self.keep_original_url {
                    cells.push(row.original_url);
                }
                cells
            })
            .collect();

        let mut table = BookmarkTable::new(self.columns(), rows);
        table.sort_by_tags();
        table
    }

    /// Re-classifies a previously exported table and overwrites its tags.
    ///
    /// Titles come from `Title`; URLs from `url` and `Original url`, whichever
    /// exist. Prior tags are discarded, not merged.
    ///
    /// # Errors
    ///
    /// Fails when the table has no `Title` column or no URL column at all.
    pub fn retag(&self, mut table: BookmarkTable) -> Result<BookmarkTable, DatasetError> {
        let tags_col = table.ensure_tags_column();
        let title_col = table
            .column_index(TITLE_COLUMN)
            .ok_or(DatasetError::MissingColumn(TITLE_COLUMN))?;
        let url_col = table.column_index(URL_COLUMN);
        let original_col = table.column_index(ORIGINAL_URL_COLUMN);

        let url_cols = match (url_col, original_col) {
            (Some(u), Some(o)) => (u, o),
            (Some(u), None) => (u, u),
            (None, Some(o)) => (o, o),
            (None, None) => return Err(DatasetError::MissingColumn(URL_COLUMN)),
        };

        for row in &mut table.rows {
            let (clean_col, raw_col) = url_cols;
            let raw = row[raw_col].as_str();
            let clean = if url_col.is_some() {
                row[clean_col].as_str()
            } else {
                clean_url(raw)
            };
            let tags = match self.classifier.url_match() {
                UrlMatch::Clean => self.classifier.classify(&row[title_col], clean),
                UrlMatch::Raw => self.classifier.classify(&row[title_col], raw),
            };
            row[tags_col] = tags.to_string();
        }

        table.sort_by_tags();
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::tests::sample_classifier;
    use std::path::PathBuf;

    fn record(title: &str, raw_url: &str) -> BookmarkRecord {
        BookmarkRecord {
            title: title.to_string(),
            raw_url: raw_url.to_string(),
            clean_url: clean_url(raw_url).to_string(),
            path: PathBuf::from(format!("/bookmarks/{}.webloc", title)),
        }
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_build_projects_columns() {
        let classifier = sample_classifier();
        let table = DatasetBuilder::new(&classifier, false)
            .build(&[record("Deep Learning: A Primer", "https://a.io?x=1")]);
        assert_eq!(table.columns(), strings(&["tags", "Title", "url"]).as_slice());
        assert_eq!(
            table.rows()[0],
            strings(&["deep_learning", "Deep Learning: A Primer", "https://a.io"])
        );

        let table = DatasetBuilder::new(&classifier, true)
            .build(&[record("x", "https://a.io?x=1")]);
        assert_eq!(
            table.columns(),
            strings(&["tags", "Title", "url", "Original url"]).as_slice()
        );
        assert_eq!(table.cell(0, ORIGINAL_URL_COLUMN), Some("https://a.io?x=1"));
    }

    #[test]
    fn test_build_sorts_by_tags_stably() {
        let classifier = sample_classifier();
        let records = [
            record("first untagged", "https://one.io"),
            record("Rust book", "https://two.io"),
            record("second untagged", "https://three.io"),
            record("deep learning notes", "https://github.com/x"),
            record("third untagged", "https://four.io"),
        ];
        let table = DatasetBuilder::new(&classifier, false).build(&records);
        let titles: Vec<&str> = (0..table.len())
            .map(|i| table.cell(i, TITLE_COLUMN).unwrap())
            .collect();
        assert_eq!(
            titles,
            vec![
                "first untagged",
                "second untagged",
                "third untagged",
                "deep learning notes",
                "Rust book",
            ]
        );
        assert_eq!(table.cell(3, TAGS_COLUMN), Some("deep_learning github"));
        assert_eq!(table.untagged_count(), 3);
    }

    #[test]
    fn test_build_empty() {
        let classifier = sample_classifier();
        let table = DatasetBuilder::new(&classifier, true).build(&[]);
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 4);
    }

    #[test]
    fn test_retag_overwrites_tags_and_keeps_other_columns() {
        let classifier = sample_classifier();
        let table = BookmarkTable::new(
            strings(&["tags", "Title", "url", "Notes"]),
            vec![
                strings(&["stale", "Rust in action", "https://x.io", "keep me"]),
                strings(&["", "Nothing here", "https://github.com/a", "and me"]),
            ],
        );
        let retagged = DatasetBuilder::new(&classifier, false).retag(table).unwrap();
        assert_eq!(
            retagged.rows(),
            &[
                strings(&["github", "Nothing here", "https://github.com/a", "and me"]),
                strings(&["rust", "Rust in action", "https://x.io", "keep me"]),
            ]
        );
    }

    #[test]
    fn test_retag_adds_missing_tags_column() {
        let classifier = sample_classifier();
        let table = BookmarkTable::new(
            strings(&["Title", "Original url"]),
            vec![strings(&["Paper", "https://arxiv.org/abs/1?v=2"])],
        );
        let retagged = DatasetBuilder::new(&classifier, false).retag(table).unwrap();
        assert_eq!(retagged.columns()[0], TAGS_COLUMN);
        assert_eq!(retagged.cell(0, TAGS_COLUMN), Some("arxiv"));
        assert_eq!(retagged.cell(0, "Original url"), Some("https://arxiv.org/abs/1?v=2"));
    }

    #[test]
    fn test_retag_is_stable() {
        let classifier = sample_classifier();
        let builder = DatasetBuilder::new(&classifier, true);
        let records = [
            record("b untagged", "https://b.io"),
            record("Rust", "https://github.com"),
            record("a untagged", "https://a.io"),
        ];
        let once = builder.retag(builder.build(&records)).unwrap();
        let twice = builder.retag(once.clone()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_retag_requires_title() {
        let classifier = sample_classifier();
        let table = BookmarkTable::new(strings(&["tags", "url"]), vec![]);
        let result = DatasetBuilder::new(&classifier, false).retag(table);
        assert_eq!(result, Err(DatasetError::MissingColumn(TITLE_COLUMN)));
    }

    #[test]
    fn test_retag_requires_some_url() {
        let classifier = sample_classifier();
        let table = BookmarkTable::new(strings(&["tags", "Title"]), vec![]);
        let result = DatasetBuilder::new(&classifier, false).retag(table);
        assert_eq!(result, Err(DatasetError::MissingColumn(URL_COLUMN)));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = BookmarkTable::new(strings(&["tags", "Title", "url"]), vec![strings(&["x"])]);
        assert_eq!(table.rows()[0].len(), 3);
        assert_eq!(table.untagged_count(), 0);
    }

    #[test]
    fn test_long_rows_widen_header() {
        let table = BookmarkTable::new(
            strings(&["tags", "Title", "url"]),
            vec![
                strings(&["", "Rust", "https://a.io", "extra note"]),
                strings(&["", "Other", "https://b.io"]),
            ],
        );
        assert_eq!(table.columns(), strings(&["tags", "Title", "url", ""]));
        assert_eq!(table.rows()[0][3], "extra note");
        assert_eq!(table.rows()[1][3], "");
    }

    #[test]
    fn test_retag_keeps_cells_beyond_header() {
        let classifier = sample_classifier();
        let table = BookmarkTable::new(
            strings(&["tags", "Title", "url"]),
            vec![strings(&["", "Rust", "https://a.io", "extra note"])],
        );
        let table = DatasetBuilder::new(&classifier, true).retag(table).unwrap();
        assert_eq!(table.rows()[0], strings(&["rust", "Rust", "https://a.io", "extra note"]));
    }
}
