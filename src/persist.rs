//! Saving and loading the bookmark table as delimited text.

use crate::csv::{self, DELIMITER};
use crate::dataset::BookmarkTable;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension the output path must carry.
pub const TABLE_EXTENSION: &str = "csv";

/// Default output file when none is given.
pub const DEFAULT_OUTPUT: &str = "my_bookmarks.csv";

/// Errors that can occur while persisting or loading a table.
#[derive(Debug)]
pub enum PersistError {
    /// The destination does not end in `.csv`.
    UnsupportedFormat { path: PathBuf },
    /// Reading or writing the file failed.
    Io { path: PathBuf, source: std::io::Error },
    /// The file holds no header row.
    EmptyTable { path: PathBuf },
}

impl std::fmt::Display for PersistError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedFormat { path } => {
                let ext = path
                    .extension()
                    .map(|e| format!(".{}", e.to_string_lossy()))
                    .unwrap_or_else(|| "(none)".to_string());
                write!(
                    f,
                    "Invalid filename extension {} for {}: expected .{}",
                    ext,
                    path.display(),
                    TABLE_EXTENSION
                )
            }
            Self::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            Self::EmptyTable { path } => write!(f, "{} has no header row", path.display()),
        }
    }
}

impl std::error::Error for PersistError {}

pub type PersistResult<T> = Result<T, PersistError>;

/// True when `path` ends in `.csv` (case-insensitive).
pub fn is_table_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TABLE_EXTENSION))
}

/// Writes the table with a header row. Parent directories are created.
///
/// # Errors
///
/// `UnsupportedFormat` when the destination is not a `.csv` path; nothing is
/// written in that case.
pub fn save(table: &BookmarkTable, destination: &Path) -> PersistResult<()> {
    if !is_table_path(destination) {
        return Err(PersistError::UnsupportedFormat {
            path: destination.to_path_buf(),
        });
    }

    if let Some(parent) = destination.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| PersistError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let contents = csv::to_string(table.columns(), table.rows(), DELIMITER);
    fs::write(destination, contents).map_err(|e| PersistError::Io {
        path: destination.to_path_buf(),
        source: e,
    })
}

/// Reads a previously saved table. The first row is the header.
pub fn load(source: &Path) -> PersistResult<BookmarkTable> {
    if !is_table_path(source) {
        return Err(PersistError::UnsupportedFormat {
            path: source.to_path_buf(),
        });
    }
    let text = fs::read_to_string(source).map_err(|e| PersistError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;

    let mut rows = csv::parse_rows(&text, DELIMITER).into_iter();
    let columns = rows.next().ok_or_else(|| PersistError::EmptyTable {
        path: source.to_path_buf(),
    })?;
    Ok(BookmarkTable::new(columns, rows.collect()))
}
