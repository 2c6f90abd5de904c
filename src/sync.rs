//! Optional upload of the table to a remote spreadsheet.
//!
//! The remote side is a [`SyncTarget`]. When no credentials are configured the
//! pipeline gets a [`NullSyncTarget`], which reports itself disabled and never
//! does anything, so callers need no special casing. [`upload`] asks for
//! confirmation and appends rows after the last used remote row; existing
//! remote rows are never overwritten.

use dialoguer::Confirm;
use reqwest::Url;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Path to a file holding an OAuth2 access token.
pub const CREDENTIALS_ENV: &str = "GDRIVE_CREDENTIALS";
/// Spreadsheet id of the bookmarks sheet.
pub const SPREADSHEET_ENV: &str = "GDRIVE_BOOKMARKS_SPREADSHEET";
/// Optional worksheet (tab) name.
pub const SHEET_ENV: &str = "GDRIVE_BOOKMARKS_SHEET";

const DEFAULT_SHEET: &str = "Sheet1";
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const HTTP_TIMEOUT: Duration = Duration::from_secs(50);

/// Errors talking to the remote spreadsheet. Never fatal to a run.
#[derive(Debug)]
pub enum SyncError {
    /// The credential file is missing, unreadable or of an unsupported kind.
    Credentials(String),
    /// Transport-level failure.
    Http(String),
    /// The API answered with a non-success status.
    Api { status: u16, body: String },
    /// The confirmation prompt could not be shown.
    Prompt(String),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credentials(msg) => write!(f, "Remote sync credentials: {}", msg),
            Self::Http(msg) => write!(f, "Remote sync request failed: {}", msg),
            Self::Api { status, body } => {
                write!(f, "Remote sync API error {}: {}", status, body)
            }
            Self::Prompt(msg) => write!(f, "Could not read confirmation: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

impl From<reqwest::Error> for SyncError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

/// A remote table that rows can be appended to.
pub trait SyncTarget {
    /// False for the no-op target; [`upload`] skips disabled targets.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Human-readable name used in prompts.
    fn describe(&self) -> String;

    /// Number of rows currently used on the remote side.
    fn row_count(&self) -> SyncResult<usize>;

    /// Writes `rows` starting at zero-based row `start_row`.
    fn append_rows(&self, start_row: usize, rows: &[Vec<String>]) -> SyncResult<()>;
}

/// Target used when remote sync is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSyncTarget;

impl SyncTarget for NullSyncTarget {
    fn is_enabled(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        "remote sync disabled".to_string()
    }

    fn row_count(&self) -> SyncResult<usize> {
        Ok(0)
    }

    fn append_rows(&self, _start_row: usize, _rows: &[Vec<String>]) -> SyncResult<()> {
        Ok(())
    }
}

/// Where the Google Sheets target points, read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    pub credentials: PathBuf,
    pub spreadsheet_id: String,
    pub sheet: String,
}

impl SheetsConfig {
    /// Returns `None` unless both the credential path and the spreadsheet id
    /// are set and non-empty.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`SheetsConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let credentials = non_empty(CREDENTIALS_ENV)?;
        let spreadsheet_id = non_empty(SPREADSHEET_ENV)?;
        let sheet = non_empty(SHEET_ENV).unwrap_or_else(|| DEFAULT_SHEET.to_string());
        Some(Self {
            credentials: PathBuf::from(credentials),
            spreadsheet_id,
            sheet,
        })
    }
}

/// Google Sheets worksheet reached through the v4 REST API.
pub struct SheetsTarget {
    client: Client,
    token: String,
    config: SheetsConfig,
}

impl SheetsTarget {
    /// Reads the access token and builds the HTTP client. No request is sent.
    pub fn connect(config: SheetsConfig) -> SyncResult<Self> {
        let token = read_access_token(&config.credentials)?;
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            client,
            token,
            config,
        })
    }

    fn values_url(&self, range: &str) -> SyncResult<Url> {
        let mut url = Url::parse(SHEETS_API_BASE).map_err(|e| SyncError::Http(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SyncError::Http("invalid API base URL".to_string()))?
            .push(&self.config.spreadsheet_id)
            .push("values")
            .push(range);
        Ok(url)
    }
}

impl SyncTarget for SheetsTarget {
    fn describe(&self) -> String {
        format!(
            "Google Sheets {} ({})",
            self.config.spreadsheet_id, self.config.sheet
        )
    }

    fn row_count(&self) -> SyncResult<usize> {
        let url = self.values_url(&sheet_range(&self.config.sheet))?;
        let response = self.client.get(url).bearer_auth(&self.token).send()?;
        let body = check_status(response)?;
        let value: Value =
            serde_json::from_str(&body).map_err(|e| SyncError::Http(e.to_string()))?;
        Ok(used_rows(&value))
    }

    fn append_rows(&self, start_row: usize, rows: &[Vec<String>]) -> SyncResult<()> {
        let range = a1_start(&self.config.sheet, start_row);
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        debug!("PUT {} rows at {}", rows.len(), range);
        let response = self
            .client
            .put(url)
            .bearer_auth(&self.token)
            .json(&values_payload(&range, rows))
            .send()?;
        check_status(response)?;
        Ok(())
    }
}

fn check_status(response: reqwest::blocking::Response) -> SyncResult<String> {
    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(SyncError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

fn read_access_token(path: &std::path::Path) -> SyncResult<String> {
    let content = fs::read_to_string(path)
        .map_err(|e| SyncError::Credentials(format!("{}: {}", path.display(), e)))?;
    let token = content.trim();
    if token.is_empty() {
        return Err(SyncError::Credentials(format!(
            "{} is empty",
            path.display()
        )));
    }
    if token.starts_with('{') {
        return Err(SyncError::Credentials(format!(
            "{} looks like a service-account key; provide an OAuth2 access token instead",
            path.display()
        )));
    }
    Ok(token.to_string())
}

/// A1 range covering a whole worksheet.
fn sheet_range(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// A1 cell where writing starts; `start_row` is zero-based.
fn a1_start(sheet: &str, start_row: usize) -> String {
    format!("{}!A{}", sheet_range(sheet), start_row + 1)
}

fn used_rows(value: &Value) -> usize {
    value["values"].as_array().map_or(0, Vec::len)
}

fn values_payload(range: &str, rows: &[Vec<String>]) -> Value {
    json!({
        "range": range,
        "majorDimension": "ROWS",
        "values": rows,
    })
}

/// Yes/no question asked before anything is sent.
pub trait Prompt {
    fn confirm(&self, question: &str) -> SyncResult<bool>;
}

/// Interactive terminal prompt.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn confirm(&self, question: &str) -> SyncResult<bool> {
        Confirm::new()
            .with_prompt(question)
            .default(false)
            .interact()
            .map_err(|e| SyncError::Prompt(e.to_string()))
    }
}

/// Answers every question with a fixed value (`--yes`, tests).
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Prompt for FixedAnswer {
    fn confirm(&self, _question: &str) -> SyncResult<bool> {
        Ok(self.0)
    }
}

/// What [`upload`] ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// No target configured.
    Disabled,
    /// Nothing to send.
    NothingToUpload,
    /// The operator said no.
    Declined,
    /// Rows were written starting at zero-based `start_row`.
    Appended { start_row: usize, rows: usize },
}

/// Appends `rows` (no header) to `target` after confirmation.
pub fn upload(
    rows: &[Vec<String>],
    target: &dyn SyncTarget,
    prompt: &dyn Prompt,
) -> SyncResult<UploadOutcome> {
    if !target.is_enabled() {
        return Ok(UploadOutcome::Disabled);
    }
    if rows.is_empty() {
        return Ok(UploadOutcome::NothingToUpload);
    }

    let question = format!("Upload {} rows to {}?", rows.len(), target.describe());
    if !prompt.confirm(&question)? {
        return Ok(UploadOutcome::Declined);
    }

    let start_row = target.row_count()?;
    target.append_rows(start_row, rows)?;
    info!("appended {} rows at row {}", rows.len(), start_row);

    Ok(UploadOutcome::Appended {
        start_row,
        rows: rows.len(),
    })
}
