//! bookmark-tagger - turn a folder of `.webloc` bookmarks into a tagged CSV
//!
//! The pipeline runs in one direction: bookmark files are extracted into
//! records ([`extract`]), each record is classified by regex tag rules
//! ([`classify`]), the rows are assembled and sorted into a table
//! ([`dataset`]), written as CSV ([`persist`]) and optionally appended to a
//! remote spreadsheet ([`sync`]). A previously exported CSV can re-enter the
//! pipeline at the table stage to be re-tagged.

pub mod classify;
pub mod cli;
pub mod config;
pub mod csv;
pub mod dataset;
pub mod extract;
pub mod logging;
pub mod output;
pub mod page;
pub mod persist;
pub mod sanitize;
pub mod sync;
pub mod webloc;

pub use classify::{TagClassifier, TagRule, TagSet};
pub use config::{ConfigError, RuleConfig, UrlMatch};
pub use dataset::{BookmarkTable, DatasetBuilder, TaggedRow};
pub use extract::{BookmarkRecord, ExtractionError, LinkExtractor, RenamePlan};
pub use persist::PersistError;
pub use sync::{NullSyncTarget, SyncError, SyncTarget};

pub use cli::{RunOptions, RunSummary, TagCommand, run_cli};
