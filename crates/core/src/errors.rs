//! Error types for the couchconflicts core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them for callers that want a single
//! error type. The conflict view itself never fails; these errors belong to
//! configuration, the design document, and the scan report.

use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    DesignDoc(#[from] DesignDocError),

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Scan(#[from] ScanError),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Design document errors
// ---------------------------------------------------------------------------

/// Errors from building, parsing, or checking a design document.
#[derive(Debug, Error)]
pub enum DesignDocError {
    /// The design document does not declare the requested view.
    #[error("design document has no view named '{0}'")]
    MissingView(String),

    /// The design document is not the one the scan is configured for.
    #[error("expected design document '{expected}', found '{found}'")]
    NameMismatch { expected: String, found: String },

    /// The view is declared but its map function source is empty.
    #[error("view '{0}' has an empty map function")]
    EmptyMap(String),

    /// JSON (de)serialization failure.
    #[error("design document JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// View row errors
// ---------------------------------------------------------------------------

/// A view row that cannot be turned into a conflict record.
///
/// These are reported and skipped during a scan; they never abort it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("undefined row encountered in the view result set at index [{index}]")]
    UndefinedRow { index: usize },

    #[error("row with an undefined ID encountered in the view result set at index [{index}]")]
    MissingId { index: usize },

    #[error(
        "row with an undefined key encountered in the view result set at index [{index}], document ID: {id}"
    )]
    MissingKey { index: usize, id: String },

    #[error(
        "row with an undefined value encountered in the view result set at index [{index}], document ID: {id}"
    )]
    MissingValue { index: usize, id: String },

    #[error(
        "invalid or empty list of conflicted revisions in the view result set at index [{index}], document ID: {id}"
    )]
    InvalidRevisions { index: usize, id: String },
}

// ---------------------------------------------------------------------------
// Report errors
// ---------------------------------------------------------------------------

/// Errors from writing the scan report to disk.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The results directory could not be created.
    #[error("failed to create results directory '{}': {source}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A report file could not be written.
    #[error("failed to write report file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Scan errors
// ---------------------------------------------------------------------------

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Writing to the CSV sink failed.
    #[error("scan output error: {0}")]
    Io(#[from] std::io::Error),

    /// Report files could not be produced.
    #[error("scan report error: {0}")]
    Report(#[from] ReportError),
}
