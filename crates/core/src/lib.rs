//! couchconflicts core library.
//!
//! This crate indexes documents that carry unresolved conflicting revisions:
//! the conflicts view map function, the design document that registers it,
//! an in-memory view index, and a scan that turns view rows into a CSV
//! details file and a summary report.

pub mod config;
pub mod design_doc;
pub mod document;
pub mod errors;
pub mod index;
pub mod report;
pub mod scan;
pub mod view;

// Re-exports for convenience.
pub use config::{ReportConfig, ScanConfig, ViewConfig};
pub use design_doc::DesignDocument;
pub use index::{ViewIndex, ViewRow};
pub use scan::{ScanOutcome, ScanSummary, ScanTask};
pub use view::{ConflictsView, Emitter, IndexEntry, MapFunction};
