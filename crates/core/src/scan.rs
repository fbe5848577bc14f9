//! Scan of conflicts view rows.
//!
//! A scan walks the rows returned by the conflicts view, rejects rows that
//! cannot be interpreted, normalizes the name key, writes one CSV record per
//! conflicted document, and keeps running totals.

use std::fmt;
use std::io::Write;
use std::time::Instant;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, trace};

use crate::errors::{RowError, ScanError};
use crate::report::CsvWriter;

/// Name written for rows whose key is not a usable string.
pub const UNRESOLVED_NAME: &str = "__UNRESOLVED__";

/// Replacement for control characters found in names.
pub const SUBSTITUTE_CHAR: char = '\u{2588}';

/// Header of the CSV details file.
pub const CSV_HEADER: [&str; 4] = ["ID", "Name", "Conflicts", "Revisions"];

const REVISION_SEPARATOR: &str = "; ";
const PROGRESS_MAJOR: usize = 100;
const PROGRESS_MINOR: usize = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A validated, normalized view row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictRecord {
    /// Document ID.
    pub id: String,
    /// Sanitized name, or [`UNRESOLVED_NAME`].
    pub name: String,
    /// Conflicting revision IDs, in view order.
    pub revisions: Vec<String>,
}

impl ConflictRecord {
    pub fn conflict_count(&self) -> usize {
        self.revisions.len()
    }

    fn csv_fields(&self) -> [String; 4] {
        [
            self.id.clone(),
            self.name.clone(),
            self.conflict_count().to_string(),
            self.revisions.join(REVISION_SEPARATOR),
        ]
    }
}

impl fmt::Display for ConflictRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Document ID: {}. Name: {}. Conflicts: {}.",
            self.id,
            self.name,
            self.conflict_count()
        )
    }
}

/// Running totals of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub conflicted_documents: usize,
    pub conflicted_revisions: usize,
    pub rejected_rows: usize,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = "=".repeat(80);
        writeln!(f)?;
        writeln!(f, "{}", line)?;
        writeln!(f, "Scan Details")?;
        writeln!(f, "{}", line)?;
        writeln!(f)?;
        writeln!(f, "{:<38}{}", "- Total Conflicted Documents:", self.conflicted_documents)?;
        writeln!(f, "{:<38}{}", "- Total Conflicted Revisions:", self.conflicted_revisions)?;
        writeln!(f, "{:<38}{}", "- Total Rejected Rows:", self.rejected_rows)
    }
}

/// Result of a completed scan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanOutcome {
    pub records: Vec<ConflictRecord>,
    pub summary: ScanSummary,
    /// Rows in the result set, rejected ones included.
    pub scanned_rows: usize,
}

impl ScanOutcome {
    /// True when the view returned no rows at all.
    pub fn is_empty_result(&self) -> bool {
        self.scanned_rows == 0
    }
}

// ---------------------------------------------------------------------------
// Row handling
// ---------------------------------------------------------------------------

/// Validate a raw view row and normalize it into a [`ConflictRecord`].
///
/// `index` is the row's position in the result set and only feeds error
/// messages.
pub fn parse_row(row: &Value, index: usize) -> Result<ConflictRecord, RowError> {
    let fields = match row.as_object() {
        Some(fields) => fields,
        None => return Err(RowError::UndefinedRow { index }),
    };

    let id = fields
        .get("id")
        .and_then(Value::as_str)
        .ok_or(RowError::MissingId { index })?;

    let key = fields.get("key").ok_or_else(|| RowError::MissingKey {
        index,
        id: id.to_string(),
    })?;

    let value = fields.get("value").ok_or_else(|| RowError::MissingValue {
        index,
        id: id.to_string(),
    })?;

    let revisions = value
        .as_array()
        .filter(|items| !items.is_empty())
        .and_then(|items| {
            items
                .iter()
                .map(|rev| rev.as_str().map(str::to_owned))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| RowError::InvalidRevisions {
            index,
            id: id.to_string(),
        })?;

    Ok(ConflictRecord {
        id: id.to_string(),
        name: normalize_name(key),
        revisions,
    })
}

/// Turn a view key into a printable name.
///
/// Non-empty strings have ASCII control characters replaced with
/// [`SUBSTITUTE_CHAR`]; anything else becomes [`UNRESOLVED_NAME`].
pub fn normalize_name(key: &Value) -> String {
    match key.as_str() {
        Some(name) if !name.is_empty() => name
            .chars()
            .map(|c| if c.is_ascii_control() { SUBSTITUTE_CHAR } else { c })
            .collect(),
        _ => UNRESOLVED_NAME.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// Single-pass scan over view rows.
#[derive(Debug, Default)]
pub struct ScanTask {
    summary: ScanSummary,
    records: Vec<ConflictRecord>,
}

impl ScanTask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process every row, writing the CSV header followed by one record per
    /// valid row. Invalid rows are logged and counted, never fatal.
    pub fn run<I, W>(mut self, rows: I, csv: &mut CsvWriter<W>) -> Result<ScanOutcome, ScanError>
    where
        I: IntoIterator<Item = Value>,
        W: Write,
    {
        let started = Instant::now();
        info!("scanning conflicts view rows");

        csv.write_record(CSV_HEADER)?;

        let mut scanned_rows = 0usize;
        for (index, row) in rows.into_iter().enumerate() {
            scanned_rows = index + 1;
            self.process_row(index, &row, csv)?;
        }

        let outcome = ScanOutcome {
            records: self.records,
            summary: self.summary,
            scanned_rows,
        };

        if outcome.is_empty_result() {
            info!("no conflicted documents found");
        }

        info!(
            rows = scanned_rows,
            documents = outcome.summary.conflicted_documents,
            revisions = outcome.summary.conflicted_revisions,
            rejected = outcome.summary.rejected_rows,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "scan complete"
        );

        Ok(outcome)
    }

    fn process_row<W: Write>(
        &mut self,
        index: usize,
        row: &Value,
        csv: &mut CsvWriter<W>,
    ) -> Result<(), ScanError> {
        trace!(index, row = %row, "processing view row");

        let record = match parse_row(row, index) {
            Ok(record) => record,
            Err(e) => {
                error!(error = %e, "rejected view row");
                self.summary.rejected_rows += 1;
                return Ok(());
            }
        };

        debug!(index, "{}", record);
        csv.write_record(record.csv_fields())?;

        self.summary.conflicted_documents += 1;
        self.summary.conflicted_revisions += record.conflict_count();
        self.records.push(record);

        let processed = self.summary.conflicted_documents;
        if processed % PROGRESS_MAJOR == 0 {
            info!(processed, "scan progress");
        } else if processed % PROGRESS_MINOR == 0 {
            debug!(processed, "scan progress");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(rows: Vec<Value>) -> (ScanOutcome, String) {
        let mut csv = CsvWriter::new(Vec::new());
        let outcome = ScanTask::new().run(rows, &mut csv).unwrap();
        (outcome, String::from_utf8(csv.into_inner().unwrap()).unwrap())
    }

    #[test]
    fn test_parse_valid_row() {
        let row = json!({"id": "doc-1", "key": "widget", "value": ["1-a", "2-b"]});
        let record = parse_row(&row, 0).unwrap();
        assert_eq!(record.id, "doc-1");
        assert_eq!(record.name, "widget");
        assert_eq!(record.revisions, vec!["1-a", "2-b"]);
        assert_eq!(record.conflict_count(), 2);
    }

    #[test]
    fn test_parse_row_errors_in_order() {
        assert_eq!(parse_row(&json!(null), 4), Err(RowError::UndefinedRow { index: 4 }));
        assert_eq!(
            parse_row(&json!({"key": "k", "value": ["1-a"]}), 1),
            Err(RowError::MissingId { index: 1 })
        );
        assert_eq!(
            parse_row(&json!({"id": "d", "value": ["1-a"]}), 2),
            Err(RowError::MissingKey { index: 2, id: "d".into() })
        );
        assert_eq!(
            parse_row(&json!({"id": "d", "key": null}), 3),
            Err(RowError::MissingValue { index: 3, id: "d".into() })
        );
    }

    #[test]
    fn test_parse_row_rejects_bad_revisions() {
        for value in [json!([]), json!("1-a"), json!([1, 2]), json!({"rev": "1-a"})] {
            let row = json!({"id": "d", "key": "k", "value": value});
            assert!(matches!(
                parse_row(&row, 0),
                Err(RowError::InvalidRevisions { .. })
            ));
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name(&json!("widget")), "widget");
        assert_eq!(normalize_name(&json!("a\tb\u{7f}c")), "a\u{2588}b\u{2588}c");
        assert_eq!(normalize_name(&json!(null)), UNRESOLVED_NAME);
        assert_eq!(normalize_name(&json!("")), UNRESOLVED_NAME);
        assert_eq!(normalize_name(&json!(12)), UNRESOLVED_NAME);
    }

    #[test]
    fn test_run_writes_csv_and_totals() {
        let rows = vec![
            json!({"id": "doc-1", "key": "widget, large", "value": ["1-a", "1-b"]}),
            json!({"id": "doc-2", "key": null, "value": ["2-c"]}),
            json!({"id": "doc-3", "key": "x", "value": []}),
        ];
        let (outcome, csv) = run(rows);

        assert_eq!(
            outcome.summary,
            ScanSummary {
                conflicted_documents: 2,
                conflicted_revisions: 3,
                rejected_rows: 1,
            }
        );
        assert_eq!(outcome.records.len(), 2);
        assert_eq!(
            csv,
            "ID,Name,Conflicts,Revisions\r\n\
             doc-1,\"widget, large\",2,1-a; 1-b\r\n\
             doc-2,__UNRESOLVED__,1,2-c\r\n"
        );
    }

    #[test]
    fn test_run_with_no_rows_writes_header_only() {
        let (outcome, csv) = run(Vec::new());
        assert_eq!(outcome.summary, ScanSummary::default());
        assert!(outcome.records.is_empty());
        assert_eq!(csv, "ID,Name,Conflicts,Revisions\r\n");
        assert_eq!(outcome.scanned_rows, 0);
        assert!(outcome.is_empty_result());
    }

    #[test]
    fn test_all_rows_rejected_is_not_an_empty_result() {
        let (outcome, csv) = run(vec![json!(null), json!({"id": "d", "key": "k"})]);
        assert_eq!(outcome.summary.conflicted_documents, 0);
        assert_eq!(outcome.summary.rejected_rows, 2);
        assert_eq!(outcome.scanned_rows, 2);
        assert!(!outcome.is_empty_result());
        assert_eq!(csv, "ID,Name,Conflicts,Revisions\r\n");
    }

    #[test]
    fn test_summary_display() {
        let summary = ScanSummary {
            conflicted_documents: 12,
            conflicted_revisions: 30,
            rejected_rows: 0,
        };
        let text = summary.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "=".repeat(80));
        assert_eq!(lines[2], "Scan Details");
        assert_eq!(lines[5], "- Total Conflicted Documents:         12");
        assert_eq!(lines[6], "- Total Conflicted Revisions:         30");
        assert_eq!(lines[7], "- Total Rejected Rows:                0");
    }

    #[test]
    fn test_record_display() {
        let record = ConflictRecord {
            id: "doc-9".into(),
            name: "alice".into(),
            revisions: vec!["1-a".into()],
        };
        assert_eq!(record.to_string(), "Document ID: doc-9. Name: alice. Conflicts: 1.");
    }
}
