//! Scan report output: results directory, CSV details, and text summary.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{ReportConfig, ScanConfig};
use crate::design_doc::DesignDocument;
use crate::errors::{CoreError, ReportError, ScanError};
use crate::index::ViewIndex;
use crate::scan::{ScanOutcome, ScanTask};
use crate::view::ConflictsView;

const RESULTS_DIR: &str = "results";
const FILE_PREFIX: &str = "conflicts_";

/// Local time formatted for use in file names.
pub fn timestamp_now() -> String {
    Local::now().format("%Y-%m-%d_%H-%M-%S").to_string()
}

pub fn default_results_dir(timestamp: &str) -> PathBuf {
    Path::new(RESULTS_DIR).join(format!("{}results_{}", FILE_PREFIX, timestamp))
}

pub fn default_csv_file(timestamp: &str) -> String {
    format!("{}details_{}.csv", FILE_PREFIX, timestamp)
}

pub fn default_summary_file(timestamp: &str) -> String {
    format!("{}summary_{}.txt", FILE_PREFIX, timestamp)
}

// ---------------------------------------------------------------------------
// Filesystem helpers
// ---------------------------------------------------------------------------

/// Create the results directory and any missing parents.
///
/// A directory that already exists is reported but not treated as an error.
pub fn create_results_dir(path: &Path) -> Result<(), ReportError> {
    if path.is_dir() {
        warn!(path = %path.display(), "results directory already exists");
        return Ok(());
    }

    info!(path = %path.display(), "creating results directory");
    std::fs::create_dir_all(path).map_err(|source| ReportError::DirectoryCreate {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `content` to a UTF-8 text file, replacing any existing file.
pub fn write_text_file(path: &Path, content: &str) -> Result<(), ReportError> {
    std::fs::write(path, content).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = content.len(), "wrote text file");
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// CSV writer using the Excel dialect: comma separated, fields quoted only
/// when needed, records terminated by `\r\n`.
pub struct CsvWriter<W: Write> {
    inner: csv::Writer<W>,
    records: usize,
}

impl<W: Write> CsvWriter<W> {
    pub fn new(inner: W) -> Self {
        let inner = csv::WriterBuilder::new()
            .delimiter(b',')
            .quote_style(csv::QuoteStyle::Necessary)
            .terminator(csv::Terminator::CRLF)
            .flexible(true)
            .from_writer(inner);
        Self { inner, records: 0 }
    }

    /// Write one record.
    pub fn write_record<I, S>(&mut self, fields: I) -> io::Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        self.inner.write_record(fields)?;
        self.records += 1;
        Ok(())
    }

    /// Number of records written so far, header included.
    pub fn records(&self) -> usize {
        self.records
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    /// Flush buffered records and hand back the underlying writer.
    pub fn into_inner(self) -> io::Result<W> {
        self.inner.into_inner().map_err(|e| e.into_error())
    }
}

// ---------------------------------------------------------------------------
// End-to-end report
// ---------------------------------------------------------------------------

/// Scan view rows and write the CSV details and summary files.
pub fn write_scan_report<I>(config: &ReportConfig, rows: I) -> Result<ScanOutcome, ScanError>
where
    I: IntoIterator<Item = Value>,
{
    create_results_dir(&config.results_dir)?;

    let csv_path = config.csv_path();
    let file = File::create(&csv_path).map_err(|source| ReportError::Io {
        path: csv_path.clone(),
        source,
    })?;
    let mut csv = CsvWriter::new(BufWriter::new(file));

    let outcome = ScanTask::new().run(rows, &mut csv)?;
    csv.flush().map_err(|source| ReportError::Io {
        path: csv_path.clone(),
        source,
    })?;
    info!(path = %csv_path.display(), records = csv.records(), "wrote CSV details");

    write_text_file(&config.summary_path(), &outcome.summary.to_string())?;
    Ok(outcome)
}

/// Index `docs` with the conflicts view registered in `ddoc` and write the
/// scan report for the resulting rows.
///
/// `ddoc` must be the design document named in `config.view` and declare
/// the configured view.
pub fn scan_documents<'a, I>(
    config: &ScanConfig,
    ddoc: &DesignDocument,
    docs: I,
) -> Result<ScanOutcome, CoreError>
where
    I: IntoIterator<Item = &'a Value>,
{
    ddoc.validate_registration(&config.view.design_document, &config.view.view_name)?;
    let level = config.report.level()?;
    info!(
        design_doc = %ddoc.id,
        view = %config.view.view_name,
        log_level = %level,
        "starting conflicts scan"
    );

    let index = ViewIndex::build(&ConflictsView, docs);
    Ok(write_scan_report(&config.report, index.json_rows())?)
}
