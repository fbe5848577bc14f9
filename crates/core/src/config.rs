//! TOML-based configuration for conflict scans.
//!
//! Every field has a default, so an empty file (or no file at all, via
//! [`ScanConfig::default`]) is a valid configuration. Default report file
//! names carry the local time the configuration was created.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, Level};

use crate::design_doc::{self, DesignDocument};
use crate::errors::ConfigError;
use crate::report;
use crate::view;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level scan configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Which design document and view the scan reads.
    #[serde(default)]
    pub view: ViewConfig,

    /// Where and how the scan report is written.
    #[serde(default)]
    pub report: ReportConfig,
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// Names the conflicts view is registered under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewConfig {
    /// Design document name, without the `_design/` prefix.
    #[serde(default = "default_design_document")]
    pub design_document: String,

    /// View name inside the design document.
    #[serde(default = "default_view_name")]
    pub view_name: String,
}

fn default_design_document() -> String {
    design_doc::DESIGN_DOC_NAME.into()
}
fn default_view_name() -> String {
    view::VIEW_NAME.into()
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            design_document: default_design_document(),
            view_name: default_view_name(),
        }
    }
}

impl ViewConfig {
    /// The design document to register for these names.
    pub fn design_doc(&self) -> DesignDocument {
        DesignDocument::named(&self.design_document, &self.view_name)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Output locations for the scan report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory the report files are written into (created if missing).
    pub results_dir: PathBuf,

    /// CSV details file name, relative to `results_dir`.
    pub csv_file: String,

    /// Summary text file name, relative to `results_dir`.
    pub summary_file: String,

    /// Log verbosity for the scan (`trace`, `debug`, `info`, `warn`, `error`).
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for ReportConfig {
    fn default() -> Self {
        let timestamp = report::timestamp_now();
        Self {
            results_dir: report::default_results_dir(&timestamp),
            csv_file: report::default_csv_file(&timestamp),
            summary_file: report::default_summary_file(&timestamp),
            log_level: default_log_level(),
        }
    }
}

impl ReportConfig {
    /// Full path of the CSV details file.
    pub fn csv_path(&self) -> PathBuf {
        self.results_dir.join(&self.csv_file)
    }

    /// Full path of the summary file.
    pub fn summary_path(&self) -> PathBuf {
        self.results_dir.join(&self.summary_file)
    }

    /// Parsed `log_level`, for installing a subscriber.
    pub fn level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse::<Level>()
            .map_err(|_| ConfigError::InvalidValue {
                field: "report.log_level".into(),
                detail: format!(
                    "'{}' is not one of trace, debug, info, warn, error",
                    self.log_level
                ),
            })
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl ScanConfig {
    /// Load a [`ScanConfig`] from a TOML file at the given path.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: ScanConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Validate that all values are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_file_name("view.design_document", &self.view.design_document)?;
        if self.view.view_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "view.view_name".into(),
                detail: "view name must not be empty".into(),
            });
        }

        if self.report.results_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "report.results_dir".into(),
                detail: "results directory must not be empty".into(),
            });
        }
        validate_file_name("report.csv_file", &self.report.csv_file)?;
        validate_file_name("report.summary_file", &self.report.summary_file)?;

        if self.report.csv_file == self.report.summary_file {
            return Err(ConfigError::InvalidValue {
                field: "report.summary_file".into(),
                detail: "summary file must differ from the CSV file".into(),
            });
        }
        self.report.level()?;

        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}

fn validate_file_name(field: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.into(),
            detail: "name must not be empty".into(),
        });
    }
    if name.contains('/') || name.contains('\\') {
        return Err(ConfigError::InvalidValue {
            field: field.into(),
            detail: format!("'{}' must be a bare name, not a path", name),
        });
    }
    Ok(())
}
