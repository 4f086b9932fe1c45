//! Loader error types

use std::path::PathBuf;

use thiserror::Error;

use cablebox_csv::CsvError;
use cablebox_xlsx::XlsxError;

/// Why a candidate file could not be read as a table
#[derive(Debug, Error)]
pub enum SheetError {
    /// XLSX container or part could not be read
    #[error(transparent)]
    Xlsx(#[from] XlsxError),

    /// CSV content could not be read
    #[error(transparent)]
    Csv(#[from] CsvError),

    /// File metadata could not be read
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No reader handles this extension
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
}

/// A required column is absent after header trimming
#[derive(Debug, Error)]
#[error("required column '{column}' not found (headers: {})", .found.join(", "))]
pub struct MissingColumn {
    /// Primary name of the missing column
    pub column: String,
    /// Trimmed headers that were present
    pub found: Vec<String>,
}

/// Broad classes of load failure, each needing a different operator action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadErrorKind {
    /// Nothing to load: provide a spreadsheet
    SourceNotFound,
    /// A file exists but is unreadable: fix or replace it
    ParseFailure,
    /// A file was read but lacks required columns: fix its headers
    SchemaMismatch,
}

/// A failed load attempt, returned as a value so callers can report it and carry on
#[derive(Debug, Error)]
pub enum LoadError {
    /// No candidate spreadsheet in the scanned directory
    #[error("no inventory spreadsheet found in {}", .directory.display())]
    SourceNotFound {
        directory: PathBuf,
        #[source]
        cause: Option<std::io::Error>,
    },

    /// The candidate exists but could not be parsed
    #[error("could not read {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: SheetError,
    },

    /// The candidate parsed but required columns are missing
    #[error("{} is not an inventory sheet: {source}", .path.display())]
    SchemaMismatch {
        path: PathBuf,
        #[source]
        source: MissingColumn,
    },
}

impl LoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            LoadError::SourceNotFound { .. } => LoadErrorKind::SourceNotFound,
            LoadError::Parse { .. } => LoadErrorKind::ParseFailure,
            LoadError::SchemaMismatch { .. } => LoadErrorKind::SchemaMismatch,
        }
    }

    /// Schema mismatches count as parse failures when reporting
    pub fn is_parse_failure(&self) -> bool {
        matches!(
            self.kind(),
            LoadErrorKind::ParseFailure | LoadErrorKind::SchemaMismatch
        )
    }
}

/// Errors reading a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON or unknown option
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
}
