//! # cablebox
//!
//! Look up theater circuit boxes in a cable/connector inventory spreadsheet.
//!
//! The pipeline runs in one direction:
//!
//! - [`Loader`] finds the spreadsheet in a directory ([`select_source`]),
//!   parses it into a [`Sheet`] and normalizes it into an [`InventoryTable`].
//! - [`Resolver`] normalizes operator input with the same key rule, looks up
//!   the matching rows and derives the box details and interface summary.
//! - [`InventoryCache`] shares one read-only table between queries and
//!   rebuilds it when the source file changes.
//!
//! Load failures are returned as [`LoadError`] values so a front end can show
//! them and keep running.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cablebox::{Loader, LoaderConfig, QueryOutcome, Resolver};
//!
//! let config = LoaderConfig::default().with_source_dir("/srv/inventory");
//! let table = Loader::new(config.clone()).load()?;
//!
//! match Resolver::from_config(&config).query(&table, "04-01") {
//!     QueryOutcome::Found(report) => println!("{} in {}", report.key, report.details.hall),
//!     QueryOutcome::NotFound { key } => println!("no box {}", key),
//!     QueryOutcome::Idle => {}
//! }
//! # Ok::<(), cablebox::LoadError>(())
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod loader;
pub mod resolver;

pub use cache::{InventoryCache, SourceIdentity};
pub use config::{ColumnAliases, LoaderConfig};
pub use error::{ConfigError, LoadError, LoadErrorKind, MissingColumn, SheetError};
pub use loader::{select_source, Loader, LOCK_FILE_MARKER};
pub use resolver::{
    present_summary, summarize, BoxDetails, BoxReport, MatchSet, QueryOutcome, Resolver,
};

// Re-export core types
pub use cablebox_core::{
    CellValue, HallCode, HallCodes, HallMatch, InterfaceSummaryRow, InventoryRow, InventoryTable,
    KeyNormalizer, Sheet,
};

// Re-export reader types
pub use cablebox_csv::{CsvError, CsvReadOptions, CsvReader};
pub use cablebox_xlsx::{XlsxError, XlsxReader};
