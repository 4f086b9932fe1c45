//! # cablebox-core
//!
//! Core data structures for the cablebox circuit-box inventory.
//!
//! This crate provides the fundamental types used throughout cablebox:
//! - [`CellValue`] and [`CellAddress`] - what format readers produce
//! - [`Sheet`] - one worksheet as a trimmed header row plus data rows
//! - [`KeyNormalizer`] - the single box-id/query key normalization
//! - [`HallCodes`] - the hall-name to hall-code policy
//! - [`InventoryRow`], [`InventoryTable`], [`InterfaceSummaryRow`] - the inventory model
//!
//! ## Example
//!
//! ```rust
//! use cablebox_core::{InventoryRow, InventoryTable, KeyNormalizer};
//!
//! let keys = KeyNormalizer::new("AV");
//! let table = InventoryTable::new(vec![
//!     InventoryRow::new("AV 04-01", &keys).with_count(2),
//! ]);
//!
//! assert_eq!(table.rows_for_key(&keys.normalize("04-01")).len(), 1);
//! ```

pub mod cell;
pub mod error;
pub mod hall;
pub mod inventory;
pub mod key;
pub mod sheet;

// Re-exports for convenience
pub use cell::{CellAddress, CellValue};
pub use error::{Error, Result};
pub use hall::{clean_hall_name, HallCode, HallCodes, HallMatch};
pub use inventory::{coerce_count, InterfaceSummaryRow, InventoryRow, InventoryTable};
pub use key::KeyNormalizer;
pub use sheet::Sheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Facility prefix used when none is configured
pub const DEFAULT_FACILITY_PREFIX: &str = "AV";
