//! # cablebox-csv
//!
//! CSV reader for cablebox. A CSV export of the inventory workbook reads into
//! the same [`cablebox_core::Sheet`] shape as the XLSX reader produces.

mod error;
mod options;
mod reader;

pub use error::{CsvError, CsvResult};
pub use options::CsvReadOptions;
pub use reader::CsvReader;
