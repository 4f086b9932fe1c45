//! # cablebox-xlsx
//!
//! Reads one worksheet of an XLSX (Office Open XML) workbook into a
//! [`cablebox_core::Sheet`]. Only cell values are read; styles, comments and
//! formulas are ignored, and formula cells contribute their cached result.

pub mod error;
pub mod reader;

mod escape;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
