//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::CsvResult;
use crate::options::CsvReadOptions;
use cablebox_core::{CellValue, Sheet};

/// Name given to the single sheet a CSV file holds
const SHEET_NAME: &str = "Sheet1";

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a sheet
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<Sheet> {
        let file = File::open(path)?;
        Self::read(file, options)
    }

    /// Read CSV from a reader into a sheet; the first record is the header row.
    pub fn read<R: Read>(reader: R, options: &CsvReadOptions) -> CsvResult<Sheet> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut records = Vec::new();
        for (idx, result) in csv_reader.records().enumerate() {
            let record = result?;
            let is_header = idx == 0;

            records.push(
                record
                    .iter()
                    .map(|field| {
                        // Spreadsheet exports prefix the first field with a BOM
                        let field = if is_header {
                            field.trim_start_matches('\u{feff}')
                        } else {
                            field
                        };
                        if options.detect_numbers && !is_header {
                            Self::detect_type(field)
                        } else {
                            CellValue::string(field)
                        }
                    })
                    .collect(),
            );
        }

        Ok(Sheet::from_records(SHEET_NAME, records))
    }

    /// Empty fields are empty cells, bare numbers are numbers, the rest is text
    fn detect_type(field: &str) -> CellValue {
        let trimmed = field.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        // Leading zeros carry meaning in ids like "0401"
        let leading_zero = trimmed.len() > 1 && trimmed.starts_with('0') && !trimmed.starts_with("0.");
        if !leading_zero {
            if let Ok(n) = trimmed.parse::<f64>() {
                if n.is_finite() {
                    return CellValue::Number(n);
                }
            }
        }

        CellValue::string(field)
    }
}
