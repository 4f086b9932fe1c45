//! Raw tabular content of one worksheet

use crate::cell::CellValue;

static EMPTY: CellValue = CellValue::Empty;

/// A worksheet reduced to a header row plus data rows.
///
/// Readers hand their records to [`Sheet::from_records`], which treats the
/// first record as the header row. Header text is trimmed of surrounding
/// whitespace, and data rows with no non-blank cell are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    name: String,
    headers: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    /// Build a sheet from records in row order; the first record is the header row.
    pub fn from_records<S, I>(name: S, records: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = Vec<CellValue>>,
    {
        let mut records = records.into_iter();
        let headers = records
            .next()
            .map(|header| header.iter().map(|v| v.to_string().trim().to_string()).collect())
            .unwrap_or_default();
        let rows = records
            .filter(|record| record.iter().any(|v| !v.is_blank()))
            .collect();

        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed header row
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows (header excluded)
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of data rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Find a column by header, ignoring ASCII case.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        let header = header.trim();
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(header))
    }

    /// Find the first alias that names a column.
    pub fn find_column<'a, I>(&self, aliases: I) -> Option<usize>
    where
        I: IntoIterator<Item = &'a str>,
    {
        aliases
            .into_iter()
            .find_map(|alias| self.column_index(alias))
    }

    /// Value at a data row/column; short rows read as empty.
    pub fn value(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }
}
