//! Cell address type

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;

/// Where a worksheet part says a cell sits (e.g. `r="C12"`)
///
/// Rows and columns are 0-based. `$` markers are accepted and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    pub row: u32,
    pub col: u16,
}

impl CellAddress {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style reference
    ///
    /// # Examples
    /// ```
    /// use cablebox_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("B3").unwrap();
    /// assert_eq!((addr.row, addr.col), (2, 1));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |why: &str| Error::InvalidAddress(format!("{} in '{}'", why, s));

        let body = s.trim().trim_start_matches('$');
        let split = body
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(body.len());
        let (letters, digits) = body.split_at(split);
        let digits = digits.strip_prefix('$').unwrap_or(digits);

        if letters.is_empty() {
            return Err(invalid("no column letters"));
        }
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("no row number"));
        }

        // 1-based column number, bounded as it accumulates so long runs cannot overflow
        let col = letters
            .bytes()
            .try_fold(0u32, |acc, b| {
                let next = acc * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1;
                (next <= u32::from(MAX_COLS)).then_some(next)
            })
            .ok_or(Error::ColumnOutOfBounds(u16::MAX, MAX_COLS - 1))?;

        let row: u32 = digits.parse().map_err(|_| invalid("row number too large"))?;
        if row == 0 {
            return Err(invalid("row 0"));
        }
        if row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row - 1, MAX_ROWS - 1));
        }

        Ok(Self::new(row - 1, (col - 1) as u16))
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut letters = Vec::new();
        let mut n = u32::from(self.col) + 1;
        while n > 0 {
            n -= 1;
            letters.push(b'A' + (n % 26) as u8);
            n /= 26;
        }
        letters.reverse();

        f.write_str(&String::from_utf8_lossy(&letters))?;
        write!(f, "{}", self.row + 1)
    }
}
