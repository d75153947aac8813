//! Cell label parsing and formatting.
//!
//! A label is one lowercase letter naming the row followed by the zero-based
//! column index in decimal, so the grid is addressed as `a0`, `a1`, ... `b0`.
//!
//! # Examples
//!
//! ```ignore
//! let cell = CellRef::from_str("b3").unwrap();
//! assert_eq!(cell.row, 1);
//! assert_eq!(cell.col, 3);
//! assert_eq!(cell.to_string(), "b3");
//! ```

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Rows are named by a single letter, so a grid has at most 26 of them.
pub const MAX_ROWS: usize = 26;

/// A reference to a cell by row and column indices (0-indexed).
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct CellRef {
    pub row: usize,
    pub col: usize,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid cell label: {0:?}")]
pub struct LabelError(pub String);

impl CellRef {
    pub fn new(row: usize, col: usize) -> CellRef {
        CellRef { row, col }
    }

    /// Parse a label such as `a0` or `z12`.
    /// Returns None if the input is not in label form.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<CellRef> {
        Self::parse_label(name)
    }

    fn parse_label(name: &str) -> Option<CellRef> {
        let caps = label_re().captures(name)?;
        let row = (caps["row"].as_bytes()[0] - b'a') as usize;
        let col = caps["col"].parse::<usize>().ok()?;
        Some(CellRef::new(row, col))
    }

    /// Row index to its letter (0 -> 'a', 25 -> 'z').
    pub fn row_letter(row: usize) -> Option<char> {
        (row < MAX_ROWS).then(|| (b'a' + row as u8) as char)
    }
}

fn label_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Leading zeros are rejected so every label has exactly one spelling.
    RE.get_or_init(|| {
        Regex::new(r"^(?<row>[a-z])(?<col>0|[1-9][0-9]*)$").expect("label regex must compile")
    })
}

impl std::str::FromStr for CellRef {
    type Err = LabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_label(s).ok_or_else(|| LabelError(s.to_string()))
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match CellRef::row_letter(self.row) {
            Some(letter) => write!(f, "{}{}", letter, self.col),
            None => write!(f, "?{}:{}", self.row, self.col),
        }
    }
}
