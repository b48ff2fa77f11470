// src/sheet/mod.rs

use std::fmt;

pub mod read;
pub mod write;

pub use read::read_table;
pub use write::write_table;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date; written back with a date format.
    DateTime(f64),
}

impl CellValue {
    /// True for cells that carry no value, including empty strings.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            // floats keep a trailing ".0", so 64175 prints as "64175.0"
            CellValue::Number(n) | CellValue::DateTime(n) => write!(f, "{:?}", n),
            CellValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// One worksheet row, aligned with [`Table::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub cells: Vec<CellValue>,
}

impl Record {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    pub fn get(&self, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cells.get(col).unwrap_or(&EMPTY)
    }

    /// Copy of this record with `col` replaced, padding short rows.
    pub fn with_cell(&self, col: usize, value: CellValue) -> Self {
        let mut cells = self.cells.clone();
        if cells.len() <= col {
            cells.resize(col + 1, CellValue::Empty);
        }
        cells[col] = value;
        Self { cells }
    }
}

/// A sheet as a header row plus records, in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
