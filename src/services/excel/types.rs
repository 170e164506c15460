use calamine::Data;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single spreadsheet value as seen by detection and merging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

pub type Row = Vec<Cell>;

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Bool(b) => write!(f, "{}", b),
            // f64's Display already drops the fractional part of integral values
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<&Data> for Cell {
    fn from(value: &Data) -> Self {
        match value {
            Data::Empty => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::String(s) => Cell::Text(s.clone()),
            Data::DateTime(d) => match d.as_datetime() {
                Some(dt) if dt.time() == chrono::NaiveTime::MIN => {
                    Cell::Text(dt.date().format("%Y-%m-%d").to_string())
                }
                Some(dt) => Cell::Text(dt.format("%Y-%m-%dT%H:%M:%S").to_string()),
                None => Cell::Number(d.as_f64()),
            },
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Row>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub file_name: String,
    pub sheets: Vec<Sheet>,
}

/// A contiguous block of rows judged to be tabular data.
///
/// `start_row` and `end_row` are inclusive, 0-based and relative to the
/// owning sheet. They record where the block was detected; row edits keep
/// them, so after an edit `len()` can be smaller than the span. The region
/// carries its own copy of the rows so edits produce a new region instead
/// of touching the sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRegion {
    pub start_row: usize,
    pub end_row: usize,
    pub rows: Vec<Row>,
    pub headers: Row,
    pub summary_row_offsets: Vec<usize>,
}

impl TableRegion {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_summary_rows(&self) -> bool {
        !self.summary_row_offsets.is_empty()
    }
}

/// Thresholds used to decide whether a block of rows is a real table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Fewest rows a block may have. Default 3.
    pub min_rows: usize,
    /// Lowest acceptable mode of per-row non-empty cell counts. Default 2.
    pub min_columns: usize,
    /// Fewest non-empty cells across the whole block. Default 6.
    pub min_data_cells: usize,
    /// Share of rows whose density is within one of the mode. Default 0.7.
    pub min_consistency: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_rows: 3,
            min_columns: 2,
            min_data_cells: 6,
            min_consistency: 0.7,
        }
    }
}
