use super::types::Cell;

/// Keywords that mark an aggregate row when a cell consists of nothing else.
pub const SUMMARY_KEYWORDS: [&str; 6] = ["total", "sum", "subtotal", "average", "avg", "count"];

pub fn is_empty_cell(cell: &Cell) -> bool {
    match cell {
        Cell::Empty => true,
        Cell::Text(s) => s.trim().is_empty(),
        Cell::Bool(_) | Cell::Number(_) => false,
    }
}

/// True when every cell is empty, including a row with no cells at all.
pub fn is_row_empty(row: &[Cell]) -> bool {
    row.iter().all(is_empty_cell)
}

pub fn is_summary_row(row: &[Cell]) -> bool {
    row.iter().any(|cell| {
        let text = cell.to_string().to_lowercase();
        SUMMARY_KEYWORDS.contains(&text.trim())
    })
}

/// Number of non-empty cells in a row.
pub fn row_density(row: &[Cell]) -> usize {
    row.iter().filter(|cell| !is_empty_cell(cell)).count()
}
