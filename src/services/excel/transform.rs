//! Edits applied to a detected table before it is accepted. Each one returns
//! a new region and leaves its input untouched.

use super::detector::detect_empty_columns;
use super::types::{Row, TableRegion};
use std::collections::BTreeSet;

pub fn remove_summary_rows(table: &TableRegion) -> TableRegion {
    if !table.has_summary_rows() {
        return table.clone();
    }
    let offsets = table.summary_row_offsets.clone();
    let mut cleaned = remove_rows(table, &offsets);
    cleaned.summary_row_offsets.clear();
    cleaned
}

pub fn remove_empty_columns(table: &TableRegion) -> TableRegion {
    let empty = detect_empty_columns(&table.rows);
    if empty.is_empty() {
        return table.clone();
    }
    remove_columns(table, &empty)
}

/// Drops rows by offset within the region. Summary flags on surviving rows
/// are shifted to their new offsets. Unknown offsets are ignored. The sheet
/// bounds stay those of the detected block.
pub fn remove_rows(table: &TableRegion, offsets: &[usize]) -> TableRegion {
    let removed: BTreeSet<usize> = offsets.iter().copied().collect();

    let rows: Vec<Row> = table
        .rows
        .iter()
        .enumerate()
        .filter(|(idx, _)| !removed.contains(idx))
        .map(|(_, row)| row.clone())
        .collect();

    let summary_row_offsets = table
        .summary_row_offsets
        .iter()
        .filter(|offset| !removed.contains(*offset))
        .map(|&offset| offset - removed.range(..offset).count())
        .collect();

    TableRegion {
        start_row: table.start_row,
        end_row: table.end_row,
        headers: rows.first().cloned().unwrap_or_default(),
        rows,
        summary_row_offsets,
    }
}

/// Drops column offsets from every row that reaches them.
pub fn remove_columns(table: &TableRegion, offsets: &[usize]) -> TableRegion {
    let removed: BTreeSet<usize> = offsets.iter().copied().collect();
    let strip = |row: &Row| -> Row {
        row.iter()
            .enumerate()
            .filter(|(idx, _)| !removed.contains(idx))
            .map(|(_, cell)| cell.clone())
            .collect()
    };

    TableRegion {
        start_row: table.start_row,
        end_row: table.end_row,
        rows: table.rows.iter().map(strip).collect(),
        headers: strip(&table.headers),
        summary_row_offsets: table.summary_row_offsets.clone(),
    }
}

/// Rejects one candidate table. Out-of-range indexes leave the list as is.
pub fn discard_table(tables: &[TableRegion], index: usize) -> Vec<TableRegion> {
    tables
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != index)
        .map(|(_, table)| table.clone())
        .collect()
}
