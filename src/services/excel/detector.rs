use super::classifier::{is_empty_cell, is_row_empty, is_summary_row, row_density};
use super::types::{DetectionConfig, Row, Sheet, TableRegion, Workbook};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

/// Tables found in one sheet, in sheet order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetTables {
    pub sheet_name: String,
    pub tables: Vec<TableRegion>,
}

pub struct TableDetector {
    config: DetectionConfig,
}

impl Default for TableDetector {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

impl TableDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    /// Splits the rows on blank lines and keeps the blocks that look tabular.
    pub fn detect(&self, rows: &[Row]) -> Vec<TableRegion> {
        let mut tables = Vec::new();
        let mut start_row: Option<usize> = None;
        let mut summary_offsets: Vec<usize> = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            if is_row_empty(row) {
                if let Some(start) = start_row.take() {
                    self.close_group(rows, start, idx - 1, &summary_offsets, &mut tables);
                    summary_offsets.clear();
                }
                continue;
            }

            let start = *start_row.get_or_insert(idx);
            // summary rows stay in the data, they are only flagged
            if is_summary_row(row) {
                summary_offsets.push(idx - start);
            }
        }

        if let Some(start) = start_row {
            self.close_group(rows, start, rows.len() - 1, &summary_offsets, &mut tables);
        }

        tables
    }

    fn close_group(
        &self,
        rows: &[Row],
        start: usize,
        end: usize,
        summary_offsets: &[usize],
        tables: &mut Vec<TableRegion>,
    ) {
        let group = &rows[start..=end];
        if !self.is_likely_table(group) {
            tracing::debug!("Rejected block at rows {}-{}", start, end);
            return;
        }

        tracing::debug!("Accepted table at rows {}-{}", start, end);
        tables.push(TableRegion {
            start_row: start,
            end_row: end,
            rows: group.to_vec(),
            headers: group[0].clone(),
            summary_row_offsets: summary_offsets.to_vec(),
        });
    }

    /// Density and consistency heuristics separating real tables from
    /// label blocks and section headers.
    pub fn is_likely_table(&self, group: &[Row]) -> bool {
        if group.is_empty() || group.len() < self.config.min_rows {
            return false;
        }

        let densities: Vec<usize> = group.iter().map(|row| row_density(row)).collect();
        let mode_density = mode(&densities);

        if mode_density < self.config.min_columns {
            return false;
        }

        let data_cells: usize = group
            .iter()
            .flat_map(|row| row.iter())
            .filter(|cell| !is_empty_cell(cell))
            .count();
        if data_cells < self.config.min_data_cells {
            return false;
        }

        let consistent = densities
            .iter()
            .filter(|&&d| d.abs_diff(mode_density) <= 1)
            .count();
        let consistency = consistent as f64 / group.len() as f64;

        consistency >= self.config.min_consistency
    }

    pub fn detect_sheet(&self, sheet: &Sheet) -> SheetTables {
        let tables = self.detect(&sheet.rows);
        tracing::debug!("Sheet {}: {} table(s) detected", sheet.name, tables.len());
        SheetTables {
            sheet_name: sheet.name.clone(),
            tables,
        }
    }

    /// Runs detection over every sheet, keeping only sheets that yielded a
    /// table. Output follows workbook order.
    pub fn detect_workbook(&self, workbook: &Workbook) -> Vec<SheetTables> {
        let start = std::time::Instant::now();
        let detected: Vec<SheetTables> = workbook
            .sheets
            .par_iter()
            .map(|sheet| self.detect_sheet(sheet))
            .filter(|sheet| !sheet.tables.is_empty())
            .collect();

        tracing::info!(
            "Detected tables in {} of {} sheets of {} in {:?}",
            detected.len(),
            workbook.sheets.len(),
            workbook.file_name,
            start.elapsed()
        );
        detected
    }
}

/// Most frequent value. On ties the value that reached the top count first wins.
fn mode(values: &[usize]) -> usize {
    let mut counts: HashMap<usize, usize> = HashMap::new();
    let mut max_count = 0;
    let mut max_value = values.first().copied().unwrap_or(0);

    for &value in values {
        let count = counts.entry(value).or_insert(0);
        *count += 1;
        if *count > max_count {
            max_count = *count;
            max_value = value;
        }
    }

    max_value
}

pub fn detect_tables(sheet: &Sheet) -> Vec<TableRegion> {
    TableDetector::default().detect(&sheet.rows)
}

/// Column offsets with no content in any row that reaches them.
///
/// Columns past the end of every row are never reported.
pub fn detect_empty_columns(rows: &[Row]) -> Vec<usize> {
    let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);

    (0..width)
        .filter(|&col| {
            rows.iter()
                .filter_map(|row| row.get(col))
                .all(is_empty_cell)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::excel::types::Cell;

    fn row(cells: &[&str]) -> Row {
        cells
            .iter()
            .map(|c| if c.is_empty() { Cell::Empty } else { Cell::text(*c) })
            .collect()
    }

    fn sheet(rows: Vec<Row>) -> Sheet {
        Sheet::new("Sheet1", rows)
    }

    #[test]
    fn test_mode_first_to_reach_top_count_wins() {
        assert_eq!(mode(&[3, 2, 2, 3]), 2);
        assert_eq!(mode(&[1, 2, 3]), 1);
        assert_eq!(mode(&[4, 4, 1, 1, 1]), 1);
        assert_eq!(mode(&[]), 0);
    }

    #[test]
    fn test_two_blocks_split_on_blank_row() {
        let rows = vec![
            row(&["Name", "Price"]),
            row(&["Apple", "1"]),
            row(&["Pear", "2"]),
            row(&["", ""]),
            row(&["City", "Pop"]),
            row(&["Oslo", "700"]),
            row(&["Rome", "2800"]),
        ];
        let tables = detect_tables(&sheet(rows));
        assert_eq!(tables.len(), 2);
        assert_eq!((tables[0].start_row, tables[0].end_row), (0, 2));
        assert_eq!((tables[1].start_row, tables[1].end_row), (4, 6));
        assert_eq!(tables[1].headers, row(&["City", "Pop"]));
    }

    #[test]
    fn test_trailing_block_without_blank_row() {
        let rows = vec![
            row(&["Report"]),
            row(&[]),
            row(&["a", "b", "c"]),
            row(&["1", "2", "3"]),
            row(&["4", "5", "6"]),
        ];
        let tables = detect_tables(&sheet(rows));
        assert_eq!(tables.len(), 1);
        assert_eq!((tables[0].start_row, tables[0].end_row), (2, 4));
        assert_eq!(tables[0].len(), 3);
    }

    #[test]
    fn test_summary_rows_flagged_and_kept() {
        let rows = vec![
            row(&["Quarter", "A", "B"]),
            vec![Cell::text("Q1"), Cell::Number(100.0), Cell::Number(200.0)],
            vec![Cell::text("Q2"), Cell::Number(150.0), Cell::Number(250.0)],
            vec![Cell::text("Total"), Cell::Number(250.0), Cell::Number(450.0)],
            row(&[]),
        ];
        let tables = detect_tables(&sheet(rows));
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].summary_row_offsets, vec![3]);
        assert_eq!(tables[0].len(), 4);
    }

    #[test]
    fn test_summary_offsets_are_relative_to_region() {
        let rows = vec![
            row(&["x", "y"]),
            row(&["1", "2"]),
            row(&["3", "4"]),
            row(&[]),
            vec![Cell::text("Total"), Cell::Empty, Cell::Empty],
            vec![Cell::text("Q1"), Cell::Number(100.0), Cell::Number(200.0)],
            vec![Cell::text("Q2"), Cell::Number(150.0), Cell::Number(250.0)],
            vec![Cell::text("Q3"), Cell::Number(120.0), Cell::Number(210.0)],
        ];
        let tables = detect_tables(&sheet(rows));
        assert_eq!(tables.len(), 2);
        assert!(tables[0].summary_row_offsets.is_empty());
        assert_eq!(tables[1].start_row, 4);
        assert_eq!(tables[1].summary_row_offsets, vec![0]);
    }

    #[test]
    fn test_leading_total_row_fails_consistency() {
        // densities 1, 3, 3: mode 3, only 2 of 3 rows within one of it
        let rows = vec![
            vec![Cell::text("Total"), Cell::Empty, Cell::Empty],
            vec![Cell::text("Q1"), Cell::Number(100.0), Cell::Number(200.0)],
            vec![Cell::text("Q2"), Cell::Number(150.0), Cell::Number(250.0)],
            row(&[]),
        ];
        assert!(detect_tables(&sheet(rows)).is_empty());
    }

    #[test]
    fn test_rejects_sparse_label_block() {
        let rows = vec![
            row(&["Company: Acme"]),
            row(&["Prepared by: Finance"]),
            row(&["Date: 2024-01-01"]),
            row(&["Confidential"]),
        ];
        assert!(detect_tables(&sheet(rows)).is_empty());
    }

    #[test]
    fn test_rejects_short_block() {
        let rows = vec![row(&["a", "b", "c"]), row(&["1", "2", "3"])];
        assert!(detect_tables(&sheet(rows)).is_empty());
    }

    #[test]
    fn test_rejects_too_few_data_cells() {
        let detector = TableDetector::default();
        let rows = vec![row(&["a", "b"]), row(&["1", "2"]), row(&["3"])];
        // 5 cells, below the default minimum of 6
        assert!(!detector.is_likely_table(&rows));
    }

    #[test]
    fn test_rejects_inconsistent_columns() {
        let detector = TableDetector::default();
        let rows = vec![
            row(&["a", "b"]),
            row(&["1", "2"]),
            row(&["1", "2", "3", "4", "5"]),
            row(&["1", "2", "3", "4", "5", "6"]),
        ];
        // mode 2, only half the rows within one of it
        assert!(!detector.is_likely_table(&rows));
    }

    #[test]
    fn test_custom_thresholds() {
        let detector = TableDetector::new(DetectionConfig {
            min_rows: 2,
            min_data_cells: 4,
            ..DetectionConfig::default()
        });
        let rows = vec![row(&["a", "b"]), row(&["1", "2"])];
        assert_eq!(detector.detect(&rows).len(), 1);
    }

    #[test]
    fn test_detection_is_idempotent() {
        let rows = vec![
            row(&["Name", "Price"]),
            row(&["Apple", "1"]),
            row(&["Pear", "2"]),
        ];
        let s = sheet(rows);
        assert_eq!(detect_tables(&s), detect_tables(&s));
    }

    #[test]
    fn test_empty_sheet() {
        assert!(detect_tables(&sheet(vec![])).is_empty());
        assert!(detect_tables(&sheet(vec![row(&[]), row(&["", " "])])).is_empty());
    }

    #[test]
    fn test_detect_workbook_keeps_sheet_order() {
        let table = vec![row(&["a", "b"]), row(&["1", "2"]), row(&["3", "4"])];
        let workbook = Workbook {
            file_name: "book.xlsx".into(),
            sheets: vec![
                Sheet::new("First", table.clone()),
                Sheet::new("Notes", vec![row(&["just text"])]),
                Sheet::new("Third", table),
            ],
        };
        let detected = TableDetector::default().detect_workbook(&workbook);
        let names: Vec<_> = detected.iter().map(|s| s.sheet_name.as_str()).collect();
        assert_eq!(names, vec!["First", "Third"]);
    }

    #[test]
    fn test_empty_columns_only_within_populated_width() {
        let rows = vec![
            row(&["a", "", "c"]),
            row(&["1", " ", "3", ""]),
            row(&["2"]),
        ];
        assert_eq!(detect_empty_columns(&rows), vec![1, 3]);
        assert!(detect_empty_columns(&[]).is_empty());
    }
}
