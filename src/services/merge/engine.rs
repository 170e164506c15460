use super::fuzzy::{ColumnMapping, ColumnMatcher, MergeConfig};
use crate::services::excel::classifier::{is_empty_cell, is_row_empty};
use crate::services::excel::types::{Cell, Row, Sheet};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Reserved column holding the name of the sheet each row came from.
pub const TAB_NAME_COLUMN: &str = "tab_name";
/// Reserved column holding the group a sheet was assigned to. Only present
/// when more than one group is selected.
pub const GROUP_COLUMN: &str = "project";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MergeRequest {
    pub sheets: Vec<Sheet>,
    /// Sheet name to group id.
    pub assignments: HashMap<String, String>,
    pub selected_groups: Vec<String>,
    /// Group id to display label. Ids without a label are written as is.
    pub group_labels: HashMap<String, String>,
}

pub struct SheetMerger {
    matcher: ColumnMatcher,
}

impl Default for SheetMerger {
    fn default() -> Self {
        Self::new(MergeConfig::default())
    }
}

impl SheetMerger {
    pub fn new(config: MergeConfig) -> Self {
        Self {
            matcher: ColumnMatcher::new(config.similarity_threshold),
        }
    }

    /// Stacks the sheets into one grid whose columns are the fuzzy-aligned
    /// union of every sheet's header row, followed by the reserved
    /// provenance columns. The first row of the result is the header row.
    pub fn merge(&self, request: &MergeRequest) -> Vec<Row> {
        let sheets = &request.sheets;
        if sheets.is_empty() {
            return Vec::new();
        }

        let start = std::time::Instant::now();
        let header_lists: Vec<Vec<String>> = sheets
            .iter()
            .map(|sheet| {
                sheet
                    .rows
                    .first()
                    .map(|row| row.iter().map(|cell| cell.to_string()).collect())
                    .unwrap_or_default()
            })
            .collect();
        let mapping = self.matcher.build_mapping(&header_lists);

        let with_group = request.selected_groups.len() > 1;
        let final_headers = final_headers(&header_lists, &mapping, with_group);
        let is_reserved: Vec<bool> = final_headers
            .iter()
            .map(|h| h == TAB_NAME_COLUMN || (with_group && h == GROUP_COLUMN))
            .collect();

        let mut grid: Vec<Row> = Vec::new();
        grid.push(final_headers.iter().map(|h| Cell::text(h.as_str())).collect());

        for (sheet, headers) in sheets.iter().zip(&header_lists) {
            if sheet.rows.len() <= 1 {
                continue;
            }

            // later duplicates of a canonical column win
            let positions: HashMap<String, usize> = headers
                .iter()
                .enumerate()
                .map(|(idx, header)| (mapping.canonical(header), idx))
                .collect();

            let group_label = Cell::text(self.group_label(request, &sheet.name));
            let mut kept = 0;

            for row in sheet.rows.iter().skip(1) {
                if is_row_empty(row) {
                    continue;
                }

                let new_row: Row = final_headers
                    .iter()
                    .map(|header| {
                        if header == TAB_NAME_COLUMN {
                            Cell::text(sheet.name.as_str())
                        } else if with_group && header == GROUP_COLUMN {
                            group_label.clone()
                        } else {
                            positions
                                .get(header)
                                .and_then(|&idx| row.get(idx))
                                .cloned()
                                .unwrap_or_else(|| Cell::text(""))
                        }
                    })
                    .collect();

                let has_data = new_row
                    .iter()
                    .zip(&is_reserved)
                    .any(|(cell, &reserved)| !reserved && !is_empty_cell(cell));
                if has_data {
                    grid.push(new_row);
                    kept += 1;
                }
            }

            tracing::debug!("Merged {} row(s) from sheet {}", kept, sheet.name);
        }

        tracing::info!(
            "Merged {} sheets into {} rows x {} columns in {:?}",
            sheets.len(),
            grid.len() - 1,
            final_headers.len(),
            start.elapsed()
        );
        grid
    }

    fn group_label(&self, request: &MergeRequest, sheet_name: &str) -> String {
        match request.assignments.get(sheet_name) {
            Some(group) => request
                .group_labels
                .get(group)
                .cloned()
                .unwrap_or_else(|| group.clone()),
            None => String::new(),
        }
    }
}

/// Canonical columns in first-seen order, then the reserved columns.
fn final_headers(header_lists: &[Vec<String>], mapping: &ColumnMapping, with_group: bool) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::new();

    let canonical = header_lists
        .iter()
        .flatten()
        .map(|header| mapping.canonical(header));
    let reserved = std::iter::once(TAB_NAME_COLUMN.to_string())
        .chain(with_group.then(|| GROUP_COLUMN.to_string()));

    for header in canonical.chain(reserved) {
        if seen.insert(header.clone()) {
            headers.push(header);
        }
    }
    headers
}

pub fn merge_sheets(
    sheets: Vec<Sheet>,
    assignments: HashMap<String, String>,
    selected_groups: Vec<String>,
    group_labels: HashMap<String, String>,
) -> Vec<Row> {
    SheetMerger::default().merge(&MergeRequest {
        sheets,
        assignments,
        selected_groups,
        group_labels,
    })
}
