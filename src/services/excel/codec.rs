use super::types::{Cell, Row, Sheet, Workbook};
use super::utils::{split_table_tab_name, unique_tab_name};
use crate::error::AppError;
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx, XlsxError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Cursor;

pub const MERGED_TAB_NAME: &str = "Merged";

/// Tables the user accepted from one source sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcceptedSheet {
    pub sheet_name: String,
    pub tables: Vec<Vec<Row>>,
}

/// Reads every sheet of an xlsx workbook into rows of cells.
///
/// Row and column positions are absolute: a used range starting at `C4`
/// is padded with leading empty rows and cells. Sheets that cannot be read
/// are skipped with a warning.
pub fn decode(file_name: &str, bytes: &[u8]) -> Result<Workbook, AppError> {
    let start = std::time::Instant::now();
    tracing::info!("Opening workbook {} ({}KB)", file_name, bytes.len() / 1024);

    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).map_err(|e| {
        tracing::error!("Failed to open Excel file: {}", e);
        AppError::Decode(format!("Failed to open Excel file: {}", e))
    })?;

    let sheet_names = workbook.sheet_names().to_vec();
    tracing::info!("Found {} sheets: {:?}", sheet_names.len(), sheet_names);

    let mut sheets = Vec::with_capacity(sheet_names.len());
    for sheet_name in sheet_names {
        let range = workbook.worksheet_range(&sheet_name);
        sheets.extend(read_sheet(sheet_name, range));
    }

    tracing::info!("Workbook decoded in {:?}", start.elapsed());
    Ok(Workbook {
        file_name: file_name.to_string(),
        sheets,
    })
}

fn read_sheet(sheet_name: String, range: Result<Range<Data>, XlsxError>) -> Option<Sheet> {
    match range {
        Ok(range) => {
            let rows = range_to_rows(&range);
            tracing::debug!("Sheet {}: {} rows", sheet_name, rows.len());
            Some(Sheet::new(sheet_name, rows))
        }
        Err(e) => {
            tracing::warn!("Skipping worksheet {}: {}", sheet_name, e);
            None
        }
    }
}

fn range_to_rows(range: &Range<Data>) -> Vec<Row> {
    let Some((row_offset, col_offset)) = range.start() else {
        return Vec::new();
    };

    let mut rows: Vec<Row> = vec![Vec::new(); row_offset as usize];
    rows.extend(range.rows().map(|cells| {
        let mut row: Row = vec![Cell::Empty; col_offset as usize];
        row.extend(cells.iter().map(Cell::from));
        row
    }));
    rows
}

/// Writes accepted tables into a new workbook. A sheet that produced a
/// single table keeps its name; several tables become `<sheet>_Table<N>`.
pub fn encode_tables(sheets: &[AcceptedSheet]) -> Result<Vec<u8>, AppError> {
    let mut tabs: Vec<(String, &[Row])> = Vec::new();
    for sheet in sheets {
        if sheet.tables.len() == 1 {
            tabs.push((sheet.sheet_name.clone(), sheet.tables[0].as_slice()));
        } else {
            for (idx, table) in sheet.tables.iter().enumerate() {
                tabs.push((split_table_tab_name(&sheet.sheet_name, idx), table.as_slice()));
            }
        }
    }

    if tabs.is_empty() {
        return Err(AppError::InvalidInput("No tables to export".to_string()));
    }

    tracing::info!("Writing {} tab(s)", tabs.len());
    write_workbook(&tabs)
}

/// Writes a merged grid as a single `Merged` tab.
pub fn encode_merged(grid: &[Row]) -> Result<Vec<u8>, AppError> {
    write_workbook(&[(MERGED_TAB_NAME.to_string(), grid)])
}

fn write_workbook(tabs: &[(String, &[Row])]) -> Result<Vec<u8>, AppError> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let mut existing_names = HashSet::new();

    for (name, rows) in tabs {
        let tab_name = unique_tab_name(name, &mut existing_names);
        let worksheet = book.new_sheet(&tab_name).map_err(|e| {
            AppError::Encode(format!("Failed to create sheet {}: {}", tab_name, e))
        })?;

        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let coordinate = (col_idx as u32 + 1, row_idx as u32 + 1);
                match cell {
                    Cell::Empty => {}
                    Cell::Bool(b) => {
                        worksheet.get_cell_mut(coordinate).set_value_bool(*b);
                    }
                    Cell::Number(n) => {
                        worksheet.get_cell_mut(coordinate).set_value_number(*n);
                    }
                    Cell::Text(s) => {
                        worksheet.get_cell_mut(coordinate).set_value_string(s.clone());
                    }
                }
            }
        }
    }

    let mut out = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out)
        .map_err(|e| AppError::Encode(format!("Failed to serialize workbook: {}", e)))?;
    Ok(out.into_inner())
}
