use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, Method},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    error::AppError,
    services::{
        excel::{
            codec::{self, AcceptedSheet},
            detect_empty_columns, transform, Row, Sheet, SheetTables, TableDetector, TableRegion,
        },
        merge::{MergeRequest, SheetMerger},
    },
    AppState,
};

const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub fn routes() -> Router<Arc<AppState>> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/sheets/detect", post(detect_tables))
        .route("/sheets/tables/clean", post(clean_table))
        .route("/sheets/merge", post(merge_sheets))
        .route("/sheets/export", post(export_tables))
        .route("/sheets/merge/export", post(export_merged))
        .layer(cors)
}

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    file_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    file_name: String,
    sheets: Vec<Sheet>,
    tables: Vec<SheetTables>,
}

async fn detect_tables(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<DetectResponse>, AppError> {
    let start = std::time::Instant::now();
    let file_name = params.file_name.unwrap_or_else(|| "upload.xlsx".to_string());

    if body.is_empty() {
        return Err(AppError::InvalidInput("No file provided".to_string()));
    }
    if body.len() > state.config.max_file_size {
        tracing::error!("Upload of {} bytes exceeds limit", body.len());
        return Err(AppError::InvalidInput(format!(
            "File exceeds the {}MB limit",
            state.config.max_file_size / (1024 * 1024)
        )));
    }

    tracing::info!("Processing file {}, size: {}KB", file_name, body.len() / 1024);
    let detector = TableDetector::new(state.config.detection);
    let response = tokio::task::spawn_blocking(move || -> Result<DetectResponse, AppError> {
        let workbook = codec::decode(&file_name, &body)?;
        let tables = detector.detect_workbook(&workbook);
        Ok(DetectResponse {
            file_name: workbook.file_name,
            sheets: workbook.sheets,
            tables,
        })
    })
    .await
    .map_err(|e| AppError::Internal(format!("Detection task failed: {}", e)))??;

    tracing::info!("Total processing completed in {:?}", start.elapsed());
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CleanAction {
    RemoveSummaryRows,
    RemoveEmptyColumns,
    RemoveRows { offsets: Vec<usize> },
    RemoveColumns { offsets: Vec<usize> },
}

#[derive(Debug, Deserialize)]
pub struct CleanRequest {
    table: TableRegion,
    action: CleanAction,
}

#[derive(Debug, Serialize)]
pub struct CleanResponse {
    table: TableRegion,
    empty_column_offsets: Vec<usize>,
}

async fn clean_table(Json(request): Json<CleanRequest>) -> Result<Json<CleanResponse>, AppError> {
    let table = match &request.action {
        CleanAction::RemoveSummaryRows => transform::remove_summary_rows(&request.table),
        CleanAction::RemoveEmptyColumns => transform::remove_empty_columns(&request.table),
        CleanAction::RemoveRows { offsets } => transform::remove_rows(&request.table, offsets),
        CleanAction::RemoveColumns { offsets } => {
            transform::remove_columns(&request.table, offsets)
        }
    };
    tracing::debug!("Applied {:?}, {} rows left", request.action, table.len());

    let empty_column_offsets = detect_empty_columns(&table.rows);
    Ok(Json(CleanResponse {
        table,
        empty_column_offsets,
    }))
}

#[derive(Debug, Serialize)]
pub struct MergeResponse {
    rows: Vec<Row>,
}

async fn merge_sheets(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MergeRequest>,
) -> Result<Json<MergeResponse>, AppError> {
    tracing::info!(
        "Merging {} sheets across {} selected group(s)",
        request.sheets.len(),
        request.selected_groups.len()
    );
    let rows = SheetMerger::new(state.config.merge).merge(&request);
    Ok(Json(MergeResponse { rows }))
}

#[derive(Debug, Deserialize)]
pub struct ExportRequest {
    #[serde(default)]
    file_name: Option<String>,
    sheets: Vec<AcceptedSheet>,
}

async fn export_tables(Json(request): Json<ExportRequest>) -> Result<Response, AppError> {
    let bytes = codec::encode_tables(&request.sheets)?;
    let file_name = output_file_name(request.file_name.as_deref(), "processed");
    Ok(xlsx_response(bytes, &file_name))
}

async fn export_merged(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MergeRequest>,
) -> Result<Response, AppError> {
    let rows = SheetMerger::new(state.config.merge).merge(&request);
    if rows.is_empty() {
        return Err(AppError::InvalidInput("No sheets to merge".to_string()));
    }
    let bytes = codec::encode_merged(&rows)?;
    Ok(xlsx_response(bytes, &output_file_name(None, "merged")))
}

fn output_file_name(source: Option<&str>, suffix: &str) -> String {
    let stem = source
        .map(|name| name.trim_end_matches(".xlsx"))
        .filter(|stem| !stem.is_empty())
        .unwrap_or("workbook");
    format!(
        "{}_{}_{}.xlsx",
        stem,
        suffix,
        chrono::Utc::now().format("%Y%m%d%H%M%S")
    )
}

fn xlsx_response(bytes: Vec<u8>, file_name: &str) -> Response {
    tracing::info!("Sending {} ({}KB)", file_name, bytes.len() / 1024);
    (
        [
            (header::CONTENT_TYPE, XLSX_MIME.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name.replace('"', "")),
            ),
        ],
        bytes,
    )
        .into_response()
}
