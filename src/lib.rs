//! Detects the tables hidden in loosely structured spreadsheets, cleans
//! them, and merges sheets whose headers only roughly agree.

use axum::{extract::DefaultBodyLimit, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod routes;
pub mod services;

pub use services::excel::{
    detect_empty_columns, detect_tables, Cell, DetectionConfig, Row, Sheet, TableDetector,
    TableRegion, Workbook,
};
pub use services::merge::{merge_sheets, MergeConfig, MergeRequest, SheetMerger};

// Application state
#[derive(Clone)]
pub struct AppState {
    config: config::Config,
}

impl AppState {
    pub fn new(config: config::Config) -> Self {
        Self { config }
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_file_size;
    routes::routes()
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
