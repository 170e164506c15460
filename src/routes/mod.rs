use axum::{routing::get, Router};
use std::sync::Arc;

use crate::AppState;

pub mod projects;
pub mod sheets;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .merge(sheets::routes())
        .merge(projects::routes())
}

async fn health_check() -> &'static str {
    "OK"
}
