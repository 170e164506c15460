use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    error::AppError,
    models::ProjectsData,
    services::projects::{fetch_projects, projects_by_developers},
    AppState,
};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/projects", get(list_projects))
}

#[derive(Debug, Deserialize)]
pub struct ProjectsQuery {
    /// Comma separated developer ids; when present only their projects are
    /// returned.
    developers: Option<String>,
}

async fn list_projects(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ProjectsQuery>,
) -> Result<Json<ProjectsData>, AppError> {
    let mut data = fetch_projects(&state.config.projects_csv_url).await?;

    if let Some(developers) = query.developers {
        let ids: Vec<String> = developers
            .split(',')
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .collect();
        data.projects = projects_by_developers(&data.projects, &ids);
    }

    Ok(Json(data))
}
