//! HTTP handlers for project endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use shared::models::project::Project;
use shared::types::Pagination;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::project::{ProjectInput, ProjectService};
use crate::AppState;

/// Query parameters for listing projects
#[derive(Debug, Default, Deserialize)]
pub struct ListProjectsQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListProjectsQuery {
    fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Create a project
pub async fn create_project(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<ProjectInput>,
) -> AppResult<Json<Project>> {
    let service = ProjectService::new(state.db);
    let project = service
        .create_project(&current_user.0.username, &current_user.0.user_type, input)
        .await?;
    Ok(Json(project))
}

/// List projects
pub async fn list_projects(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListProjectsQuery>,
) -> AppResult<Json<Vec<Project>>> {
    let service = ProjectService::new(state.db);
    let projects = service.list_projects(&query.pagination()).await?;
    Ok(Json(projects))
}

/// Get a project
pub async fn get_project(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(project_id): Path<i64>,
) -> AppResult<Json<Project>> {
    let service = ProjectService::new(state.db);
    let project = service.get_project(project_id).await?;
    Ok(Json(project))
}

/// Edit a project
pub async fn update_project(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(project_id): Path<i64>,
    Json(input): Json<ProjectInput>,
) -> AppResult<Json<Project>> {
    let service = ProjectService::new(state.db);
    let project = service
        .update_project(
            project_id,
            &current_user.0.username,
            &current_user.0.user_type,
            input,
        )
        .await?;
    Ok(Json(project))
}

/// Delete a project
pub async fn delete_project(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(project_id): Path<i64>,
) -> AppResult<Json<()>> {
    let service = ProjectService::new(state.db);
    service
        .delete_project(
            project_id,
            &current_user.0.username,
            &current_user.0.user_type,
        )
        .await?;
    Ok(Json(()))
}
