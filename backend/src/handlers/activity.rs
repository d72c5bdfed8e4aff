//! HTTP handlers for the activity log

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;

use shared::models::activity::ActivityLogEntry;
use shared::types::Pagination;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::activity::{ActivityFilter, ActivityService};
use crate::AppState;

/// Query parameters for listing activity entries
#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ActivityQuery {
    fn filter(&self) -> ActivityFilter {
        ActivityFilter {
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// List audit entries, newest first
pub async fn list_activity(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<Json<Vec<ActivityLogEntry>>> {
    let service = ActivityService::new(state.db);
    let entries = service.list(&query.filter(), &query.pagination()).await?;
    Ok(Json(entries))
}

/// Export the audit trail as CSV
pub async fn export_activity(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ActivityQuery>,
) -> AppResult<impl IntoResponse> {
    let service = ActivityService::new(state.db);
    let csv = service.export_csv(&query.filter()).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"activity_log.csv\"",
            ),
        ],
        csv,
    ))
}
