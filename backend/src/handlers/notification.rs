//! HTTP handlers for notification endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared::models::notification::Notification;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::notification::NotificationService;
use crate::AppState;

/// Query parameters for listing notifications
#[derive(Debug, Default, Deserialize)]
pub struct ListNotificationsQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct UnreadCountResponse {
    pub unread: i64,
}

#[derive(Serialize)]
pub struct MarkAllReadResponse {
    pub marked: i64,
}

/// Get the current user's notifications
pub async fn get_notifications(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ListNotificationsQuery>,
) -> AppResult<Json<Vec<Notification>>> {
    let service = NotificationService::new(state.db);
    let notifications = service
        .list_for_user(
            current_user.0.user_id,
            query.unread_only.unwrap_or(false),
            query.limit.unwrap_or(50),
        )
        .await?;
    Ok(Json(notifications))
}

/// Get the current user's unread notification count
pub async fn get_unread_count(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<UnreadCountResponse>> {
    let service = NotificationService::new(state.db);
    let unread = service.unread_count(current_user.0.user_id).await?;
    Ok(Json(UnreadCountResponse { unread }))
}

/// Mark one notification as read
pub async fn mark_as_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> AppResult<Json<()>> {
    let service = NotificationService::new(state.db);
    service
        .mark_read(current_user.0.user_id, notification_id)
        .await?;
    Ok(Json(()))
}

/// Mark all of the current user's notifications as read
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<MarkAllReadResponse>> {
    let service = NotificationService::new(state.db);
    let marked = service.mark_all_read(current_user.0.user_id).await?;
    Ok(Json(MarkAllReadResponse { marked }))
}
