//! HTTP handlers for inventory and stock endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::models::stock::{InventoryDomain, InventoryItem};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::stock::{
    AdjustStockInput, CreateItemInput, ItemStockSummary, StockAdjustment, StockService,
};
use crate::AppState;

/// Query parameters for listing items
#[derive(Debug, Default, Deserialize)]
pub struct ListItemsQuery {
    pub domain: Option<InventoryDomain>,
}

/// Create an inventory item
pub async fn create_item(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateItemInput>,
) -> AppResult<Json<InventoryItem>> {
    let service = StockService::new(state.db);
    let item = service
        .create_item(&current_user.0.username, &current_user.0.user_type, input)
        .await?;
    Ok(Json(item))
}

/// List inventory items, optionally filtered by domain
pub async fn list_items(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListItemsQuery>,
) -> AppResult<Json<Vec<InventoryItem>>> {
    let service = StockService::new(state.db);
    let items = service.list_items(query.domain).await?;
    Ok(Json(items))
}

/// Get an inventory item
pub async fn get_item(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<InventoryItem>> {
    let service = StockService::new(state.db);
    let item = service.get_item(item_id).await?;
    Ok(Json(item))
}

/// Get an item's per-owner stock entries and pooled total
pub async fn get_item_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
) -> AppResult<Json<ItemStockSummary>> {
    let service = StockService::new(state.db);
    let summary = service.item_stock(item_id).await?;
    Ok(Json(summary))
}

/// Apply a direct stock adjustment
pub async fn adjust_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(item_id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<Json<StockAdjustment>> {
    let service = StockService::new(state.db);
    let adjustment = service
        .adjust(
            &current_user.0.username,
            &current_user.0.user_type,
            item_id,
            input,
        )
        .await?;
    Ok(Json(adjustment))
}
