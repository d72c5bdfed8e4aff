//! Stock ledger service
//!
//! Applies signed quantity deltas to per-owner stock entries. Every
//! mutation runs inside a database transaction with row locking, so
//! two sessions adjusting the same (item, owner) entry serialize
//! instead of losing the earlier write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::models::activity::ActivityKind;
use shared::models::stock::{next_stock, InventoryDomain, InventoryItem, StockEntry};
use shared::validation::{validate_name, validate_unit};

use super::activity::ActivityService;
use super::notification::NotificationService;
use crate::error::{AppError, AppResult};

/// Stock service for managing inventory items and their ledgers
#[derive(Clone)]
pub struct StockService {
    db: PgPool,
}

/// Database row for an inventory item
#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    domain: String,
    item_type: String,
    name: String,
    unit: String,
    created_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_item(self) -> AppResult<InventoryItem> {
        let domain = InventoryDomain::parse(&self.domain)
            .ok_or_else(|| anyhow::anyhow!("unknown inventory domain '{}'", self.domain))?;
        Ok(InventoryItem {
            id: self.id,
            domain,
            item_type: self.item_type,
            name: self.name,
            unit: self.unit,
            created_at: self.created_at,
        })
    }
}

/// Database row for a stock entry
#[derive(Debug, FromRow)]
struct StockEntryRow {
    owned_by: String,
    current_stock: i64,
    unit: String,
    stock_date: DateTime<Utc>,
}

/// Input for creating an inventory item
#[derive(Debug, Deserialize)]
pub struct CreateItemInput {
    pub domain: InventoryDomain,
    pub item_type: String,
    pub name: String,
    pub unit: String,
}

/// Input for a direct stock adjustment
#[derive(Debug, Deserialize)]
pub struct AdjustStockInput {
    /// Role the adjustment is booked against; defaults to the acting
    /// user's role
    pub owned_by: Option<String>,
    /// Signed quantity change
    pub delta: i64,
    /// Unit override; defaults to the item's unit
    pub unit: Option<String>,
}

/// Outcome of a ledger mutation
#[derive(Debug, Clone, Serialize)]
pub struct StockAdjustment {
    pub item_id: Uuid,
    pub item_name: String,
    pub owned_by: String,
    pub delta: i64,
    pub new_stock: i64,
    pub unit: String,
}

/// An item's ledger with per-owner entries and the pooled total
#[derive(Debug, Serialize)]
pub struct ItemStockSummary {
    pub item: InventoryItem,
    pub entries: Vec<StockEntry>,
    pub total_stock: i64,
}

impl StockService {
    /// Create a new StockService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create an inventory item, rejecting duplicates on
    /// (domain, type, name)
    pub async fn create_item(
        &self,
        username: &str,
        user_type: &str,
        input: CreateItemInput,
    ) -> AppResult<InventoryItem> {
        validate_name(&input.item_type).map_err(|msg| AppError::Validation {
            field: "item_type".to_string(),
            message: msg.to_string(),
        })?;
        validate_name(&input.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;
        validate_unit(&input.unit).map_err(|msg| AppError::Validation {
            field: "unit".to_string(),
            message: msg.to_string(),
        })?;

        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM inventory_items WHERE domain = $1 AND item_type = $2 AND name = $3)",
        )
        .bind(input.domain.as_str())
        .bind(&input.item_type)
        .bind(&input.name)
        .fetch_one(&self.db)
        .await?;

        if exists {
            return Err(AppError::DuplicateEntry(format!(
                "{} {}/{}",
                input.domain.label(),
                input.item_type,
                input.name
            )));
        }

        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            INSERT INTO inventory_items (domain, item_type, name, unit)
            VALUES ($1, $2, $3, $4)
            RETURNING id, domain, item_type, name, unit, created_at
            "#,
        )
        .bind(input.domain.as_str())
        .bind(&input.item_type)
        .bind(&input.name)
        .bind(&input.unit)
        .fetch_one(&self.db)
        .await?;

        let item = row.into_item()?;

        self.log_activity(
            username,
            user_type,
            ActivityKind::Create,
            format!("Added {} {}", item.domain.label().to_lowercase(), item.display_name()),
        )
        .await;

        Ok(item)
    }

    /// List inventory items, optionally filtered by domain
    pub async fn list_items(
        &self,
        domain: Option<InventoryDomain>,
    ) -> AppResult<Vec<InventoryItem>> {
        let rows = if let Some(domain) = domain {
            sqlx::query_as::<_, ItemRow>(
                r#"
                SELECT id, domain, item_type, name, unit, created_at
                FROM inventory_items
                WHERE domain = $1
                ORDER BY item_type, name
                "#,
            )
            .bind(domain.as_str())
            .fetch_all(&self.db)
            .await?
        } else {
            sqlx::query_as::<_, ItemRow>(
                r#"
                SELECT id, domain, item_type, name, unit, created_at
                FROM inventory_items
                ORDER BY domain, item_type, name
                "#,
            )
            .fetch_all(&self.db)
            .await?
        };

        rows.into_iter().map(ItemRow::into_item).collect()
    }

    /// Get an inventory item by id
    pub async fn get_item(&self, item_id: Uuid) -> AppResult<InventoryItem> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, domain, item_type, name, unit, created_at
            FROM inventory_items
            WHERE id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory item".to_string()))?;

        row.into_item()
    }

    /// Look up an item by its (domain, type, name) key
    pub async fn find_item(
        &self,
        domain: InventoryDomain,
        item_type: &str,
        name: &str,
    ) -> AppResult<InventoryItem> {
        let row = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT id, domain, item_type, name, unit, created_at
            FROM inventory_items
            WHERE domain = $1 AND item_type = $2 AND name = $3
            "#,
        )
        .bind(domain.as_str())
        .bind(item_type)
        .bind(name)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("{} {}/{}", domain.label(), item_type, name))
        })?;

        row.into_item()
    }

    /// Get an item's ledger entries and pooled total
    pub async fn item_stock(&self, item_id: Uuid) -> AppResult<ItemStockSummary> {
        let item = self.get_item(item_id).await?;

        let rows = sqlx::query_as::<_, StockEntryRow>(
            r#"
            SELECT owned_by, current_stock, unit, stock_date
            FROM stock_entries
            WHERE item_id = $1
            ORDER BY owned_by
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.db)
        .await?;

        let entries: Vec<StockEntry> = rows
            .into_iter()
            .map(|r| StockEntry {
                owned_by: r.owned_by,
                current_stock: r.current_stock,
                unit: r.unit,
                stock_date: r.stock_date,
            })
            .collect();

        let total_stock = entries.iter().map(|e| e.current_stock).sum();

        Ok(ItemStockSummary {
            item,
            entries,
            total_stock,
        })
    }

    /// Apply a signed delta to the entry for (item, owner) inside an
    /// open transaction. The entry row is locked for the duration.
    ///
    /// A missing entry is created on increase; an entry reaching
    /// exactly zero is deleted; a zero delta leaves both the stock
    /// and the stock date untouched. Returns the new stock level.
    pub async fn apply_delta_in(
        tx: &mut Transaction<'_, Postgres>,
        item: &InventoryItem,
        owner: &str,
        delta: i64,
        unit: &str,
    ) -> AppResult<i64> {
        let current = sqlx::query_scalar::<_, i64>(
            "SELECT current_stock FROM stock_entries WHERE item_id = $1 AND owned_by = $2 FOR UPDATE",
        )
        .bind(item.id)
        .bind(owner)
        .fetch_optional(&mut **tx)
        .await?;

        match current {
            None => {
                if delta == 0 {
                    return Ok(0);
                }
                if delta < 0 {
                    return Err(AppError::InsufficientStock {
                        item: item.display_name(),
                        available: 0,
                    });
                }
                sqlx::query(
                    r#"
                    INSERT INTO stock_entries (item_id, owned_by, current_stock, unit, stock_date)
                    VALUES ($1, $2, $3, $4, NOW())
                    "#,
                )
                .bind(item.id)
                .bind(owner)
                .bind(delta)
                .bind(unit)
                .execute(&mut **tx)
                .await?;
                Ok(delta)
            }
            Some(current) => {
                if delta == 0 {
                    return Ok(current);
                }
                let new_stock = next_stock(current, delta)
                    .map_err(|e| AppError::from_stock_error(&item.display_name(), e))?;

                if new_stock == 0 {
                    sqlx::query(
                        "DELETE FROM stock_entries WHERE item_id = $1 AND owned_by = $2",
                    )
                    .bind(item.id)
                    .bind(owner)
                    .execute(&mut **tx)
                    .await?;
                } else {
                    sqlx::query(
                        r#"
                        UPDATE stock_entries
                        SET current_stock = $3, unit = $4, stock_date = NOW()
                        WHERE item_id = $1 AND owned_by = $2
                        "#,
                    )
                    .bind(item.id)
                    .bind(owner)
                    .bind(new_stock)
                    .bind(unit)
                    .execute(&mut **tx)
                    .await?;
                }
                Ok(new_stock)
            }
        }
    }

    /// Apply a single delta in its own transaction
    pub async fn apply_delta(
        &self,
        item_id: Uuid,
        owner: &str,
        delta: i64,
        unit: Option<String>,
    ) -> AppResult<StockAdjustment> {
        let item = self.get_item(item_id).await?;
        let unit = unit.unwrap_or_else(|| item.unit.clone());

        let mut tx = self.db.begin().await?;
        let new_stock = Self::apply_delta_in(&mut tx, &item, owner, delta, &unit).await?;
        tx.commit().await?;

        Ok(StockAdjustment {
            item_id: item.id,
            item_name: item.display_name(),
            owned_by: owner.to_string(),
            delta,
            new_stock,
            unit,
        })
    }

    /// Direct inventory adjustment submitted from the stock pages:
    /// apply the delta, then run the low-stock alert sync and audit
    /// write as best-effort side effects.
    pub async fn adjust(
        &self,
        username: &str,
        user_type: &str,
        item_id: Uuid,
        input: AdjustStockInput,
    ) -> AppResult<StockAdjustment> {
        let owned_by = input.owned_by.unwrap_or_else(|| user_type.to_string());
        let adjustment = self
            .apply_delta(item_id, &owned_by, input.delta, input.unit)
            .await?;

        let notifications = NotificationService::new(self.db.clone());
        if let Err(e) = notifications
            .sync_low_stock(
                &adjustment.item_name,
                &adjustment.unit,
                &adjustment.owned_by,
                adjustment.new_stock,
            )
            .await
        {
            tracing::warn!(
                "low-stock sync failed for {}: {}",
                adjustment.item_name,
                e
            );
        }

        self.log_activity(
            username,
            user_type,
            ActivityKind::Update,
            format!(
                "Adjusted {} stock for {} by {} ({} {} now on hand)",
                adjustment.item_name,
                adjustment.owned_by,
                adjustment.delta,
                adjustment.new_stock,
                adjustment.unit
            ),
        )
        .await;

        Ok(adjustment)
    }

    /// Best-effort audit write; a failure is logged, never propagated
    async fn log_activity(
        &self,
        username: &str,
        user_type: &str,
        kind: ActivityKind,
        desc: String,
    ) {
        let activity = ActivityService::new(self.db.clone());
        if let Err(e) = activity.record(username, user_type, kind, &desc).await {
            tracing::warn!("activity log write failed: {}", e);
        }
    }
}
