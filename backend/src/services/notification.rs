//! Low-stock notification service
//!
//! After a stock mutation the alert state for every cohort member is
//! re-derived and moved through the canonical transition, so a run of
//! drops below the threshold produces one alert per (item, recipient)
//! instead of one per mutation. Alerts are broadcast to every user
//! sharing the acting owner's role, not just the actor.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::models::notification::{
    alert_transition, derive_alert_state, low_stock_description, AlertAction, Notification,
    NotifyFlag,
};

use crate::error::{AppError, AppResult};

/// Notification type string for low-stock alerts
const LOW_STOCK_TYPE: &str = "low_stock";

/// Notification service for managing low-stock alerts
#[derive(Clone)]
pub struct NotificationService {
    db: PgPool,
}

/// Database row for a notification
#[derive(Debug, FromRow)]
struct NotificationRow {
    id: Uuid,
    recipient: Uuid,
    notification_type: String,
    item_name: String,
    description: String,
    read: bool,
    notify: String,
    created_at: DateTime<Utc>,
}

impl NotificationRow {
    fn into_notification(self) -> AppResult<Notification> {
        let notify = NotifyFlag::parse(&self.notify)
            .ok_or_else(|| anyhow::anyhow!("unknown notify flag '{}'", self.notify))?;
        Ok(Notification {
            id: self.id,
            recipient: self.recipient,
            notification_type: self.notification_type,
            item_name: self.item_name,
            description: self.description,
            read: self.read,
            notify,
            created_at: self.created_at,
        })
    }
}

impl NotificationService {
    /// Create a new NotificationService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Re-derive and apply the low-stock alert state for every user in
    /// the owner's cohort. Returns the number of notification writes.
    pub async fn sync_low_stock(
        &self,
        item_name: &str,
        unit: &str,
        owner_type: &str,
        current_stock: i64,
    ) -> AppResult<u32> {
        let recipients =
            sqlx::query_scalar::<_, Uuid>("SELECT id FROM users WHERE user_type = $1")
                .bind(owner_type)
                .fetch_all(&self.db)
                .await?;

        let mut writes = 0;
        for recipient in recipients {
            if self
                .sync_recipient(recipient, item_name, unit, current_stock)
                .await?
            {
                writes += 1;
            }
        }

        Ok(writes)
    }

    /// Apply the alert transition for one (item, recipient) pair.
    /// Returns whether a write happened.
    async fn sync_recipient(
        &self,
        recipient: Uuid,
        item_name: &str,
        unit: &str,
        current_stock: i64,
    ) -> AppResult<bool> {
        let raw_flags = sqlx::query_scalar::<_, String>(
            r#"
            SELECT notify FROM notifications
            WHERE recipient = $1 AND item_name = $2
              AND notification_type = $3 AND read = FALSE
            "#,
        )
        .bind(recipient)
        .bind(item_name)
        .bind(LOW_STOCK_TYPE)
        .fetch_all(&self.db)
        .await?;

        let flags: Vec<NotifyFlag> = raw_flags
            .iter()
            .filter_map(|s| NotifyFlag::parse(s))
            .collect();

        let state = derive_alert_state(&flags);
        match alert_transition(state, current_stock) {
            AlertAction::Create => {
                sqlx::query(
                    r#"
                    INSERT INTO notifications
                        (recipient, notification_type, item_name, description, read, notify)
                    VALUES ($1, $2, $3, $4, FALSE, $5)
                    "#,
                )
                .bind(recipient)
                .bind(LOW_STOCK_TYPE)
                .bind(item_name)
                .bind(low_stock_description(item_name, current_stock, unit))
                .bind(NotifyFlag::No.as_str())
                .execute(&self.db)
                .await?;
                Ok(true)
            }
            AlertAction::Resolve => {
                sqlx::query(
                    r#"
                    UPDATE notifications
                    SET notify = $4
                    WHERE recipient = $1 AND item_name = $2
                      AND notification_type = $3 AND read = FALSE AND notify = $5
                    "#,
                )
                .bind(recipient)
                .bind(item_name)
                .bind(LOW_STOCK_TYPE)
                .bind(NotifyFlag::Yes.as_str())
                .bind(NotifyFlag::No.as_str())
                .execute(&self.db)
                .await?;
                Ok(true)
            }
            AlertAction::Reactivate => {
                sqlx::query(
                    r#"
                    UPDATE notifications
                    SET notify = $4, description = $6, created_at = NOW()
                    WHERE recipient = $1 AND item_name = $2
                      AND notification_type = $3 AND read = FALSE AND notify = $5
                    "#,
                )
                .bind(recipient)
                .bind(item_name)
                .bind(LOW_STOCK_TYPE)
                .bind(NotifyFlag::No.as_str())
                .bind(NotifyFlag::Yes.as_str())
                .bind(low_stock_description(item_name, current_stock, unit))
                .execute(&self.db)
                .await?;
                Ok(true)
            }
            AlertAction::Nothing => Ok(false),
        }
    }

    /// Get notifications for a user
    pub async fn list_for_user(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        let rows = if unread_only {
            sqlx::query_as::<_, NotificationRow>(
                r#"
                SELECT id, recipient, notification_type, item_name, description,
                       read, notify, created_at
                FROM notifications
                WHERE recipient = $1 AND read = FALSE
                ORDER BY created_at DESC
                LIMIT $2
                "#,
            )
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.db)
            .await?
        } else {
            sqlx::query_as::<_, NotificationRow>(
                r#"
                SELECT id, recipient, notification_type, item_name, description,
                       read, notify, created_at
                FROM notifications
                WHERE recipient = $1
                ORDER BY created_at DESC
                LIMIT $2
                "#,
            )
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.db)
            .await?
        };

        rows.into_iter()
            .map(NotificationRow::into_notification)
            .collect()
    }

    /// Get unread notification count
    pub async fn unread_count(&self, user_id: Uuid) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE recipient = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.db)
        .await?;

        Ok(count)
    }

    /// Mark a notification as read
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE id = $1 AND recipient = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notification".to_string()));
        }

        Ok(())
    }

    /// Mark all notifications as read; returns how many were updated
    pub async fn mark_all_read(&self, user_id: Uuid) -> AppResult<i64> {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE recipient = $1 AND read = FALSE",
        )
        .bind(user_id)
        .execute(&self.db)
        .await?;

        Ok(result.rows_affected() as i64)
    }
}
