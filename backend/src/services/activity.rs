//! Activity log service
//!
//! Append-only audit trail keyed by a counter document. The counter
//! is bumped with a single atomic upsert, so concurrent writers get
//! distinct, gapless ids; the bump and the log insert share one
//! transaction so a failed insert never burns an id.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{FromRow, PgPool};

use shared::models::activity::{ActivityKind, ActivityLogEntry};
use shared::types::Pagination;

use crate::error::AppResult;

/// Counter name for activity log ids
const ACTIVITY_COUNTER: &str = "activity_log_id";

/// Activity log service
#[derive(Clone)]
pub struct ActivityService {
    db: PgPool,
}

/// Database row for an activity log entry
#[derive(Debug, FromRow)]
struct ActivityRow {
    activity_log_id: i64,
    username: String,
    user_type: String,
    activity: String,
    activity_desc: String,
    logged_at: DateTime<Utc>,
}

impl ActivityRow {
    fn into_entry(self) -> AppResult<ActivityLogEntry> {
        let activity = ActivityKind::parse(&self.activity)
            .ok_or_else(|| anyhow::anyhow!("unknown activity kind '{}'", self.activity))?;
        Ok(ActivityLogEntry {
            activity_log_id: self.activity_log_id,
            username: self.username,
            user_type: self.user_type,
            activity,
            activity_desc: self.activity_desc,
            logged_at: self.logged_at,
        })
    }
}

/// Filter for listing and exporting activity entries
#[derive(Debug, Default, Deserialize)]
pub struct ActivityFilter {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Atomically advance a named counter and return the new value.
/// A missing counter row starts the sequence at 1.
pub async fn next_counter<'e, E>(executor: E, name: &str) -> sqlx::Result<i64>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO counters (name, value)
        VALUES ($1, 1)
        ON CONFLICT (name) DO UPDATE SET value = counters.value + 1
        RETURNING value
        "#,
    )
    .bind(name)
    .fetch_one(executor)
    .await
}

impl ActivityService {
    /// Create a new ActivityService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append an audit entry with the next activity log id
    pub async fn record(
        &self,
        username: &str,
        user_type: &str,
        kind: ActivityKind,
        desc: &str,
    ) -> AppResult<ActivityLogEntry> {
        let mut tx = self.db.begin().await?;

        let id = next_counter(&mut *tx, ACTIVITY_COUNTER).await?;

        let logged_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r#"
            INSERT INTO activity_log (activity_log_id, username, user_type, activity, activity_desc)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING logged_at
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(user_type)
        .bind(kind.as_str())
        .bind(desc)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ActivityLogEntry {
            activity_log_id: id,
            username: username.to_string(),
            user_type: user_type.to_string(),
            activity: kind,
            activity_desc: desc.to_string(),
            logged_at,
        })
    }

    /// List audit entries, newest first
    pub async fn list(
        &self,
        filter: &ActivityFilter,
        pagination: &Pagination,
    ) -> AppResult<Vec<ActivityLogEntry>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT activity_log_id, username, user_type, activity, activity_desc, logged_at
            FROM activity_log
            WHERE ($1::date IS NULL OR logged_at::date >= $1)
              AND ($2::date IS NULL OR logged_at::date <= $2)
            ORDER BY activity_log_id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.start_date)
        .bind(filter.end_date)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(ActivityRow::into_entry).collect()
    }

    /// Export the audit trail as CSV, oldest first
    pub async fn export_csv(&self, filter: &ActivityFilter) -> AppResult<String> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            r#"
            SELECT activity_log_id, username, user_type, activity, activity_desc, logged_at
            FROM activity_log
            WHERE ($1::date IS NULL OR logged_at::date >= $1)
              AND ($2::date IS NULL OR logged_at::date <= $2)
            ORDER BY activity_log_id ASC
            "#,
        )
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(&self.db)
        .await?;

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "activity_log_id",
                "username",
                "user_type",
                "activity",
                "activity_desc",
                "logged_at",
            ])
            .map_err(anyhow::Error::from)?;

        for row in rows {
            writer
                .write_record([
                    row.activity_log_id.to_string(),
                    row.username,
                    row.user_type,
                    row.activity,
                    row.activity_desc,
                    row.logged_at.to_rfc3339(),
                ])
                .map_err(anyhow::Error::from)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("csv flush failed: {}", e))?;
        Ok(String::from_utf8(bytes).map_err(anyhow::Error::from)?)
    }
}
