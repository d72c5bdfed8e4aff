//! Project management service
//!
//! Creating a project deducts the requested quantities from the
//! creator's role stock; edits reconcile only the difference, still
//! attributed to the original creator's role no matter who edits.
//! All deltas for one save land in a single transaction, so a failed
//! line rolls back the whole save with no partial writes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use shared::models::activity::ActivityKind;
use shared::models::project::{LineItem, Project};
use shared::models::stock::{InventoryDomain, InventoryItem};
use shared::reconciliation::line_item_deltas;
use shared::types::Pagination;
use shared::validation::{
    validate_date_range, validate_line_items, validate_name, validate_quantity, validate_unit,
};

use super::activity::{next_counter, ActivityService};
use super::notification::NotificationService;
use super::stock::StockService;
use crate::error::{AppError, AppResult};

/// Counter name for project ids
const PROJECT_COUNTER: &str = "project_id";

/// Project service
#[derive(Clone)]
pub struct ProjectService {
    db: PgPool,
}

/// Database row for a project
#[derive(Debug, FromRow)]
struct ProjectRow {
    project_id: i64,
    name: String,
    crop_type: String,
    crop_name: String,
    quantity: i64,
    unit: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    fertilizers: Json<Vec<LineItem>>,
    equipment: Json<Vec<LineItem>>,
    created_by: String,
    created_by_role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            project_id: row.project_id,
            name: row.name,
            crop_type: row.crop_type,
            crop_name: row.crop_name,
            quantity: row.quantity,
            unit: row.unit,
            start_date: row.start_date,
            end_date: row.end_date,
            fertilizers: row.fertilizers.0,
            equipment: row.equipment.0,
            created_by: row.created_by,
            created_by_role: row.created_by_role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating or editing a project. Edits submit the full
/// requested state; the service computes the difference.
#[derive(Debug, Deserialize)]
pub struct ProjectInput {
    pub name: String,
    pub crop_type: String,
    pub crop_name: String,
    pub quantity: i64,
    pub unit: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub fertilizers: Vec<LineItem>,
    #[serde(default)]
    pub equipment: Vec<LineItem>,
}

impl ProjectInput {
    fn crop_line(&self) -> LineItem {
        LineItem {
            item_type: self.crop_type.clone(),
            name: self.crop_name.clone(),
            quantity: self.quantity,
            unit: self.unit.clone(),
        }
    }

    fn validate(&self) -> AppResult<()> {
        validate_name(&self.name).map_err(|msg| AppError::Validation {
            field: "name".to_string(),
            message: msg.to_string(),
        })?;
        validate_name(&self.crop_type).map_err(|msg| AppError::Validation {
            field: "crop_type".to_string(),
            message: msg.to_string(),
        })?;
        validate_name(&self.crop_name).map_err(|msg| AppError::Validation {
            field: "crop_name".to_string(),
            message: msg.to_string(),
        })?;
        validate_quantity(self.quantity).map_err(|msg| AppError::Validation {
            field: "quantity".to_string(),
            message: msg.to_string(),
        })?;
        validate_unit(&self.unit).map_err(|msg| AppError::Validation {
            field: "unit".to_string(),
            message: msg.to_string(),
        })?;
        validate_date_range(self.start_date, self.end_date).map_err(|msg| {
            AppError::Validation {
                field: "end_date".to_string(),
                message: msg.to_string(),
            }
        })?;
        validate_line_items(&self.fertilizers).map_err(|message| AppError::Validation {
            field: "fertilizers".to_string(),
            message,
        })?;
        validate_line_items(&self.equipment).map_err(|message| AppError::Validation {
            field: "equipment".to_string(),
            message,
        })?;
        Ok(())
    }
}

/// One resolved stock change for an item, ready to apply
#[derive(Debug)]
struct PlannedDelta {
    item: InventoryItem,
    delta: i64,
    unit: String,
}

/// The post-commit view of one touched ledger entry
#[derive(Debug)]
struct StockOutcome {
    item_name: String,
    unit: String,
    new_stock: i64,
}

/// Put a batch of deltas into lock order. Entries are applied in
/// item-id order so concurrent saves touching the same items acquire
/// their row locks in the same sequence instead of deadlocking.
fn order_for_apply(planned: &mut [PlannedDelta]) {
    planned.sort_by_key(|p| p.item.id);
}

impl ProjectService {
    /// Create a new ProjectService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get a project by id
    pub async fn get_project(&self, project_id: i64) -> AppResult<Project> {
        let row = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT project_id, name, crop_type, crop_name, quantity, unit,
                   start_date, end_date, fertilizers, equipment,
                   created_by, created_by_role, created_at, updated_at
            FROM projects
            WHERE project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Project".to_string()))?;

        Ok(Project::from(row))
    }

    /// List projects, newest first
    pub async fn list_projects(&self, pagination: &Pagination) -> AppResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(
            r#"
            SELECT project_id, name, crop_type, crop_name, quantity, unit,
                   start_date, end_date, fertilizers, equipment,
                   created_by, created_by_role, created_at, updated_at
            FROM projects
            ORDER BY project_id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Project::from).collect())
    }

    /// Create a project, deducting the full requested quantities from
    /// the creator's role stock
    pub async fn create_project(
        &self,
        username: &str,
        user_type: &str,
        input: ProjectInput,
    ) -> AppResult<Project> {
        input.validate()?;

        let planned = self.plan_deltas(&[], &input).await?;

        let mut tx = self.db.begin().await?;

        let project_id = next_counter(&mut *tx, PROJECT_COUNTER).await?;
        let outcomes = Self::apply_planned(&mut tx, planned, user_type).await?;

        sqlx::query(
            r#"
            INSERT INTO projects (project_id, name, crop_type, crop_name, quantity, unit,
                                  start_date, end_date, fertilizers, equipment,
                                  created_by, created_by_role)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(project_id)
        .bind(&input.name)
        .bind(&input.crop_type)
        .bind(&input.crop_name)
        .bind(input.quantity)
        .bind(&input.unit)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(Json(&input.fertilizers))
        .bind(Json(&input.equipment))
        .bind(username)
        .bind(user_type)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.sync_alerts(&outcomes, user_type).await;
        self.log_activity(
            username,
            user_type,
            ActivityKind::Create,
            format!("Created project {} (#{})", input.name, project_id),
        )
        .await;

        self.get_project(project_id).await
    }

    /// Edit a project, applying only the difference between the old
    /// and new requested quantities. Stock changes are booked against
    /// the original creator's role even when someone else edits.
    pub async fn update_project(
        &self,
        project_id: i64,
        editor_username: &str,
        editor_user_type: &str,
        input: ProjectInput,
    ) -> AppResult<Project> {
        input.validate()?;

        let existing = self.get_project(project_id).await?;
        let owner = existing.created_by_role.clone();

        let planned = self.plan_deltas(std::slice::from_ref(&existing), &input).await?;

        let mut tx = self.db.begin().await?;

        let outcomes = Self::apply_planned(&mut tx, planned, &owner).await?;

        sqlx::query(
            r#"
            UPDATE projects
            SET name = $2, crop_type = $3, crop_name = $4, quantity = $5, unit = $6,
                start_date = $7, end_date = $8, fertilizers = $9, equipment = $10,
                updated_at = NOW()
            WHERE project_id = $1
            "#,
        )
        .bind(project_id)
        .bind(&input.name)
        .bind(&input.crop_type)
        .bind(&input.crop_name)
        .bind(input.quantity)
        .bind(&input.unit)
        .bind(input.start_date)
        .bind(input.end_date)
        .bind(Json(&input.fertilizers))
        .bind(Json(&input.equipment))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.sync_alerts(&outcomes, &owner).await;
        self.log_activity(
            editor_username,
            editor_user_type,
            ActivityKind::Update,
            format!("Updated project {} (#{})", input.name, project_id),
        )
        .await;

        self.get_project(project_id).await
    }

    /// Delete a project and return its full requested quantities to
    /// the creator's role stock
    pub async fn delete_project(
        &self,
        project_id: i64,
        username: &str,
        user_type: &str,
    ) -> AppResult<()> {
        let existing = self.get_project(project_id).await?;
        let owner = existing.created_by_role.clone();

        let mut planned = Vec::new();
        planned.extend(
            self.resolve_deltas(
                InventoryDomain::Crop,
                &[existing.crop_line()],
                &[],
            )
            .await?,
        );
        planned.extend(
            self.resolve_deltas(InventoryDomain::Fertilizer, &existing.fertilizers, &[])
                .await?,
        );
        planned.extend(
            self.resolve_deltas(InventoryDomain::Equipment, &existing.equipment, &[])
                .await?,
        );

        let mut tx = self.db.begin().await?;

        let outcomes = Self::apply_planned(&mut tx, planned, &owner).await?;

        sqlx::query("DELETE FROM projects WHERE project_id = $1")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.sync_alerts(&outcomes, &owner).await;
        self.log_activity(
            username,
            user_type,
            ActivityKind::Delete,
            format!("Deleted project {} (#{})", existing.name, project_id),
        )
        .await;

        Ok(())
    }

    /// Plan all stock changes for a save: crop, fertilizer and
    /// equipment lines diffed against the previous state (empty on
    /// create) and resolved to catalog items. Nothing is written yet.
    async fn plan_deltas(
        &self,
        existing: &[Project],
        input: &ProjectInput,
    ) -> AppResult<Vec<PlannedDelta>> {
        let (old_crop, old_fertilizers, old_equipment) = match existing.first() {
            Some(p) => (vec![p.crop_line()], p.fertilizers.clone(), p.equipment.clone()),
            None => (Vec::new(), Vec::new(), Vec::new()),
        };

        let mut planned = Vec::new();
        planned.extend(
            self.resolve_deltas(InventoryDomain::Crop, &old_crop, &[input.crop_line()])
                .await?,
        );
        planned.extend(
            self.resolve_deltas(
                InventoryDomain::Fertilizer,
                &old_fertilizers,
                &input.fertilizers,
            )
            .await?,
        );
        planned.extend(
            self.resolve_deltas(InventoryDomain::Equipment, &old_equipment, &input.equipment)
                .await?,
        );

        Ok(planned)
    }

    /// Diff one domain's line items and resolve the results against
    /// the item catalog
    async fn resolve_deltas(
        &self,
        domain: InventoryDomain,
        old: &[LineItem],
        new: &[LineItem],
    ) -> AppResult<Vec<PlannedDelta>> {
        let stock = StockService::new(self.db.clone());
        let mut planned = Vec::new();

        for line in line_item_deltas(old, new) {
            let item = stock
                .find_item(domain, &line.key.item_type, &line.key.name)
                .await?;
            planned.push(PlannedDelta {
                item,
                delta: line.delta,
                unit: line.unit,
            });
        }

        Ok(planned)
    }

    /// Apply planned deltas against the owner's ledger entries inside
    /// one transaction. Any failure rolls back every earlier delta.
    async fn apply_planned(
        tx: &mut Transaction<'_, Postgres>,
        mut planned: Vec<PlannedDelta>,
        owner: &str,
    ) -> AppResult<Vec<StockOutcome>> {
        order_for_apply(&mut planned);

        let mut outcomes = Vec::with_capacity(planned.len());

        for p in &planned {
            let new_stock =
                StockService::apply_delta_in(tx, &p.item, owner, p.delta, &p.unit).await?;
            outcomes.push(StockOutcome {
                item_name: p.item.display_name(),
                unit: p.unit.clone(),
                new_stock,
            });
        }

        Ok(outcomes)
    }

    /// Best-effort low-stock alert sync for every touched ledger entry
    async fn sync_alerts(&self, outcomes: &[StockOutcome], owner_type: &str) {
        let notifications = NotificationService::new(self.db.clone());
        for o in outcomes {
            if let Err(e) = notifications
                .sync_low_stock(&o.item_name, &o.unit, owner_type, o.new_stock)
                .await
            {
                tracing::warn!("low-stock sync failed for {}: {}", o.item_name, e);
            }
        }
    }

    /// Best-effort audit write
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

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn planned(id: Uuid, name: &str, delta: i64) -> PlannedDelta {
        PlannedDelta {
            item: InventoryItem {
                id,
                domain: InventoryDomain::Fertilizer,
                item_type: "npk".to_string(),
                name: name.to_string(),
                unit: "kg".to_string(),
                created_at: Utc::now(),
            },
            delta,
            unit: "kg".to_string(),
        }
    }

    /// Two saves touching the same items must lock their entry rows
    /// in the same sequence regardless of line-item order
    #[test]
    fn apply_order_is_item_id_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();

        let mut first = vec![planned(b, "16-16-16", -10), planned(c, "46-0-0", 5), planned(a, "15-15-15", -20)];
        let mut second = vec![planned(c, "46-0-0", -5), planned(a, "15-15-15", 20), planned(b, "16-16-16", 10)];

        order_for_apply(&mut first);
        order_for_apply(&mut second);

        let first_ids: Vec<Uuid> = first.iter().map(|p| p.item.id).collect();
        let second_ids: Vec<Uuid> = second.iter().map(|p| p.item.id).collect();

        assert_eq!(first_ids, second_ids);
        assert!(first_ids.windows(2).all(|w| w[0] < w[1]));
    }
}
