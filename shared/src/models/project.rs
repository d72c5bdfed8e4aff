//! Project models
//!
//! A project requests a crop quantity plus fertilizer and equipment
//! line items. Creating one deducts the requested quantities from the
//! creator's role stock; editing reconciles only the difference.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A requested fertilizer or equipment line within a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub item_type: String,
    pub name: String,
    pub quantity: i64,
    pub unit: String,
}

/// A farm project with its requested quantities. The saved quantities
/// are the "previous state" the next edit reconciles against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub project_id: i64,
    pub name: String,
    pub crop_type: String,
    pub crop_name: String,
    pub quantity: i64,
    pub unit: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub fertilizers: Vec<LineItem>,
    pub equipment: Vec<LineItem>,
    /// Username of the creator
    pub created_by: String,
    /// User type of the creator; stock effects are attributed to this
    /// role on every edit, not to the editor
    pub created_by_role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// The crop request expressed as a line item, so crop deltas go
    /// through the same diff as fertilizer and equipment lines
    pub fn crop_line(&self) -> LineItem {
        LineItem {
            item_type: self.crop_type.clone(),
            name: self.crop_name.clone(),
            quantity: self.quantity,
            unit: self.unit.clone(),
        }
    }
}
