//! Activity log models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of action an audit entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityKind {
    Create,
    Update,
    Delete,
}

impl ActivityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Create => "Create",
            ActivityKind::Update => "Update",
            ActivityKind::Delete => "Delete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Create" => Some(ActivityKind::Create),
            "Update" => Some(ActivityKind::Update),
            "Delete" => Some(ActivityKind::Delete),
            _ => None,
        }
    }
}

/// An append-only audit trail entry. Ids come from a counter document
/// incremented atomically, so they are strictly increasing and
/// gapless.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityLogEntry {
    pub activity_log_id: i64,
    pub username: String,
    pub user_type: String,
    pub activity: ActivityKind,
    pub activity_desc: String,
    pub logged_at: DateTime<Utc>,
}
