//! Low-stock notifications and the alert dedup state machine
//!
//! For each (item, recipient) pair at most one unread notification
//! exists. Its `notify` flag distinguishes "already alerted, still
//! low" from "resolved, watch for recurrence", so a sequence of stock
//! drops below the threshold produces exactly one alert instead of
//! one per mutation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::stock::is_low_stock;

/// The `notify` flag on a notification document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyFlag {
    /// Alert sent, stock still below threshold; do not re-alert
    No,
    /// Stock recovered since the alert; re-alert if it drops again
    Yes,
}

impl NotifyFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyFlag::No => "no",
            NotifyFlag::Yes => "yes",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "no" => Some(NotifyFlag::No),
            "yes" => Some(NotifyFlag::Yes),
            _ => None,
        }
    }
}

/// A low-stock notification addressed to one user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub recipient: Uuid,
    pub notification_type: String,
    pub item_name: String,
    pub description: String,
    pub read: bool,
    pub notify: NotifyFlag,
    pub created_at: DateTime<Utc>,
}

/// Alert state for one (item, recipient) pair, derived from the
/// unread notifications on file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertState {
    /// No unread notification
    Quiet,
    /// Unread notification with `notify = "no"`
    Active,
    /// Unread notification with `notify = "yes"`
    Resolved,
}

/// What to write after a stock mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertAction {
    /// Insert a fresh notification with `notify = "no"`
    Create,
    /// Flip unread notifications to `notify = "yes"`
    Resolve,
    /// Flip the unread `"yes"` notification back to `"no"` and
    /// refresh its description
    Reactivate,
    Nothing,
}

/// Derive the alert state from the notify flags of the unread
/// notifications for one (item, recipient) pair. An active alert
/// dominates a resolved one if both somehow exist.
pub fn derive_alert_state(unread_flags: &[NotifyFlag]) -> AlertState {
    if unread_flags.contains(&NotifyFlag::No) {
        AlertState::Active
    } else if unread_flags.contains(&NotifyFlag::Yes) {
        AlertState::Resolved
    } else {
        AlertState::Quiet
    }
}

/// The canonical alert transition after a stock mutation. Exactly one
/// write (or none) per pair, keeping "at most one unread alert" an
/// invariant rather than an aspiration.
pub fn alert_transition(state: AlertState, stock: i64) -> AlertAction {
    match (state, is_low_stock(stock)) {
        (AlertState::Quiet, true) => AlertAction::Create,
        (AlertState::Quiet, false) => AlertAction::Nothing,
        (AlertState::Active, true) => AlertAction::Nothing,
        (AlertState::Active, false) => AlertAction::Resolve,
        (AlertState::Resolved, true) => AlertAction::Reactivate,
        (AlertState::Resolved, false) => AlertAction::Nothing,
    }
}

/// Message body for a low-stock notification
pub fn low_stock_description(item_name: &str, stock: i64, unit: &str) -> String {
    format!("{} stock is low: {} {} remaining", item_name, stock, unit)
}
