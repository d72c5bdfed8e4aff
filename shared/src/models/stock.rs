//! Inventory items and per-owner stock ledger entries
//!
//! Stock is pooled per role (`owned_by` is a user-type string, not an
//! individual user), with at most one ledger entry per (item, owner)
//! pair. All quantities are whole units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Stock below this many units raises a low-stock alert. Uniform
/// across all three inventory domains; a stock of exactly the
/// threshold is still healthy.
pub const LOW_STOCK_THRESHOLD: i64 = 100;

/// The three inventory domains, collapsed into one abstraction
/// instead of three parallel code paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InventoryDomain {
    Crop,
    Fertilizer,
    Equipment,
}

impl InventoryDomain {
    pub fn as_str(&self) -> &'static str {
        match self {
            InventoryDomain::Crop => "crop",
            InventoryDomain::Fertilizer => "fertilizer",
            InventoryDomain::Equipment => "equipment",
        }
    }

    /// Human-readable label for messages and audit descriptions
    pub fn label(&self) -> &'static str {
        match self {
            InventoryDomain::Crop => "Crop type",
            InventoryDomain::Fertilizer => "Fertilizer",
            InventoryDomain::Equipment => "Equipment",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "crop" => Some(InventoryDomain::Crop),
            "fertilizer" => Some(InventoryDomain::Fertilizer),
            "equipment" => Some(InventoryDomain::Equipment),
            _ => None,
        }
    }

    pub fn all() -> [InventoryDomain; 3] {
        [
            InventoryDomain::Crop,
            InventoryDomain::Fertilizer,
            InventoryDomain::Equipment,
        ]
    }
}

/// An inventory item: a type name plus a human name within a domain,
/// e.g. crop type "Rice" / "Inbred"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: Uuid,
    pub domain: InventoryDomain,
    pub item_type: String,
    pub name: String,
    pub unit: String,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    /// Display name used in notifications and audit entries,
    /// e.g. "Rice/Inbred"
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.item_type, self.name)
    }
}

/// One owner's quantity record for an item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockEntry {
    pub owned_by: String,
    pub current_stock: i64,
    pub unit: String,
    pub stock_date: DateTime<Utc>,
}

/// Ledger arithmetic failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StockError {
    /// The requested deduction exceeds the available stock. Carries
    /// the amount still on hand so callers can say "only N left".
    #[error("insufficient stock: only {available} left")]
    Insufficient { available: i64 },

    /// The delta would push the stock level past the representable
    /// range.
    #[error("stock quantity out of range")]
    Overflow,
}

/// Compute the stock level after applying a signed delta to an
/// existing entry. Never produces a negative level; a delta that
/// would do so is rejected and the entry stays unchanged.
pub fn next_stock(current: i64, delta: i64) -> Result<i64, StockError> {
    let next = current.checked_add(delta).ok_or(StockError::Overflow)?;
    if next < 0 {
        return Err(StockError::Insufficient { available: current });
    }
    Ok(next)
}

/// Whether a stock level is below the low-stock threshold
pub fn is_low_stock(stock: i64) -> bool {
    stock < LOW_STOCK_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_stock_applies_signed_delta() {
        assert_eq!(next_stock(150, -60), Ok(90));
        assert_eq!(next_stock(90, 20), Ok(110));
    }

    #[test]
    fn next_stock_rejects_overdraw_with_available_amount() {
        assert_eq!(
            next_stock(53, -60),
            Err(StockError::Insufficient { available: 53 })
        );
    }

    #[test]
    fn next_stock_rejects_overflowing_delta() {
        assert_eq!(next_stock(i64::MAX, 1), Err(StockError::Overflow));
        assert_eq!(next_stock(i64::MAX - 1, 1), Ok(i64::MAX));
    }

    #[test]
    fn next_stock_allows_exact_drain_to_zero() {
        assert_eq!(next_stock(40, -40), Ok(0));
    }

    #[test]
    fn threshold_boundary_is_exclusive() {
        assert!(!is_low_stock(LOW_STOCK_THRESHOLD));
        assert!(is_low_stock(LOW_STOCK_THRESHOLD - 1));
    }

    #[test]
    fn domain_round_trips_through_str() {
        for domain in InventoryDomain::all() {
            assert_eq!(InventoryDomain::parse(domain.as_str()), Some(domain));
        }
        assert_eq!(InventoryDomain::parse("livestock"), None);
    }
}
