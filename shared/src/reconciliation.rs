//! Project stock reconciliation
//!
//! When a project's requested quantities change, only the difference
//! is applied to inventory. The sign convention lives in one place:
//! the stock change is `old - new`, so stock increases when the
//! requested quantity decreases. Getting this backwards silently
//! corrupts inventory, which is why it is a named function with tests
//! instead of inline arithmetic at each call site.

use crate::models::project::LineItem;

/// Stock delta when a requested quantity changes from `old` to `new`.
/// Positive means stock is returned; negative means more is deducted.
pub fn refund_delta(old_quantity: i64, new_quantity: i64) -> i64 {
    old_quantity - new_quantity
}

/// Key matching old and new line items across an edit
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub item_type: String,
    pub name: String,
}

impl LineKey {
    pub fn of(item: &LineItem) -> Self {
        Self {
            item_type: item.item_type.clone(),
            name: item.name.clone(),
        }
    }
}

/// One planned stock change produced by a reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDelta {
    pub key: LineKey,
    /// Signed stock change (`old - new` convention)
    pub delta: i64,
    pub unit: String,
}

/// Diff two line-item lists by (type, name) key.
///
/// Items present only in `old` are fully refunded; items present only
/// in `new` are fully deducted; items in both get the difference.
/// Zero deltas are dropped so unchanged lines never touch the ledger.
pub fn line_item_deltas(old: &[LineItem], new: &[LineItem]) -> Vec<LineDelta> {
    let mut deltas = Vec::new();

    for old_item in old {
        let key = LineKey::of(old_item);
        let delta = match new.iter().find(|n| LineKey::of(n) == key) {
            Some(new_item) => refund_delta(old_item.quantity, new_item.quantity),
            None => old_item.quantity,
        };
        if delta != 0 {
            let unit = new
                .iter()
                .find(|n| LineKey::of(n) == key)
                .map(|n| n.unit.clone())
                .unwrap_or_else(|| old_item.unit.clone());
            deltas.push(LineDelta { key, delta, unit });
        }
    }

    for new_item in new {
        let key = LineKey::of(new_item);
        if !old.iter().any(|o| LineKey::of(o) == key) && new_item.quantity != 0 {
            deltas.push(LineDelta {
                key,
                delta: -new_item.quantity,
                unit: new_item.unit.clone(),
            });
        }
    }

    deltas
}

/// Find the first (type, name) pair that appears more than once in a
/// submitted line-item list. Duplicate lines would double-charge the
/// same stock entry, so they are rejected up front.
pub fn find_duplicate(items: &[LineItem]) -> Option<LineKey> {
    for (i, item) in items.iter().enumerate() {
        let key = LineKey::of(item);
        if items[..i].iter().any(|earlier| LineKey::of(earlier) == key) {
            return Some(key);
        }
    }
    None
}
