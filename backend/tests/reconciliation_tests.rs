//! Project stock reconciliation tests
//!
//! Tests for the diff-and-refund logic that keeps project edits and
//! the stock ledger consistent:
//! - The sign convention: stock change = old quantity - new quantity
//! - Matching line items across revisions by (type, name)
//! - Conservation: deltas sum to the overall requested change

use proptest::prelude::*;

use shared::models::project::LineItem;
use shared::reconciliation::{find_duplicate, line_item_deltas, refund_delta, LineKey};

fn line(item_type: &str, name: &str, quantity: i64) -> LineItem {
    LineItem {
        item_type: item_type.to_string(),
        name: name.to_string(),
        quantity,
        unit: "kg".to_string(),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Test lowering a request refunds the difference
    #[test]
    fn test_lowered_request_refunds() {
        // Requested 60, now 40: 20 goes back to stock
        assert_eq!(refund_delta(60, 40), 20);
    }

    /// Test raising a request deducts the difference
    #[test]
    fn test_raised_request_deducts() {
        // Requested 40, now 70: 30 more comes out of stock
        assert_eq!(refund_delta(40, 70), -30);
    }

    /// Test an unchanged request moves nothing
    #[test]
    fn test_unchanged_request() {
        assert_eq!(refund_delta(50, 50), 0);
    }

    /// Test a line removed from the revision is fully refunded
    #[test]
    fn test_removed_line_refunded() {
        let old = vec![line("npk", "15-15-15", 80)];
        let deltas = line_item_deltas(&old, &[]);

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].key, LineKey::of(&old[0]));
        assert_eq!(deltas[0].delta, 80);
    }

    /// Test a line added in the revision is deducted in full
    #[test]
    fn test_added_line_deducted() {
        let new = vec![line("urea", "46-0-0", 25)];
        let deltas = line_item_deltas(&[], &new);

        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].delta, -25);
    }

    /// Test lines are matched by (type, name), not by position
    #[test]
    fn test_lines_matched_by_key() {
        let old = vec![line("npk", "15-15-15", 80), line("urea", "46-0-0", 20)];
        let new = vec![line("urea", "46-0-0", 35), line("npk", "15-15-15", 80)];
        let deltas = line_item_deltas(&old, &new);

        // npk is unchanged and dropped; urea grew by 15
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].key, LineKey::of(&old[1]));
        assert_eq!(deltas[0].delta, -15);
    }

    /// Test renaming a line refunds the old and deducts the new
    #[test]
    fn test_renamed_line_is_swap() {
        let old = vec![line("npk", "15-15-15", 40)];
        let new = vec![line("npk", "16-16-16", 40)];
        let mut deltas = line_item_deltas(&old, &new);
        deltas.sort_by_key(|d| d.delta);

        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].delta, -40);
        assert_eq!(deltas[1].delta, 40);
    }

    /// Test zero-quantity changes produce no deltas
    #[test]
    fn test_identical_revisions_no_deltas() {
        let items = vec![line("npk", "15-15-15", 80), line("urea", "46-0-0", 20)];
        assert!(line_item_deltas(&items, &items).is_empty());
    }

    /// Test duplicate detection by (type, name)
    #[test]
    fn test_duplicate_detection() {
        let items = vec![
            line("npk", "15-15-15", 10),
            line("urea", "46-0-0", 20),
            line("npk", "15-15-15", 5),
        ];
        assert_eq!(find_duplicate(&items), Some(LineKey::of(&items[0])));
        assert_eq!(find_duplicate(&items[..2]), None);
    }
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Generate a small pool of distinct line item keys
fn key_pool() -> Vec<(&'static str, &'static str)> {
    vec![
        ("npk", "15-15-15"),
        ("npk", "16-16-16"),
        ("urea", "46-0-0"),
        ("compost", "worm"),
        ("tractor", "kubota-l4508"),
    ]
}

/// Generate a revision: a subset of the pool with random quantities
fn revision_strategy() -> impl Strategy<Value = Vec<LineItem>> {
    prop::collection::vec((0usize..5, 1i64..1000), 0..5).prop_map(|picks| {
        let pool = key_pool();
        let mut seen = Vec::new();
        let mut items = Vec::new();
        for (idx, qty) in picks {
            if seen.contains(&idx) {
                continue;
            }
            seen.push(idx);
            let (item_type, name) = pool[idx];
            items.push(LineItem {
                item_type: item_type.to_string(),
                name: name.to_string(),
                quantity: qty,
                unit: "kg".to_string(),
            });
        }
        items
    })
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// The opposite edit produces the opposite delta
    #[test]
    fn prop_refund_antisymmetric(old in 0i64..10_000, new in 0i64..10_000) {
        prop_assert_eq!(refund_delta(old, new), -refund_delta(new, old));
    }

    /// Deltas conserve quantity: the refund for a key equals the drop
    /// in its requested amount
    #[test]
    fn prop_deltas_match_requested_change(
        old in revision_strategy(),
        new in revision_strategy(),
    ) {
        for delta in line_item_deltas(&old, &new) {
            let old_qty = old
                .iter()
                .find(|i| LineKey::of(i) == delta.key)
                .map_or(0, |i| i.quantity);
            let new_qty = new
                .iter()
                .find(|i| LineKey::of(i) == delta.key)
                .map_or(0, |i| i.quantity);
            prop_assert_eq!(delta.delta, old_qty - new_qty);
        }
    }

    /// Every changed key shows up exactly once, unchanged keys never
    #[test]
    fn prop_deltas_cover_changed_keys(
        old in revision_strategy(),
        new in revision_strategy(),
    ) {
        let deltas = line_item_deltas(&old, &new);

        for (item_type, name) in key_pool() {
            let key = LineKey {
                item_type: item_type.to_string(),
                name: name.to_string(),
            };
            let old_qty = old
                .iter()
                .find(|i| LineKey::of(i) == key)
                .map_or(0, |i| i.quantity);
            let new_qty = new
                .iter()
                .find(|i| LineKey::of(i) == key)
                .map_or(0, |i| i.quantity);

            let count = deltas.iter().filter(|d| d.key == key).count();
            if old_qty == new_qty {
                prop_assert_eq!(count, 0);
            } else {
                prop_assert_eq!(count, 1);
            }
        }
    }

    /// Reverting a revision cancels out: applying the forward deltas
    /// and then the reverse deltas nets to zero per key
    #[test]
    fn prop_revert_cancels(
        old in revision_strategy(),
        new in revision_strategy(),
    ) {
        let forward = line_item_deltas(&old, &new);
        let reverse = line_item_deltas(&new, &old);

        for (item_type, name) in key_pool() {
            let key = LineKey {
                item_type: item_type.to_string(),
                name: name.to_string(),
            };
            let net: i64 = forward
                .iter()
                .chain(reverse.iter())
                .filter(|d| d.key == key)
                .map(|d| d.delta)
                .sum();
            prop_assert_eq!(net, 0);
        }
    }
}
