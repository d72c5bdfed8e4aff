//! Stock ledger tests
//!
//! Tests for per-owner stock tracking including:
//! - Non-negativity of ledger entries under any delta
//! - Zero-delta requests leaving the ledger untouched
//! - The low-stock threshold boundary

use proptest::prelude::*;

use shared::models::stock::{is_low_stock, next_stock, StockError, LOW_STOCK_THRESHOLD};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Test positive delta increases stock
    #[test]
    fn test_positive_delta() {
        assert_eq!(next_stock(100, 50).unwrap(), 150);
    }

    /// Test negative delta decreases stock
    #[test]
    fn test_negative_delta() {
        assert_eq!(next_stock(100, -40).unwrap(), 60);
    }

    /// Test deduction to exactly zero is allowed
    #[test]
    fn test_deduction_to_zero() {
        assert_eq!(next_stock(75, -75).unwrap(), 0);
    }

    /// Test overdraw is rejected with the available amount
    #[test]
    fn test_overdraw_rejected() {
        let err = next_stock(30, -31).unwrap_err();
        assert_eq!(err, StockError::Insufficient { available: 30 });
    }

    /// Test overdraw from an empty entry
    #[test]
    fn test_overdraw_from_zero() {
        let err = next_stock(0, -1).unwrap_err();
        assert_eq!(err, StockError::Insufficient { available: 0 });
    }

    /// Test zero delta leaves stock unchanged
    #[test]
    fn test_zero_delta() {
        assert_eq!(next_stock(42, 0).unwrap(), 42);
        assert_eq!(next_stock(0, 0).unwrap(), 0);
    }

    /// Test the threshold is exclusive: exactly 100 is healthy
    #[test]
    fn test_threshold_boundary() {
        assert!(!is_low_stock(LOW_STOCK_THRESHOLD));
        assert!(!is_low_stock(LOW_STOCK_THRESHOLD + 1));
        assert!(is_low_stock(LOW_STOCK_THRESHOLD - 1));
        assert!(is_low_stock(0));
    }

    /// Test the error message names the remaining quantity
    #[test]
    fn test_insufficient_message() {
        let err = next_stock(12, -20).unwrap_err();
        assert_eq!(err.to_string(), "insufficient stock: only 12 left");
    }

    /// Test a delta past the representable range is rejected instead
    /// of wrapping
    #[test]
    fn test_overflowing_delta_rejected() {
        assert_eq!(next_stock(i64::MAX, 1), Err(StockError::Overflow));
        assert_eq!(next_stock(i64::MAX, i64::MAX), Err(StockError::Overflow));
        assert_eq!(next_stock(i64::MAX, 0).unwrap(), i64::MAX);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// A successful delta never produces a negative stock level
    #[test]
    fn prop_stock_never_negative(
        current in 0i64..1_000_000,
        delta in -1_000_000i64..1_000_000,
    ) {
        match next_stock(current, delta) {
            Ok(new_stock) => prop_assert!(new_stock >= 0),
            Err(StockError::Insufficient { available }) => {
                prop_assert_eq!(available, current);
                prop_assert!(current + delta < 0);
            }
            Err(StockError::Overflow) => {
                // Unreachable within these ranges
                prop_assert!(false);
            }
        }
    }

    /// A successful delta is exact arithmetic
    #[test]
    fn prop_delta_is_exact(
        current in 0i64..1_000_000,
        delta in -1_000_000i64..1_000_000,
    ) {
        if let Ok(new_stock) = next_stock(current, delta) {
            prop_assert_eq!(new_stock, current + delta);
        }
    }

    /// Zero deltas are idempotent regardless of current stock
    #[test]
    fn prop_zero_delta_identity(current in 0i64..1_000_000) {
        prop_assert_eq!(next_stock(current, 0).unwrap(), current);
    }

    /// Applying a sequence of deltas keeps the entry non-negative at
    /// every step; the final level is the sum of applied deltas
    #[test]
    fn prop_delta_sequence_stays_non_negative(
        deltas in prop::collection::vec(-500i64..500, 0..50),
    ) {
        let mut stock = 0i64;
        let mut applied = 0i64;
        for delta in deltas {
            if let Ok(new_stock) = next_stock(stock, delta) {
                prop_assert!(new_stock >= 0);
                stock = new_stock;
                applied += delta;
            }
        }
        prop_assert_eq!(stock, applied);
    }

    /// A deduction that succeeds can always be undone by the matching
    /// addition
    #[test]
    fn prop_deduction_reversible(
        current in 0i64..1_000_000,
        amount in 0i64..1_000_000,
    ) {
        if let Ok(after) = next_stock(current, -amount) {
            prop_assert_eq!(next_stock(after, amount).unwrap(), current);
        }
    }
}
