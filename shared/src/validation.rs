//! Validation helpers for the Farm Management Platform
//!
//! Pure checks applied before any database call.

use chrono::NaiveDate;

use crate::models::project::LineItem;
use crate::reconciliation::find_duplicate;

/// Validate that a requested quantity is a positive whole number
pub fn validate_quantity(quantity: i64) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be greater than 0");
    }
    Ok(())
}

/// Validate that a unit of measure is present
pub fn validate_unit(unit: &str) -> Result<(), &'static str> {
    if unit.trim().is_empty() {
        return Err("Unit must not be empty");
    }
    Ok(())
}

/// Validate that a name field is present
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("Name must not be empty");
    }
    Ok(())
}

/// Validate a project date range (end before start is rejected)
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), &'static str> {
    if end < start {
        return Err("End date must not be before start date");
    }
    Ok(())
}

/// Validate a submitted line-item list: positive quantities, non-empty
/// names, no duplicate (type, name) pairs
pub fn validate_line_items(items: &[LineItem]) -> Result<(), String> {
    for item in items {
        validate_name(&item.item_type).map_err(|e| e.to_string())?;
        validate_name(&item.name).map_err(|e| e.to_string())?;
        validate_quantity(item.quantity).map_err(|e| e.to_string())?;
        validate_unit(&item.unit).map_err(|e| e.to_string())?;
    }
    if let Some(dup) = find_duplicate(items) {
        return Err(format!(
            "Duplicate line item: {}/{}",
            dup.item_type, dup.name
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_must_be_positive() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
    }

    #[test]
    fn date_range_rejects_inverted_dates() {
        let start = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert!(validate_date_range(start, end).is_err());
        assert!(validate_date_range(start, start).is_ok());
    }

    #[test]
    fn line_items_reject_duplicates() {
        let items = vec![
            LineItem {
                item_type: "Urea".into(),
                name: "46-0-0".into(),
                quantity: 10,
                unit: "kg".into(),
            },
            LineItem {
                item_type: "Urea".into(),
                name: "46-0-0".into(),
                quantity: 5,
                unit: "kg".into(),
            },
        ];
        assert!(validate_line_items(&items).is_err());
        assert!(validate_line_items(&items[..1]).is_ok());
    }

    #[test]
    fn line_items_reject_blank_fields() {
        let items = vec![LineItem {
            item_type: "".into(),
            name: "46-0-0".into(),
            quantity: 10,
            unit: "kg".into(),
        }];
        assert!(validate_line_items(&items).is_err());
    }
}
