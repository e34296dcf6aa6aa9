//! Validation utilities for the Pharmacy Inventory Management System

use chrono::NaiveDate;
use rust_decimal::Decimal;

// ============================================================================
// Inventory Validations
// ============================================================================

/// Validate a requested order/return quantity
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be positive");
    }
    Ok(())
}

/// Validate a unit price
pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    Ok(())
}

/// Validate a batch lot label (1-40 chars, alphanumeric plus `-` and `/`)
pub fn validate_lot_label(label: &str) -> Result<(), &'static str> {
    if label.is_empty() {
        return Err("Lot label cannot be empty");
    }
    if label.len() > 40 {
        return Err("Lot label must be at most 40 characters");
    }
    if !label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/')
    {
        return Err("Lot label must be alphanumeric with optional '-' or '/'");
    }
    Ok(())
}

/// Validate that an expiry date is usable for newly received stock
pub fn validate_expiry_date(expiry: NaiveDate, today: NaiveDate) -> Result<(), &'static str> {
    if expiry <= today {
        return Err("Expiry date must be in the future");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate a display name for master data
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Name cannot be empty");
    }
    if trimmed.len() > 120 {
        return Err("Name must be at most 120 characters");
    }
    Ok(())
}

/// Validate a phone number (7-15 digits, optional separators)
pub fn validate_phone(phone: &str) -> Result<(), &'static str> {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 7 || digits.len() > 15 {
        return Err("Invalid phone number");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(500).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-5).is_err());
    }

    #[test]
    fn test_validate_unit_price() {
        assert!(validate_unit_price(Decimal::ZERO).is_ok());
        assert!(validate_unit_price(Decimal::new(1250, 2)).is_ok());
        assert!(validate_unit_price(Decimal::new(-1, 0)).is_err());
    }

    #[test]
    fn test_validate_lot_label_valid() {
        assert!(validate_lot_label("LOT-2026-001").is_ok());
        assert!(validate_lot_label("A1").is_ok());
        assert!(validate_lot_label("B12/07").is_ok());
    }

    #[test]
    fn test_validate_lot_label_invalid() {
        assert!(validate_lot_label("").is_err());
        assert!(validate_lot_label("lot label with spaces").is_err());
        assert!(validate_lot_label(&"X".repeat(41)).is_err());
    }

    #[test]
    fn test_validate_expiry_date() {
        let today = date(2026, 1, 15);
        assert!(validate_expiry_date(date(2026, 1, 16), today).is_ok());
        assert!(validate_expiry_date(date(2026, 1, 15), today).is_err());
        assert!(validate_expiry_date(date(2025, 12, 31), today).is_err());
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Paracetamol 500mg").is_ok());
        assert!(validate_name("  ").is_err());
        assert!(validate_name(&"N".repeat(121)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("0812345678").is_ok());
        assert!(validate_phone("081-234-5678").is_ok());
        assert!(validate_phone("+15551234567").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("abcdefg").is_err());
    }
}
