//! # Validation Module
//!
//! Input validation for sale submissions, payments, and manual stock
//! movements.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Validation Layers                           │
//! │                                                                 │
//! │  Layer 1: Caller (UI / API layer, out of scope)                 │
//! │  └── Basic format checks, immediate user feedback               │
//! │           │                                                     │
//! │           ▼                                                     │
//! │  Layer 2: THIS MODULE - business rule validation                │
//! │  └── Runs BEFORE any persistence; a failed check means          │
//! │      nothing was written                                        │
//! │           │                                                     │
//! │           ▼                                                     │
//! │  Layer 3: Database (SQLite)                                     │
//! │  └── NOT NULL / UNIQUE / foreign key constraints                │
//! │                                                                 │
//! │  Defense in depth: multiple layers catch different errors       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::{MovementKind, SaleLineInput};
use crate::Money;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Sale Line Validators
// =============================================================================

/// Validates a single sale line intent.
///
/// ## Rules
/// - Item reference must be present
/// - Quantity must be positive (> 0)
/// - An explicit unit price, when given, must not be negative
pub fn validate_sale_line(line: &SaleLineInput) -> ValidationResult<()> {
    if line.item_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "item_id".to_string(),
        });
    }

    if line.quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if let Some(price) = line.unit_price {
        if price.is_negative() {
            return Err(ValidationError::InvalidFormat {
                field: "unit_price".to_string(),
                reason: "must not be negative".to_string(),
            });
        }
    }

    Ok(())
}

/// Validates every line of a sale submission, failing on the first bad one.
/// A sale needs at least one line.
pub fn validate_sale_lines(lines: &[SaleLineInput]) -> ValidationResult<()> {
    if lines.is_empty() {
        return Err(ValidationError::Required {
            field: "lines".to_string(),
        });
    }
    for line in lines {
        validate_sale_line(line)?;
    }
    Ok(())
}

// =============================================================================
// Payment Validators
// =============================================================================

/// Validates a payment amount.
///
/// ## Rules
/// - Must be positive (> 0); zero or negative payments are rejected.
///   Overpayment is allowed - the balance simply goes negative.
pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Movement Validators
// =============================================================================

/// Validates a manual stock movement before it is appended to the ledger.
///
/// ## Rules
/// - Delta must not be zero (a zero movement has no meaning and would
///   pollute the audit trail)
/// - The SALE kind is reserved for the settlement engine; manual entry
///   points record RESTOCK, ADJUSTMENT, or RETURN
pub fn validate_manual_movement(kind: MovementKind, delta: i64) -> ValidationResult<()> {
    validate_movement_delta(delta)?;

    if kind == MovementKind::Sale {
        return Err(ValidationError::ReservedMovementKind);
    }

    Ok(())
}

/// Validates a movement quantity delta. Applies to every ledger append,
/// including those made by the settlement engine.
pub fn validate_movement_delta(delta: i64) -> ValidationResult<()> {
    if delta == 0 {
        return Err(ValidationError::ZeroMovementDelta);
    }

    Ok(())
}

// =============================================================================
// Note Validators
// =============================================================================

/// Validates a free-text note attached to a movement or payment.
///
/// ## Rules
/// - Maximum 255 characters (mirrors the storage column width)
pub fn validate_note(note: &str) -> ValidationResult<()> {
    if note.len() > 255 {
        return Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: 255,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(item_id: &str, quantity: i64, unit_price: Option<i64>) -> SaleLineInput {
        SaleLineInput {
            item_id: item_id.to_string(),
            quantity,
            unit_price: unit_price.map(Money::from_cents),
        }
    }

    #[test]
    fn test_validate_sale_line() {
        assert!(validate_sale_line(&line("item-1", 2, None)).is_ok());
        assert!(validate_sale_line(&line("item-1", 2, Some(0))).is_ok());

        assert!(validate_sale_line(&line("", 2, None)).is_err());
        assert!(validate_sale_line(&line("item-1", 0, None)).is_err());
        assert!(validate_sale_line(&line("item-1", -3, None)).is_err());
        assert!(validate_sale_line(&line("item-1", 1, Some(-100))).is_err());
    }

    #[test]
    fn test_validate_sale_lines_fails_on_any_bad_line() {
        let lines = vec![line("item-1", 2, None), line("item-2", 0, None)];
        assert!(validate_sale_lines(&lines).is_err());
    }

    #[test]
    fn test_validate_sale_lines_rejects_empty_submission() {
        assert!(validate_sale_lines(&[]).is_err());
    }

    #[test]
    fn test_validate_payment_amount() {
        assert!(validate_payment_amount(Money::from_cents(1)).is_ok());
        assert!(validate_payment_amount(Money::from_cents(0)).is_err());
        assert!(validate_payment_amount(Money::from_cents(-500)).is_err());
    }

    #[test]
    fn test_validate_manual_movement() {
        assert!(validate_manual_movement(MovementKind::Restock, 10).is_ok());
        assert!(validate_manual_movement(MovementKind::Adjustment, -4).is_ok());
        assert!(validate_manual_movement(MovementKind::Return, 1).is_ok());

        // Zero delta is always rejected
        assert!(matches!(
            validate_manual_movement(MovementKind::Restock, 0),
            Err(ValidationError::ZeroMovementDelta)
        ));

        // SALE movements only come from the settlement engine
        assert!(matches!(
            validate_manual_movement(MovementKind::Sale, -1),
            Err(ValidationError::ReservedMovementKind)
        ));
    }

    #[test]
    fn test_validate_note() {
        assert!(validate_note("restock from vendor").is_ok());
        assert!(validate_note(&"x".repeat(255)).is_ok());
        assert!(validate_note(&"x".repeat(256)).is_err());
    }
}
