//! # Error Types
//!
//! Domain-specific error types for shopledger-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Error Types                              │
//! │                                                                 │
//! │  shopledger-core errors (this file)                             │
//! │  ├── CoreError        - Business rule violations                │
//! │  │     └── InsufficientStock carries the FULL violation list    │
//! │  └── ValidationError  - Malformed input, caught pre-persistence │
//! │                                                                 │
//! │  shopledger-db errors (separate crate)                          │
//! │  ├── DbError          - Storage failures                        │
//! │  └── SettlementError  - What callers of the engine see          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (SKU, amounts, ids)
//! 3. Errors are enum variants, never String
//! 4. A failed stock check reports every shortfall at once, so the
//!    caller can present all problems in a single round trip

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Stock Violation
// =============================================================================

/// One item that would be overdrawn by a sale submission.
///
/// Carries enough detail (sku, name, amounts) for the caller to act on
/// without another lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockViolation {
    pub sku: String,
    pub name: String,
    /// Stock available to this submission (committed stock plus any
    /// giveback from lines being reversed).
    pub available: i64,
    /// Quantity the submission asked for.
    pub requested: i64,
}

impl std::fmt::Display for StockViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): available {}, requested {}",
            self.name, self.sku, self.available, self.requested
        )
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations. They are all recoverable:
/// the submission that raised them is rolled back in full and the caller
/// may correct the input and retry.
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more items would go negative.
    ///
    /// Validation is atomic: either every line fits within derived stock
    /// (plus givebacks on edit) or the whole list of shortfalls is
    /// returned and nothing is applied.
    #[error("insufficient stock for {} item(s)", violations.len())]
    InsufficientStock { violations: Vec<StockViolation> },

    /// Validation error (wraps ValidationError).
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when a submission doesn't meet requirements. Raised before
/// any persistence happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// A stock movement with a zero delta would be meaningless noise in
    /// the ledger.
    #[error("movement quantity delta must not be zero")]
    ZeroMovementDelta,

    /// The SALE movement kind is reserved for the settlement engine.
    #[error("movement kind SALE cannot be recorded manually")]
    ReservedMovementKind,

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
