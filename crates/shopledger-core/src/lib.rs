//! # shopledger-core: Pure Business Logic for Shopledger
//!
//! This crate is the **heart** of Shopledger, a small-business point-of-sale
//! and inventory tracker. It contains all business logic as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Shopledger Architecture                       │
//! │                                                                 │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │        Caller (CLI / HTTP / UI - out of scope)            │  │
//! │  └────────────────────────────┬──────────────────────────────┘  │
//! │                               │                                 │
//! │  ┌────────────────────────────▼──────────────────────────────┐  │
//! │  │            ★ shopledger-core (THIS CRATE) ★               │  │
//! │  │                                                           │  │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌───────────────┐  │  │
//! │  │  │  types  │ │  money  │ │  totals  │ │   reconcile   │  │  │
//! │  │  │  Item   │ │  Money  │ │  status  │ │ demand/give-  │  │  │
//! │  │  │  Sale   │ │  cents  │ │  balance │ │ back checking │  │  │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └───────────────┘  │  │
//! │  │                                                           │  │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS       │  │
//! │  └────────────────────────────┬──────────────────────────────┘  │
//! │                               │                                 │
//! │  ┌────────────────────────────▼──────────────────────────────┐  │
//! │  │              shopledger-db (Database Layer)               │  │
//! │  │     SQLite queries, stock ledger, settlement engine       │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, Sale, StockMovement, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//! - [`totals`] - Sale totals, payment status, balance
//! - [`reconcile`] - Stock demand/giveback reconciliation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input =
//!    same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid
//!    float errors
//! 4. **Derived Stock**: Current stock is the sum of ledger deltas, never a
//!    mutable counter

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod reconcile;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use shopledger_core::Money` instead of
// `use shopledger_core::money::Money`

pub use error::{CoreError, CoreResult, StockViolation, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default low-stock threshold when an item doesn't define its own.
///
/// ## Why a constant?
/// This is the out-of-the-box global default. It is always passed into
/// threshold/classification calls explicitly, so deployments can override
/// it with configuration without the core reading ambient state.
pub const DEFAULT_LOW_STOCK_THRESHOLD: i64 = 5;
