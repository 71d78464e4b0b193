//! # Domain Types
//!
//! Core domain types used throughout Shopledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Domain Types                              │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐    │
//! │  │    Item      │   │    Sale      │   │  StockMovement   │    │
//! │  │ ──────────── │   │ ──────────── │   │ ──────────────── │    │
//! │  │ id (UUID)    │   │ id (UUID)    │   │ id (UUID)        │    │
//! │  │ sku (unique) │   │ status       │   │ kind             │    │
//! │  │ sell_price   │   │ total        │   │ quantity_delta   │    │
//! │  └──────────────┘   └──────────────┘   └──────────────────┘    │
//! │                                                                 │
//! │  Sale owns SaleItem* and Payment*.                             │
//! │  StockMovement references Sale softly (plain id, no FK).       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists (item `sku`) - human-readable
//!
//! ## Snapshot Pattern
//! `SaleItem` freezes the unit price and line total at sale time. Catalog
//! price changes never rewrite the history of existing sales.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Catalog
// =============================================================================

/// A product category. Thin grouping for items; protected from deletion
/// while any item references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub id: String,
    /// Unique display name.
    pub name: String,
    pub is_active: bool,
}

/// An inventory item (catalog entry).
///
/// The core flows treat items as read-only context: prices and names are
/// snapshotted onto sale lines, and stock is derived from the ledger, so
/// nothing here is mutated when a sale settles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - unique business identifier.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Optional category reference.
    pub category_id: Option<String>,

    /// Cost price in cents (what the store pays).
    pub cost_price: Money,

    /// Sell price in cents. Used as the default line price when a sale
    /// submission does not carry an explicit unit price.
    pub sell_price: Money,

    /// Optional metadata.
    pub brand: String,
    pub vendor: String,
    pub notes: String,

    /// Per-item low stock threshold. `None` means "use the global default".
    pub low_stock_threshold: Option<i64>,

    /// Whether the item is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    /// Returns the low-stock threshold in effect for this item.
    ///
    /// The per-item threshold wins when set; otherwise the supplied global
    /// default applies. The default is passed in explicitly - it is process
    /// configuration, not domain state.
    #[inline]
    pub fn effective_threshold(&self, global_default: i64) -> i64 {
        self.low_stock_threshold.unwrap_or(global_default)
    }

    /// Low-stock classification: stock at or below the effective threshold.
    ///
    /// Out-of-stock items (stock <= 0) are a subset of low-stock items.
    #[inline]
    pub fn is_low_stock(&self, current_stock: i64, global_default: i64) -> bool {
        current_stock <= self.effective_threshold(global_default)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer. Sales reference customers with SET NULL semantics: deleting
/// a customer never deletes their sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub instagram_handle: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Ledger
// =============================================================================

/// The kind of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MovementKind {
    /// Stock received from a supplier.
    Restock,
    /// Stock removed by a sale. Reserved for the settlement engine;
    /// manual entry points reject it.
    Sale,
    /// Manual correction, including sale-edit reversals.
    Adjustment,
    /// Stock returned by a customer.
    Return,
}

/// One append-only entry in the stock ledger.
///
/// ## Invariant
/// An item's current stock is the sum of its movements' `quantity_delta`
/// values - always computed, never cached, so it can never drift.
///
/// Movements are immutable once created. Corrections are made by appending
/// an offsetting `Adjustment`, preserving the full audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StockMovement {
    pub id: String,
    pub item_id: String,
    pub kind: MovementKind,
    /// Signed quantity change: positive adds stock, negative removes stock.
    /// Never zero.
    pub quantity_delta: i64,
    pub note: String,
    /// Soft reference to the sale that caused this movement. A plain id
    /// value, not a foreign key, so the ledger's lifecycle stays decoupled
    /// from the sale's.
    pub sale_id: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Optional actor reference.
    pub created_by: Option<String>,
}

// =============================================================================
// Sale Status
// =============================================================================

/// Payment status of a sale.
///
/// Derived from `total` vs. the sum of payments but persisted for fast
/// querying; refreshed on every total or payment change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaleStatus {
    /// No payments, or a zero-total sale.
    Unpaid,
    /// Partially paid: 0 < paid < total.
    Partial,
    /// Fully paid: paid >= total and total > 0.
    Paid,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Unpaid
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale transaction with stored totals.
///
/// `subtotal` and `total` are snapshots computed from the sale's own line
/// snapshots - never recomputed from live catalog prices after the fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    /// Nullable: the customer may be deleted without deleting the sale.
    pub customer_id: Option<String>,
    pub notes: String,
    pub subtotal: Money,
    pub total: Money,
    pub status: SaleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern to freeze pricing at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Items cannot be deleted while referenced by a sale line.
    pub item_id: String,
    /// Quantity sold (always positive).
    pub quantity: i64,
    /// Unit price at time of sale (frozen).
    pub unit_price: Money,
    /// Stored snapshot: unit_price x quantity, recomputed whenever the
    /// line is saved.
    pub line_total: Money,
}

// =============================================================================
// Payment
// =============================================================================

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Other,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::Cash
    }
}

/// A payment towards a sale. Append-only in the core flow: there is no
/// edit or delete path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Payment {
    pub id: String,
    pub sale_id: String,
    /// Amount paid in cents. Always positive.
    pub amount: Money,
    pub method: PaymentMethod,
    pub note: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Submission Inputs
// =============================================================================

/// One line of a sale submission: "this item, this many, at this price".
///
/// `unit_price` is optional: when omitted, the item's current sell price is
/// snapshotted as the default. An explicit price is never overridden.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleLineInput {
    pub item_id: String,
    pub quantity: i64,
    pub unit_price: Option<Money>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item_with_threshold(threshold: Option<i64>) -> Item {
        Item {
            id: "item-1".to_string(),
            sku: "WIDGET-1".to_string(),
            name: "Widget".to_string(),
            category_id: None,
            cost_price: Money::from_cents(100),
            sell_price: Money::from_cents(250),
            brand: String::new(),
            vendor: String::new(),
            notes: String::new(),
            low_stock_threshold: threshold,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_effective_threshold_prefers_item_override() {
        let item = item_with_threshold(Some(10));
        assert_eq!(item.effective_threshold(5), 10);
    }

    #[test]
    fn test_effective_threshold_falls_back_to_default() {
        let item = item_with_threshold(None);
        assert_eq!(item.effective_threshold(5), 5);
    }

    #[test]
    fn test_low_stock_boundary_is_inclusive() {
        let item = item_with_threshold(Some(5));
        assert!(item.is_low_stock(5, 0));
        assert!(item.is_low_stock(0, 0));
        assert!(item.is_low_stock(-2, 0)); // out of stock is low stock
        assert!(!item.is_low_stock(6, 0));
    }

    #[test]
    fn test_sale_status_default() {
        assert_eq!(SaleStatus::default(), SaleStatus::Unpaid);
    }
}
