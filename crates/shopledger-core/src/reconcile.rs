//! # Stock Reconciliation
//!
//! Pure math for validating the stock effects of a sale submission against
//! derived current stock, before anything is committed.
//!
//! ## How Edit Validation Works
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Editing a sale re-validates against "what stock would exist    │
//! │  if the old lines were undone first":                           │
//! │                                                                 │
//! │  demand    = per-item sums of the NEW lines                     │
//! │  givebacks = per-item sums of the PRE-EDIT lines                │
//! │                                                                 │
//! │  effective available = current_stock + giveback                 │
//! │                                                                 │
//! │  The ledger is not touched until validation passes; the         │
//! │  giveback is notional until the reversal movements land.        │
//! │                                                                 │
//! │  On create, givebacks is simply empty.                          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Violations are collected across ALL demanded items and returned as one
//! failure, so the caller can present every problem at once.

use std::collections::{BTreeMap, HashMap};

use crate::error::{CoreError, CoreResult, StockViolation};
use crate::types::{Item, SaleItem, SaleLineInput};

/// Per-item quantity map. BTreeMap keeps iteration (and therefore the
/// violation list) in a deterministic order.
pub type QuantityByItem = BTreeMap<String, i64>;

// =============================================================================
// Demand & Giveback
// =============================================================================

/// Sums requested quantities per item across a submission's lines.
///
/// Duplicate rows for the same item accumulate - two lines of 3 widgets
/// demand 6 widgets, not 3.
pub fn projected_demand(lines: &[SaleLineInput]) -> QuantityByItem {
    let mut demand = QuantityByItem::new();
    for line in lines {
        *demand.entry(line.item_id.clone()).or_insert(0) += line.quantity;
    }
    demand
}

/// Sums per-item quantities of a sale's pre-edit lines.
///
/// Used only on edit: these quantities will be restored by the reversal
/// step before new movements apply, so they count as available during
/// validation.
pub fn giveback_map(pre_edit_lines: &[SaleItem]) -> QuantityByItem {
    let mut givebacks = QuantityByItem::new();
    for line in pre_edit_lines {
        *givebacks.entry(line.item_id.clone()).or_insert(0) += line.quantity;
    }
    givebacks
}

// =============================================================================
// Validation
// =============================================================================

/// Validates projected demand against derived stock.
///
/// For each demanded item:
/// `effective = stock + giveback`; if `effective - demand < 0` the item is
/// recorded as a violation. All violations are gathered before failing -
/// nothing is partially applied.
///
/// `stock` holds committed current stock per item (missing entries mean no
/// movements yet, i.e. zero). `catalog` supplies sku/name for violation
/// details; the caller resolves items beforehand, so a missing entry only
/// degrades the message, never the check.
pub fn check_stock(
    demand: &QuantityByItem,
    stock: &HashMap<String, i64>,
    givebacks: &QuantityByItem,
    catalog: &HashMap<String, Item>,
) -> CoreResult<()> {
    let mut violations = Vec::new();

    for (item_id, &requested) in demand {
        let giveback = givebacks.get(item_id).copied().unwrap_or(0);
        let available = stock.get(item_id).copied().unwrap_or(0) + giveback;

        if available - requested < 0 {
            let (sku, name) = match catalog.get(item_id) {
                Some(item) => (item.sku.clone(), item.name.clone()),
                None => (item_id.clone(), item_id.clone()),
            };
            violations.push(StockViolation {
                sku,
                name,
                available,
                requested,
            });
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(CoreError::InsufficientStock { violations })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Money;
    use chrono::Utc;

    fn line(item_id: &str, quantity: i64) -> SaleLineInput {
        SaleLineInput {
            item_id: item_id.to_string(),
            quantity,
            unit_price: None,
        }
    }

    fn sale_item(item_id: &str, quantity: i64) -> SaleItem {
        SaleItem {
            id: format!("line-{item_id}"),
            sale_id: "sale-1".to_string(),
            item_id: item_id.to_string(),
            quantity,
            unit_price: Money::from_cents(100),
            line_total: Money::from_cents(100 * quantity),
        }
    }

    fn catalog_item(id: &str, sku: &str, name: &str) -> Item {
        Item {
            id: id.to_string(),
            sku: sku.to_string(),
            name: name.to_string(),
            category_id: None,
            cost_price: Money::zero(),
            sell_price: Money::from_cents(100),
            brand: String::new(),
            vendor: String::new(),
            notes: String::new(),
            low_stock_threshold: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_projected_demand_accumulates_duplicate_rows() {
        let demand = projected_demand(&[line("a", 3), line("b", 1), line("a", 3)]);
        assert_eq!(demand.get("a"), Some(&6));
        assert_eq!(demand.get("b"), Some(&1));
    }

    #[test]
    fn test_giveback_map_sums_pre_edit_lines() {
        let givebacks = giveback_map(&[sale_item("a", 2), sale_item("a", 1), sale_item("b", 4)]);
        assert_eq!(givebacks.get("a"), Some(&3));
        assert_eq!(givebacks.get("b"), Some(&4));
    }

    #[test]
    fn test_check_stock_passes_when_stock_suffices() {
        let demand = projected_demand(&[line("a", 2)]);
        let stock = HashMap::from([("a".to_string(), 5)]);
        let catalog = HashMap::from([("a".to_string(), catalog_item("a", "SKU-A", "Item A"))]);

        assert!(check_stock(&demand, &stock, &QuantityByItem::new(), &catalog).is_ok());
    }

    #[test]
    fn test_check_stock_exact_fit_passes() {
        let demand = projected_demand(&[line("a", 5)]);
        let stock = HashMap::from([("a".to_string(), 5)]);
        let catalog = HashMap::from([("a".to_string(), catalog_item("a", "SKU-A", "Item A"))]);

        assert!(check_stock(&demand, &stock, &QuantityByItem::new(), &catalog).is_ok());
    }

    #[test]
    fn test_check_stock_collects_all_violations() {
        let demand = projected_demand(&[line("a", 9), line("b", 2), line("c", 1)]);
        let stock = HashMap::from([
            ("a".to_string(), 3),
            ("b".to_string(), 2),
            // "c" has no movements at all -> 0
        ]);
        let catalog = HashMap::from([
            ("a".to_string(), catalog_item("a", "SKU-A", "Item A")),
            ("b".to_string(), catalog_item("b", "SKU-B", "Item B")),
            ("c".to_string(), catalog_item("c", "SKU-C", "Item C")),
        ]);

        let err = check_stock(&demand, &stock, &QuantityByItem::new(), &catalog).unwrap_err();
        match err {
            CoreError::InsufficientStock { violations } => {
                // both shortfalls reported, in deterministic (item id) order
                assert_eq!(violations.len(), 2);
                assert_eq!(violations[0].sku, "SKU-A");
                assert_eq!(violations[0].available, 3);
                assert_eq!(violations[0].requested, 9);
                assert_eq!(violations[1].sku, "SKU-C");
                assert_eq!(violations[1].available, 0);
                assert_eq!(violations[1].requested, 1);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }

    #[test]
    fn test_check_stock_honors_givebacks_on_edit() {
        // Sale originally took 4 of "a"; stock is now 0. Editing down to 3
        // must pass because the reversal gives 4 back first.
        let demand = projected_demand(&[line("a", 3)]);
        let stock = HashMap::from([("a".to_string(), 0)]);
        let givebacks = giveback_map(&[sale_item("a", 4)]);
        let catalog = HashMap::from([("a".to_string(), catalog_item("a", "SKU-A", "Item A"))]);

        assert!(check_stock(&demand, &stock, &givebacks, &catalog).is_ok());

        // Editing UP past stock + giveback still fails
        let demand_up = projected_demand(&[line("a", 5)]);
        assert!(check_stock(&demand_up, &stock, &givebacks, &catalog).is_err());
    }
}
