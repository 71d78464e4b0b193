//! # Sale Totals & Status
//!
//! Pure math for the sale aggregate: line totals, subtotal/total, payment
//! status, and balance.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  lines: [(unit_price, quantity), ...]                           │
//! │       │                                                         │
//! │       ▼                                                         │
//! │  recompute_lines()  ← line_total = unit_price x quantity        │
//! │       │                subtotal  = Σ line_total                 │
//! │       │                total     = subtotal (no tax/discount    │
//! │       │                            yet - extension point)       │
//! │       ▼                                                         │
//! │  refresh_status(total, paid)                                    │
//! │       ├── paid >= total && total > 0  → PAID                    │
//! │       ├── 0 < paid < total            → PARTIAL                 │
//! │       └── otherwise                   → UNPAID                  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All functions here are deterministic and idempotent: recomputing an
//! unchanged sale yields identical snapshots, with no rounding drift
//! (integer cents arithmetic is exact).

use crate::money::Money;
use crate::types::{SaleItem, SaleStatus};

/// Computed sale totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub total: Money,
}

/// Computes one line's total from its frozen unit price.
#[inline]
pub fn line_total(unit_price: Money, quantity: i64) -> Money {
    unit_price.multiply_quantity(quantity)
}

/// Recomputes every line's stored total and returns the sale totals.
///
/// `total` is currently identical to `subtotal`; discounts/tax/shipping
/// would hook in here later without touching the stored line snapshots.
pub fn recompute_lines(lines: &mut [SaleItem]) -> SaleTotals {
    let mut subtotal = Money::zero();

    for line in lines.iter_mut() {
        line.line_total = line_total(line.unit_price, line.quantity);
        subtotal += line.line_total;
    }

    SaleTotals {
        subtotal,
        total: subtotal,
    }
}

/// Derives the payment status from the stored total and the sum of
/// payments.
///
/// A zero-total sale is UNPAID even with nothing owed: a giveaway never
/// counts as PAID (see DESIGN.md open questions).
pub fn refresh_status(total: Money, paid: Money) -> SaleStatus {
    if paid >= total && total.is_positive() {
        SaleStatus::Paid
    } else if paid.is_positive() && paid < total {
        SaleStatus::Partial
    } else {
        SaleStatus::Unpaid
    }
}

/// Outstanding balance: `total - paid`. Negative when overpaid, which is
/// representable and not an error.
#[inline]
pub fn balance(total: Money, paid: Money) -> Money {
    total - paid
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sale_line(quantity: i64, unit_price_cents: i64) -> SaleItem {
        SaleItem {
            id: "line".to_string(),
            sale_id: "sale".to_string(),
            item_id: "item".to_string(),
            quantity,
            unit_price: Money::from_cents(unit_price_cents),
            line_total: Money::zero(),
        }
    }

    #[test]
    fn test_recompute_lines() {
        let mut lines = vec![sale_line(2, 500), sale_line(3, 199)];

        let totals = recompute_lines(&mut lines);

        assert_eq!(lines[0].line_total.cents(), 1000);
        assert_eq!(lines[1].line_total.cents(), 597);
        assert_eq!(totals.subtotal.cents(), 1597);
        assert_eq!(totals.total.cents(), 1597);
    }

    #[test]
    fn test_recompute_is_idempotent() {
        let mut lines = vec![sale_line(7, 333), sale_line(1, 19999)];

        let first = recompute_lines(&mut lines);
        let snapshot: Vec<i64> = lines.iter().map(|l| l.line_total.cents()).collect();

        let second = recompute_lines(&mut lines);
        let again: Vec<i64> = lines.iter().map(|l| l.line_total.cents()).collect();

        assert_eq!(first, second);
        assert_eq!(snapshot, again);
    }

    #[test]
    fn test_empty_sale_totals_are_zero() {
        let totals = recompute_lines(&mut []);
        assert!(totals.subtotal.is_zero());
        assert!(totals.total.is_zero());
    }

    #[test]
    fn test_status_matrix() {
        let total = Money::from_cents(10000);

        assert_eq!(refresh_status(total, Money::from_cents(0)), SaleStatus::Unpaid);
        assert_eq!(refresh_status(total, Money::from_cents(4000)), SaleStatus::Partial);
        assert_eq!(refresh_status(total, Money::from_cents(10000)), SaleStatus::Paid);
        assert_eq!(refresh_status(total, Money::from_cents(15000)), SaleStatus::Paid);
    }

    #[test]
    fn test_zero_total_sale_is_unpaid() {
        // Policy, not math: a free sale is not PAID
        let zero = Money::zero();
        assert_eq!(refresh_status(zero, zero), SaleStatus::Unpaid);
        // Even an (erroneous but conceivable) payment on a zero-total sale
        // leaves it out of PAID because total > 0 fails
        assert_eq!(
            refresh_status(zero, Money::from_cents(100)),
            SaleStatus::Unpaid
        );
    }

    #[test]
    fn test_overpaid_balance_is_negative() {
        let b = balance(Money::from_cents(10000), Money::from_cents(15000));
        assert_eq!(b.cents(), -5000);
    }
}
