//! # Sale Repository
//!
//! Read access to sales, their line snapshots, and payments.
//!
//! ## Division of Labor
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  SaleRepository (this file)     SettlementEngine (settlement)   │
//! │  ─────────────────────────      ───────────────────────────     │
//! │  • get_by_id / list_recent      • create_sale (atomic)          │
//! │  • get_items / get_payments     • edit_sale   (atomic)          │
//! │  • total_paid aggregation       • record_payment (atomic)       │
//! │                                                                 │
//! │  Reads here run against committed state; every multi-statement  │
//! │  write lives in one settlement transaction.                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;

use crate::error::DbResult;
use shopledger_core::{Money, Payment, Sale, SaleItem, SaleStatus};

/// Repository for sale database reads.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT
                id, customer_id, notes, subtotal, total, status,
                created_at, updated_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Lists recent sales, newest first, optionally filtered by status.
    pub async fn list_recent(
        &self,
        status: Option<SaleStatus>,
        limit: u32,
    ) -> DbResult<Vec<Sale>> {
        let sales = match status {
            Some(status) => {
                sqlx::query_as::<_, Sale>(
                    r#"
                    SELECT
                        id, customer_id, notes, subtotal, total, status,
                        created_at, updated_at
                    FROM sales
                    WHERE status = ?1
                    ORDER BY created_at DESC
                    LIMIT ?2
                    "#,
                )
                .bind(status)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Sale>(
                    r#"
                    SELECT
                        id, customer_id, notes, subtotal, total, status,
                        created_at, updated_at
                    FROM sales
                    ORDER BY created_at DESC
                    LIMIT ?1
                    "#,
                )
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(sales)
    }

    /// Gets all line snapshots for a sale.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT
                id, sale_id, item_id, quantity, unit_price, line_total
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets all payments for a sale, oldest first.
    pub async fn get_payments(&self, sale_id: &str) -> DbResult<Vec<Payment>> {
        let payments = sqlx::query_as::<_, Payment>(
            r#"
            SELECT
                id, sale_id, amount, method, note, created_at
            FROM payments
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(payments)
    }

    /// Gets the total amount paid for a sale.
    pub async fn total_paid(&self, sale_id: &str) -> DbResult<Money> {
        let total: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT SUM(amount)
            FROM payments
            WHERE sale_id = ?1
            "#,
        )
        .bind(sale_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Money::from_cents(total.unwrap_or(0)))
    }
}
