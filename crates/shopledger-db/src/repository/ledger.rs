//! # Stock Ledger Repository
//!
//! The append-only log of stock movements.
//!
//! ## The Ledger Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  current_stock(item) == SUM(quantity_delta) over its movements  │
//! │                                                                 │
//! │  RESTOCK  +20   ──┐                                             │
//! │  SALE      -3     ├──► stock = 20 - 3 - 2 + 1 = 16              │
//! │  SALE      -2     │                                             │
//! │  RETURN    +1   ──┘                                             │
//! │                                                                 │
//! │  Movements are NEVER updated or deleted. Corrections are made   │
//! │  by appending an offsetting ADJUSTMENT, so the audit history    │
//! │  stays complete and edits stay reversible.                      │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Derived-as-query beats cached counters: a counter can drift out of
//! sync; a sum over an append-only log cannot.

use std::collections::HashMap;

use sqlx::{Row, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use shopledger_core::validation::validate_movement_delta;
use shopledger_core::StockMovement;

/// Repository for the append-only stock ledger.
///
/// Exposes reads and single-movement appends. Movements tied to a sale
/// submission are written by the settlement engine inside its own
/// transaction; this repository never exposes update or delete.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Derives an item's current stock by summing its movement deltas.
    /// An item with no movements has stock 0.
    pub async fn current_stock(&self, item_id: &str) -> DbResult<i64> {
        let stock: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity_delta), 0)
            FROM stock_movements
            WHERE item_id = ?1
            "#,
        )
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(stock)
    }

    /// Derives current stock for many items in one aggregated query.
    ///
    /// Items without movements are absent from the map; callers treat a
    /// missing entry as zero. Used by reconciliation to avoid one query
    /// per demanded item.
    pub async fn batch_current_stock(&self, item_ids: &[String]) -> DbResult<HashMap<String, i64>> {
        sum_movement_deltas(&self.pool, item_ids.iter().map(String::as_str)).await
    }

    /// Appends a movement to the ledger.
    ///
    /// A zero delta is rejected here (the schema's CHECK constraint backs
    /// that up). Once written the movement is immutable.
    pub async fn append(&self, movement: &StockMovement) -> DbResult<()> {
        validate_movement_delta(movement.quantity_delta)?;

        debug!(
            item_id = %movement.item_id,
            kind = ?movement.kind,
            delta = %movement.quantity_delta,
            "Appending stock movement"
        );

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, item_id, kind, quantity_delta, note,
                sale_id, created_at, created_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.item_id)
        .bind(movement.kind)
        .bind(movement.quantity_delta)
        .bind(&movement.note)
        .bind(&movement.sale_id)
        .bind(movement.created_at)
        .bind(&movement.created_by)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists an item's movements, newest first.
    pub async fn movements_for_item(
        &self,
        item_id: &str,
        limit: u32,
    ) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT
                id, item_id, kind, quantity_delta, note,
                sale_id, created_at, created_by
            FROM stock_movements
            WHERE item_id = ?1
            ORDER BY rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(item_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Lists the movements recorded for a sale (via the soft reference) in
    /// insertion order. Useful for auditing what a settlement did.
    pub async fn movements_for_sale(&self, sale_id: &str) -> DbResult<Vec<StockMovement>> {
        let movements = sqlx::query_as::<_, StockMovement>(
            r#"
            SELECT
                id, item_id, kind, quantity_delta, note,
                sale_id, created_at, created_by
            FROM stock_movements
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }
}

/// Sums `quantity_delta` per item over the given ids in one `GROUP BY`
/// query. Generic over the executor so it serves both pool reads (the
/// repository above) and in-transaction reads (the settlement engine's
/// reconciliation, on its write-locked connection).
///
/// Items without movements are absent from the result; a missing entry
/// means zero.
pub(crate) async fn sum_movement_deltas<'e, 'a, E>(
    executor: E,
    item_ids: impl IntoIterator<Item = &'a str>,
) -> DbResult<HashMap<String, i64>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let mut ids = item_ids.into_iter().peekable();
    if ids.peek().is_none() {
        return Ok(HashMap::new());
    }

    let mut builder = sqlx::QueryBuilder::new(
        "SELECT item_id, COALESCE(SUM(quantity_delta), 0) AS stock \
         FROM stock_movements WHERE item_id IN (",
    );
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.to_string());
    }
    builder.push(") GROUP BY item_id");

    let rows = builder.build().fetch_all(executor).await?;

    let mut stock_by_item = HashMap::with_capacity(rows.len());
    for row in rows {
        let item_id: String = row.try_get("item_id")?;
        let stock: i64 = row.try_get("stock")?;
        stock_by_item.insert(item_id, stock);
    }

    Ok(stock_by_item)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use shopledger_core::{Item, Money, MovementKind};
    use uuid::Uuid;

    async fn seed_item(db: &Database, sku: &str) -> Item {
        let now = Utc::now();
        let item = Item {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            name: format!("{sku} item"),
            category_id: None,
            cost_price: Money::from_cents(100),
            sell_price: Money::from_cents(250),
            brand: String::new(),
            vendor: String::new(),
            notes: String::new(),
            low_stock_threshold: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        db.items().insert(&item).await.unwrap();
        item
    }

    fn movement(item_id: &str, kind: MovementKind, delta: i64, note: &str) -> StockMovement {
        StockMovement {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            kind,
            quantity_delta: delta,
            note: note.to_string(),
            sale_id: None,
            created_at: Utc::now(),
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_batch_current_stock_sums_per_item() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger();
        let a = seed_item(&db, "A-1").await;
        let b = seed_item(&db, "B-1").await;

        ledger
            .append(&movement(&a.id, MovementKind::Restock, 10, ""))
            .await
            .unwrap();
        ledger
            .append(&movement(&a.id, MovementKind::Adjustment, -4, ""))
            .await
            .unwrap();

        let ids = vec![a.id.clone(), b.id.clone(), "ghost".to_string()];
        let stock = ledger.batch_current_stock(&ids).await.unwrap();

        // Only items with movements appear; missing means zero.
        assert_eq!(stock.get(&a.id), Some(&6));
        assert_eq!(stock.get(&b.id), None);
        assert_eq!(stock.get("ghost"), None);

        assert!(ledger.batch_current_stock(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_movements_for_item_newest_first_with_limit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let ledger = db.ledger();
        let item = seed_item(&db, "HIST-1").await;

        for (delta, note) in [(10, "first"), (-2, "second"), (1, "third")] {
            ledger
                .append(&movement(&item.id, MovementKind::Adjustment, delta, note))
                .await
                .unwrap();
        }

        let recent = ledger.movements_for_item(&item.id, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].note, "third");
        assert_eq!(recent[1].note, "second");
    }

    #[tokio::test]
    async fn test_append_rejects_zero_delta() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let item = seed_item(&db, "ZERO-1").await;

        let err = db
            .ledger()
            .append(&movement(&item.id, MovementKind::Adjustment, 0, ""))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidMovement(_)));
        assert_eq!(db.ledger().current_stock(&item.id).await.unwrap(), 0);
    }
}
