//! # Item Repository
//!
//! Catalog reads and thin CRUD for inventory items.
//!
//! The settlement flows treat the catalog as read-only context: item
//! prices and names are snapshotted onto sale lines, never joined live.
//! Stock is NOT stored here - it is always derived from the ledger.

use chrono::Utc;
use sqlx::{FromRow, Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shopledger_core::{Category, Item};

/// One row of the low-stock report.
#[derive(Debug, Clone)]
pub struct LowStockRow {
    pub item: Item,
    pub stock: i64,
    pub threshold: i64,
}

/// Repository for item (catalog) database operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Gets an item by its ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT
                id, sku, name, category_id,
                cost_price, sell_price,
                brand, vendor, notes,
                low_stock_threshold, is_active,
                created_at, updated_at
            FROM items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets an item by its SKU (the business identifier).
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Item>> {
        let item = sqlx::query_as::<_, Item>(
            r#"
            SELECT
                id, sku, name, category_id,
                cost_price, sell_price,
                brand, vendor, notes,
                low_stock_threshold, is_active,
                created_at, updated_at
            FROM items
            WHERE sku = ?1
            "#,
        )
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists active items ordered by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<Item>> {
        let items = sqlx::query_as::<_, Item>(
            r#"
            SELECT
                id, sku, name, category_id,
                cost_price, sell_price,
                brand, vendor, notes,
                low_stock_threshold, is_active,
                created_at, updated_at
            FROM items
            WHERE is_active = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Inserts a new item.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, item: &Item) -> DbResult<()> {
        debug!(sku = %item.sku, "Inserting item");

        sqlx::query(
            r#"
            INSERT INTO items (
                id, sku, name, category_id,
                cost_price, sell_price,
                brand, vendor, notes,
                low_stock_threshold, is_active,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6,
                ?7, ?8, ?9,
                ?10, ?11,
                ?12, ?13
            )
            "#,
        )
        .bind(&item.id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.category_id)
        .bind(item.cost_price)
        .bind(item.sell_price)
        .bind(&item.brand)
        .bind(&item.vendor)
        .bind(&item.notes)
        .bind(item.low_stock_threshold)
        .bind(item.is_active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing item (thin catalog CRUD; the settlement flows
    /// never call this).
    pub async fn update(&self, item: &Item) -> DbResult<()> {
        debug!(id = %item.id, "Updating item");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE items SET
                sku = ?2,
                name = ?3,
                category_id = ?4,
                cost_price = ?5,
                sell_price = ?6,
                brand = ?7,
                vendor = ?8,
                notes = ?9,
                low_stock_threshold = ?10,
                is_active = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.category_id)
        .bind(item.cost_price)
        .bind(item.sell_price)
        .bind(&item.brand)
        .bind(&item.vendor)
        .bind(&item.notes)
        .bind(item.low_stock_threshold)
        .bind(item.is_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Item", &item.id));
        }

        Ok(())
    }

    /// Lists active items at or below their effective low-stock threshold.
    ///
    /// ## How It Works
    /// 1. One aggregated query derives every active item's stock from the
    ///    ledger (LEFT JOIN so movement-less items count as zero)
    /// 2. The threshold filter runs in Rust because the threshold is
    ///    per-item (nullable, falling back to `global_default`)
    ///
    /// Out-of-stock items (stock <= 0) are always included: they sit at or
    /// below any non-negative threshold.
    pub async fn low_stock(&self, global_default: i64) -> DbResult<Vec<LowStockRow>> {
        let rows = sqlx::query(
            r#"
            SELECT
                i.id, i.sku, i.name, i.category_id,
                i.cost_price, i.sell_price,
                i.brand, i.vendor, i.notes,
                i.low_stock_threshold, i.is_active,
                i.created_at, i.updated_at,
                COALESCE(SUM(m.quantity_delta), 0) AS stock
            FROM items i
            LEFT JOIN stock_movements m ON m.item_id = i.id
            WHERE i.is_active = 1
            GROUP BY i.id
            ORDER BY i.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut low = Vec::new();
        for row in rows {
            let stock: i64 = row.try_get("stock")?;
            let item = Item::from_row(&row)?;
            let threshold = item.effective_threshold(global_default);
            if stock <= threshold {
                low.push(LowStockRow {
                    item,
                    stock,
                    threshold,
                });
            }
        }

        debug!(count = low.len(), "Low stock report computed");
        Ok(low)
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------
    // Thin grouping for items. A category cannot be deleted while items
    // reference it (RESTRICT in the schema).

    /// Inserts a new category. Names are unique.
    pub async fn insert_category(&self, category: &Category) -> DbResult<()> {
        debug!(name = %category.name, "Inserting category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, is_active)
            VALUES (?1, ?2, ?3)
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(category.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists active categories ordered by name.
    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, is_active
            FROM categories
            WHERE is_active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }
}

/// Helper to generate a new item ID.
pub fn generate_item_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use shopledger_core::Money;

    fn sample_item(sku: &str, category_id: Option<String>) -> Item {
        let now = Utc::now();
        Item {
            id: generate_item_id(),
            sku: sku.to_string(),
            name: format!("{sku} item"),
            category_id,
            cost_price: Money::from_cents(100),
            sell_price: Money::from_cents(250),
            brand: String::new(),
            vendor: String::new(),
            notes: String::new(),
            low_stock_threshold: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup_by_sku() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let items = db.items();

        items.insert(&sample_item("COLA-330", None)).await.unwrap();

        let found = items.get_by_sku("COLA-330").await.unwrap().unwrap();
        assert_eq!(found.name, "COLA-330 item");
        assert!(items.get_by_sku("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_unique_violation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let items = db.items();

        items.insert(&sample_item("COLA-330", None)).await.unwrap();
        let err = items.insert(&sample_item("COLA-330", None)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_categories_group_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let items = db.items();

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: "Drinks".to_string(),
            is_active: true,
        };
        items.insert_category(&category).await.unwrap();
        items
            .insert(&sample_item("COLA-330", Some(category.id.clone())))
            .await
            .unwrap();

        let listed = items.list_categories().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Drinks");

        // Unknown category reference is a foreign key violation.
        let err = items
            .insert(&sample_item("FANTA-330", Some("no-such-category".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_update_missing_item_is_not_found() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.items().update(&sample_item("GHOST-1", None)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
