//! # Settlement Engine
//!
//! Orchestrates the atomic sale create/edit/payment transactions: line
//! snapshots, stock reconciliation against the ledger, totals, and status.
//!
//! ## Submission State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                                                                 │
//! │   DRAFT ──────► VALIDATING ──────► APPLYING ──────► COMMITTED   │
//! │   persist       demand vs.         totals +         all writes  │
//! │   header +      ledger stock       ledger           durable     │
//! │   line          (+ givebacks       movements        together    │
//! │   snapshots     on edit)                                        │
//! │                      │                 │                        │
//! │                      └────────┬────────┘                        │
//! │                               ▼                                 │
//! │                          ROLLED_BACK                            │
//! │                     every write of this                         │
//! │                     submission discarded                        │
//! │                                                                 │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The whole path runs inside ONE SQLite write transaction. The first
//! statement is a write (the sale header), which acquires the database
//! write lock before any stock is read - so validation always sees all
//! previously committed movements, and two concurrent submissions for the
//! same last unit serialize instead of both passing validation. A writer
//! that cannot get the lock within the busy timeout fails with a
//! retryable conflict, never a partial application.
//!
//! ## Edit Reversal
//! Editing never deletes ledger history. The pre-edit lines are captured
//! first, validation counts them as givebacks, and on success the engine
//! appends one ADJUSTMENT (+quantity) per old line before the new SALE
//! movements - the audit trail shows exactly what happened.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::item::{ItemRepository, LowStockRow};
use crate::repository::ledger::{self, LedgerRepository};
use crate::repository::sale::SaleRepository;
use shopledger_core::reconcile::{self, QuantityByItem};
use shopledger_core::validation::{
    validate_manual_movement, validate_note, validate_payment_amount, validate_sale_lines,
};
use shopledger_core::{
    totals, CoreError, Item, MovementKind, Money, Payment, PaymentMethod, Sale, SaleItem,
    SaleLineInput, SaleStatus, StockMovement, StockViolation, ValidationError,
};

// =============================================================================
// Submission Inputs
// =============================================================================

/// A sale-create submission.
#[derive(Debug, Clone, Default)]
pub struct CreateSale {
    pub customer_id: Option<String>,
    pub notes: String,
    pub lines: Vec<SaleLineInput>,
    /// Optional actor recorded on the ledger movements.
    pub created_by: Option<String>,
}

/// A sale-edit submission. The new lines REPLACE the sale's line
/// snapshots; the old lines are reversed in the ledger, never erased.
#[derive(Debug, Clone, Default)]
pub struct EditSale {
    pub notes: String,
    pub lines: Vec<SaleLineInput>,
    pub edited_by: Option<String>,
}

// =============================================================================
// Settlement Error
// =============================================================================

/// What callers of the settlement engine see.
///
/// Every variant except `Db` is recoverable: the submission was rolled
/// back in full and the caller can correct the input (or simply retry, for
/// `Conflict`).
#[derive(Debug, Error)]
pub enum SettlementError {
    /// Malformed input, rejected before any persistence.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// One or more items would go negative. Carries the FULL violation
    /// list so the caller can present every problem at once.
    #[error("insufficient stock for {} item(s)", violations.len())]
    InsufficientStock { violations: Vec<StockViolation> },

    /// Unknown sale / item / customer reference.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Storage contention during validation/apply. Retry the whole
    /// submission; nothing was applied.
    #[error("storage contention; retry the submission")]
    Conflict,

    /// Any other storage failure. Fatal to the submission (fully rolled
    /// back) but not to the process.
    #[error(transparent)]
    Db(DbError),
}

impl SettlementError {
    /// Whether retrying the whole submission unchanged can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SettlementError::Conflict)
    }

    fn not_found(entity: &str, id: &str) -> Self {
        SettlementError::NotFound {
            entity: entity.to_string(),
            id: id.to_string(),
        }
    }
}

impl From<CoreError> for SettlementError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock { violations } => {
                SettlementError::InsufficientStock { violations }
            }
            CoreError::Validation(v) => SettlementError::Validation(v),
        }
    }
}

impl From<DbError> for SettlementError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => SettlementError::NotFound { entity, id },
            DbError::ConcurrencyConflict => SettlementError::Conflict,
            other => SettlementError::Db(other),
        }
    }
}

impl From<sqlx::Error> for SettlementError {
    fn from(err: sqlx::Error) -> Self {
        SettlementError::from(DbError::from(err))
    }
}

/// Result type for settlement operations.
pub type SettlementResult<T> = Result<T, SettlementError>;

// =============================================================================
// Settlement Engine
// =============================================================================

/// Owns the atomic sale submission transactions.
///
/// This is the boundary the (out-of-scope) UI/API layer calls into. Reads
/// that don't need a transaction are delegated to the repositories.
#[derive(Debug, Clone)]
pub struct SettlementEngine {
    pool: SqlitePool,
}

impl SettlementEngine {
    /// Creates a new SettlementEngine.
    pub fn new(pool: SqlitePool) -> Self {
        SettlementEngine { pool }
    }

    // -------------------------------------------------------------------------
    // Sale Create
    // -------------------------------------------------------------------------

    /// Creates a sale: persists the header and line snapshots, validates
    /// projected stock against the ledger, appends one SALE movement per
    /// line, and stores totals and status - all in one transaction.
    pub async fn create_sale(&self, submission: CreateSale) -> SettlementResult<Sale> {
        validate_sale_lines(&submission.lines).map_err(CoreError::from)?;
        validate_note(&submission.notes).map_err(CoreError::from)?;

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        debug!(sale_id = %sale_id, lines = submission.lines.len(), "Creating sale");

        let mut tx = self.pool.begin().await?;

        if let Some(customer_id) = &submission.customer_id {
            ensure_customer_exists(&mut tx, customer_id).await?;
        }

        // DRAFT: the header insert is the first write, taking the database
        // write lock before any stock read below.
        let mut sale = Sale {
            id: sale_id.clone(),
            customer_id: submission.customer_id.clone(),
            notes: submission.notes.clone(),
            subtotal: Money::zero(),
            total: Money::zero(),
            status: SaleStatus::Unpaid,
            created_at: now,
            updated_at: now,
        };
        insert_sale_header(&mut tx, &sale).await?;

        let catalog = fetch_catalog(&mut tx, &submission.lines).await?;
        let mut lines = snapshot_lines(&sale_id, &submission.lines, &catalog);
        insert_lines(&mut tx, &lines).await?;

        // VALIDATING: demand vs. committed stock; no givebacks on create.
        let demand = reconcile::projected_demand(&submission.lines);
        let stock = stock_for_demand(&mut tx, &demand).await?;
        reconcile::check_stock(&demand, &stock, &QuantityByItem::new(), &catalog)?;

        // APPLYING: totals onto the header, one SALE movement per line.
        let sale_totals = totals::recompute_lines(&mut lines);
        update_lines_totals(&mut tx, &lines).await?;
        sale.subtotal = sale_totals.subtotal;
        sale.total = sale_totals.total;

        for line in &lines {
            append_movement(
                &mut tx,
                &line.item_id,
                MovementKind::Sale,
                -line.quantity,
                &format!("Sale {sale_id}"),
                Some(&sale_id),
                submission.created_by.as_deref(),
                now,
            )
            .await?;
        }

        sale.status = totals::refresh_status(sale.total, Money::zero());
        update_sale_header(&mut tx, &sale, now).await?;

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            total = %sale.total,
            lines = lines.len(),
            "Sale committed"
        );
        Ok(sale)
    }

    // -------------------------------------------------------------------------
    // Sale Edit
    // -------------------------------------------------------------------------

    /// Edits a sale: replaces its line snapshots, validates the new demand
    /// with the pre-edit lines counted as givebacks, reverses the old
    /// lines with ADJUSTMENT movements, appends new SALE movements, and
    /// recomputes totals and status - all in one transaction.
    ///
    /// On any failure the pre-edit state is untouched, including the
    /// ledger.
    pub async fn edit_sale(&self, sale_id: &str, submission: EditSale) -> SettlementResult<Sale> {
        validate_sale_lines(&submission.lines).map_err(CoreError::from)?;
        validate_note(&submission.notes).map_err(CoreError::from)?;

        let now = Utc::now();

        debug!(sale_id = %sale_id, lines = submission.lines.len(), "Editing sale");

        let mut tx = self.pool.begin().await?;

        let mut sale = fetch_sale(&mut tx, sale_id).await?;

        // DRAFT: update the header first - a write, so the lock is held
        // before the pre-edit capture and stock reads.
        sale.notes = submission.notes.clone();
        update_sale_header(&mut tx, &sale, now).await?;

        // Capture pre-edit lines BEFORE any line mutation: they drive both
        // the giveback validation and the reversal movements.
        let pre_edit_lines = fetch_lines(&mut tx, sale_id).await?;

        delete_lines(&mut tx, sale_id).await?;
        let catalog = fetch_catalog(&mut tx, &submission.lines).await?;
        let mut lines = snapshot_lines(sale_id, &submission.lines, &catalog);
        insert_lines(&mut tx, &lines).await?;

        // VALIDATING: the old lines are about to be reversed, so their
        // quantities count as available.
        let demand = reconcile::projected_demand(&submission.lines);
        let givebacks = reconcile::giveback_map(&pre_edit_lines);
        let stock = stock_for_demand(&mut tx, &demand).await?;
        reconcile::check_stock(&demand, &stock, &givebacks, &catalog)?;

        // APPLYING: reverse old lines (audit-preserving), then apply new.
        for old in &pre_edit_lines {
            append_movement(
                &mut tx,
                &old.item_id,
                MovementKind::Adjustment,
                old.quantity,
                &format!("Reversal for edited sale {sale_id}"),
                Some(sale_id),
                submission.edited_by.as_deref(),
                now,
            )
            .await?;
        }
        for line in &lines {
            append_movement(
                &mut tx,
                &line.item_id,
                MovementKind::Sale,
                -line.quantity,
                &format!("Sale {sale_id}"),
                Some(sale_id),
                submission.edited_by.as_deref(),
                now,
            )
            .await?;
        }

        let sale_totals = totals::recompute_lines(&mut lines);
        update_lines_totals(&mut tx, &lines).await?;
        sale.subtotal = sale_totals.subtotal;
        sale.total = sale_totals.total;

        let paid = total_paid(&mut tx, sale_id).await?;
        sale.status = totals::refresh_status(sale.total, paid);
        update_sale_header(&mut tx, &sale, now).await?;

        tx.commit().await?;

        info!(sale_id = %sale_id, total = %sale.total, "Sale edit committed");
        Ok(sale)
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    /// Records a payment and refreshes the sale's persisted status in one
    /// transaction. Payments are append-only: there is no edit or delete.
    pub async fn record_payment(
        &self,
        sale_id: &str,
        amount: Money,
        method: PaymentMethod,
        note: &str,
    ) -> SettlementResult<Payment> {
        validate_payment_amount(amount).map_err(CoreError::from)?;
        validate_note(note).map_err(CoreError::from)?;

        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let mut sale = fetch_sale(&mut tx, sale_id).await?;

        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.to_string(),
            amount,
            method,
            note: note.to_string(),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO payments (id, sale_id, amount, method, note, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.sale_id)
        .bind(payment.amount)
        .bind(payment.method)
        .bind(&payment.note)
        .bind(payment.created_at)
        .execute(&mut *tx)
        .await?;

        let paid = total_paid(&mut tx, sale_id).await?;
        sale.status = totals::refresh_status(sale.total, paid);
        update_sale_header(&mut tx, &sale, now).await?;

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            payment_id = %payment.id,
            amount = %payment.amount,
            status = ?sale.status,
            "Payment recorded"
        );
        Ok(payment)
    }

    // -------------------------------------------------------------------------
    // Manual Movements & Stock Queries
    // -------------------------------------------------------------------------

    /// Records a manual RESTOCK / ADJUSTMENT / RETURN movement outside the
    /// sales flow. The SALE kind is reserved for settlement and rejected;
    /// a zero delta is rejected.
    pub async fn record_manual_movement(
        &self,
        item_id: &str,
        kind: MovementKind,
        delta: i64,
        note: &str,
        created_by: Option<&str>,
    ) -> SettlementResult<StockMovement> {
        validate_manual_movement(kind, delta).map_err(CoreError::from)?;
        validate_note(note).map_err(CoreError::from)?;

        let items = ItemRepository::new(self.pool.clone());
        if items.get_by_id(item_id).await?.is_none() {
            return Err(SettlementError::not_found("Item", item_id));
        }

        let movement = StockMovement {
            id: Uuid::new_v4().to_string(),
            item_id: item_id.to_string(),
            kind,
            quantity_delta: delta,
            note: note.to_string(),
            sale_id: None,
            created_at: Utc::now(),
            created_by: created_by.map(str::to_string),
        };

        LedgerRepository::new(self.pool.clone())
            .append(&movement)
            .await?;

        Ok(movement)
    }

    /// Current stock for one item, derived from the ledger.
    pub async fn current_stock(&self, item_id: &str) -> SettlementResult<i64> {
        Ok(LedgerRepository::new(self.pool.clone())
            .current_stock(item_id)
            .await?)
    }

    /// Active items at or below their effective low-stock threshold.
    pub async fn low_stock_items(&self, global_default: i64) -> SettlementResult<Vec<LowStockRow>> {
        Ok(ItemRepository::new(self.pool.clone())
            .low_stock(global_default)
            .await?)
    }

    /// Loads a sale with its line snapshots and payments.
    pub async fn get_sale(
        &self,
        sale_id: &str,
    ) -> SettlementResult<(Sale, Vec<SaleItem>, Vec<Payment>)> {
        let sales = SaleRepository::new(self.pool.clone());
        let sale = sales
            .get_by_id(sale_id)
            .await?
            .ok_or_else(|| SettlementError::not_found("Sale", sale_id))?;
        let items = sales.get_items(sale_id).await?;
        let payments = sales.get_payments(sale_id).await?;
        Ok((sale, items, payments))
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================
// Every helper below runs on the submission's transaction connection, so a
// failure anywhere rolls back the whole unit when the transaction drops.

/// Freezes each input line into a `SaleItem` snapshot. A line without an
/// explicit price defaults to the item's current sell price; an explicit
/// price is never overridden. Line totals are filled in by
/// `totals::recompute_lines`.
fn snapshot_lines(
    sale_id: &str,
    inputs: &[SaleLineInput],
    catalog: &HashMap<String, Item>,
) -> Vec<SaleItem> {
    inputs
        .iter()
        .map(|input| {
            let unit_price = input.unit_price.unwrap_or_else(|| {
                catalog
                    .get(&input.item_id)
                    .map(|item| item.sell_price)
                    .unwrap_or_else(Money::zero)
            });
            SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.to_string(),
                item_id: input.item_id.clone(),
                quantity: input.quantity,
                unit_price,
                line_total: Money::zero(),
            }
        })
        .collect()
}

/// Resolves every distinct item referenced by the submission, failing
/// with NotFound on the first unknown reference.
async fn fetch_catalog(
    conn: &mut SqliteConnection,
    lines: &[SaleLineInput],
) -> SettlementResult<HashMap<String, Item>> {
    let mut catalog = HashMap::new();
    for line in lines {
        if catalog.contains_key(&line.item_id) {
            continue;
        }
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
        .bind(&line.item_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| SettlementError::not_found("Item", &line.item_id))?;
        catalog.insert(item.id.clone(), item);
    }
    Ok(catalog)
}

async fn ensure_customer_exists(
    conn: &mut SqliteConnection,
    customer_id: &str,
) -> SettlementResult<()> {
    let exists: Option<String> = sqlx::query_scalar("SELECT id FROM customers WHERE id = ?1")
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Err(SettlementError::not_found("Customer", customer_id));
    }
    Ok(())
}

async fn fetch_sale(conn: &mut SqliteConnection, sale_id: &str) -> SettlementResult<Sale> {
    sqlx::query_as::<_, Sale>(
        r#"
        SELECT
            id, customer_id, notes, subtotal, total, status,
            created_at, updated_at
        FROM sales
        WHERE id = ?1
        "#,
    )
    .bind(sale_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| SettlementError::not_found("Sale", sale_id))
}

async fn insert_sale_header(conn: &mut SqliteConnection, sale: &Sale) -> SettlementResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, customer_id, notes, subtotal, total, status,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.customer_id)
    .bind(&sale.notes)
    .bind(sale.subtotal)
    .bind(sale.total)
    .bind(sale.status)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Persists the header's mutable fields (notes, totals, status) and bumps
/// `updated_at`.
async fn update_sale_header(
    conn: &mut SqliteConnection,
    sale: &Sale,
    now: chrono::DateTime<Utc>,
) -> SettlementResult<()> {
    sqlx::query(
        r#"
        UPDATE sales SET
            notes = ?2,
            subtotal = ?3,
            total = ?4,
            status = ?5,
            updated_at = ?6
        WHERE id = ?1
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.notes)
    .bind(sale.subtotal)
    .bind(sale.total)
    .bind(sale.status)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

async fn fetch_lines(conn: &mut SqliteConnection, sale_id: &str) -> SettlementResult<Vec<SaleItem>> {
    let lines = sqlx::query_as::<_, SaleItem>(
        r#"
        SELECT id, sale_id, item_id, quantity, unit_price, line_total
        FROM sale_items
        WHERE sale_id = ?1
        ORDER BY rowid
        "#,
    )
    .bind(sale_id)
    .fetch_all(&mut *conn)
    .await?;
    Ok(lines)
}

async fn insert_lines(conn: &mut SqliteConnection, lines: &[SaleItem]) -> SettlementResult<()> {
    for line in lines {
        sqlx::query(
            r#"
            INSERT INTO sale_items (id, sale_id, item_id, quantity, unit_price, line_total)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&line.id)
        .bind(&line.sale_id)
        .bind(&line.item_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.line_total)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Stores the recomputed line totals back onto the snapshots.
async fn update_lines_totals(
    conn: &mut SqliteConnection,
    lines: &[SaleItem],
) -> SettlementResult<()> {
    for line in lines {
        sqlx::query("UPDATE sale_items SET line_total = ?2 WHERE id = ?1")
            .bind(&line.id)
            .bind(line.line_total)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Replaces a sale's line snapshots. Only the snapshots: the ledger keeps
/// the full history via reversal movements.
async fn delete_lines(conn: &mut SqliteConnection, sale_id: &str) -> SettlementResult<()> {
    sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
        .bind(sale_id)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Derives committed stock for every demanded item in one aggregated
/// query, on the submission's own (write-locked) connection.
async fn stock_for_demand(
    conn: &mut SqliteConnection,
    demand: &QuantityByItem,
) -> SettlementResult<HashMap<String, i64>> {
    let stock =
        ledger::sum_movement_deltas(&mut *conn, demand.keys().map(String::as_str)).await?;
    Ok(stock)
}

#[allow(clippy::too_many_arguments)]
async fn append_movement(
    conn: &mut SqliteConnection,
    item_id: &str,
    kind: MovementKind,
    delta: i64,
    note: &str,
    sale_id: Option<&str>,
    created_by: Option<&str>,
    now: chrono::DateTime<Utc>,
) -> SettlementResult<()> {
    sqlx::query(
        r#"
        INSERT INTO stock_movements (
            id, item_id, kind, quantity_delta, note,
            sale_id, created_at, created_by
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(item_id)
    .bind(kind)
    .bind(delta)
    .bind(note)
    .bind(sale_id)
    .bind(now)
    .bind(created_by)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Sum of a sale's payments, read on the submission's connection.
async fn total_paid(conn: &mut SqliteConnection, sale_id: &str) -> SettlementResult<Money> {
    let paid: Option<i64> = sqlx::query_scalar("SELECT SUM(amount) FROM payments WHERE sale_id = ?1")
        .bind(sale_id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(Money::from_cents(paid.unwrap_or(0)))
}

// =============================================================================
// Unit Tests
// =============================================================================
