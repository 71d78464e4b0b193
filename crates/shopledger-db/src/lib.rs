//! # shopledger-db: Database Layer for Shopledger
//!
//! This crate provides database access for the Shopledger POS and
//! inventory tracker. It uses SQLite for local storage with sqlx for
//! async operations, and owns the atomic sale settlement transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Shopledger Data Flow                              │
//! │                                                                         │
//! │  Caller (UI / API layer, out of scope here)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  shopledger-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │   │ SettlementEngine│  │ Repositories │   │   │
//! │  │   │   (pool.rs)   │   │ (settlement.rs) │  │ (repository/)│   │   │
//! │  │   │               │   │                 │  │              │   │   │
//! │  │   │ SqlitePool    │◄──│ create_sale     │  │ ItemRepo     │   │   │
//! │  │   │ WAL + busy    │   │ edit_sale       │  │ LedgerRepo   │   │   │
//! │  │   │ timeout       │◄──│ record_payment  │  │ SaleRepo     │   │   │
//! │  │   └───────────────┘   └────────────────┘   └──────────────┘   │   │
//! │  │           │                                                    │   │
//! │  │           │          pure math (totals, reconcile, status)     │   │
//! │  │           └────────────────► shopledger-core                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │        single file, embedded migrations, append-only ledger     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (item, customer, ledger, sale)
//! - [`settlement`] - The settlement engine: atomic sale create/edit/payment
//!
//! ## Usage
//!
//! ```rust,ignore
//! use shopledger_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/shopledger.db")).await?;
//!
//! let stock = db.ledger().current_stock("item-id").await?;
//! let sale = db.settlement().create_sale(submission).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod settlement;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use settlement::{
    CreateSale, EditSale, SettlementEngine, SettlementError, SettlementResult,
};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::item::{ItemRepository, LowStockRow};
pub use repository::ledger::LedgerRepository;
pub use repository::sale::SaleRepository;
