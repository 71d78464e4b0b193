//! # Repository Module
//!
//! Database repository implementations for Shopledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  The Repository pattern abstracts database access behind a      │
//! │  clean API.                                                     │
//! │                                                                 │
//! │  Caller                                                         │
//! │    │   db.ledger().current_stock("item-id")                     │
//! │    ▼                                                            │
//! │  LedgerRepository                                               │
//! │    │   SQL query                                                │
//! │    ▼                                                            │
//! │  SQLite Database                                                │
//! │                                                                 │
//! │  Benefits:                                                      │
//! │  • Clean separation of concerns                                 │
//! │  • SQL is isolated in one place                                 │
//! │  • Easy to test against an in-memory database                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories cover single-statement reads and appends. Multi-statement
//! atomic units (sale create/edit, payment + status refresh) belong to the
//! settlement engine, which owns its own transactions.
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Catalog reads and thin CRUD
//! - [`customer::CustomerRepository`] - Customer thin CRUD
//! - [`ledger::LedgerRepository`] - Append-only stock ledger
//! - [`sale::SaleRepository`] - Sale, line, and payment reads

pub mod customer;
pub mod item;
pub mod ledger;
pub mod sale;
