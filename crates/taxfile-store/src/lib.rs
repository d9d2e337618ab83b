//! # taxfile-store: Keyed Document Store
//!
//! One generic store replaces a table per record type. Documents are JSON
//! bodies in named [`Collection`](taxfile_core::Collection)s, keyed by
//! `(userId, taxYear)`, `(filingId)` or owner. Two generic write strategies
//! cover every wizard section:
//!
//! - **upsert-by-key**: [`Transaction::upsert_by_key`] for singletons.
//! - **replace-all**: [`Transaction::replace_all`] for lists.
//!
//! ## Persistence
//!
//! Memory is the read path. With `DATABASE_URL` set, commits are written to
//! PostgreSQL first and the store is hydrated from it at startup; see
//! [`db`].

pub mod db;
mod document;
mod error;
mod store;
mod transaction;

pub use db::{init_pool, ping};
pub use document::{Document, Key, Record};
pub use error::StoreError;
pub use store::DocumentStore;
pub use transaction::Transaction;
