use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use sqlx::PgPool;
use taxfile_core::Collection;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::db;
use crate::document::{Document, Key};
use crate::error::StoreError;
use crate::transaction::Transaction;

type Tables = HashMap<Collection, HashMap<Uuid, Document>>;

/// Thread-safe, cloneable document store.
///
/// Reads are synchronous and served from memory: the lock is `parking_lot`
/// and is never held across `.await`. Every write goes through a
/// [`Transaction`]; when a pool is configured, commits reach PostgreSQL
/// before memory. Commits are serialized by an async gate, which is held
/// across the database write.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    tables: Arc<RwLock<Tables>>,
    seq: Arc<AtomicI64>,
    pool: Option<PgPool>,
    commit_gate: Arc<Mutex<()>>,
    writer_slot: Arc<Mutex<()>>,
}

impl DocumentStore {
    /// A store backed by `pool`, or in-memory only when `None`.
    pub fn new(pool: Option<PgPool>) -> Self {
        Self {
            tables: Arc::new(RwLock::new(HashMap::new())),
            seq: Arc::new(AtomicI64::new(1)),
            pool,
            commit_gate: Arc::new(Mutex::new(())),
            writer_slot: Arc::new(Mutex::new(())),
        }
    }

    /// An empty in-memory store.
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// The PostgreSQL pool, if persistence is configured.
    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Load every persisted document into memory. Returns the count loaded.
    /// A no-op without a pool.
    pub async fn hydrate(&self) -> Result<usize, StoreError> {
        let Some(pool) = &self.pool else {
            return Ok(0);
        };
        let docs = db::load_all(pool).await?;
        let loaded = docs.len();
        let max_seq = docs.iter().map(|d| d.seq).max().unwrap_or(0);

        {
            let mut tables = self.tables.write();
            for doc in docs {
                tables.entry(doc.collection).or_default().insert(doc.id, doc);
            }
        }
        self.seq.fetch_max(max_seq + 1, Ordering::SeqCst);

        tracing::info!(count = loaded, "hydrated document store from database");
        Ok(loaded)
    }

    /// Documents in `collection` matching `filter`, in insertion order.
    pub fn find(&self, collection: Collection, filter: &Key) -> Vec<Document> {
        let tables = self.tables.read();
        let mut docs: Vec<Document> = tables
            .get(&collection)
            .map(|t| {
                t.values()
                    .filter(|d| filter.matches(&d.key))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        docs.sort_by_key(|d| d.seq);
        docs
    }

    /// The earliest document matching `filter`.
    pub fn find_one(&self, collection: Collection, filter: &Key) -> Option<Document> {
        self.find(collection, filter).into_iter().next()
    }

    /// The most recently inserted document matching `filter`.
    pub fn find_latest(&self, collection: Collection, filter: &Key) -> Option<Document> {
        self.find(collection, filter).pop()
    }

    /// One document by id.
    pub fn get(&self, collection: Collection, id: &Uuid) -> Option<Document> {
        self.tables
            .read()
            .get(&collection)
            .and_then(|t| t.get(id))
            .cloned()
    }

    /// Number of documents in `collection` matching `filter`.
    pub fn count(&self, collection: Collection, filter: &Key) -> usize {
        self.tables
            .read()
            .get(&collection)
            .map_or(0, |t| t.values().filter(|d| filter.matches(&d.key)).count())
    }

    /// Every document in `collection`, in insertion order.
    pub fn list(&self, collection: Collection) -> Vec<Document> {
        self.find(collection, &Key::default())
    }

    /// Open a transaction.
    pub fn begin(&self) -> Transaction {
        Transaction::new(self.clone(), None)
    }

    /// Open a transaction that holds the writer slot until it commits or is
    /// dropped. Waits while another exclusive transaction is open.
    pub async fn begin_exclusive(&self) -> Transaction {
        let slot = Arc::clone(&self.writer_slot).lock_owned().await;
        Transaction::new(self.clone(), Some(slot))
    }

    /// Insert a single document.
    pub async fn insert<T: Serialize>(
        &self,
        collection: Collection,
        key: Key,
        body: &T,
    ) -> Result<Document, StoreError> {
        let mut tx = self.begin();
        let doc = tx.insert(collection, key, body)?;
        tx.commit().await?;
        Ok(doc)
    }

    /// Replace the body of a single document.
    pub async fn update<T: Serialize>(
        &self,
        collection: Collection,
        id: &Uuid,
        body: &T,
    ) -> Result<Document, StoreError> {
        let mut tx = self.begin();
        let doc = tx.update(collection, id, body)?;
        tx.commit().await?;
        Ok(doc)
    }

    /// Delete a single document. Returns whether it existed.
    pub async fn delete(&self, collection: Collection, id: &Uuid) -> Result<bool, StoreError> {
        let mut tx = self.begin();
        let existed = tx.delete(collection, id);
        tx.commit().await?;
        Ok(existed)
    }

    pub(crate) fn next_seq(&self) -> i64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    pub(crate) async fn lock_commits(&self) -> MutexGuard<'_, ()> {
        self.commit_gate.lock().await
    }

    /// Apply committed changes under one write lock. Callers hold the
    /// commit gate.
    pub(crate) fn apply(&self, changes: Vec<((Collection, Uuid), Option<Document>)>) {
        let mut tables = self.tables.write();
        for ((collection, id), change) in changes {
            match change {
                Some(doc) => {
                    tables.entry(collection).or_default().insert(id, doc);
                }
                None => {
                    if let Some(t) = tables.get_mut(&collection) {
                        t.remove(&id);
                    }
                }
            }
        }
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::in_memory()
    }
}
