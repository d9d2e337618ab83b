//! # Transactions
//!
//! A [`Transaction`] stages changes against a snapshot-free view of the
//! store: its reads see committed documents with staged changes laid on top.
//! [`Transaction::commit`] is all-or-nothing. With a pool configured, every
//! change is written in one SQL transaction; memory is updated only after
//! that commits, under a single write lock. Dropping an uncommitted
//! transaction discards it.
//!
//! Writes are recorded as operations, not row ids. At commit, under the
//! store's commit gate, they are replayed against the committed state:
//! `upsert_by_key` overwrites whatever first matches its key at that moment,
//! and `replace_all` deletes every row that matches then. Overlapping
//! transactions over the same key end with the later commit's rows only.
//! Id-addressed writes (`insert`, `update`, `delete`) replay as given, so
//! the later commit wins row by row.
//!
//! Flows that branch on what they read (find-or-create, status changes)
//! open [`DocumentStore::begin_exclusive`], which admits one such
//! transaction at a time.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::Serialize;
use taxfile_core::Collection;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use crate::db::{self, Write};
use crate::document::{Document, Key};
use crate::error::StoreError;
use crate::store::DocumentStore;

/// A staged write, replayed at commit.
#[derive(Debug, Clone)]
enum Op {
    Put(Document),
    Delete(Collection, Uuid),
    /// Overwrite the first match for the document's key, or insert it.
    Upsert(Document),
    /// Delete every match for `key`, then insert `docs`.
    ReplaceAll {
        collection: Collection,
        key: Key,
        docs: Vec<Document>,
    },
}

/// Row changes laid over the committed tables. `None` marks a delete.
#[derive(Debug)]
struct Overlay {
    store: DocumentStore,
    changes: BTreeMap<(Collection, Uuid), Option<Document>>,
}

impl Overlay {
    fn new(store: DocumentStore) -> Self {
        Self {
            store,
            changes: BTreeMap::new(),
        }
    }

    fn find(&self, collection: Collection, filter: &Key) -> Vec<Document> {
        let mut by_id: BTreeMap<Uuid, Document> = self
            .store
            .find(collection, filter)
            .into_iter()
            .map(|d| (d.id, d))
            .collect();

        for ((c, id), change) in &self.changes {
            if *c != collection {
                continue;
            }
            match change {
                Some(doc) if filter.matches(&doc.key) => {
                    by_id.insert(*id, doc.clone());
                }
                _ => {
                    by_id.remove(id);
                }
            }
        }

        let mut docs: Vec<Document> = by_id.into_values().collect();
        docs.sort_by_key(|d| d.seq);
        docs
    }

    fn get(&self, collection: Collection, id: &Uuid) -> Option<Document> {
        match self.changes.get(&(collection, *id)) {
            Some(change) => change.clone(),
            None => self.store.get(collection, id),
        }
    }

    fn put(&mut self, doc: Document) {
        self.changes.insert((doc.collection, doc.id), Some(doc));
    }

    fn remove(&mut self, collection: Collection, id: Uuid) {
        self.changes.insert((collection, id), None);
    }

    /// `fresh`'s body on the first match's identity, or `fresh` itself.
    fn upsert(&mut self, fresh: &Document) -> Document {
        let doc = match self.find(fresh.collection, &fresh.key).into_iter().next() {
            Some(existing) => Document {
                body: fresh.body.clone(),
                updated_at: fresh.updated_at,
                ..existing
            },
            None => fresh.clone(),
        };
        self.put(doc.clone());
        doc
    }

    /// Returns the number of rows removed.
    fn replace_all(&mut self, collection: Collection, key: &Key, docs: &[Document]) -> usize {
        let stale: Vec<Uuid> = self.find(collection, key).iter().map(|d| d.id).collect();
        for id in &stale {
            self.remove(collection, *id);
        }
        for doc in docs {
            self.put(doc.clone());
        }
        stale.len()
    }

    fn replay(&mut self, op: &Op) {
        match op {
            Op::Put(doc) => self.put(doc.clone()),
            Op::Delete(collection, id) => self.remove(*collection, *id),
            Op::Upsert(fresh) => {
                self.upsert(fresh);
            }
            Op::ReplaceAll {
                collection,
                key,
                docs,
            } => {
                self.replace_all(*collection, key, docs);
            }
        }
    }
}

/// A unit of work over a [`DocumentStore`].
#[derive(Debug)]
pub struct Transaction {
    overlay: Overlay,
    ops: Vec<Op>,
    /// Held by exclusive transactions until commit or drop.
    exclusive: Option<OwnedMutexGuard<()>>,
}

impl Transaction {
    pub(crate) fn new(store: DocumentStore, exclusive: Option<OwnedMutexGuard<()>>) -> Self {
        Self {
            overlay: Overlay::new(store),
            ops: Vec::new(),
            exclusive,
        }
    }

    /// Number of rows changed by what is staged so far.
    pub fn len(&self) -> usize {
        self.overlay.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Whether this transaction holds the store's exclusive writer slot.
    pub fn is_exclusive(&self) -> bool {
        self.exclusive.is_some()
    }

    // -- Reads ----------------------------------------------------------------

    /// Documents matching `filter`, including staged changes, in insertion
    /// order.
    pub fn find(&self, collection: Collection, filter: &Key) -> Vec<Document> {
        self.overlay.find(collection, filter)
    }

    /// The earliest document matching `filter`.
    pub fn find_one(&self, collection: Collection, filter: &Key) -> Option<Document> {
        self.find(collection, filter).into_iter().next()
    }

    /// One document by id, including staged changes.
    pub fn get(&self, collection: Collection, id: &Uuid) -> Option<Document> {
        self.overlay.get(collection, id)
    }

    // -- Writes ---------------------------------------------------------------

    fn fresh<T: Serialize>(
        &self,
        collection: Collection,
        key: Key,
        body: &T,
    ) -> Result<Document, StoreError> {
        let body = serde_json::to_value(body).map_err(StoreError::codec(collection))?;
        let now = Utc::now();
        Ok(Document {
            id: Uuid::new_v4(),
            collection,
            key,
            body,
            seq: self.overlay.store.next_seq(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Stage a new document.
    pub fn insert<T: Serialize>(
        &mut self,
        collection: Collection,
        key: Key,
        body: &T,
    ) -> Result<Document, StoreError> {
        let doc = self.fresh(collection, key, body)?;
        self.overlay.put(doc.clone());
        self.ops.push(Op::Put(doc.clone()));
        Ok(doc)
    }

    /// Replace the body of an existing document, keeping its id, key,
    /// insertion order and `created_at`.
    pub fn update<T: Serialize>(
        &mut self,
        collection: Collection,
        id: &Uuid,
        body: &T,
    ) -> Result<Document, StoreError> {
        let mut doc = self
            .get(collection, id)
            .ok_or(StoreError::NotFound { collection, id: *id })?;
        doc.body = serde_json::to_value(body).map_err(StoreError::codec(collection))?;
        doc.updated_at = Utc::now();
        self.overlay.put(doc.clone());
        self.ops.push(Op::Put(doc.clone()));
        Ok(doc)
    }

    /// Overwrite the first document matching `key`, or insert one.
    ///
    /// The returned document is what this transaction sees; the match is
    /// made again at commit.
    pub fn upsert_by_key<T: Serialize>(
        &mut self,
        collection: Collection,
        key: Key,
        body: &T,
    ) -> Result<Document, StoreError> {
        let fresh = self.fresh(collection, key, body)?;
        let doc = self.overlay.upsert(&fresh);
        self.ops.push(Op::Upsert(fresh));
        Ok(doc)
    }

    /// Delete every document matching `key`, then insert `bodies` in order.
    pub fn replace_all<T: Serialize>(
        &mut self,
        collection: Collection,
        key: Key,
        bodies: &[T],
    ) -> Result<Vec<Document>, StoreError> {
        let docs = bodies
            .iter()
            .map(|body| self.fresh(collection, key.clone(), body))
            .collect::<Result<Vec<_>, _>>()?;
        let removed = self.overlay.replace_all(collection, &key, &docs);
        tracing::debug!(
            collection = %collection,
            removed,
            inserted = docs.len(),
            "staged replace-all"
        );
        self.ops.push(Op::ReplaceAll {
            collection,
            key,
            docs: docs.clone(),
        });
        Ok(docs)
    }

    /// Stage deletion of one document. Returns whether it existed.
    pub fn delete(&mut self, collection: Collection, id: &Uuid) -> bool {
        let existed = self.get(collection, id).is_some();
        if existed {
            self.overlay.remove(collection, *id);
            self.ops.push(Op::Delete(collection, *id));
        }
        existed
    }

    /// Stage deletion of every document matching `filter`. Returns the count
    /// this transaction sees; the match is made again at commit.
    pub fn delete_where(&mut self, collection: Collection, filter: &Key) -> usize {
        let removed = self.overlay.replace_all(collection, filter, &[]);
        self.ops.push(Op::ReplaceAll {
            collection,
            key: filter.clone(),
            docs: Vec::new(),
        });
        removed
    }

    // -- Commit ---------------------------------------------------------------

    /// Replay the staged operations against committed state, then make the
    /// result durable and visible. Returns the number of rows changed.
    pub async fn commit(self) -> Result<usize, StoreError> {
        let Transaction {
            overlay,
            ops,
            exclusive: _slot,
        } = self;
        if ops.is_empty() {
            return Ok(0);
        }

        let store = overlay.store;
        let _gate = store.lock_commits().await;
        let mut resolved = Overlay::new(store.clone());
        for op in &ops {
            resolved.replay(op);
        }
        let changes = resolved.changes;

        if let Some(pool) = store.pool() {
            let writes: Vec<Write<'_>> = changes
                .iter()
                .map(|((_, id), change)| match change {
                    Some(doc) => Write::Put(doc),
                    None => Write::Delete(*id),
                })
                .collect();
            if let Err(e) = db::write_batch(pool, &writes).await {
                tracing::error!(error = %e, changes = writes.len(), "transaction rolled back");
                return Err(e.into());
            }
        }

        let count = changes.len();
        store.apply(changes.into_iter().collect());
        tracing::debug!(changes = count, ops = ops.len(), "transaction committed");
        Ok(count)
    }
}
