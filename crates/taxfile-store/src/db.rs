//! # PostgreSQL Persistence
//!
//! The database is **optional**. When a URL is configured, every committed
//! transaction is written to the `documents` table before the in-memory
//! tables change, and the tables are hydrated from it at startup. Without
//! one, the store runs in-memory only.
//!
//! Collection semantics (upsert, replace-all) are enforced in the store,
//! not in SQL. This layer only writes and deletes rows by id.

use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use taxfile_core::{Collection, FilingId, TaxYear, UserId};
use uuid::Uuid;

use crate::document::{Document, Key};
use crate::error::StoreError;

/// Connect and run migrations.
///
/// Returns `None` when no URL is given (in-memory-only mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool(database_url: Option<&str>) -> Result<Option<PgPool>, StoreError> {
    let Some(url) = database_url else {
        tracing::warn!(
            "DATABASE_URL not set: running in-memory only mode. \
             Filings will not survive restarts."
        );
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(url)
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Round-trip a trivial query. Used by the readiness probe.
pub async fn ping(pool: &PgPool) -> Result<(), StoreError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// A row change staged by a transaction.
pub(crate) enum Write<'a> {
    Put(&'a Document),
    Delete(Uuid),
}

/// Apply a batch of writes in one SQL transaction.
pub(crate) async fn write_batch(pool: &PgPool, writes: &[Write<'_>]) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    for write in writes {
        match write {
            Write::Put(doc) => {
                sqlx::query(
                    "INSERT INTO documents
                        (id, collection, user_id, tax_year, filing_id, body, seq, created_at, updated_at)
                     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                     ON CONFLICT (id) DO UPDATE SET
                        user_id = EXCLUDED.user_id,
                        tax_year = EXCLUDED.tax_year,
                        filing_id = EXCLUDED.filing_id,
                        body = EXCLUDED.body,
                        updated_at = EXCLUDED.updated_at",
                )
                .bind(doc.id)
                .bind(doc.collection.as_str())
                .bind(doc.key.user_id.map(|u| *u.as_uuid()))
                .bind(doc.key.tax_year.as_ref().map(TaxYear::as_str))
                .bind(doc.key.filing_id.map(|f| *f.as_uuid()))
                .bind(&doc.body)
                .bind(doc.seq)
                .bind(doc.created_at)
                .bind(doc.updated_at)
                .execute(&mut *tx)
                .await?;
            }
            Write::Delete(id) => {
                sqlx::query("DELETE FROM documents WHERE id = $1")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
        }
    }

    tx.commit().await
}

/// Load every document, in insertion order.
pub(crate) async fn load_all(pool: &PgPool) -> Result<Vec<Document>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DocumentRow>(
        "SELECT id, collection, user_id, tax_year, filing_id, body, seq, created_at, updated_at
         FROM documents ORDER BY seq",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().filter_map(DocumentRow::into_document).collect())
}

/// Internal row type for SQLx mapping.
#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    collection: String,
    user_id: Option<Uuid>,
    tax_year: Option<String>,
    filing_id: Option<Uuid>,
    body: serde_json::Value,
    seq: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    /// Rows from collections this build no longer knows are skipped and
    /// logged, never fatal.
    fn into_document(self) -> Option<Document> {
        let collection: Collection = match self.collection.parse() {
            Ok(c) => c,
            Err(e) => {
                tracing::error!(
                    id = %self.id,
                    collection = %self.collection,
                    error = %e,
                    "unknown collection in database: skipping row"
                );
                return None;
            }
        };

        let tax_year = self.tax_year.and_then(|raw| match TaxYear::new(raw.as_str()) {
            Ok(ty) => Some(ty),
            Err(e) => {
                tracing::error!(
                    id = %self.id,
                    tax_year = %raw,
                    error = %e,
                    "invalid tax year in database: dropping key field"
                );
                None
            }
        });

        Some(Document {
            id: self.id,
            collection,
            key: Key {
                user_id: self.user_id.map(UserId::from_uuid),
                tax_year,
                filing_id: self.filing_id.map(FilingId::from_uuid),
            },
            body: self.body,
            seq: self.seq,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(collection: &str, tax_year: Option<&str>) -> DocumentRow {
        DocumentRow {
            id: Uuid::new_v4(),
            collection: collection.to_string(),
            user_id: Some(Uuid::new_v4()),
            tax_year: tax_year.map(String::from),
            filing_id: None,
            body: serde_json::json!({"amount": 10}),
            seq: 7,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn row_maps_to_document() {
        let doc = row("zakat_deductions", Some("2024")).into_document().unwrap();
        assert_eq!(doc.collection, Collection::ZakatDeductions);
        assert_eq!(doc.key.tax_year.unwrap().as_str(), "2024");
        assert_eq!(doc.seq, 7);
    }

    #[test]
    fn unknown_collection_is_skipped() {
        assert!(row("legacy_table", Some("2024")).into_document().is_none());
    }

    #[test]
    fn bad_tax_year_drops_only_that_field() {
        let doc = row("expenses", Some("24")).into_document().unwrap();
        assert!(doc.key.tax_year.is_none());
        assert!(doc.key.user_id.is_some());
    }

    #[tokio::test]
    async fn no_url_means_in_memory() {
        assert!(init_pool(None).await.unwrap().is_none());
    }
}
