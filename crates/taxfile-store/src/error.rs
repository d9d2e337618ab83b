use taxfile_core::Collection;
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by the document store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// PostgreSQL rejected a query or the connection failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Embedded migrations failed to apply.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A body could not be encoded to, or decoded from, JSON.
    #[error("codec error in {collection}: {source}")]
    Codec {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },

    /// No document with this id exists in the collection.
    #[error("{collection} document {id} not found")]
    NotFound { collection: Collection, id: Uuid },
}

impl StoreError {
    pub(crate) fn codec(collection: Collection) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Codec { collection, source }
    }
}
