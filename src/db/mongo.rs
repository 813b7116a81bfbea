//! MongoDB client and collection wrapper
//!
//! Collections apply their schema's indexes when opened, so uniqueness is
//! enforced by the server rather than by read-then-write checks. Duplicate-key
//! failures are translated into `BrainError::Conflict` here and nowhere else.

use bson::{doc, oid::ObjectId, Document};
use futures_util::TryStreamExt;
use mongodb::{
    error::{ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument, UpdateModifications},
    results::UpdateResult,
    Client, Collection, IndexModel,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::db::schemas::Metadata;
use crate::types::{BrainError, Result};

/// MongoDB server error code for unique index violations
pub const DUPLICATE_KEY_CODE: i32 = 11000;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// Trait for schemas with mutable metadata
pub trait MutMetadata {
    fn mut_metadata(&mut self) -> &mut Metadata;
}

/// Whether a driver error is a unique index violation
fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

/// Map a write error, turning duplicate keys into `Conflict`
fn write_error(context: &str, err: mongodb::error::Error) -> BrainError {
    if is_duplicate_key(&err) {
        BrainError::Conflict(format!("{}: duplicate key", context))
    } else {
        BrainError::Storage(format!("{} failed: {}", context, err))
    }
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
}

impl MongoClient {
    /// Connect and verify the server answers a ping
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB (database '{}')", db_name);

        // Fail fast instead of hanging on an unreachable server
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| BrainError::Storage(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| BrainError::Storage(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    /// Get a typed collection with its indexes applied
    pub async fn collection<T>(&self, name: &str) -> Result<MongoCollection<T>>
    where
        T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
    {
        MongoCollection::new(&self.client, &self.db_name, name).await
    }
}

/// Typed MongoDB collection with automatic indexing
#[derive(Debug, Clone)]
pub struct MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    inner: Collection<T>,
}

impl<T> MongoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync + IntoIndexes + MutMetadata,
{
    /// Open a collection and apply its indexes
    pub async fn new(client: &Client, db_name: &str, collection_name: &str) -> Result<Self> {
        let collection = client.database(db_name).collection::<T>(collection_name);
        let mongo_collection = MongoCollection { inner: collection };

        mongo_collection.apply_indexes().await?;
        debug!("Collection '{}' ready", collection_name);

        Ok(mongo_collection)
    }

    async fn apply_indexes(&self) -> Result<()> {
        let schema_indices = T::into_indices();

        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.inner
            .create_indexes(indices)
            .await
            .map_err(|e| BrainError::Storage(format!("Failed to create indexes: {}", e)))?;

        Ok(())
    }

    /// Insert a document, setting metadata timestamps
    ///
    /// Fails with `Conflict` when a unique index rejects the document.
    pub async fn insert_one(&self, mut item: T) -> Result<ObjectId> {
        *item.mut_metadata() = Metadata::new();

        let result = self
            .inner
            .insert_one(item)
            .await
            .map_err(|e| write_error("Insert", e))?;

        result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| BrainError::Storage("Failed to get inserted ID".into()))
    }

    /// Find one document by filter
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>> {
        self.inner
            .find_one(filter)
            .await
            .map_err(|e| BrainError::Storage(format!("Find failed: {}", e)))
    }

    /// Find all documents matching a filter, in the given sort order
    pub async fn find_many(&self, filter: Document, sort: Document) -> Result<Vec<T>> {
        let cursor = self
            .inner
            .find(filter)
            .sort(sort)
            .await
            .map_err(|e| BrainError::Storage(format!("Find failed: {}", e)))?;

        cursor
            .try_collect()
            .await
            .map_err(|e| BrainError::Storage(format!("Cursor read failed: {}", e)))
    }

    /// Update one document
    pub async fn update_one(
        &self,
        filter: Document,
        update: impl Into<UpdateModifications>,
    ) -> Result<UpdateResult> {
        self.inner
            .update_one(filter, update)
            .await
            .map_err(|e| write_error("Update", e))
    }

    /// Atomically fetch the document matching `filter`, inserting
    /// `on_insert` first if there is none
    ///
    /// Two racing callers can both miss and both try to insert; the loser gets
    /// `Conflict` from the unique index and should retry as a plain lookup.
    pub async fn find_or_insert(&self, filter: Document, on_insert: Document) -> Result<T> {
        self.inner
            .find_one_and_update(filter, doc! { "$setOnInsert": on_insert })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| write_error("Upsert", e))?
            .ok_or_else(|| BrainError::Storage("Upsert returned no document".into()))
    }

    /// Hard-delete one document, returning how many were removed (0 or 1)
    pub async fn delete_one(&self, filter: Document) -> Result<u64> {
        let result = self
            .inner
            .delete_one(filter)
            .await
            .map_err(|e| BrainError::Storage(format!("Delete failed: {}", e)))?;

        Ok(result.deleted_count)
    }
}

