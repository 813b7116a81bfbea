//! Storage seams for Brainlink
//!
//! Services talk to persistence only through these traits. Two backends
//! implement all of them:
//! - `MongoStore`: the production document store, uniqueness via indexes
//! - `MemoryStore`: in-process maps for dev mode without MongoDB and for tests
//!
//! Every implementation must enforce the uniqueness rules itself (username,
//! email, link owner, link hash, tag title) so that racing requests cannot
//! both succeed.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use bson::oid::ObjectId;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::schemas::{ContentDoc, LinkDoc, UserDoc};
use crate::db::MongoClient;
use crate::types::Result;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Users, their password hashes and share toggles
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new user; `Conflict` if the username or email is taken
    async fn create_user(&self, user: UserDoc) -> Result<UserDoc>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>>;

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<UserDoc>>;

    /// Set the share flag; setting it to its current value is a no-op
    async fn set_share_enabled(&self, id: &ObjectId, enabled: bool) -> Result<()>;
}

/// Owner-scoped content items
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn insert_content(&self, item: ContentDoc) -> Result<ContentDoc>;

    /// All items of one owner, oldest first
    async fn list_by_owner(&self, owner: &ObjectId) -> Result<Vec<ContentDoc>>;

    /// Delete an item only if it belongs to `owner`; returns rows removed
    async fn delete_owned(&self, owner: &ObjectId, id: &ObjectId) -> Result<u64>;
}

/// Tag title lookup
#[async_trait]
pub trait TagStore: Send + Sync {
    /// Resolve normalized titles to tag ids, creating missing tags
    async fn ensure_tags(&self, titles: &[String]) -> Result<Vec<ObjectId>>;

    /// Titles for the given ids; unknown ids are left out
    async fn titles_by_id(&self, ids: &[ObjectId]) -> Result<HashMap<ObjectId, String>>;
}

/// Owner ↔ share token bindings
#[async_trait]
pub trait ShareLinkRegistry: Send + Sync {
    /// Return the owner's existing link, or bind `candidate_hash` to them
    ///
    /// `Conflict` means the candidate hash already belongs to another owner.
    async fn find_or_create_link(&self, owner: &ObjectId, candidate_hash: &str)
        -> Result<LinkDoc>;

    async fn find_by_hash(&self, hash: &str) -> Result<Option<LinkDoc>>;

    /// Remove the owner's link if present; returns rows removed
    async fn delete_for_owner(&self, owner: &ObjectId) -> Result<u64>;
}

/// Which backend is serving requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Mongo => "mongodb",
            StorageBackend::Memory => "memory",
        }
    }
}

/// Handles to every store, shared by the services
#[derive(Clone)]
pub struct Stores {
    pub backend: StorageBackend,
    pub credentials: Arc<dyn CredentialStore>,
    pub content: Arc<dyn ContentStore>,
    pub tags: Arc<dyn TagStore>,
    pub links: Arc<dyn ShareLinkRegistry>,
}

impl Stores {
    /// All stores backed by one in-process `MemoryStore`
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            backend: StorageBackend::Memory,
            credentials: store.clone(),
            content: store.clone(),
            tags: store.clone(),
            links: store,
        }
    }

    /// All stores backed by MongoDB collections (indexes applied on open)
    pub async fn mongo(client: &MongoClient) -> Result<Self> {
        let store = Arc::new(MongoStore::open(client).await?);
        Ok(Self {
            backend: StorageBackend::Mongo,
            credentials: store.clone(),
            content: store.clone(),
            tags: store.clone(),
            links: store,
        })
    }
}
