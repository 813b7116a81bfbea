//! MongoDB-backed store
//!
//! Thin mapping from the store traits onto typed collections. Uniqueness
//! comes from the schema indexes; `MongoCollection` reports violations as
//! `Conflict`.

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, DateTime};
use std::collections::HashMap;
use tracing::debug;

use super::{ContentStore, CredentialStore, ShareLinkRegistry, TagStore};
use crate::db::schemas::{
    ContentDoc, LinkDoc, TagDoc, UserDoc, CONTENT_COLLECTION, LINK_COLLECTION, TAG_COLLECTION,
    USER_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{BrainError, Result};

/// All collections used by the service
#[derive(Clone)]
pub struct MongoStore {
    users: MongoCollection<UserDoc>,
    contents: MongoCollection<ContentDoc>,
    tags: MongoCollection<TagDoc>,
    links: MongoCollection<LinkDoc>,
}

impl MongoStore {
    /// Open every collection, applying indexes
    pub async fn open(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            users: client.collection(USER_COLLECTION).await?,
            contents: client.collection(CONTENT_COLLECTION).await?,
            tags: client.collection(TAG_COLLECTION).await?,
            links: client.collection(LINK_COLLECTION).await?,
        })
    }
}

fn fresh_metadata() -> bson::Document {
    let now = DateTime::now();
    doc! { "created_at": now, "updated_at": now }
}

#[async_trait]
impl CredentialStore for MongoStore {
    async fn create_user(&self, mut user: UserDoc) -> Result<UserDoc> {
        let id = self
            .users
            .insert_one(user.clone())
            .await
            .map_err(|e| match e {
                BrainError::Conflict(_) => {
                    BrainError::Conflict("username or email already exists".into())
                }
                other => other,
            })?;
        user._id = Some(id);
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        self.users.find_one(doc! { "email": email }).await
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<UserDoc>> {
        self.users.find_one(doc! { "_id": *id }).await
    }

    async fn set_share_enabled(&self, id: &ObjectId, enabled: bool) -> Result<()> {
        self.users
            .update_one(
                doc! { "_id": *id },
                doc! { "$set": { "share_enabled": enabled, "metadata.updated_at": DateTime::now() } },
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MongoStore {
    async fn insert_content(&self, mut item: ContentDoc) -> Result<ContentDoc> {
        let id = self.contents.insert_one(item.clone()).await?;
        item._id = Some(id);
        Ok(item)
    }

    async fn list_by_owner(&self, owner: &ObjectId) -> Result<Vec<ContentDoc>> {
        self.contents
            .find_many(doc! { "user_id": *owner }, doc! { "_id": 1 })
            .await
    }

    async fn delete_owned(&self, owner: &ObjectId, id: &ObjectId) -> Result<u64> {
        self.contents
            .delete_one(doc! { "_id": *id, "user_id": *owner })
            .await
    }
}

#[async_trait]
impl TagStore for MongoStore {
    async fn ensure_tags(&self, titles: &[String]) -> Result<Vec<ObjectId>> {
        let mut ids = Vec::with_capacity(titles.len());

        for title in titles {
            let filter = doc! { "title": title.as_str() };
            let tag = match self
                .tags
                .find_or_insert(filter.clone(), doc! { "metadata": fresh_metadata() })
                .await
            {
                Ok(tag) => tag,
                // Lost an insert race; the winner's document is there now
                Err(BrainError::Conflict(_)) => self
                    .tags
                    .find_one(filter)
                    .await?
                    .ok_or_else(|| BrainError::Storage(format!("Tag '{}' vanished", title)))?,
                Err(e) => return Err(e),
            };

            ids.push(
                tag._id
                    .ok_or_else(|| BrainError::Storage("Tag without _id".into()))?,
            );
        }

        Ok(ids)
    }

    async fn titles_by_id(&self, ids: &[ObjectId]) -> Result<HashMap<ObjectId, String>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let tags = self
            .tags
            .find_many(doc! { "_id": { "$in": ids.to_vec() } }, doc! { "_id": 1 })
            .await?;

        Ok(tags
            .into_iter()
            .filter_map(|tag| tag._id.map(|id| (id, tag.title)))
            .collect())
    }
}

#[async_trait]
impl ShareLinkRegistry for MongoStore {
    async fn find_or_create_link(
        &self,
        owner: &ObjectId,
        candidate_hash: &str,
    ) -> Result<LinkDoc> {
        let filter = doc! { "user_id": *owner };
        // The upsert seeds `user_id` from the filter
        let on_insert = doc! {
            "hash": candidate_hash,
            "metadata": fresh_metadata(),
        };

        match self.links.find_or_insert(filter.clone(), on_insert).await {
            Ok(link) => Ok(link),
            Err(BrainError::Conflict(reason)) => {
                // Either a concurrent enable for the same owner won (its link
                // is now visible) or the hash collided with another owner's.
                debug!("Share link upsert conflict: {}", reason);
                match self.links.find_one(filter).await? {
                    Some(link) => Ok(link),
                    None => Err(BrainError::Conflict("share hash already bound".into())),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<LinkDoc>> {
        self.links.find_one(doc! { "hash": hash }).await
    }

    async fn delete_for_owner(&self, owner: &ObjectId) -> Result<u64> {
        self.links.delete_one(doc! { "user_id": *owner }).await
    }
}
