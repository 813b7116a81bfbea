//! Owner-scoped content flows
//!
//! Every operation takes the caller's `Identity`; there is no way to reach an
//! item without naming its owner.

use std::sync::Arc;

use bson::oid::ObjectId;
use serde::Serialize;
use tracing::{debug, info};

use crate::auth::Identity;
use crate::db::schemas::{ContentDoc, ContentType};
use crate::services::validation::NewContent;
use crate::store::{ContentStore, TagStore};
use crate::types::{BrainError, Result};

const CONTENT_NOT_FOUND: &str = "Content not found or you are not authorized to delete it";

/// Content item as returned to clients, tags resolved to titles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentView {
    pub id: String,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub link: String,
    pub title: String,
    pub tags: Vec<String>,
}

pub struct ContentService {
    content: Arc<dyn ContentStore>,
    tags: Arc<dyn TagStore>,
}

impl ContentService {
    pub fn new(content: Arc<dyn ContentStore>, tags: Arc<dyn TagStore>) -> Self {
        Self { content, tags }
    }

    /// Store a validated item for the caller
    ///
    /// Tags are resolved first. If the insert then fails they stay behind as
    /// unreferenced entries and are reused by the next item naming them.
    pub async fn create(&self, owner: &Identity, item: NewContent) -> Result<ContentView> {
        let tag_ids = self.tags.ensure_tags(&item.tags).await?;

        let doc = ContentDoc::new(
            owner.user_id,
            item.title,
            item.link,
            item.content_type,
            tag_ids,
        );
        let stored = self.content.insert_content(doc).await?;

        info!(
            "User '{}' saved {} '{}'",
            owner.username, stored.content_type, stored.title
        );

        let id = stored
            ._id
            .ok_or_else(|| BrainError::Storage("Created content has no _id".into()))?;

        Ok(ContentView {
            id: id.to_hex(),
            content_type: stored.content_type,
            link: stored.link,
            title: stored.title,
            tags: item.tags,
        })
    }

    /// Every item owned by `owner`, oldest first
    pub async fn list(&self, owner: &ObjectId) -> Result<Vec<ContentView>> {
        let items = self.content.list_by_owner(owner).await?;

        let mut tag_ids: Vec<ObjectId> = items.iter().flat_map(|i| i.tags.iter().copied()).collect();
        tag_ids.sort();
        tag_ids.dedup();
        let titles = self.tags.titles_by_id(&tag_ids).await?;

        Ok(items
            .into_iter()
            .filter_map(|item| {
                let id = item._id?;
                Some(ContentView {
                    id: id.to_hex(),
                    content_type: item.content_type,
                    link: item.link,
                    title: item.title,
                    tags: item
                        .tags
                        .iter()
                        .filter_map(|t| titles.get(t).cloned())
                        .collect(),
                })
            })
            .collect())
    }

    /// Delete one of the caller's items
    ///
    /// A missing item, someone else's item and an unparseable id all fail
    /// the same way.
    pub async fn delete(&self, owner: &Identity, content_id: Option<&str>) -> Result<()> {
        let raw = match content_id.map(str::trim) {
            Some(raw) if !raw.is_empty() => raw,
            _ => return Err(BrainError::BadRequest("contentId is required in the body".into())),
        };

        let id = ObjectId::parse_str(raw).map_err(|_| {
            debug!("Delete with malformed content id '{}'", raw);
            BrainError::NotFoundOrForbidden(CONTENT_NOT_FOUND.into())
        })?;

        match self.content.delete_owned(&owner.user_id, &id).await? {
            0 => Err(BrainError::NotFoundOrForbidden(CONTENT_NOT_FOUND.into())),
            _ => {
                info!("User '{}' deleted content {}", owner.username, id);
                Ok(())
            }
        }
    }
}
