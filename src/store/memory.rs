//! In-memory store
//!
//! Concurrent maps with secondary indexes. Uniqueness is claimed through the
//! `DashMap` entry API so two racing inserts cannot both win.

use async_trait::async_trait;
use bson::oid::ObjectId;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;

use super::{ContentStore, CredentialStore, ShareLinkRegistry, TagStore};
use crate::db::schemas::{ContentDoc, LinkDoc, Metadata, TagDoc, UserDoc};
use crate::types::{BrainError, Result};

/// Process-local implementation of every store trait
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<ObjectId, UserDoc>,
    /// username -> user id
    usernames: DashMap<String, ObjectId>,
    /// email -> user id
    emails: DashMap<String, ObjectId>,
    contents: DashMap<ObjectId, ContentDoc>,
    /// title -> tag
    tags: DashMap<String, TagDoc>,
    /// owner -> link
    links: DashMap<ObjectId, LinkDoc>,
    /// hash -> owner
    link_owners: DashMap<String, ObjectId>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn create_user(&self, mut user: UserDoc) -> Result<UserDoc> {
        let id = ObjectId::new();

        match self.usernames.entry(user.username.clone()) {
            Entry::Occupied(_) => {
                return Err(BrainError::Conflict("username already exists".into()))
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => {
                self.usernames.remove(&user.username);
                return Err(BrainError::Conflict("email already exists".into()));
            }
            Entry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        user._id = Some(id);
        user.metadata = Metadata::new();
        self.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        let id = match self.emails.get(email) {
            Some(id) => *id,
            None => return Ok(None),
        };
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn find_by_id(&self, id: &ObjectId) -> Result<Option<UserDoc>> {
        Ok(self.users.get(id).map(|u| u.clone()))
    }

    async fn set_share_enabled(&self, id: &ObjectId, enabled: bool) -> Result<()> {
        if let Some(mut user) = self.users.get_mut(id) {
            user.share_enabled = enabled;
            user.metadata.touch();
        }
        Ok(())
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn insert_content(&self, mut item: ContentDoc) -> Result<ContentDoc> {
        let id = ObjectId::new();
        item._id = Some(id);
        item.metadata = Metadata::new();
        self.contents.insert(id, item.clone());
        Ok(item)
    }

    async fn list_by_owner(&self, owner: &ObjectId) -> Result<Vec<ContentDoc>> {
        let mut items: Vec<ContentDoc> = self
            .contents
            .iter()
            .filter(|entry| entry.user_id == *owner)
            .map(|entry| entry.value().clone())
            .collect();

        // ObjectIds embed a timestamp and a process counter
        items.sort_by_key(|item| item._id);
        Ok(items)
    }

    async fn delete_owned(&self, owner: &ObjectId, id: &ObjectId) -> Result<u64> {
        let removed = self.contents.remove_if(id, |_, item| item.user_id == *owner);
        Ok(u64::from(removed.is_some()))
    }
}

#[async_trait]
impl TagStore for MemoryStore {
    async fn ensure_tags(&self, titles: &[String]) -> Result<Vec<ObjectId>> {
        let ids = titles
            .iter()
            .map(|title| {
                let tag = self.tags.entry(title.clone()).or_insert_with(|| {
                    let mut tag = TagDoc::new(title.clone());
                    tag._id = Some(ObjectId::new());
                    tag
                });
                tag._id.unwrap_or_default()
            })
            .collect();
        Ok(ids)
    }

    async fn titles_by_id(&self, ids: &[ObjectId]) -> Result<HashMap<ObjectId, String>> {
        Ok(self
            .tags
            .iter()
            .filter_map(|entry| {
                let id = entry._id?;
                ids.contains(&id).then(|| (id, entry.title.clone()))
            })
            .collect())
    }
}

#[async_trait]
impl ShareLinkRegistry for MemoryStore {
    async fn find_or_create_link(
        &self,
        owner: &ObjectId,
        candidate_hash: &str,
    ) -> Result<LinkDoc> {
        match self.links.entry(*owner) {
            Entry::Occupied(existing) => Ok(existing.get().clone()),
            Entry::Vacant(slot) => {
                match self.link_owners.entry(candidate_hash.to_string()) {
                    Entry::Occupied(_) => {
                        return Err(BrainError::Conflict("share hash already bound".into()))
                    }
                    Entry::Vacant(hash_slot) => {
                        hash_slot.insert(*owner);
                    }
                }

                let mut link = LinkDoc::new(candidate_hash.to_string(), *owner);
                link._id = Some(ObjectId::new());
                slot.insert(link.clone());
                Ok(link)
            }
        }
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<LinkDoc>> {
        let owner = match self.link_owners.get(hash) {
            Some(owner) => *owner,
            None => return Ok(None),
        };
        Ok(self
            .links
            .get(&owner)
            .filter(|link| link.hash == hash)
            .map(|link| link.clone()))
    }

    async fn delete_for_owner(&self, owner: &ObjectId) -> Result<u64> {
        match self.links.remove(owner) {
            Some((_, link)) => {
                self.link_owners.remove(&link.hash);
                Ok(1)
            }
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::ContentType;

    fn user(username: &str, email: &str) -> UserDoc {
        UserDoc::new(username.into(), email.into(), "$argon2id$stub".into())
    }

    fn item(owner: ObjectId, title: &str) -> ContentDoc {
        ContentDoc::new(
            owner,
            title.into(),
            "https://example.com".into(),
            ContentType::Article,
            vec![],
        )
    }

    #[tokio::test]
    async fn test_user_uniqueness() {
        let store = MemoryStore::new();
        let alice = store.create_user(user("alice", "alice@x.com")).await.unwrap();
        assert!(alice._id.is_some());
        assert!(!alice.share_enabled);

        let dup_name = store.create_user(user("alice", "other@x.com")).await;
        assert!(matches!(dup_name, Err(BrainError::Conflict(_))));

        let dup_email = store.create_user(user("alice2", "alice@x.com")).await;
        assert!(matches!(dup_email, Err(BrainError::Conflict(_))));

        // The failed email claim must not leave "alice2" reserved
        assert!(store.create_user(user("alice2", "a2@x.com")).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_signups_admit_one() {
        let store = std::sync::Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move {
                    // Alternate between a shared username and a shared email
                    let candidate = if i % 2 == 0 {
                        user("racer", &format!("racer{}@x.com", i))
                    } else {
                        user(&format!("racer{}", i), "racer@x.com")
                    };
                    store.create_user(candidate).await
                })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(BrainError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        // One winner for the shared username, one for the shared email
        assert_eq!(created, 2);
        assert!(store.usernames.contains_key("racer"));
        assert!(store.emails.contains_key("racer@x.com"));
        assert_eq!(store.users.len(), 2);
        assert_eq!(store.usernames.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_signups_same_email() {
        let store = std::sync::Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .create_user(user(&format!("user{}", i), "same@x.com"))
                        .await
                })
            })
            .collect();

        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results
            .iter()
            .filter(|r| r.is_err())
            .all(|r| matches!(r, Err(BrainError::Conflict(_)))));
        assert_eq!(store.users.len(), 1);
        // Losers must not leave their usernames reserved
        assert_eq!(store.usernames.len(), 1);
    }

    #[tokio::test]
    async fn test_share_flag() {
        let store = MemoryStore::new();
        let alice = store.create_user(user("alice", "alice@x.com")).await.unwrap();
        let id = alice._id.unwrap();

        store.set_share_enabled(&id, true).await.unwrap();
        store.set_share_enabled(&id, true).await.unwrap();
        assert!(store.find_by_id(&id).await.unwrap().unwrap().share_enabled);

        store.set_share_enabled(&id, false).await.unwrap();
        assert!(!store.find_by_email("alice@x.com").await.unwrap().unwrap().share_enabled);

        // Unknown ids are ignored
        store.set_share_enabled(&ObjectId::new(), true).await.unwrap();
    }

    #[tokio::test]
    async fn test_content_scoped_by_owner() {
        let store = MemoryStore::new();
        let (alice, bob) = (ObjectId::new(), ObjectId::new());

        let first = store.insert_content(item(alice, "First title")).await.unwrap();
        store.insert_content(item(alice, "Second title")).await.unwrap();
        store.insert_content(item(bob, "Bob's title")).await.unwrap();

        let listed = store.list_by_owner(&alice).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].title, "First title");

        let first_id = first._id.unwrap();
        assert_eq!(store.delete_owned(&bob, &first_id).await.unwrap(), 0);
        assert_eq!(store.delete_owned(&alice, &first_id).await.unwrap(), 1);
        assert_eq!(store.delete_owned(&alice, &first_id).await.unwrap(), 0);
        assert_eq!(store.list_by_owner(&alice).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tags_find_or_create() {
        let store = MemoryStore::new();
        let first = store.ensure_tags(&["rust".into(), "db".into()]).await.unwrap();
        let second = store.ensure_tags(&["rust".into()]).await.unwrap();
        assert_eq!(first[0], second[0]);

        let titles = store.titles_by_id(&first).await.unwrap();
        assert_eq!(titles.get(&first[1]).map(String::as_str), Some("db"));
    }

    #[tokio::test]
    async fn test_link_binding() {
        let store = MemoryStore::new();
        let (alice, bob) = (ObjectId::new(), ObjectId::new());

        let link = store.find_or_create_link(&alice, "aaaa").await.unwrap();
        let again = store.find_or_create_link(&alice, "bbbb").await.unwrap();
        assert_eq!(link.hash, "aaaa");
        assert_eq!(again.hash, "aaaa");

        // Hash already bound to alice
        assert!(matches!(
            store.find_or_create_link(&bob, "aaaa").await,
            Err(BrainError::Conflict(_))
        ));

        assert_eq!(store.find_by_hash("aaaa").await.unwrap().unwrap().user_id, alice);
        assert_eq!(store.delete_for_owner(&alice).await.unwrap(), 1);
        assert_eq!(store.delete_for_owner(&alice).await.unwrap(), 0);
        assert!(store.find_by_hash("aaaa").await.unwrap().is_none());
    }
}
