//! Share link document schema
//!
//! Binds an unguessable hex token to the user whose brain it exposes.
//! Both fields carry unique indexes: one link per owner, one owner per token.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for share links
pub const LINK_COLLECTION: &str = "links";

/// Share link document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct LinkDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Hex-encoded random token
    pub hash: String,

    /// Owner of the shared brain
    pub user_id: ObjectId,
}

impl LinkDoc {
    pub fn new(hash: String, user_id: ObjectId) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            hash,
            user_id,
        }
    }
}

impl IntoIndexes for LinkDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "hash": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("hash_unique".to_string())
                        .build(),
                ),
            ),
            (
                doc! { "user_id": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("user_id_unique".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for LinkDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
