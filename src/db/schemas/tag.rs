//! Tag document schema

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for tags
pub const TAG_COLLECTION: &str = "tags";

/// Tag document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct TagDoc {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    #[serde(default)]
    pub metadata: Metadata,

    /// Normalized (trimmed, lower-case) title
    pub title: String,
}

impl TagDoc {
    pub fn new(title: String) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            title,
        }
    }
}

impl IntoIndexes for TagDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "title": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("title_unique".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for TagDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
