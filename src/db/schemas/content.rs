//! Content document schema
//!
//! One saved link, owned by exactly one user.

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for content items
pub const CONTENT_COLLECTION: &str = "contents";

/// Kind of thing a link points at
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Image,
    Video,
    #[default]
    Article,
    Audio,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [
        ContentType::Image,
        ContentType::Video,
        ContentType::Article,
        ContentType::Audio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Image => "image",
            ContentType::Video => "video",
            ContentType::Article => "article",
            ContentType::Audio => "audio",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                format!("Type must be one of: image, video, article, audio (got '{}')", s)
            })
    }
}

/// Content document stored in MongoDB
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ContentDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata
    #[serde(default)]
    pub metadata: Metadata,

    pub title: String,

    pub link: String,

    #[serde(rename = "type")]
    pub content_type: ContentType,

    /// Referenced tag documents
    #[serde(default)]
    pub tags: Vec<ObjectId>,

    /// Owning user; never changes after insert
    pub user_id: ObjectId,
}

impl ContentDoc {
    /// Create a new content document
    pub fn new(
        user_id: ObjectId,
        title: String,
        link: String,
        content_type: ContentType,
        tags: Vec<ObjectId>,
    ) -> Self {
        Self {
            _id: None,
            metadata: Metadata::new(),
            title,
            link,
            content_type,
            tags,
            user_id,
        }
    }
}

impl IntoIndexes for ContentDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "user_id": 1 },
            Some(
                IndexOptions::builder()
                    .name("user_id_index".to_string())
                    .build(),
            ),
        )]
    }
}

impl MutMetadata for ContentDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}
