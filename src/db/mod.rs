//! Database layer for Brainlink
//!
//! Provides MongoDB storage for users, content, tags and share links.

pub mod mongo;
pub mod schemas;

pub use mongo::{MongoClient, MongoCollection};
pub use schemas::{ContentDoc, ContentType, LinkDoc, Metadata, TagDoc, UserDoc};
