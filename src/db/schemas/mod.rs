//! Database schemas for Brainlink
//!
//! Defines MongoDB document structures for users, content, tags and share links.

mod content;
mod link;
mod metadata;
mod tag;
mod user;

pub use content::{ContentDoc, ContentType, CONTENT_COLLECTION};
pub use link::{LinkDoc, LINK_COLLECTION};
pub use metadata::Metadata;
pub use tag::{TagDoc, TAG_COLLECTION};
pub use user::{UserDoc, USER_COLLECTION};
