//! Brainlink - a second brain for saved links
//!
//! Users save links (articles, videos, images, audio) to a private collection
//! and can publish a read-only view of it behind an unguessable share link.
//!
//! ## Components
//!
//! - **Auth**: Argon2id credentials, HS256 bearer tokens, the access guard
//! - **Content**: owner-scoped create/list/delete with tag lookup
//! - **Sharing**: one share link per user, resolvable without a token while
//!   sharing is enabled
//! - **Storage**: MongoDB collections with unique indexes, or an in-memory
//!   store for development and tests

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod store;
pub mod types;

pub use config::Args;
pub use server::{route, run, AppState};
pub use types::{BrainError, Result};
