//! Application services
//!
//! The flows behind each route. Services depend on the store traits only, so
//! the same code runs against MongoDB and the in-memory store.

pub mod accounts;
pub mod content;
pub mod sharing;
pub mod validation;

pub use accounts::{AccountService, AccountView};
pub use content::{ContentService, ContentView};
pub use sharing::{SharedBrain, ShareLinkView, SharingService};
