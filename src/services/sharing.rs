//! Share links and the public read path
//!
//! Per-user states:
//! - Disabled: no link row, `share_enabled == false`
//! - Enabled: link row exists, `share_enabled == true`
//!
//! `enable` reuses an existing link so a user's URL is stable across toggles
//! until they disable sharing, which deletes the row. `resolve` is the only
//! unauthenticated read in the service.

use std::sync::Arc;

use rand::rngs::OsRng;
use rand::RngCore;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::Identity;
use crate::services::content::{ContentService, ContentView};
use crate::store::{CredentialStore, ShareLinkRegistry};
use crate::types::{BrainError, Result};

/// Fresh candidates tried when a new token collides with an existing one
const MAX_TOKEN_ATTEMPTS: usize = 3;

const INVALID_LINK: &str = "Invalid or expired share link";

/// An enabled share link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShareLinkView {
    pub hash: String,
    pub url: String,
}

/// Everything a visitor to a share link sees
#[derive(Debug, Clone, Serialize)]
pub struct SharedBrain {
    pub username: String,
    pub content: Vec<ContentView>,
}

pub struct SharingService {
    credentials: Arc<dyn CredentialStore>,
    links: Arc<dyn ShareLinkRegistry>,
    content: Arc<ContentService>,
    token_bytes: usize,
}

impl SharingService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        links: Arc<dyn ShareLinkRegistry>,
        content: Arc<ContentService>,
        token_bytes: usize,
    ) -> Self {
        Self {
            credentials,
            links,
            content,
            token_bytes,
        }
    }

    /// Random hex token from the OS CSPRNG
    fn generate_token(&self) -> String {
        let mut bytes = vec![0u8; self.token_bytes];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Whether `token` could have been produced by `generate_token`
    fn is_well_formed(&self, token: &str) -> bool {
        token.len() == self.token_bytes * 2
            && token
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    }

    /// Turn sharing on, returning the owner's (possibly existing) link
    ///
    /// `base_url` is prepended to `/brain/<hash>` when building the URL.
    pub async fn enable(&self, owner: &Identity, base_url: &str) -> Result<ShareLinkView> {
        let mut attempt = 0;
        let link = loop {
            attempt += 1;
            let candidate = self.generate_token();
            match self
                .links
                .find_or_create_link(&owner.user_id, &candidate)
                .await
            {
                Ok(link) => break link,
                Err(BrainError::Conflict(reason)) if attempt < MAX_TOKEN_ATTEMPTS => {
                    warn!("Share token collision (attempt {}): {}", attempt, reason);
                }
                Err(e) => return Err(e),
            }
        };

        self.credentials
            .set_share_enabled(&owner.user_id, true)
            .await?;

        info!("Sharing enabled for '{}'", owner.username);

        Ok(ShareLinkView {
            url: format!("{}/brain/{}", base_url.trim_end_matches('/'), link.hash),
            hash: link.hash,
        })
    }

    /// Turn sharing off and drop the link; safe to repeat
    pub async fn disable(&self, owner: &Identity) -> Result<()> {
        self.credentials
            .set_share_enabled(&owner.user_id, false)
            .await?;
        let removed = self.links.delete_for_owner(&owner.user_id).await?;

        info!(
            "Sharing disabled for '{}' ({} link removed)",
            owner.username, removed
        );
        Ok(())
    }

    /// Resolve a share token to its owner's public view
    pub async fn resolve(&self, hash: &str) -> Result<SharedBrain> {
        if !self.is_well_formed(hash) {
            debug!("Rejected malformed share token");
            return Err(BrainError::NotFound(INVALID_LINK.into()));
        }

        let link = self
            .links
            .find_by_hash(hash)
            .await?
            .ok_or_else(|| BrainError::NotFound(INVALID_LINK.into()))?;

        let owner = self
            .credentials
            .find_by_id(&link.user_id)
            .await?
            .ok_or_else(|| BrainError::NotFound("User not found".into()))?;

        if !owner.share_enabled {
            return Err(BrainError::Forbidden(
                "The user has disabled sharing for this link".into(),
            ));
        }

        let content = self.content.list(&link.user_id).await?;

        Ok(SharedBrain {
            username: owner.username,
            content,
        })
    }
}
