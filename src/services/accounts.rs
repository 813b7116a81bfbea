//! Signup and signin flows

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::auth::{hash_password_async, verify_password_async, IssuedToken, TokenService};
use crate::db::schemas::UserDoc;
use crate::services::validation::{Credentials, NewAccount};
use crate::store::CredentialStore;
use crate::types::{BrainError, Result};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Verified against when the email is unknown, so both failures cost one Argon2 run
const DUMMY_PASSWORD: &str = "brainlink-unknown-account";

/// Public view of a freshly created account
#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub id: String,
    pub username: String,
    pub email: String,
}

pub struct AccountService {
    credentials: Arc<dyn CredentialStore>,
    tokens: TokenService,
    /// Argon2 hash of `DUMMY_PASSWORD`, computed on first use
    dummy_hash: OnceCell<String>,
}

impl AccountService {
    pub fn new(credentials: Arc<dyn CredentialStore>, tokens: TokenService) -> Self {
        Self {
            credentials,
            tokens,
            dummy_hash: OnceCell::new(),
        }
    }

    async fn dummy_hash(&self) -> Result<String> {
        self.dummy_hash
            .get_or_try_init(|| hash_password_async(DUMMY_PASSWORD.to_string()))
            .await
            .cloned()
    }

    /// Hash the password and create the user; `Conflict` if taken
    pub async fn signup(&self, account: NewAccount) -> Result<AccountView> {
        let NewAccount {
            username,
            email,
            password,
        } = account;

        let password_hash = hash_password_async(password).await?;
        let user = self
            .credentials
            .create_user(UserDoc::new(username, email, password_hash))
            .await
            .map_err(|e| match e {
                BrainError::Conflict(reason) => {
                    debug!("Signup rejected: {}", reason);
                    BrainError::Conflict("Username or email already exists.".into())
                }
                other => other,
            })?;

        let id = user
            ._id
            .ok_or_else(|| BrainError::Storage("Created user has no _id".into()))?;

        info!("User '{}' signed up", user.username);

        Ok(AccountView {
            id: id.to_hex(),
            username: user.username,
            email: user.email,
        })
    }

    /// Verify credentials and issue a bearer token
    ///
    /// Unknown email and wrong password fail identically.
    pub async fn signin(&self, credentials: Credentials) -> Result<IssuedToken> {
        let Credentials { email, password } = credentials;

        let user = match self.credentials.find_by_email(&email).await? {
            Some(user) => user,
            None => {
                debug!("Signin for unknown email");
                let dummy = self.dummy_hash().await?;
                verify_password_async(password, dummy).await?;
                return Err(BrainError::Forbidden(INVALID_CREDENTIALS.into()));
            }
        };

        if !verify_password_async(password, user.password_hash.clone()).await? {
            debug!("Signin with wrong password for '{}'", user.username);
            return Err(BrainError::Forbidden(INVALID_CREDENTIALS.into()));
        }

        let id = user
            ._id
            .ok_or_else(|| BrainError::Storage("Stored user has no _id".into()))?;

        let issued = self.tokens.issue(&id, &user.username)?;
        info!("User '{}' signed in", user.username);
        Ok(issued)
    }
}
