//! Access guard for owner-scoped routes
//!
//! Pulls the bearer token out of the `Authorization` header, verifies it and
//! hands back a typed `Identity`. Handlers receive that value as a parameter;
//! nothing is stashed on the transport request.

use bson::oid::ObjectId;
use hyper::header::{HeaderMap, AUTHORIZATION};
use tracing::warn;

use crate::auth::TokenService;
use crate::types::{BrainError, Result};

/// Verified caller identity for a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: ObjectId,
    pub username: String,
}

/// Extract token from Authorization header.
///
/// `Bearer <token>` yields everything after the first space; any other value
/// is taken whole as a raw token.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    let token = match header.strip_prefix("Bearer ") {
        Some(rest) => rest,
        None => header,
    };

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Authenticate a request from its headers
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<Identity> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let token = extract_token_from_header(header).ok_or(BrainError::MissingToken)?;

    tokens.verify(token).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        e
    })
}
