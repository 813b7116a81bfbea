//! Error types for Brainlink
//!
//! Every failure a request can hit maps onto one `BrainError` variant, and each
//! variant maps onto exactly one HTTP status. Storage, configuration and
//! internal failures are opaque to clients: the detail is logged, never sent.

use std::collections::BTreeMap;
use std::fmt;

use hyper::StatusCode;
use serde::Serialize;

/// Per-field validation messages, keyed by request field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for a field, if any
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(value)` when nothing was recorded, otherwise a validation error
    pub fn into_result<T>(self, value: T) -> Result<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(BrainError::Validation(self))
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "{}", fields.join(", "))
    }
}

/// Main error type for Brainlink operations
#[derive(Debug, thiserror::Error)]
pub enum BrainError {
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Missing auth token")]
    MissingToken,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Deliberately conflates "does not exist" with "belongs to someone else"
    #[error("Not found or forbidden: {0}")]
    NotFoundOrForbidden(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BrainError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::MissingToken | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) | Self::NotFoundOrForbidden(_) => StatusCode::NOT_FOUND,
            Self::Config(_) | Self::Storage(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable code for response bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Conflict(_) => "CONFLICT",
            Self::MissingToken => "MISSING_TOKEN",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::NotFoundOrForbidden(_) => "NOT_FOUND",
            Self::Config(_) | Self::Storage(_) | Self::Internal(_) => "SERVER_ERROR",
        }
    }

    /// Message safe to show a client
    pub fn public_message(&self) -> String {
        match self {
            Self::Validation(_) => "Invalid input".to_string(),
            Self::MissingToken => "Please provide an auth token".to_string(),
            Self::Unauthorized(_) => "Unauthorized access".to_string(),
            Self::BadRequest(msg)
            | Self::Conflict(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::NotFoundOrForbidden(msg) => msg.clone(),
            Self::Config(_) | Self::Storage(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
        }
    }

    /// Whether the failure is on our side rather than the caller's
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl From<std::io::Error> for BrainError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<tokio::task::JoinError> for BrainError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("Background task failed: {}", err))
    }
}

/// Result type alias for Brainlink operations
pub type Result<T> = std::result::Result<T, BrainError>;
