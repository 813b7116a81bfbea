//! Request validation
//!
//! Raw request bodies deserialize into permissive `*Request` structs (every
//! field optional) and are checked here, so one response can report every bad
//! field at once. Nothing reaches a store before it passes.

use serde::Deserialize;
use serde_json::Value;

use crate::db::schemas::ContentType;
use crate::types::{BrainError, FieldErrors, Result};

pub const USERNAME_MIN_LEN: usize = 3;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 100;
pub const TITLE_MIN_LEN: usize = 5;
pub const TAG_MAX_LEN: usize = 50;
pub const MAX_TAGS: usize = 20;

/// POST /auth/signup body
#[derive(Debug, Default, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /auth/signin body
#[derive(Debug, Default, Deserialize)]
pub struct SigninRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// POST /content body
#[derive(Debug, Default, Deserialize)]
pub struct CreateContentRequest {
    pub title: Option<String>,
    pub link: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// DELETE /content body
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteContentRequest {
    pub content_id: Option<String>,
}

/// POST /brain/share body
#[derive(Debug, Default, Deserialize)]
pub struct ShareRequest {
    pub share: Option<Value>,
}

/// Signup input that passed validation
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Signin input with both fields present
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Content input that passed validation
#[derive(Debug, Clone)]
pub struct NewContent {
    pub title: String,
    pub link: String,
    pub content_type: ContentType,
    /// Normalized, de-duplicated tag titles
    pub tags: Vec<String>,
}

/// Loose email shape check: one '@', non-empty local part, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

pub fn validate_signup(req: SignupRequest) -> Result<NewAccount> {
    let mut errors = FieldErrors::new();

    let username = req.username.unwrap_or_default();
    if username.chars().count() < USERNAME_MIN_LEN {
        errors.add("username", "Username too short");
    }

    let email = req.email.unwrap_or_default().trim().to_string();
    if !is_valid_email(&email) {
        errors.add("email", "Invalid Email");
    }

    let password = req.password.unwrap_or_default();
    let password_len = password.chars().count();
    if password_len < PASSWORD_MIN_LEN {
        errors.add("password", "Password too short");
    } else if password_len > PASSWORD_MAX_LEN {
        errors.add("password", "Password too long");
    }

    errors.into_result(NewAccount {
        username,
        email,
        password,
    })
}

pub fn validate_signin(req: SigninRequest) -> Result<Credentials> {
    match (req.email, req.password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
            Ok(Credentials {
                email: email.trim().to_string(),
                password,
            })
        }
        _ => Err(BrainError::BadRequest("Email & Password are required".into())),
    }
}

/// Trim, lower-case and de-duplicate tag titles, keeping first-seen order
pub fn normalize_tags(raw: &[String], errors: &mut FieldErrors) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    for tag in raw {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() || tags.contains(&tag) {
            continue;
        }
        if tag.chars().count() > TAG_MAX_LEN {
            errors.add("tags", format!("Tag '{}' is too long", tag));
            continue;
        }
        tags.push(tag);
    }

    if tags.len() > MAX_TAGS {
        errors.add("tags", format!("At most {} tags are allowed", MAX_TAGS));
    }

    tags
}

pub fn validate_content(req: CreateContentRequest) -> Result<NewContent> {
    let mut errors = FieldErrors::new();

    let title = req.title.unwrap_or_default();
    if title.trim().is_empty() {
        errors.add("title", "Title is required");
    } else if title.chars().count() < TITLE_MIN_LEN {
        errors.add("title", "Title is too short");
    }

    let link = req.link.unwrap_or_default();
    if url::Url::parse(&link).is_err() {
        errors.add("link", "Invalid url");
    }

    let content_type = match req.content_type.as_deref().map(str::parse::<ContentType>) {
        Some(Ok(t)) => Some(t),
        Some(Err(msg)) => {
            errors.add("type", msg);
            None
        }
        None => {
            errors.add("type", "Type is required");
            None
        }
    };

    let tags = normalize_tags(&req.tags, &mut errors);

    match content_type {
        Some(content_type) if errors.is_empty() => Ok(NewContent {
            title,
            link,
            content_type,
            tags,
        }),
        _ => Err(BrainError::Validation(errors)),
    }
}

/// Coerce the `share` field the way loosely-typed clients send it
pub fn parse_share_flag(req: ShareRequest) -> Result<bool> {
    let invalid = || {
        BrainError::BadRequest("The 'share' property must be a boolean (true or false)".into())
    };

    match req.share.ok_or_else(invalid)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().map(|f| f != 0.0).unwrap_or(false)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(true),
            "false" | "0" | "no" | "off" | "" => Ok(false),
            _ => Err(invalid()),
        },
        _ => Err(invalid()),
    }
}
