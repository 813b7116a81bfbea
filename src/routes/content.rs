//! HTTP routes for the caller's own content
//!
//! - POST   /content - Save an item
//! - GET    /content - List the caller's items
//! - DELETE /content - Delete one of the caller's items by `contentId`
//!
//! Every route here sits behind the access guard.

use bytes::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;

use super::response::{
    error_response, json_response, message_response, method_not_allowed, parse_json_body,
    BoxBody,
};
use crate::auth::{authenticate, Identity};
use crate::server::AppState;
use crate::services::validation::{validate_content, CreateContentRequest, DeleteContentRequest};
use crate::services::ContentView;
use crate::types::Result;

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub content: ContentView,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub message: &'static str,
    pub data: Vec<ContentView>,
}

async fn handle_create(
    req: Request<Bytes>,
    identity: &Identity,
    state: &AppState,
) -> Result<Response<BoxBody>> {
    let body: CreateContentRequest = parse_json_body(&req)?;
    let item = validate_content(body)?;
    let content = state.content.create(identity, item).await?;

    Ok(json_response(
        StatusCode::CREATED,
        &CreatedResponse {
            message: "Content created successfully",
            content,
        },
    ))
}

async fn handle_list(identity: &Identity, state: &AppState) -> Result<Response<BoxBody>> {
    let data = state.content.list(&identity.user_id).await?;

    Ok(json_response(
        StatusCode::OK,
        &ListResponse {
            message: "Content fetched successfully",
            data,
        },
    ))
}

async fn handle_delete(
    req: Request<Bytes>,
    identity: &Identity,
    state: &AppState,
) -> Result<Response<BoxBody>> {
    let body: DeleteContentRequest = parse_json_body(&req)?;
    state
        .content
        .delete(identity, body.content_id.as_deref())
        .await?;

    Ok(message_response(StatusCode::OK, "Content deleted successfully"))
}

async fn dispatch(req: Request<Bytes>, state: &AppState) -> Result<Response<BoxBody>> {
    let identity = authenticate(req.headers(), &state.tokens)?;
    let method = req.method().clone();

    match method {
        Method::POST => handle_create(req, &identity, state).await,
        Method::GET => handle_list(&identity, state).await,
        _ => handle_delete(req, &identity, state).await,
    }
}

/// Handle /content requests; `None` if `path` is not a content route
pub async fn handle_content_request(
    req: Request<Bytes>,
    path: &str,
    state: &AppState,
) -> Option<Response<BoxBody>> {
    if path != "/content" {
        return None;
    }

    if !matches!(*req.method(), Method::POST | Method::GET | Method::DELETE) {
        return Some(method_not_allowed("GET, POST, DELETE, OPTIONS"));
    }

    Some(
        dispatch(req, state)
            .await
            .unwrap_or_else(|e| error_response(&e)),
    )
}
