//! HTTP routes for share links
//!
//! - POST /brain/share       - Toggle sharing for the caller (guarded)
//! - GET  /brain/{shareLink} - Public, read-only view of a shared brain

use bytes::Bytes;
use hyper::header::HOST;
use hyper::{HeaderMap, Method, Request, Response, StatusCode};
use serde::Serialize;

use super::response::{
    error_response, json_response, message_response, method_not_allowed, parse_json_body,
    BoxBody,
};
use crate::auth::authenticate;
use crate::server::AppState;
use crate::services::validation::{parse_share_flag, ShareRequest};
use crate::types::Result;

#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub link: String,
    pub hash: String,
}

/// Externally visible base of the API, without a trailing slash
///
/// `PUBLIC_URL` wins; otherwise the request's Host header, otherwise the
/// listen address.
pub fn share_base_url(state: &AppState, headers: &HeaderMap) -> String {
    let origin = match state.args.public_url.as_deref() {
        Some(url) if !url.is_empty() => url.trim_end_matches('/').to_string(),
        _ => match headers.get(HOST).and_then(|h| h.to_str().ok()) {
            Some(host) if !host.is_empty() => format!("http://{}", host),
            _ => format!("http://{}", state.args.listen),
        },
    };

    format!("{}{}", origin, state.args.api_prefix())
}

async fn handle_share(req: Request<Bytes>, state: &AppState) -> Result<Response<BoxBody>> {
    let identity = authenticate(req.headers(), &state.tokens)?;
    let body: ShareRequest = parse_json_body(&req)?;

    if parse_share_flag(body)? {
        let base = share_base_url(state, req.headers());
        let link = state.sharing.enable(&identity, &base).await?;
        Ok(json_response(
            StatusCode::OK,
            &ShareResponse {
                link: link.url,
                hash: link.hash,
            },
        ))
    } else {
        state.sharing.disable(&identity).await?;
        Ok(message_response(
            StatusCode::OK,
            "Sharing disabled successfully",
        ))
    }
}

async fn handle_shared_brain(hash: &str, state: &AppState) -> Result<Response<BoxBody>> {
    let brain = state.sharing.resolve(hash).await?;
    Ok(json_response(StatusCode::OK, &brain))
}

/// Handle /brain/* requests; `None` if `path` is not a brain route
pub async fn handle_brain_request(
    req: Request<Bytes>,
    path: &str,
    state: &AppState,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();

    let result = match (&method, path) {
        (&Method::POST, "/brain/share") => handle_share(req, state).await,
        (_, "/brain/share") => Ok(method_not_allowed("POST, OPTIONS")),
        (_, p) => {
            let hash = p.strip_prefix("/brain/")?;
            if method == Method::GET {
                handle_shared_brain(hash, state).await
            } else {
                Ok(method_not_allowed("GET, OPTIONS"))
            }
        }
    };

    Some(result.unwrap_or_else(|e| error_response(&e)))
}
