//! HTTP routes for accounts
//!
//! - POST /auth/signup - Create an account
//! - POST /auth/signin - Exchange credentials for a bearer token

use bytes::Bytes;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;

use super::response::{
    error_response, json_response, method_not_allowed, parse_json_body, BoxBody,
};
use crate::server::AppState;
use crate::services::AccountView;
use crate::services::validation::{validate_signin, validate_signup, SigninRequest, SignupRequest};
use crate::types::Result;

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: &'static str,
    pub user: AccountView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninResponse {
    pub message: &'static str,
    pub token: String,
    /// Unix timestamp after which the token is rejected
    pub expires_at: u64,
}

// =============================================================================
// Route Handlers
// =============================================================================

async fn handle_signup(req: Request<Bytes>, state: &AppState) -> Result<Response<BoxBody>> {
    let body: SignupRequest = parse_json_body(&req)?;
    let account = validate_signup(body)?;
    let user = state.accounts.signup(account).await?;

    Ok(json_response(
        StatusCode::CREATED,
        &SignupResponse {
            message: "You are Signed Up",
            user,
        },
    ))
}

async fn handle_signin(req: Request<Bytes>, state: &AppState) -> Result<Response<BoxBody>> {
    let body: SigninRequest = parse_json_body(&req)?;
    let credentials = validate_signin(body)?;
    let issued = state.accounts.signin(credentials).await?;

    Ok(json_response(
        StatusCode::OK,
        &SigninResponse {
            message: "You are Signed In",
            token: issued.token,
            expires_at: issued.expires_at,
        },
    ))
}

// =============================================================================
// Router
// =============================================================================

/// Handle /auth/* requests; `None` if `path` is not an auth route
pub async fn handle_auth_request(
    req: Request<Bytes>,
    path: &str,
    state: &AppState,
) -> Option<Response<BoxBody>> {
    let method = req.method().clone();

    let result = match (&method, path) {
        (&Method::POST, "/auth/signup") => handle_signup(req, state).await,
        (&Method::POST, "/auth/signin") => handle_signin(req, state).await,
        (_, "/auth/signup") | (_, "/auth/signin") => Ok(method_not_allowed("POST, OPTIONS")),
        _ => return None,
    };

    Some(result.unwrap_or_else(|e| error_response(&e)))
}
