//! HTTP server implementation using hyper

use bytes::Bytes;
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::TokenService;
use crate::config::Args;
use crate::routes::{self, BoxBody};
use crate::services::{AccountService, ContentService, SharingService};
use crate::store::{StorageBackend, Stores};
use crate::types::Result;

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub tokens: TokenService,
    pub accounts: AccountService,
    pub content: Arc<ContentService>,
    pub sharing: SharingService,
    /// Which store the services were wired to
    pub backend: StorageBackend,
    pub started_at: Instant,
}

impl AppState {
    /// Wire every service to `stores`
    ///
    /// Fails with a configuration error if the signing secret is unusable.
    pub fn new(args: Args, stores: Stores) -> Result<Self> {
        let tokens = TokenService::new(args.jwt_secret.as_deref(), args.jwt_expiry_seconds)?;

        let content = Arc::new(ContentService::new(
            stores.content.clone(),
            stores.tags.clone(),
        ));
        let accounts = AccountService::new(stores.credentials.clone(), tokens.clone());
        let sharing = SharingService::new(
            stores.credentials,
            stores.links,
            Arc::clone(&content),
            args.share_token_bytes,
        );

        Ok(Self {
            args,
            tokens,
            accounts,
            content,
            sharing,
            backend: stores.backend,
            started_at: Instant::now(),
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Brainlink listening on {} (storage: {})",
        state.args.listen,
        state.backend.as_str()
    );

    if state.backend == StorageBackend::Memory {
        warn!("In-memory storage - all data is lost on restart");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .preserve_header_case(true)
                        .title_case_headers(true)
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, Infallible> {
    info!("[{}] {} {}", addr, req.method(), req.uri().path());
    Ok(route(state, req).await)
}

/// Strip the configured API prefix; `None` if the path lies outside it
fn strip_api_prefix<'a>(prefix: &str, path: &'a str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }

    match path.strip_prefix(prefix)? {
        "" => Some("/"),
        rest if rest.starts_with('/') => Some(rest),
        _ => None,
    }
}

/// Route one request to its handler
///
/// Generic over the body so tests can drive the full routing table without a
/// socket.
pub async fn route<B>(state: Arc<AppState>, req: Request<B>) -> Response<BoxBody>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    if req.method() == Method::OPTIONS {
        return routes::cors_preflight();
    }

    let full_path = req.uri().path().to_string();
    let path = match strip_api_prefix(state.args.api_prefix(), &full_path) {
        Some(path) => path.to_string(),
        None => return routes::not_found_response(&full_path),
    };

    let (parts, body) = req.into_parts();
    let body: Bytes = match routes::read_body(body).await {
        Ok(body) => body,
        Err(e) => return routes::error_response(&e),
    };
    let req = Request::from_parts(parts, body);

    debug!("Dispatching {} {}", req.method(), path);

    match path.as_str() {
        "/" => {
            if req.method() == Method::GET {
                routes::liveness()
            } else {
                routes::method_not_allowed("GET, OPTIONS")
            }
        }
        "/health" => {
            if req.method() == Method::GET {
                routes::health_check(&state)
            } else {
                routes::method_not_allowed("GET, OPTIONS")
            }
        }
        p if p.starts_with("/auth/") => routes::handle_auth_request(req, p, &state)
            .await
            .unwrap_or_else(|| routes::not_found_response(&full_path)),
        p if p == "/content" => routes::handle_content_request(req, p, &state)
            .await
            .unwrap_or_else(|| routes::not_found_response(&full_path)),
        p if p.starts_with("/brain/") => routes::handle_brain_request(req, p, &state)
            .await
            .unwrap_or_else(|| routes::not_found_response(&full_path)),
        _ => routes::not_found_response(&full_path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_api_prefix() {
        assert_eq!(strip_api_prefix("", "/content"), Some("/content"));
        assert_eq!(strip_api_prefix("/api/v1", "/api/v1/content"), Some("/content"));
        assert_eq!(strip_api_prefix("/api/v1", "/api/v1"), Some("/"));
        assert_eq!(strip_api_prefix("/api/v1", "/api/v10/content"), None);
        assert_eq!(strip_api_prefix("/api/v1", "/content"), None);
    }
}
