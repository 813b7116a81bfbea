//! HTTP API integration tests
//!
//! Drive the full routing table against the in-memory store.

use std::sync::Arc;

use brainlink::store::Stores;
use brainlink::{route, AppState, Args};
use bytes::Bytes;
use clap::Parser;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request, StatusCode};
use serde_json::{json, Value};

const SECRET: &str = "integration-test-secret-at-least-32-chars";

fn state_with(extra: &[&str]) -> Arc<AppState> {
    let mut argv = vec!["brainlink", "--jwt-secret", SECRET];
    argv.extend_from_slice(extra);
    let args = Args::parse_from(argv);
    Arc::new(AppState::new(args, Stores::memory()).expect("state"))
}

fn state() -> Arc<AppState> {
    state_with(&[])
}

struct Reply {
    status: StatusCode,
    body: Value,
    raw: Bytes,
}

async fn call(
    state: &Arc<AppState>,
    method: Method,
    path: &str,
    auth: Option<&str>,
    body: Option<Value>,
) -> Reply {
    let mut builder = Request::builder()
        .method(method)
        .uri(path)
        .header("host", "localhost:4000");
    if let Some(value) = auth {
        builder = builder.header("authorization", value);
    }
    let payload = body.map(|v| v.to_string()).unwrap_or_default();
    let req = builder.body(Full::new(Bytes::from(payload))).unwrap();

    let response = route(Arc::clone(state), req).await;
    let status = response.status();
    let raw = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);

    Reply { status, body, raw }
}

async fn signup(state: &Arc<AppState>, username: &str, email: &str) {
    let reply = call(
        state,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({ "username": username, "email": email, "password": "password123" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
    assert_eq!(reply.body["user"]["username"], username);
    assert_eq!(reply.body["user"]["email"], email);
    assert_eq!(reply.body["user"]["id"].as_str().map(str::len), Some(24));
    assert!(reply.body["user"].get("password").is_none());
}

async fn signin(state: &Arc<AppState>, email: &str) -> String {
    let reply = call(
        state,
        Method::POST,
        "/auth/signin",
        None,
        Some(json!({ "email": email, "password": "password123" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
    format!("Bearer {}", reply.body["token"].as_str().unwrap())
}

async fn add_content(state: &Arc<AppState>, auth: &str, title: &str) -> Reply {
    call(
        state,
        Method::POST,
        "/content",
        Some(auth),
        Some(json!({ "title": title, "link": "https://example.com", "type": "article" })),
    )
    .await
}

#[tokio::test]
async fn test_save_list_and_share_flow() {
    let state = state();
    signup(&state, "alice", "alice@x.com").await;
    let auth = signin(&state, "alice@x.com").await;

    let created = add_content(&state, &auth, "My Article Title").await;
    assert_eq!(created.status, StatusCode::CREATED);

    let listed = call(&state, Method::GET, "/content", Some(&auth), None).await;
    assert_eq!(listed.status, StatusCode::OK);
    let items = listed.body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["title"], "My Article Title");
    assert_eq!(items[0]["type"], "article");

    let shared = call(
        &state,
        Method::POST,
        "/brain/share",
        Some(&auth),
        Some(json!({ "share": true })),
    )
    .await;
    assert_eq!(shared.status, StatusCode::OK);
    let link = shared.body["link"].as_str().unwrap();
    let hash = link.rsplit('/').next().unwrap().to_string();
    assert_eq!(link, format!("http://localhost:4000/brain/{}", hash));
    assert_eq!(hash.len(), 32);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));

    // Public read needs no token
    let public = call(&state, Method::GET, &format!("/brain/{}", hash), None, None).await;
    assert_eq!(public.status, StatusCode::OK);
    assert_eq!(public.body["username"], "alice");
    let content = public.body["content"].as_array().unwrap();
    assert_eq!(content.len(), 1);
    assert_eq!(content[0]["link"], "https://example.com");
    assert_eq!(content[0]["tags"], json!([]));

    // Enabling again returns the same link
    let again = call(
        &state,
        Method::POST,
        "/brain/share",
        Some(&auth),
        Some(json!({ "share": "true" })),
    )
    .await;
    assert_eq!(again.body["link"], shared.body["link"]);
}

#[tokio::test]
async fn test_signup_rules() {
    let state = state();
    signup(&state, "alice", "alice@x.com").await;

    let duplicate = call(
        &state,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({ "username": "alice", "email": "other@x.com", "password": "password123" })),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let invalid = call(
        &state,
        Method::POST,
        "/auth/signup",
        None,
        Some(json!({ "username": "al", "email": "nope", "password": "short" })),
    )
    .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["code"], "VALIDATION_ERROR");
    assert!(invalid.body["errors"]["username"].is_array());
    assert!(invalid.body["errors"]["email"].is_array());
    assert!(invalid.body["errors"]["password"].is_array());
}

#[tokio::test]
async fn test_signin_failures() {
    let state = state();
    signup(&state, "alice", "alice@x.com").await;

    let wrong = call(
        &state,
        Method::POST,
        "/auth/signin",
        None,
        Some(json!({ "email": "alice@x.com", "password": "not-the-password" })),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::FORBIDDEN);

    let unknown = call(
        &state,
        Method::POST,
        "/auth/signin",
        None,
        Some(json!({ "email": "ghost@x.com", "password": "password123" })),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::FORBIDDEN);
    assert_eq!(unknown.body["message"], wrong.body["message"]);

    let missing = call(
        &state,
        Method::POST,
        "/auth/signin",
        None,
        Some(json!({ "email": "alice@x.com" })),
    )
    .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_guard_rejections() {
    let state = state();

    let missing = call(&state, Method::GET, "/content", None, None).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);
    assert_eq!(missing.body["code"], "MISSING_TOKEN");

    let garbage = call(&state, Method::GET, "/content", Some("Bearer garbage"), None).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.body["code"], "UNAUTHORIZED");

    let share = call(
        &state,
        Method::POST,
        "/brain/share",
        None,
        Some(json!({ "share": true })),
    )
    .await;
    assert_eq!(share.status, StatusCode::UNAUTHORIZED);

    // A bare token without the Bearer prefix is accepted
    signup(&state, "alice", "alice@x.com").await;
    let auth = signin(&state, "alice@x.com").await;
    let bare = auth.trim_start_matches("Bearer ");
    let listed = call(&state, Method::GET, "/content", Some(bare), None).await;
    assert_eq!(listed.status, StatusCode::OK);
}

#[tokio::test]
async fn test_content_validation_and_delete() {
    let state = state();
    signup(&state, "alice", "alice@x.com").await;
    signup(&state, "bob", "bob@x.com").await;
    let alice = signin(&state, "alice@x.com").await;
    let bob = signin(&state, "bob@x.com").await;

    let short = add_content(&state, &alice, "Tiny").await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert!(short.body["errors"]["title"].is_array());

    let created = add_content(&state, &alice, "Alice's saved post").await;
    let id = created.body["content"]["id"].as_str().unwrap().to_string();

    let no_id = call(&state, Method::DELETE, "/content", Some(&alice), Some(json!({}))).await;
    assert_eq!(no_id.status, StatusCode::BAD_REQUEST);

    let by_bob = call(
        &state,
        Method::DELETE,
        "/content",
        Some(&bob),
        Some(json!({ "contentId": id })),
    )
    .await;
    assert_eq!(by_bob.status, StatusCode::NOT_FOUND);

    let by_alice = call(
        &state,
        Method::DELETE,
        "/content",
        Some(&alice),
        Some(json!({ "contentId": id })),
    )
    .await;
    assert_eq!(by_alice.status, StatusCode::OK);

    let listed = call(&state, Method::GET, "/content", Some(&alice), None).await;
    assert_eq!(listed.body["data"], json!([]));
}

#[tokio::test]
async fn test_disable_sharing() {
    let state = state();
    signup(&state, "alice", "alice@x.com").await;
    let auth = signin(&state, "alice@x.com").await;

    let shared = call(
        &state,
        Method::POST,
        "/brain/share",
        Some(&auth),
        Some(json!({ "share": true })),
    )
    .await;
    let link = shared.body["link"].as_str().unwrap().to_string();
    let path = link.trim_start_matches("http://localhost:4000").to_string();

    let disabled = call(
        &state,
        Method::POST,
        "/brain/share",
        Some(&auth),
        Some(json!({ "share": false })),
    )
    .await;
    assert_eq!(disabled.status, StatusCode::OK);
    assert_eq!(disabled.body["message"], "Sharing disabled successfully");

    let gone = call(&state, Method::GET, &path, None, None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);

    let invalid = call(
        &state,
        Method::POST,
        "/brain/share",
        Some(&auth),
        Some(json!({ "share": "maybe" })),
    )
    .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_routing_table() {
    let state = state();

    let alive = call(&state, Method::GET, "/", None, None).await;
    assert_eq!(alive.status, StatusCode::OK);
    assert_eq!(&alive.raw[..], b"API is alive and running!");

    let health = call(&state, Method::GET, "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body["healthy"], true);
    assert_eq!(health.body["storage"], "memory");

    let preflight = call(&state, Method::OPTIONS, "/content", None, None).await;
    assert_eq!(preflight.status, StatusCode::NO_CONTENT);

    let unknown = call(&state, Method::GET, "/nowhere", None, None).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let wrong_method = call(&state, Method::PUT, "/content", None, None).await;
    assert_eq!(wrong_method.status, StatusCode::METHOD_NOT_ALLOWED);

    let get_signup = call(&state, Method::GET, "/auth/signup", None, None).await;
    assert_eq!(get_signup.status, StatusCode::METHOD_NOT_ALLOWED);

    let bad_link = call(&state, Method::GET, "/brain/not-a-token", None, None).await;
    assert_eq!(bad_link.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_prefix_and_public_url() {
    let state = state_with(&[
        "--api-prefix",
        "/api/v1",
        "--public-url",
        "https://brain.example.com/",
    ]);

    let outside = call(&state, Method::GET, "/health", None, None).await;
    assert_eq!(outside.status, StatusCode::NOT_FOUND);

    let inside = call(&state, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(inside.status, StatusCode::OK);

    let reply = call(
        &state,
        Method::POST,
        "/api/v1/auth/signup",
        None,
        Some(json!({ "username": "alice", "email": "alice@x.com", "password": "password123" })),
    )
    .await;
    assert_eq!(reply.status, StatusCode::CREATED);

    let reply = call(
        &state,
        Method::POST,
        "/api/v1/auth/signin",
        None,
        Some(json!({ "email": "alice@x.com", "password": "password123" })),
    )
    .await;
    let auth = format!("Bearer {}", reply.body["token"].as_str().unwrap());

    let shared = call(
        &state,
        Method::POST,
        "/api/v1/brain/share",
        Some(&auth),
        Some(json!({ "share": 1 })),
    )
    .await;
    let link = shared.body["link"].as_str().unwrap();
    assert!(link.starts_with("https://brain.example.com/api/v1/brain/"));
}

#[tokio::test]
async fn test_oversized_body_rejected() {
    let state = state();
    let huge = json!({ "username": "a".repeat(20 * 1024), "email": "a@x.com", "password": "password123" });
    let reply = call(&state, Method::POST, "/auth/signup", None, Some(huge)).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}
