//! Response and request-body helpers shared by every route

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, ALLOW, CONTENT_TYPE,
};
use hyper::{Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::types::{BrainError, FieldErrors, Result};

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest accepted request body
pub const MAX_BODY_BYTES: usize = 10 * 1024;

const ALLOWED_METHODS: &str = "GET, POST, DELETE, OPTIONS";

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

/// Body carrying only a message
#[derive(Serialize)]
struct MessageBody<'a> {
    message: &'a str,
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

fn with_cors(mut response: Response<BoxBody>) -> Response<BoxBody> {
    let headers = response.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    let mut response = Response::new(full_body(json));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    with_cors(response)
}

pub fn message_response(status: StatusCode, message: &str) -> Response<BoxBody> {
    json_response(status, &MessageBody { message })
}

pub fn text_response(status: StatusCode, text: &'static str) -> Response<BoxBody> {
    let mut response = Response::new(full_body(text));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    with_cors(response)
}

pub fn cors_preflight() -> Response<BoxBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
        .headers_mut()
        .insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static("86400"));
    with_cors(response)
}

/// Render an error; server-side detail goes to the log, not the client
pub fn error_response(err: &BrainError) -> Response<BoxBody> {
    if err.is_server_error() {
        error!("Request failed: {}", err);
    } else {
        debug!("Request rejected: {}", err);
    }

    let errors = match err {
        BrainError::Validation(fields) => Some(fields),
        _ => None,
    };

    json_response(
        err.status_code(),
        &ErrorBody {
            message: err.public_message(),
            code: err.code(),
            errors,
        },
    )
}

pub fn not_found_response(path: &str) -> Response<BoxBody> {
    debug!("No route for {}", path);
    message_response(StatusCode::NOT_FOUND, "Route not found")
}

pub fn method_not_allowed(allow: &'static str) -> Response<BoxBody> {
    let mut response = message_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
    response
        .headers_mut()
        .insert(ALLOW, HeaderValue::from_static(allow));
    response
}

/// Buffer a request body, refusing anything over `MAX_BODY_BYTES`
pub async fn read_body<B>(body: B) -> Result<Bytes>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => {
            Err(BrainError::BadRequest("Request body too large".into()))
        }
        Err(e) => Err(BrainError::BadRequest(format!("Failed to read body: {}", e))),
    }
}

/// Decode a buffered JSON body; an empty body reads as `{}`
pub fn parse_json_body<T: DeserializeOwned>(req: &Request<Bytes>) -> Result<T> {
    let bytes: &[u8] = match req.body().as_ref() {
        b if b.iter().all(u8::is_ascii_whitespace) => &b"{}"[..],
        b => b,
    };

    serde_json::from_slice(bytes)
        .map_err(|e| BrainError::BadRequest(format!("Invalid JSON body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct NameOnly {
        name: Option<String>,
    }

    #[tokio::test]
    async fn test_read_body_limit() {
        let ok = read_body(Full::new(Bytes::from_static(b"{}"))).await.unwrap();
        assert_eq!(&ok[..], b"{}");

        let big = Bytes::from(vec![b'a'; MAX_BODY_BYTES + 1]);
        assert!(matches!(
            read_body(Full::new(big)).await,
            Err(BrainError::BadRequest(msg)) if msg.contains("too large")
        ));
    }

    #[test]
    fn test_parse_json_body() {
        let req = Request::new(Bytes::from_static(br#"{"name":"alice"}"#));
        let parsed: NameOnly = parse_json_body(&req).unwrap();
        assert_eq!(parsed.name.as_deref(), Some("alice"));

        let empty = Request::new(Bytes::new());
        let parsed: NameOnly = parse_json_body(&empty).unwrap();
        assert!(parsed.name.is_none());

        let broken = Request::new(Bytes::from_static(b"{not json"));
        assert!(parse_json_body::<NameOnly>(&broken).is_err());
    }

    #[test]
    fn test_error_response_shape() {
        let mut fields = FieldErrors::new();
        fields.add("title", "Title is too short");
        let response = error_response(&BrainError::Validation(fields));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );

        let response = error_response(&BrainError::Storage("connection reset".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
