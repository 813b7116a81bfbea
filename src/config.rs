//! Configuration for Brainlink
//!
//! CLI arguments and environment variable handling using clap.
//! A `.env` file is loaded by `main` before parsing, so every flag can also
//! come from the environment.

use clap::Parser;
use std::net::SocketAddr;

/// Smallest accepted share token size in bytes (128 bits, 32 hex characters)
pub const MIN_SHARE_TOKEN_BYTES: usize = 16;

/// Largest accepted share token size in bytes
pub const MAX_SHARE_TOKEN_BYTES: usize = 64;

/// Minimum signing secret length
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Brainlink - second-brain bookmark service
#[derive(Parser, Debug, Clone)]
#[command(name = "brainlink")]
#[command(about = "Bookmark service with token auth and opt-in public share links")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:4000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "brainlink")]
    pub mongodb_db: String,

    /// Secret used to sign bearer tokens (required, at least 32 characters)
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Bearer token lifetime in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "86400")]
    pub jwt_expiry_seconds: u64,

    /// Development mode: fall back to the in-memory store when MongoDB is unreachable
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Externally reachable base URL used when building share links
    /// (e.g. "https://brain.example.com"). Falls back to the request Host header.
    #[arg(long, env = "PUBLIC_URL")]
    pub public_url: Option<String>,

    /// Path prefix every API route is mounted under (e.g. "/api/v1")
    #[arg(long, env = "API_PREFIX", default_value = "")]
    pub api_prefix: String,

    /// Random bytes per share token (hex encoded, so the token is twice as long)
    #[arg(long, env = "SHARE_TOKEN_BYTES", default_value = "16")]
    pub share_token_bytes: usize,
}

impl Args {
    /// API prefix without a trailing slash ("" when unset)
    pub fn api_prefix(&self) -> &str {
        self.api_prefix.trim_end_matches('/')
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        match self.jwt_secret.as_deref() {
            None | Some("") => return Err("JWT_SECRET is required".to_string()),
            Some(secret) if secret.len() < MIN_JWT_SECRET_LEN => {
                return Err(format!(
                    "JWT_SECRET must be at least {} characters",
                    MIN_JWT_SECRET_LEN
                ))
            }
            Some(_) => {}
        }

        if self.jwt_expiry_seconds == 0 {
            return Err("JWT_EXPIRY_SECONDS must be greater than zero".to_string());
        }

        if !(MIN_SHARE_TOKEN_BYTES..=MAX_SHARE_TOKEN_BYTES).contains(&self.share_token_bytes) {
            return Err(format!(
                "SHARE_TOKEN_BYTES must be between {} and {}",
                MIN_SHARE_TOKEN_BYTES, MAX_SHARE_TOKEN_BYTES
            ));
        }

        let prefix = self.api_prefix();
        if !prefix.is_empty() && !prefix.starts_with('/') {
            return Err("API_PREFIX must start with '/'".to_string());
        }

        if let Some(ref public_url) = self.public_url {
            if url::Url::parse(public_url).is_err() {
                return Err(format!("PUBLIC_URL is not a valid URL: {}", public_url));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "a-test-secret-that-is-long-enough-for-hs256";

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["brainlink", "--jwt-secret", SECRET];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults_are_valid() {
        let args = args(&[]);
        assert!(args.validate().is_ok());
        assert_eq!(args.share_token_bytes, 16);
        assert_eq!(args.api_prefix(), "");
    }

    #[test]
    fn test_short_secret_rejected() {
        let args = Args::parse_from(["brainlink", "--jwt-secret", "short"]);
        assert!(args.validate().unwrap_err().contains("at least"));
    }

    #[test]
    fn test_token_bytes_bounds() {
        assert!(args(&["--share-token-bytes", "8"]).validate().is_err());
        assert!(args(&["--share-token-bytes", "15"]).validate().is_err());
        assert!(args(&["--share-token-bytes", "16"]).validate().is_ok());
        assert!(args(&["--share-token-bytes", "64"]).validate().is_ok());
        assert!(args(&["--share-token-bytes", "65"]).validate().is_err());
    }

    #[test]
    fn test_api_prefix() {
        let args_ok = args(&["--api-prefix", "/api/v1/"]);
        assert!(args_ok.validate().is_ok());
        assert_eq!(args_ok.api_prefix(), "/api/v1");

        assert!(args(&["--api-prefix", "api"]).validate().is_err());
    }

    #[test]
    fn test_public_url_must_parse() {
        assert!(args(&["--public-url", "https://brain.example.com"]).validate().is_ok());
        assert!(args(&["--public-url", "not a url"]).validate().is_err());
    }
}
