//! Authentication for Brainlink
//!
//! Provides:
//! - JWT bearer token issuance and verification
//! - The access guard that turns an `Authorization` header into an `Identity`
//! - Password hashing with Argon2

pub mod guard;
pub mod jwt;
pub mod password;

pub use guard::{authenticate, extract_token_from_header, Identity};
pub use jwt::{Claims, IssuedToken, TokenService};
pub use password::{hash_password, hash_password_async, verify_password, verify_password_async};
