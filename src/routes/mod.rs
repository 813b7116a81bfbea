//! HTTP routes for Brainlink

pub mod auth_routes;
pub mod brain;
pub mod content;
pub mod health;
pub mod response;

pub use auth_routes::handle_auth_request;
pub use brain::{handle_brain_request, share_base_url};
pub use content::handle_content_request;
pub use health::{health_check, liveness};
pub use response::{
    cors_preflight, error_response, json_response, method_not_allowed, not_found_response,
    read_body, BoxBody,
};
