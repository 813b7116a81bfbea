//! HTTP server for Brainlink

pub mod http;

pub use http::{route, run, AppState};
