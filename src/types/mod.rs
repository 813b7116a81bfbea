//! Shared types for Brainlink

pub mod error;

pub use error::{BrainError, FieldErrors, Result};
