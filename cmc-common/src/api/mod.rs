//! API module for shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY:
//! - Pure functions (no HTTP framework dependencies)
//! - Shared types
//!
//! The service crate wraps these with axum extractors and middleware.

pub mod auth;
pub mod types;

pub use auth::{generate_salt, generate_session_token, hash_password, verify_password, AuthError};
pub use types::{ErrorBody, ErrorResponse, Paginated};
