//! # CMC Common Library
//!
//! Shared code for the Cathay Metal Corporation HR services including:
//! - Database schema initialization and migrations
//! - Configuration loading and root folder resolution
//! - Password hashing and session token helpers
//! - Shared API request/response types
//! - Timestamp utilities

pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
