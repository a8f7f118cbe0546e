//! Shared building blocks for the notebook service.
//!
//! - [`config`]: server and database connection settings loaded from the environment
//! - [`errors`]: the application error type and its HTTP status mapping
//! - [`models`]: connection configuration and result-set value types
//! - [`middleware`]: request-scoped axum middleware

pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
