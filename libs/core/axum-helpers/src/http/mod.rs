//! HTTP middleware module.
//!
//! - CORS with an origin allowlist and credentials
//! - Security headers on every response
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::http::{CorsConfig, create_cors_layer, security_headers};
//!
//! let cors = CorsConfig::from_env()?;
//! let app = Router::new()
//!     .layer(axum::middleware::from_fn(security_headers))
//!     .layer(create_cors_layer(&cors));
//! ```

pub mod cors;
pub mod security;

pub use cors::{CorsConfig, DEFAULT_ALLOWED_ORIGINS, create_cors_layer};
pub use security::security_headers;
