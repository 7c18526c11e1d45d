//! Authentication and authorization.
//!
//! - HS256 JWT creation and verification for staff and customer principals
//! - Guards for staff-only and customer-only routes, plus optional auth
//! - Extractors reading verified claims from request extensions
//! - Argon2 password hashing shared by every domain that stores credentials
//!
//! # Example
//!
//! ```ignore
//! use axum_helpers::auth::{JwtAuth, JwtConfig, require_staff};
//! use core_config::FromEnv;
//!
//! let auth = JwtAuth::new(&JwtConfig::from_env()?);
//!
//! let admin = Router::new()
//!     .route("/users", get(list_users))
//!     .route_layer(axum::middleware::from_fn_with_state(auth, require_staff));
//! ```

pub mod config;
pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod password;

pub use config::JwtConfig;
pub use extractor::{AuthUser, OptionalAuthUser};
pub use jwt::{JwtAuth, JwtClaims, PrincipalKind, PrincipalValidator};
pub use middleware::{TOKEN_COOKIE, extract_token, optional_auth, require_customer, require_staff};
pub use password::{hash_password, verify_password};
