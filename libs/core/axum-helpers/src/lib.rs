//! # Axum Helpers
//!
//! Shared HTTP plumbing for the shop API and its domain crates.
//!
//! ## Modules
//!
//! - **[`auth`]**: JWT issuing/verification, staff and customer guards, password hashing
//! - **[`server`]**: Router assembly, health checks, graceful shutdown
//! - **[`http`]**: CORS allowlist and security headers
//! - **[`errors`]**: Structured error responses with error codes
//! - **[`extractors`]**: UUID path and validated JSON extractors
//! - **[`audit`]**: Audit logging for security-relevant actions
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum_helpers::{CorsConfig, create_production_app, create_router, health_router};
//! use core_config::{app_info, server::ServerConfig, FromEnv};
//!
//! let router = create_router::<ApiDoc>(api_routes, &CorsConfig::from_env()?)
//!     .merge(health_router(app_info!()));
//!
//! create_production_app(router, &ServerConfig::from_env()?, Duration::from_secs(30), async {}).await?;
//! ```

pub mod audit;
pub mod auth;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use auth::{
    AuthUser, JwtAuth, JwtClaims, JwtConfig, OptionalAuthUser, PrincipalKind, PrincipalValidator,
    hash_password, optional_auth, require_customer, require_staff, verify_password,
};

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, create_production_app, create_router,
    health_router, run_health_checks, shutdown_signal,
};

pub use http::{CorsConfig, create_cors_layer, security_headers};

pub use errors::{AppError, ErrorCode, ErrorResponse};

pub use extractors::{UuidPath, ValidatedJson};

pub use audit::{AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};
