//! Users Domain
//!
//! Backoffice staff accounts: login, profile, account management and the
//! admin bootstrap used by the `reset-admin` command.
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_users::{handlers, InMemoryUserRepository, UserService};
//!
//! let auth = JwtAuth::new(&JwtConfig::new("x".repeat(32), 3600).unwrap());
//! let service = UserService::new(InMemoryUserRepository::new(), auth.clone());
//! let auth = auth.with_staff_validator(service.principal_validator());
//! let router = handlers::router(service, auth);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{UserError, UserResult};
pub use models::{
    AdminReset, CreateUser, LoginRequest, LoginResponse, LoginUser, User, UserResponse, UserRole,
};
pub use postgres::PgUserRepository;
pub use repository::{InMemoryUserRepository, UserRepository};
pub use service::UserService;
