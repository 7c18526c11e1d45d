//! PostgreSQL access shared by the shop domains.
//!
//! - [`postgres`]: pool configuration from the environment, connection with
//!   retry, migrations and the readiness probe
//! - [`repository`]: [`BaseRepository`], the generic CRUD core each domain's
//!   sea-orm repository wraps
//! - [`common`]: error type and retry with exponential backoff
//!
//! ```ignore
//! use database::postgres::{PostgresConfig, connect_from_config_with_retry, run_migrations};
//! use core_config::FromEnv;
//!
//! let db = connect_from_config_with_retry(PostgresConfig::from_env()?, None).await?;
//! run_migrations::<migration::Migrator>(&db, "shop_api").await?;
//! ```

pub mod common;
pub mod postgres;
pub mod repository;

pub use common::{DatabaseError, DatabaseResult};
pub use repository::BaseRepository;
