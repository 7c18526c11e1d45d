//! Stats Domain
//!
//! Backoffice reporting over the catalog, customers and orders: the dashboard
//! overview, daily sales, best sellers and monthly activity. Sales figures
//! only ever count approved payments.
//!
//! # Usage
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_stats::{handlers, PgStatsRepository, StatsService};
//! # fn example(db: sea_orm::DatabaseConnection) {
//! let auth = JwtAuth::new(&JwtConfig::new("x".repeat(32), 3600).unwrap());
//! let service = StatsService::new(PgStatsRepository::new(db));
//! let router = handlers::router(service, auth);
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{StatsError, StatsResult};
pub use models::{
    DailySales, Dashboard, MonthlyCount, MonthlyOrders, MonthsQuery, Overview, PaymentStatusCount,
    PeriodQuery, StatusCount, TopProduct, TopProductsQuery,
};
pub use postgres::PgStatsRepository;
pub use repository::StatsRepository;
pub use service::StatsService;
