//! Customers Domain
//!
//! Storefront accounts (registration, login, own profile) and the backoffice
//! views over them: filtered listing, order history, edits and counts.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_catalog::InMemoryCatalogRepository;
//! use domain_customers::{handlers, CustomerService, InMemoryCustomerRepository};
//! use domain_orders::InMemoryOrderRepository;
//!
//! let auth = JwtAuth::new(&JwtConfig::new("x".repeat(32), 3600).unwrap());
//! let orders = Arc::new(InMemoryOrderRepository::new(InMemoryCatalogRepository::new()));
//! let service = CustomerService::new(InMemoryCustomerRepository::new(), orders, auth.clone());
//! let router = handlers::router(service, auth);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{CustomerError, CustomerResult};
pub use models::{
    AuthResponse, Customer, CustomerChanges, CustomerFilter, CustomerResponse, CustomerStats,
    CustomerWithOrders, LoginCustomer, RegisterCustomer, UpdateCustomer, UpdateCustomerStatus,
};
pub use postgres::PgCustomerRepository;
pub use repository::{CustomerRepository, InMemoryCustomerRepository};
pub use service::CustomerService;
