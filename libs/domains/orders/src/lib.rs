//! Orders Domain
//!
//! Checkout with stock reservation, Webpay payments and carrier shipments.
//!
//! Placing an order prices it from current product rows, numbers it
//! `ORD-{year}-{n}` and takes the items out of stock in one transaction. A
//! rejected payment puts the stock back.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_catalog::InMemoryCatalogRepository;
//! use domain_orders::{handlers, InMemoryOrderRepository, OrderService, ShippingService, SimulatedWebpay};
//!
//! let auth = JwtAuth::new(&JwtConfig::new("x".repeat(32), 3600).unwrap());
//! let repo = InMemoryOrderRepository::new(InMemoryCatalogRepository::new());
//! let service = OrderService::new(
//!     repo,
//!     Arc::new(SimulatedWebpay::new("http://localhost:3000")),
//!     ShippingService::default(),
//!     "http://localhost:3000",
//! );
//! let router = handlers::router(service, auth);
//! ```

mod codes;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod payment;
pub mod postgres;
pub mod repository;
pub mod service;
pub mod shipping;

pub use error::{OrderError, OrderResult};
pub use models::{
    ConfirmWebpay, CreateOrder, CreateOrderItem, Order, OrderFilter, OrderItem, OrderStatus,
    OrderWithItems, PaymentMethod, PaymentOutcome, PaymentStatus, ShippingType, UpdateOrderStatus,
    WebpayRedirect,
};
pub use payment::{
    CreateTransaction, PaymentGateway, SimulatedWebpay, TransactionCommit, TransactionCreated,
    WebpayClient, WebpayConfig, WebpayEnvironment,
};
pub use postgres::PgOrderRepository;
pub use repository::{InMemoryOrderRepository, OrderRepository};
pub use service::OrderService;
pub use shipping::{Shipment, ShippingConfig, ShippingOption, ShippingService};
