//! API routes
//!
//! Wires each domain to its PostgreSQL repositories. Domain routers carry
//! full paths and are merged here; `create_router` nests the result under `/api`.

pub mod health;

use axum::Router;
use axum_helpers::JwtAuth;
use domain_catalog::{
    CategoryService, PgCategoryRepository, PgProductRepository, ProductService,
};
use domain_customers::{CustomerService, PgCustomerRepository};
use domain_orders::{OrderService, PgOrderRepository, ShippingService};
use domain_stats::{PgStatsRepository, StatsService};
use domain_users::{PgUserRepository, UserService};
use std::sync::Arc;

use crate::state::AppState;

/// Create all API routes
pub fn routes(state: &AppState) -> Router {
    let db = &state.db;
    let config = &state.config;

    let jwt = JwtAuth::new(&config.jwt);
    let users = UserService::new(PgUserRepository::new(db.clone()), jwt.clone());
    // Staff tokens stop working as soon as the account is deactivated
    let auth = jwt.with_staff_validator(users.principal_validator());

    let categories = CategoryService::new(PgCategoryRepository::new(db.clone()));
    let products = ProductService::new(PgProductRepository::new(db.clone()));

    let orders = OrderService::new(
        PgOrderRepository::new(db.clone()),
        config.webpay.gateway(),
        ShippingService::new(config.shipping.clone()),
        config.webpay.frontend_url.clone(),
    );

    let customers = CustomerService::new(
        PgCustomerRepository::new(db.clone()),
        Arc::new(PgOrderRepository::new(db.clone())),
        auth.clone(),
    );

    let stats = StatsService::new(PgStatsRepository::new(db.clone()));

    Router::new()
        .merge(domain_users::handlers::router(users, auth.clone()))
        .merge(domain_catalog::handlers::categories_router(categories, auth.clone()))
        .merge(domain_catalog::handlers::products_router(products, auth.clone()))
        .merge(domain_orders::handlers::router(orders, auth.clone()))
        .merge(domain_customers::handlers::router(customers, auth.clone()))
        .merge(domain_stats::handlers::router(stats, auth))
}
