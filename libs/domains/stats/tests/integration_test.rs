//! Integration tests for the reporting queries against real PostgreSQL

use axum_helpers::{JwtAuth, JwtConfig};
use chrono::{Datelike, Utc};
use domain_customers::{CustomerService, PgCustomerRepository, RegisterCustomer};
use domain_orders::{
    ConfirmWebpay, CreateOrder, CreateOrderItem, OrderService, OrderStatus, PaymentStatus,
    PgOrderRepository, ShippingService, SimulatedWebpay,
};
use domain_stats::*;
use rust_decimal::Decimal;
use std::sync::Arc;
use test_utils::{TestDataBuilder, TestDatabase};
use uuid::Uuid;

fn orders(db: &TestDatabase) -> OrderService<PgOrderRepository> {
    OrderService::new(
        PgOrderRepository::new(db.connection()),
        Arc::new(SimulatedWebpay::new("http://localhost:3000")),
        ShippingService::default(),
        "http://localhost:3000",
    )
}

fn checkout(product_id: Uuid, quantity: i32) -> CreateOrder {
    CreateOrder {
        customer_name: "Reportes".to_string(),
        customer_email: "reportes@example.cl".to_string(),
        customer_phone: "+56910101010".to_string(),
        shipping_address: None,
        shipping_type: None,
        items: vec![CreateOrderItem {
            product_id,
            quantity,
        }],
        payment_method: None,
        discount: None,
        notes: None,
    }
}

/// Two approved orders of the product and one left pending
async fn place_orders(db: &TestDatabase, product_id: Uuid) {
    let service = orders(db);
    for quantity in [2, 1] {
        let order = service
            .create(checkout(product_id, quantity), None)
            .await
            .unwrap();
        let redirect = service.init_webpay(order.order.id).await.unwrap();
        service
            .confirm_webpay(ConfirmWebpay {
                token: redirect.token,
            })
            .await
            .unwrap();
    }
    service.create(checkout(product_id, 4), None).await.unwrap();
}

#[tokio::test]
async fn test_dashboard_counts_only_approved_sales() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("stats_dashboard");
    let category_id = db.create_test_category(&builder, "main").await;
    let product_id = db
        .create_test_product(&builder, category_id, "main", 10000, 20)
        .await;
    place_orders(&db, product_id).await;

    let auth = JwtAuth::new(&JwtConfig::new("integration-secret-at-least-32-chars", 3600).unwrap());
    CustomerService::new(
        PgCustomerRepository::new(db.connection()),
        Arc::new(PgOrderRepository::new(db.connection())),
        auth,
    )
    .register(RegisterCustomer {
        full_name: "Cliente Reportes".to_string(),
        email: builder.email("customer"),
        phone: "+56910101011".to_string(),
        password: "secret1".to_string(),
        address: None,
        city: None,
        region: None,
    })
    .await
    .unwrap();

    let stats = StatsService::new(PgStatsRepository::new(db.connection()));
    let dashboard = stats.dashboard().await.unwrap();

    // Seeded catalog plus the test category and product
    assert_eq!(dashboard.overview.total_categories, 8);
    assert_eq!(dashboard.overview.total_products, 13);
    assert_eq!(dashboard.overview.total_customers, 1);
    assert_eq!(dashboard.overview.total_orders, 3);
    assert_eq!(dashboard.overview.total_sales, Decimal::from(30000));
    assert_eq!(dashboard.overview.sales_last_month, Decimal::from(30000));
    assert_eq!(dashboard.overview.sales_current_month, Decimal::from(30000));

    let paid = dashboard
        .orders_by_status
        .iter()
        .find(|s| s.status == OrderStatus::Paid)
        .map(|s| s.count);
    assert_eq!(paid, Some(2));

    let pending = dashboard
        .orders_by_payment_status
        .iter()
        .find(|s| s.payment_status == PaymentStatus::Pending)
        .map(|s| s.count);
    assert_eq!(pending, Some(1));
}

#[tokio::test]
async fn test_sales_and_top_products() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("stats_sales");
    let category_id = db.create_test_category(&builder, "main").await;
    let product_id = db
        .create_test_product(&builder, category_id, "main", 10000, 20)
        .await;
    place_orders(&db, product_id).await;

    let stats = StatsService::new(PgStatsRepository::new(db.connection()));

    let sales = stats.sales_by_period(30).await.unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].date, Utc::now().format("%Y-%m-%d").to_string());
    assert_eq!(sales[0].count, 2);
    assert_eq!(sales[0].total, Decimal::from(30000));

    let top = stats.top_products(10).await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].product_id, product_id);
    assert_eq!(top[0].total_quantity, 3);
    assert_eq!(top[0].total_revenue, Decimal::from(30000));
}

#[tokio::test]
async fn test_monthly_reports() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("stats_monthly");
    let category_id = db.create_test_category(&builder, "main").await;
    let product_id = db
        .create_test_product(&builder, category_id, "main", 10000, 20)
        .await;
    place_orders(&db, product_id).await;

    let stats = StatsService::new(PgStatsRepository::new(db.connection()));
    let now = Utc::now();
    let this_month = format!("{}-{:02}", now.year(), now.month());

    let orders = stats.orders_by_month(6).await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].month, this_month);
    assert_eq!(orders[0].count, 3);
    assert_eq!(orders[0].revenue, Decimal::from(30000));

    let customers = stats.customers_by_month(6).await.unwrap();
    assert!(customers.is_empty());
}
