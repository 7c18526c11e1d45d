//! Handler tests for the stats domain
//!
//! Routes are driven against a fixed in-test repository; the SQL itself is
//! covered by the integration tests.

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum_helpers::{JwtAuth, JwtConfig};
use chrono::{DateTime, Utc};
use domain_orders::{OrderStatus, PaymentStatus};
use domain_stats::*;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "stats-handler-secret-at-least-32-chars!";

/// Canned figures, one row per report
struct FixedStats;

#[async_trait]
impl StatsRepository for FixedStats {
    async fn overview(
        &self,
        _last_month_from: DateTime<Utc>,
        _current_month_from: DateTime<Utc>,
    ) -> StatsResult<Overview> {
        Ok(Overview {
            total_products: 12,
            active_products: 12,
            total_categories: 7,
            total_customers: 2,
            active_customers: 1,
            total_orders: 3,
            total_sales: Decimal::new(2998000, 2),
            sales_last_month: Decimal::new(2998000, 2),
            sales_current_month: Decimal::new(1499000, 2),
            total_stock: 150,
        })
    }

    async fn orders_by_status(&self) -> StatsResult<Vec<StatusCount>> {
        Ok(vec![StatusCount {
            status: OrderStatus::Paid,
            count: 2,
        }])
    }

    async fn orders_by_payment_status(&self) -> StatsResult<Vec<PaymentStatusCount>> {
        Ok(vec![PaymentStatusCount {
            payment_status: PaymentStatus::Approved,
            count: 2,
        }])
    }

    async fn daily_sales(&self, _from: DateTime<Utc>) -> StatsResult<Vec<DailySales>> {
        Ok(vec![DailySales {
            date: "2025-03-10".to_string(),
            total: Decimal::from(14990),
            count: 1,
        }])
    }

    async fn top_products(&self, limit: u64) -> StatsResult<Vec<TopProduct>> {
        Ok((0..limit.min(2))
            .map(|i| TopProduct {
                product_id: Uuid::now_v7(),
                product_name: format!("Producto {}", i),
                total_quantity: 5 - i as i64,
                total_revenue: Decimal::from(1000),
            })
            .collect())
    }

    async fn orders_by_month(&self, _from: DateTime<Utc>) -> StatsResult<Vec<MonthlyOrders>> {
        Ok(vec![MonthlyOrders {
            month: "2025-03".to_string(),
            count: 3,
            revenue: Decimal::new(2998000, 2),
        }])
    }

    async fn customers_by_month(&self, _from: DateTime<Utc>) -> StatsResult<Vec<MonthlyCount>> {
        Ok(vec![MonthlyCount {
            month: "2025-03".to_string(),
            count: 2,
        }])
    }
}

struct TestApp {
    app: Router,
    auth: JwtAuth,
}

fn setup() -> TestApp {
    let auth = JwtAuth::new(&JwtConfig::new(SECRET, 3600).unwrap());
    TestApp {
        app: handlers::router(StatsService::new(FixedStats), auth.clone()),
        auth,
    }
}

impl TestApp {
    fn staff_token(&self) -> String {
        self.auth
            .create_staff_token(Uuid::now_v7(), "admin", "admin")
            .unwrap()
    }

    async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = self
            .app
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }
}

#[tokio::test]
async fn test_stats_require_staff() {
    let t = setup();

    let (status, _) = t.get("/stats/dashboard", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let customer = t
        .auth
        .create_customer_token(Uuid::now_v7(), "c@example.cl")
        .unwrap();
    let (status, _) = t.get("/stats/dashboard", Some(&customer)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_dashboard_shape() {
    let t = setup();
    let token = t.staff_token();

    let (status, body) = t.get("/stats/dashboard", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overview"]["total_categories"], 7);
    assert_eq!(body["overview"]["total_sales"], "29980.00");
    assert_eq!(body["orders_by_status"][0]["status"], "paid");
    assert_eq!(
        body["orders_by_payment_status"][0]["payment_status"],
        "approved"
    );
}

#[tokio::test]
async fn test_reports_with_defaults() {
    let t = setup();
    let token = t.staff_token();

    let (status, sales) = t.get("/stats/sales-by-period", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sales[0]["date"], "2025-03-10");

    let (status, top) = t.get("/stats/top-products?limit=1", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(top.as_array().unwrap().len(), 1);

    let (status, orders) = t.get("/stats/orders-by-month", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders[0]["month"], "2025-03");

    let (status, customers) = t.get("/stats/customers-by-month?months=24", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(customers[0]["count"], 2);
}

#[tokio::test]
async fn test_out_of_range_parameters() {
    let t = setup();
    let token = t.staff_token();

    for uri in [
        "/stats/sales-by-period?days=0",
        "/stats/sales-by-period?days=400",
        "/stats/top-products?limit=101",
        "/stats/orders-by-month?months=25",
        "/stats/customers-by-month?months=0",
    ] {
        let (status, _) = t.get(uri, Some(&token)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    }
}
