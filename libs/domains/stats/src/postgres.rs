use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, DbBackend, FromQueryResult, Statement};
use std::str::FromStr;

use crate::{
    error::{StatsError, StatsResult},
    models::{
        DailySales, MonthlyCount, MonthlyOrders, Overview, PaymentStatusCount, StatusCount,
        TopProduct,
    },
    repository::StatsRepository,
};

const OVERVIEW: &str = r#"
SELECT
    (SELECT COUNT(*) FROM products)::bigint AS total_products,
    (SELECT COUNT(*) FROM products WHERE is_active)::bigint AS active_products,
    (SELECT COUNT(*) FROM categories)::bigint AS total_categories,
    (SELECT COUNT(*) FROM customers)::bigint AS total_customers,
    (SELECT COUNT(*) FROM customers WHERE is_active)::bigint AS active_customers,
    (SELECT COUNT(*) FROM orders)::bigint AS total_orders,
    (SELECT COALESCE(SUM(total), 0) FROM orders
        WHERE payment_status = 'approved') AS total_sales,
    (SELECT COALESCE(SUM(total), 0) FROM orders
        WHERE payment_status = 'approved' AND created_at >= $1) AS sales_last_month,
    (SELECT COALESCE(SUM(total), 0) FROM orders
        WHERE payment_status = 'approved' AND created_at >= $2) AS sales_current_month,
    (SELECT COALESCE(SUM(stock), 0) FROM products WHERE is_active)::bigint AS total_stock
"#;

const ORDERS_BY_STATUS: &str = r#"
SELECT status::text AS label, COUNT(*)::bigint AS count
FROM orders
GROUP BY status
ORDER BY status
"#;

const ORDERS_BY_PAYMENT_STATUS: &str = r#"
SELECT payment_status::text AS label, COUNT(*)::bigint AS count
FROM orders
GROUP BY payment_status
ORDER BY payment_status
"#;

const DAILY_SALES: &str = r#"
SELECT
    to_char(date_trunc('day', created_at AT TIME ZONE 'UTC'), 'YYYY-MM-DD') AS date,
    COALESCE(SUM(total), 0) AS total,
    COUNT(*)::bigint AS count
FROM orders
WHERE payment_status = 'approved' AND created_at >= $1
GROUP BY 1
ORDER BY 1
"#;

const TOP_PRODUCTS: &str = r#"
SELECT
    i.product_id,
    i.product_name,
    SUM(i.quantity)::bigint AS total_quantity,
    COALESCE(SUM(i.subtotal), 0) AS total_revenue
FROM order_items i
JOIN orders o ON o.id = i.order_id
WHERE o.payment_status = 'approved'
GROUP BY i.product_id, i.product_name
ORDER BY total_quantity DESC, total_revenue DESC
LIMIT $1
"#;

const ORDERS_BY_MONTH: &str = r#"
SELECT
    to_char(date_trunc('month', created_at AT TIME ZONE 'UTC'), 'YYYY-MM') AS month,
    COUNT(*)::bigint AS count,
    COALESCE(SUM(total) FILTER (WHERE payment_status = 'approved'), 0) AS revenue
FROM orders
WHERE created_at >= $1
GROUP BY 1
ORDER BY 1
"#;

const CUSTOMERS_BY_MONTH: &str = r#"
SELECT
    to_char(date_trunc('month', created_at AT TIME ZONE 'UTC'), 'YYYY-MM') AS month,
    COUNT(*)::bigint AS count
FROM customers
WHERE created_at >= $1
GROUP BY 1
ORDER BY 1
"#;

/// Grouped count keyed by an enum rendered as text
#[derive(Debug, FromQueryResult)]
struct LabelCount {
    label: String,
    count: i64,
}

fn parse_label<T: FromStr>(label: &str) -> StatsResult<T> {
    label
        .parse()
        .map_err(|_| StatsError::Internal(format!("unexpected status value '{}'", label)))
}

pub struct PgStatsRepository {
    db: DatabaseConnection,
}

impl PgStatsRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn label_counts(&self, sql: &str) -> StatsResult<Vec<LabelCount>> {
        let stmt = Statement::from_string(DbBackend::Postgres, sql);
        Ok(LabelCount::find_by_statement(stmt).all(&self.db).await?)
    }
}

#[async_trait]
impl StatsRepository for PgStatsRepository {
    async fn overview(
        &self,
        last_month_from: DateTime<Utc>,
        current_month_from: DateTime<Utc>,
    ) -> StatsResult<Overview> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            OVERVIEW,
            [last_month_from.into(), current_month_from.into()],
        );

        Overview::find_by_statement(stmt)
            .one(&self.db)
            .await?
            .ok_or_else(|| StatsError::Internal("overview query returned no row".to_string()))
    }

    async fn orders_by_status(&self) -> StatsResult<Vec<StatusCount>> {
        self.label_counts(ORDERS_BY_STATUS)
            .await?
            .into_iter()
            .map(|row| {
                Ok(StatusCount {
                    status: parse_label(&row.label)?,
                    count: row.count,
                })
            })
            .collect()
    }

    async fn orders_by_payment_status(&self) -> StatsResult<Vec<PaymentStatusCount>> {
        self.label_counts(ORDERS_BY_PAYMENT_STATUS)
            .await?
            .into_iter()
            .map(|row| {
                Ok(PaymentStatusCount {
                    payment_status: parse_label(&row.label)?,
                    count: row.count,
                })
            })
            .collect()
    }

    async fn daily_sales(&self, from: DateTime<Utc>) -> StatsResult<Vec<DailySales>> {
        let stmt = Statement::from_sql_and_values(DbBackend::Postgres, DAILY_SALES, [from.into()]);
        Ok(DailySales::find_by_statement(stmt).all(&self.db).await?)
    }

    async fn top_products(&self, limit: u64) -> StatsResult<Vec<TopProduct>> {
        let stmt = Statement::from_sql_and_values(
            DbBackend::Postgres,
            TOP_PRODUCTS,
            [(limit as i64).into()],
        );
        Ok(TopProduct::find_by_statement(stmt).all(&self.db).await?)
    }

    async fn orders_by_month(&self, from: DateTime<Utc>) -> StatsResult<Vec<MonthlyOrders>> {
        let stmt =
            Statement::from_sql_and_values(DbBackend::Postgres, ORDERS_BY_MONTH, [from.into()]);
        Ok(MonthlyOrders::find_by_statement(stmt).all(&self.db).await?)
    }

    async fn customers_by_month(&self, from: DateTime<Utc>) -> StatsResult<Vec<MonthlyCount>> {
        let stmt =
            Statement::from_sql_and_values(DbBackend::Postgres, CUSTOMERS_BY_MONTH, [from.into()]);
        Ok(MonthlyCount::find_by_statement(stmt).all(&self.db).await?)
    }
}
