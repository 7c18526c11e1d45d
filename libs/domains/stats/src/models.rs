use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, Utc};
use domain_orders::{OrderStatus, PaymentStatus};
use rust_decimal::Decimal;
use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Store-wide counters; sales figures count approved payments only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromQueryResult)]
pub struct Overview {
    pub total_products: i64,
    pub active_products: i64,
    pub total_categories: i64,
    pub total_customers: i64,
    pub active_customers: i64,
    pub total_orders: i64,
    #[schema(value_type = String, example = "1250000.00")]
    pub total_sales: Decimal,
    /// Since the same instant one month ago
    #[schema(value_type = String)]
    pub sales_last_month: Decimal,
    /// Since the first day of the current UTC month
    #[schema(value_type = String)]
    pub sales_current_month: Decimal,
    /// Units in stock across active products
    pub total_stock: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentStatusCount {
    pub payment_status: PaymentStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Dashboard {
    pub overview: Overview,
    pub orders_by_status: Vec<StatusCount>,
    pub orders_by_payment_status: Vec<PaymentStatusCount>,
}

/// Approved sales of one UTC day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromQueryResult)]
pub struct DailySales {
    /// `YYYY-MM-DD`
    pub date: String,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromQueryResult)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub product_name: String,
    pub total_quantity: i64,
    #[schema(value_type = String)]
    pub total_revenue: Decimal,
}

/// Orders placed in one month; revenue counts approved payments only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromQueryResult)]
pub struct MonthlyOrders {
    /// `YYYY-MM`
    pub month: String,
    pub count: i64,
    #[schema(value_type = String)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, FromQueryResult)]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
pub struct PeriodQuery {
    /// Days to look back, 1 to 365
    #[serde(default = "default_days")]
    pub days: u32,
}

fn default_days() -> u32 {
    30
}

#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
pub struct TopProductsQuery {
    /// Number of products, 1 to 100
    #[serde(default = "default_top")]
    pub limit: u32,
}

fn default_top() -> u32 {
    10
}

#[derive(Debug, Clone, Copy, Deserialize, IntoParams)]
pub struct MonthsQuery {
    /// Months to look back, 1 to 24
    #[serde(default = "default_months")]
    pub months: u32,
}

fn default_months() -> u32 {
    6
}

impl Default for PeriodQuery {
    fn default() -> Self {
        Self {
            days: default_days(),
        }
    }
}

impl Default for TopProductsQuery {
    fn default() -> Self {
        Self {
            limit: default_top(),
        }
    }
}

impl Default for MonthsQuery {
    fn default() -> Self {
        Self {
            months: default_months(),
        }
    }
}

/// Midnight UTC of the day `days` before `now`
pub fn days_back(now: DateTime<Utc>, days: u32) -> DateTime<Utc> {
    (now - Duration::days(i64::from(days)))
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_utc()
}

/// First instant of the month `months` before `now`
pub fn months_back(now: DateTime<Utc>, months: u32) -> Option<DateTime<Utc>> {
    now.date_naive()
        .with_day(1)?
        .checked_sub_months(Months::new(months))
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
}

/// First instant of the current UTC month
pub fn month_start(now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    months_back(now, 0)
}
