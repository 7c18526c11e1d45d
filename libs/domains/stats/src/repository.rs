use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StatsResult;
use crate::models::{
    DailySales, MonthlyCount, MonthlyOrders, Overview, PaymentStatusCount, StatusCount, TopProduct,
};

/// Read-only reporting queries over catalog, customers and orders
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatsRepository: Send + Sync {
    /// Counters with approved sales since each of the two instants
    async fn overview(
        &self,
        last_month_from: DateTime<Utc>,
        current_month_from: DateTime<Utc>,
    ) -> StatsResult<Overview>;

    async fn orders_by_status(&self) -> StatsResult<Vec<StatusCount>>;

    async fn orders_by_payment_status(&self) -> StatsResult<Vec<PaymentStatusCount>>;

    /// Approved sales per UTC day since `from`, oldest first
    async fn daily_sales(&self, from: DateTime<Utc>) -> StatsResult<Vec<DailySales>>;

    /// Best sellers by units over approved orders
    async fn top_products(&self, limit: u64) -> StatsResult<Vec<TopProduct>>;

    /// Orders per month since `from`, oldest first
    async fn orders_by_month(&self, from: DateTime<Utc>) -> StatsResult<Vec<MonthlyOrders>>;

    /// Customer registrations per month since `from`, oldest first
    async fn customers_by_month(&self, from: DateTime<Utc>) -> StatsResult<Vec<MonthlyCount>>;
}
