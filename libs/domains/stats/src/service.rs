use chrono::{Months, Utc};
use std::ops::RangeInclusive;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{StatsError, StatsResult};
use crate::models::{
    DailySales, Dashboard, MonthlyCount, MonthlyOrders, TopProduct, days_back, month_start,
    months_back,
};
use crate::repository::StatsRepository;

const DAYS: RangeInclusive<u32> = 1..=365;
const TOP_LIMIT: RangeInclusive<u32> = 1..=100;
const MONTHS: RangeInclusive<u32> = 1..=24;

fn check(name: &str, value: u32, range: RangeInclusive<u32>) -> StatsResult<u32> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(StatsError::Validation(format!(
            "{} must be between {} and {}",
            name,
            range.start(),
            range.end()
        )))
    }
}

fn window_error() -> StatsError {
    StatsError::Internal("reporting window out of range".to_string())
}

/// Backoffice reporting
pub struct StatsService<R: StatsRepository> {
    repository: Arc<R>,
}

impl<R: StatsRepository> Clone for StatsService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: StatsRepository> StatsService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> StatsResult<Dashboard> {
        let now = Utc::now();
        let last_month_from = now
            .checked_sub_months(Months::new(1))
            .ok_or_else(window_error)?;
        let current_month_from = month_start(now).ok_or_else(window_error)?;

        let (overview, orders_by_status, orders_by_payment_status) = tokio::try_join!(
            self.repository.overview(last_month_from, current_month_from),
            self.repository.orders_by_status(),
            self.repository.orders_by_payment_status(),
        )?;

        Ok(Dashboard {
            overview,
            orders_by_status,
            orders_by_payment_status,
        })
    }

    #[instrument(skip(self))]
    pub async fn sales_by_period(&self, days: u32) -> StatsResult<Vec<DailySales>> {
        let days = check("days", days, DAYS)?;
        self.repository.daily_sales(days_back(Utc::now(), days)).await
    }

    #[instrument(skip(self))]
    pub async fn top_products(&self, limit: u32) -> StatsResult<Vec<TopProduct>> {
        let limit = check("limit", limit, TOP_LIMIT)?;
        self.repository.top_products(u64::from(limit)).await
    }

    #[instrument(skip(self))]
    pub async fn orders_by_month(&self, months: u32) -> StatsResult<Vec<MonthlyOrders>> {
        let months = check("months", months, MONTHS)?;
        let from = months_back(Utc::now(), months).ok_or_else(window_error)?;
        self.repository.orders_by_month(from).await
    }

    #[instrument(skip(self))]
    pub async fn customers_by_month(&self, months: u32) -> StatsResult<Vec<MonthlyCount>> {
        let months = check("months", months, MONTHS)?;
        let from = months_back(Utc::now(), months).ok_or_else(window_error)?;
        self.repository.customers_by_month(from).await
    }
}
