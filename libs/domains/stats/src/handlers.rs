use axum::{
    Json, Router,
    extract::{Query, State},
    middleware,
    routing::get,
};
use axum_helpers::{
    JwtAuth,
    errors::responses::{
        BadRequestResponse, ForbiddenResponse, InternalServerErrorResponse, UnauthorizedResponse,
    },
    require_staff,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::StatsResult;
use crate::models::{
    DailySales, Dashboard, MonthlyCount, MonthlyOrders, MonthsQuery, Overview, PaymentStatusCount,
    PeriodQuery, StatusCount, TopProduct, TopProductsQuery,
};
use crate::repository::StatsRepository;
use crate::service::StatsService;

const STATS_TAG: &str = "stats";

/// OpenAPI documentation for backoffice reporting
#[derive(OpenApi)]
#[openapi(
    paths(
        dashboard,
        sales_by_period,
        top_products,
        orders_by_month,
        customers_by_month
    ),
    components(
        schemas(
            Dashboard,
            Overview,
            StatusCount,
            PaymentStatusCount,
            DailySales,
            TopProduct,
            MonthlyOrders,
            MonthlyCount
        ),
        responses(
            BadRequestResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = STATS_TAG, description = "Sales and activity reports")
    )
)]
pub struct ApiDoc;

/// Routes for `/stats/*`, all staff only
pub fn router<R: StatsRepository + 'static>(service: StatsService<R>, auth: JwtAuth) -> Router {
    Router::new()
        .route("/stats/dashboard", get(dashboard))
        .route("/stats/sales-by-period", get(sales_by_period))
        .route("/stats/top-products", get(top_products))
        .route("/stats/orders-by-month", get(orders_by_month))
        .route("/stats/customers-by-month", get(customers_by_month))
        .route_layer(middleware::from_fn_with_state(auth, require_staff))
        .with_state(Arc::new(service))
}

/// Store overview and order counts by status
#[utoipa::path(
    get,
    path = "/stats/dashboard",
    tag = STATS_TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Dashboard figures", body = Dashboard),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn dashboard<R: StatsRepository>(
    State(service): State<Arc<StatsService<R>>>,
) -> StatsResult<Json<Dashboard>> {
    Ok(Json(service.dashboard().await?))
}

/// Approved sales per day
#[utoipa::path(
    get,
    path = "/stats/sales-by-period",
    tag = STATS_TAG,
    security(("bearer_auth" = [])),
    params(PeriodQuery),
    responses(
        (status = 200, description = "Daily sales, oldest first", body = Vec<DailySales>),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn sales_by_period<R: StatsRepository>(
    State(service): State<Arc<StatsService<R>>>,
    Query(query): Query<PeriodQuery>,
) -> StatsResult<Json<Vec<DailySales>>> {
    Ok(Json(service.sales_by_period(query.days).await?))
}

#[utoipa::path(
    get,
    path = "/stats/top-products",
    tag = STATS_TAG,
    security(("bearer_auth" = [])),
    params(TopProductsQuery),
    responses(
        (status = 200, description = "Best sellers by units", body = Vec<TopProduct>),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn top_products<R: StatsRepository>(
    State(service): State<Arc<StatsService<R>>>,
    Query(query): Query<TopProductsQuery>,
) -> StatsResult<Json<Vec<TopProduct>>> {
    Ok(Json(service.top_products(query.limit).await?))
}

#[utoipa::path(
    get,
    path = "/stats/orders-by-month",
    tag = STATS_TAG,
    security(("bearer_auth" = [])),
    params(MonthsQuery),
    responses(
        (status = 200, description = "Orders and approved revenue per month", body = Vec<MonthlyOrders>),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn orders_by_month<R: StatsRepository>(
    State(service): State<Arc<StatsService<R>>>,
    Query(query): Query<MonthsQuery>,
) -> StatsResult<Json<Vec<MonthlyOrders>>> {
    Ok(Json(service.orders_by_month(query.months).await?))
}

#[utoipa::path(
    get,
    path = "/stats/customers-by-month",
    tag = STATS_TAG,
    security(("bearer_auth" = [])),
    params(MonthsQuery),
    responses(
        (status = 200, description = "Customer registrations per month", body = Vec<MonthlyCount>),
        (status = 400, response = BadRequestResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn customers_by_month<R: StatsRepository>(
    State(service): State<Arc<StatsService<R>>>,
    Query(query): Query<MonthsQuery>,
) -> StatsResult<Json<Vec<MonthlyCount>>> {
    Ok(Json(service.customers_by_month(query.months).await?))
}
