use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, AuthUser, JwtAuth, OptionalAuthUser, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        ConflictResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        ServiceUnavailableResponse, UnauthorizedResponse,
    },
    optional_auth, require_customer, require_staff,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::OrderResult;
use crate::models::{
    ConfirmWebpay, CreateOrder, CreateOrderItem, Order, OrderFilter, OrderItem, OrderStatus,
    OrderWithItems, PaymentMethod, PaymentStatus, ShippingType, UpdateOrderStatus, WebpayRedirect,
};
use crate::repository::OrderRepository;
use crate::service::OrderService;
use crate::shipping::ShippingOption;

const ORDERS_TAG: &str = "orders";

/// OpenAPI documentation for orders, payments and shipping
#[derive(OpenApi)]
#[openapi(
    paths(
        create_order,
        list_orders,
        my_orders,
        shipping_options,
        get_order_by_number,
        get_order,
        update_order_status,
        init_webpay,
        confirm_webpay,
        create_shipment
    ),
    components(
        schemas(
            Order,
            OrderItem,
            OrderWithItems,
            OrderStatus,
            PaymentStatus,
            PaymentMethod,
            ShippingType,
            ShippingOption,
            CreateOrder,
            CreateOrderItem,
            UpdateOrderStatus,
            ConfirmWebpay,
            WebpayRedirect,
            OrderFilter
        ),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            ConflictResponse,
            ServiceUnavailableResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = ORDERS_TAG, description = "Checkout, payment and fulfilment")
    )
)]
pub struct ApiDoc;

/// Routes for `/orders/*`.
///
/// Checkout accepts guests and customers alike, `/orders/mine` needs a
/// customer token and the backoffice routes need a staff token.
pub fn router<R: OrderRepository + 'static>(service: OrderService<R>, auth: JwtAuth) -> Router {
    let shared_service = Arc::new(service);

    let checkout = Router::new()
        .route("/orders", post(create_order))
        .route_layer(middleware::from_fn_with_state(auth.clone(), optional_auth))
        .with_state(shared_service.clone());

    let public = Router::new()
        .route("/orders/shipping-options", get(shipping_options))
        .route("/orders/number/{order_number}", get(get_order_by_number))
        .route("/orders/webpay/confirm", post(confirm_webpay))
        .route("/orders/{id}", get(get_order))
        .route("/orders/{id}/webpay/init", post(init_webpay))
        .with_state(shared_service.clone());

    let customer = Router::new()
        .route("/orders/mine", get(my_orders))
        .route_layer(middleware::from_fn_with_state(auth.clone(), require_customer))
        .with_state(shared_service.clone());

    let staff = Router::new()
        .route("/orders", get(list_orders))
        .route("/orders/{id}/status", patch(update_order_status))
        .route("/orders/{id}/shipment", post(create_shipment))
        .route_layer(middleware::from_fn_with_state(auth, require_staff))
        .with_state(shared_service);

    checkout.merge(public).merge(customer).merge(staff)
}

/// Place an order
///
/// A customer token links the order to that customer; without one the order
/// is a guest checkout.
#[utoipa::path(
    post,
    path = "/orders",
    tag = ORDERS_TAG,
    request_body = CreateOrder,
    responses(
        (status = 201, description = "Order placed", body = OrderWithItems),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_order<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    OptionalAuthUser(claims): OptionalAuthUser,
    ValidatedJson(input): ValidatedJson<CreateOrder>,
) -> OrderResult<impl IntoResponse> {
    let customer_id = claims
        .filter(|c| c.is_customer())
        .and_then(|c| c.principal_id().ok());

    let placed = service.create(input, customer_id).await?;
    Ok((StatusCode::CREATED, Json(placed)))
}

/// Backoffice order list, newest first
#[utoipa::path(
    get,
    path = "/orders",
    tag = ORDERS_TAG,
    security(("bearer_auth" = [])),
    params(OrderFilter),
    responses(
        (status = 200, description = "Orders", body = Vec<OrderWithItems>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn list_orders<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    Query(filter): Query<OrderFilter>,
) -> OrderResult<Json<Vec<OrderWithItems>>> {
    Ok(Json(service.list(filter).await?))
}

/// Orders of the signed-in customer
#[utoipa::path(
    get,
    path = "/orders/mine",
    tag = ORDERS_TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Customer orders", body = Vec<OrderWithItems>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn my_orders<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<OrderWithItems>>, axum_helpers::AppError> {
    let customer_id = claims.principal_id()?;
    Ok(Json(service.mine(customer_id).await?))
}

#[utoipa::path(
    get,
    path = "/orders/shipping-options",
    tag = ORDERS_TAG,
    responses(
        (status = 200, description = "Enabled shipping options", body = Vec<ShippingOption>)
    )
)]
async fn shipping_options<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
) -> Json<Vec<ShippingOption>> {
    Json(service.shipping_options())
}

#[utoipa::path(
    get,
    path = "/orders/number/{order_number}",
    tag = ORDERS_TAG,
    params(("order_number" = String, Path, description = "Order number, e.g. ORD-2025-0001")),
    responses(
        (status = 200, description = "Order found", body = OrderWithItems),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_order_by_number<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    Path(order_number): Path<String>,
) -> OrderResult<Json<OrderWithItems>> {
    Ok(Json(service.get_by_number(&order_number).await?))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = ORDERS_TAG,
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order found", body = OrderWithItems),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_order<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    UuidPath(id): UuidPath,
) -> OrderResult<Json<OrderWithItems>> {
    Ok(Json(service.get(id).await?))
}

/// Set order and payment status
#[utoipa::path(
    patch,
    path = "/orders/{id}/status",
    tag = ORDERS_TAG,
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order ID")),
    request_body = UpdateOrderStatus,
    responses(
        (status = 200, description = "Order updated", body = OrderWithItems),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_order_status<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    AuthUser(claims): AuthUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateOrderStatus>,
) -> OrderResult<Json<OrderWithItems>> {
    let details = json!({ "status": input.status, "payment_status": input.payment_status });
    let updated = service.update_status(id, input).await?;

    AuditEvent::new(
        Some(claims.sub),
        "order.status",
        Some(format!("order:{}", id)),
        AuditOutcome::Success,
    )
    .with_headers(&headers)
    .with_details(details)
    .log();

    Ok(Json(updated))
}

/// Start a Webpay payment for a pending order
#[utoipa::path(
    post,
    path = "/orders/{id}/webpay/init",
    tag = ORDERS_TAG,
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Redirect to the payment form", body = WebpayRedirect),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn init_webpay<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    UuidPath(id): UuidPath,
) -> OrderResult<Json<WebpayRedirect>> {
    Ok(Json(service.init_webpay(id).await?))
}

/// Confirm a Webpay payment when the buyer returns from the form
#[utoipa::path(
    post,
    path = "/orders/webpay/confirm",
    tag = ORDERS_TAG,
    request_body = ConfirmWebpay,
    responses(
        (status = 200, description = "Payment settled", body = OrderWithItems),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 503, response = ServiceUnavailableResponse)
    )
)]
async fn confirm_webpay<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<ConfirmWebpay>,
) -> OrderResult<Json<OrderWithItems>> {
    let settled = service.confirm_webpay(input).await?;

    let outcome = if settled.order.payment_status == PaymentStatus::Approved {
        AuditOutcome::Success
    } else {
        AuditOutcome::Failure
    };
    AuditEvent::new(
        settled.order.customer_id.map(|id| id.to_string()),
        "order.payment",
        Some(format!("order:{}", settled.order.id)),
        outcome,
    )
    .with_headers(&headers)
    .with_details(json!({
        "order_number": settled.order.order_number,
        "payment_status": settled.order.payment_status,
        "total": settled.order.total,
    }))
    .log();

    Ok(Json(settled))
}

/// Book the carrier and mark the order shipped
#[utoipa::path(
    post,
    path = "/orders/{id}/shipment",
    tag = ORDERS_TAG,
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Shipment created", body = OrderWithItems),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn create_shipment<R: OrderRepository>(
    State(service): State<Arc<OrderService<R>>>,
    AuthUser(claims): AuthUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> OrderResult<Json<OrderWithItems>> {
    let shipped = service.create_shipment(id).await?;

    AuditEvent::new(
        Some(claims.sub),
        "order.shipment",
        Some(format!("order:{}", id)),
        AuditOutcome::Success,
    )
    .with_headers(&headers)
    .with_details(json!({ "tracking_number": shipped.order.tracking_number }))
    .log();

    Ok(Json(shipped))
}
