use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, AuthUser, JwtAuth, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse,
        ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    require_customer, require_staff,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{CustomerError, CustomerResult};
use crate::models::{
    AuthResponse, CustomerFilter, CustomerResponse, CustomerStats, CustomerWithOrders,
    LoginCustomer, RegisterCustomer, UpdateCustomer, UpdateCustomerStatus,
};
use crate::repository::CustomerRepository;
use crate::service::CustomerService;

const CUSTOMERS_TAG: &str = "customers";

/// OpenAPI documentation for storefront accounts and customer management
#[derive(OpenApi)]
#[openapi(
    paths(
        register,
        login,
        me,
        list_customers,
        customer_stats,
        get_customer,
        update_customer,
        update_customer_status
    ),
    components(
        schemas(
            CustomerResponse,
            CustomerWithOrders,
            CustomerStats,
            RegisterCustomer,
            LoginCustomer,
            AuthResponse,
            UpdateCustomer,
            UpdateCustomerStatus,
            CustomerFilter
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = CUSTOMERS_TAG, description = "Storefront customer accounts")
    )
)]
pub struct ApiDoc;

/// Routes for `/customers/*`.
///
/// Registration and login are public, `/customers/me` needs a customer token
/// and the rest is backoffice only.
pub fn router<R: CustomerRepository + 'static>(
    service: CustomerService<R>,
    auth: JwtAuth,
) -> Router {
    let shared_service = Arc::new(service);

    let public = Router::new()
        .route("/customers/register", post(register))
        .route("/customers/login", post(login))
        .with_state(shared_service.clone());

    let customer = Router::new()
        .route("/customers/me", get(me))
        .route_layer(middleware::from_fn_with_state(auth.clone(), require_customer))
        .with_state(shared_service.clone());

    let staff = Router::new()
        .route("/customers", get(list_customers))
        .route("/customers/stats", get(customer_stats))
        .route("/customers/{id}", get(get_customer).patch(update_customer))
        .route("/customers/{id}/status", patch(update_customer_status))
        .route_layer(middleware::from_fn_with_state(auth, require_staff))
        .with_state(shared_service);

    public.merge(customer).merge(staff)
}

/// Create a storefront account
#[utoipa::path(
    post,
    path = "/customers/register",
    tag = CUSTOMERS_TAG,
    request_body = RegisterCustomer,
    responses(
        (status = 201, description = "Registered and signed in", body = AuthResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<R: CustomerRepository>(
    State(service): State<Arc<CustomerService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<RegisterCustomer>,
) -> CustomerResult<impl IntoResponse> {
    let response = service.register(input).await?;

    AuditEvent::new(
        Some(response.customer.id.to_string()),
        "customer.register",
        Some(format!("customer:{}", response.customer.email)),
        AuditOutcome::Success,
    )
    .with_headers(&headers)
    .log();

    Ok((StatusCode::CREATED, Json(response)))
}

/// Storefront login
#[utoipa::path(
    post,
    path = "/customers/login",
    tag = CUSTOMERS_TAG,
    request_body = LoginCustomer,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse)
    )
)]
async fn login<R: CustomerRepository>(
    State(service): State<Arc<CustomerService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<LoginCustomer>,
) -> CustomerResult<Json<AuthResponse>> {
    let email = input.email.clone();

    match service.login(input).await {
        Ok(response) => {
            AuditEvent::new(
                Some(response.customer.id.to_string()),
                "customer.login",
                Some(format!("customer:{}", response.customer.email)),
                AuditOutcome::Success,
            )
            .with_headers(&headers)
            .log();

            Ok(Json(response))
        }
        Err(CustomerError::InvalidCredentials) => {
            AuditEvent::new(
                None,
                "customer.login",
                Some(format!("customer:{}", email)),
                AuditOutcome::Denied,
            )
            .with_headers(&headers)
            .with_details(json!({ "reason": "invalid_credentials" }))
            .log();

            Err(CustomerError::InvalidCredentials)
        }
        Err(e) => Err(e),
    }
}

/// Profile of the signed-in customer
#[utoipa::path(
    get,
    path = "/customers/me",
    tag = CUSTOMERS_TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Own profile", body = CustomerResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn me<R: CustomerRepository>(
    State(service): State<Arc<CustomerService<R>>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<CustomerResponse>, axum_helpers::AppError> {
    let id = claims.principal_id()?;
    Ok(Json(service.get(id).await?))
}

/// Backoffice customer list, newest first
#[utoipa::path(
    get,
    path = "/customers",
    tag = CUSTOMERS_TAG,
    security(("bearer_auth" = [])),
    params(CustomerFilter),
    responses(
        (status = 200, description = "Customers", body = Vec<CustomerResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn list_customers<R: CustomerRepository>(
    State(service): State<Arc<CustomerService<R>>>,
    Query(filter): Query<CustomerFilter>,
) -> CustomerResult<Json<Vec<CustomerResponse>>> {
    Ok(Json(service.list(filter).await?))
}

#[utoipa::path(
    get,
    path = "/customers/stats",
    tag = CUSTOMERS_TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Customer counts", body = CustomerStats),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn customer_stats<R: CustomerRepository>(
    State(service): State<Arc<CustomerService<R>>>,
) -> CustomerResult<Json<CustomerStats>> {
    Ok(Json(service.stats().await?))
}

/// Customer profile with order history
#[utoipa::path(
    get,
    path = "/customers/{id}",
    tag = CUSTOMERS_TAG,
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer found", body = CustomerWithOrders),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_customer<R: CustomerRepository>(
    State(service): State<Arc<CustomerService<R>>>,
    UuidPath(id): UuidPath,
) -> CustomerResult<Json<CustomerWithOrders>> {
    Ok(Json(service.get_with_orders(id).await?))
}

#[utoipa::path(
    patch,
    path = "/customers/{id}",
    tag = CUSTOMERS_TAG,
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = UpdateCustomer,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn update_customer<R: CustomerRepository>(
    State(service): State<Arc<CustomerService<R>>>,
    AuthUser(claims): AuthUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateCustomer>,
) -> CustomerResult<Json<CustomerResponse>> {
    let password_changed = input.password.is_some();
    let updated = service.update(id, input).await?;

    AuditEvent::new(
        Some(claims.sub),
        "customer.update",
        Some(format!("customer:{}", id)),
        AuditOutcome::Success,
    )
    .with_headers(&headers)
    .with_details(json!({ "password_changed": password_changed }))
    .log();

    Ok(Json(updated))
}

/// Activate or deactivate a customer
#[utoipa::path(
    patch,
    path = "/customers/{id}/status",
    tag = CUSTOMERS_TAG,
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Customer ID")),
    request_body = UpdateCustomerStatus,
    responses(
        (status = 200, description = "Status changed", body = CustomerResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn update_customer_status<R: CustomerRepository>(
    State(service): State<Arc<CustomerService<R>>>,
    AuthUser(claims): AuthUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateCustomerStatus>,
) -> CustomerResult<Json<CustomerResponse>> {
    let updated = service.set_active(id, input.is_active).await?;

    AuditEvent::new(
        Some(claims.sub),
        "customer.status",
        Some(format!("customer:{}", id)),
        AuditOutcome::Success,
    )
    .with_headers(&headers)
    .with_details(json!({ "is_active": input.is_active }))
    .log();

    Ok(Json(updated))
}
