use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, AuthUser, JwtAuth, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse,
        ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    require_staff,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::{UserError, UserResult};
use crate::models::{CreateUser, LoginRequest, LoginResponse, LoginUser, UserResponse, UserRole};
use crate::repository::UserRepository;
use crate::service::UserService;

const AUTH_TAG: &str = "auth";
const USERS_TAG: &str = "users";

/// OpenAPI documentation for staff login and user management
#[derive(OpenApi)]
#[openapi(
    paths(login, me, list_users, create_user, get_user),
    components(
        schemas(UserResponse, CreateUser, LoginRequest, LoginResponse, LoginUser, UserRole),
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
        (name = AUTH_TAG, description = "Backoffice authentication"),
        (name = USERS_TAG, description = "Backoffice staff accounts")
    )
)]
pub struct ApiDoc;

/// Routes for `/auth/*` and `/users/*`; everything but login requires a staff token
pub fn router<R: UserRepository + 'static>(service: UserService<R>, auth: JwtAuth) -> Router {
    let shared_service = Arc::new(service);

    let public = Router::new()
        .route("/auth/login", post(login))
        .with_state(shared_service.clone());

    let staff = Router::new()
        .route("/auth/me", get(me))
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", get(get_user))
        .route_layer(middleware::from_fn_with_state(auth, require_staff))
        .with_state(shared_service);

    public.merge(staff)
}

/// Log in to the backoffice
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = AUTH_TAG,
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn login<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<LoginRequest>,
) -> UserResult<Json<LoginResponse>> {
    let username = input.username.clone();

    match service.login(input).await {
        Ok(response) => {
            AuditEvent::new(
                Some(response.user.id.to_string()),
                "admin.login",
                Some(format!("user:{}", response.user.username)),
                AuditOutcome::Success,
            )
            .with_headers(&headers)
            .log();

            Ok(Json(response))
        }
        Err(UserError::InvalidCredentials) => {
            AuditEvent::new(
                None,
                "admin.login",
                Some(format!("user:{}", username)),
                AuditOutcome::Denied,
            )
            .with_headers(&headers)
            .with_details(json!({ "reason": "invalid_credentials" }))
            .log();

            Err(UserError::InvalidCredentials)
        }
        Err(e) => Err(e),
    }
}

/// Current staff user's profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = AUTH_TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn me<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    AuthUser(claims): AuthUser,
) -> Result<Json<UserResponse>, axum_helpers::AppError> {
    let id = claims.principal_id()?;
    let user = service.get_user(id).await?;
    Ok(Json(user))
}

/// List staff users, newest first
#[utoipa::path(
    get,
    path = "/users",
    tag = USERS_TAG,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Staff users", body = Vec<UserResponse>),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse)
    )
)]
async fn list_users<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
) -> UserResult<Json<Vec<UserResponse>>> {
    Ok(Json(service.list_users().await?))
}

/// Create a staff user (admins only)
#[utoipa::path(
    post,
    path = "/users",
    tag = USERS_TAG,
    security(("bearer_auth" = [])),
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn create_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    AuthUser(claims): AuthUser,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateUser>,
) -> UserResult<impl IntoResponse> {
    if !claims.has_role(&UserRole::Admin.to_string()) {
        return Err(UserError::Forbidden(
            "Only administrators can create users".to_string(),
        ));
    }

    let user = service.create_user(input).await?;

    AuditEvent::new(
        Some(claims.sub.clone()),
        "user.create",
        Some(format!("user:{}", user.id)),
        AuditOutcome::Success,
    )
    .with_headers(&headers)
    .with_details(json!({ "username": user.username, "role": user.role }))
    .log();

    Ok((StatusCode::CREATED, Json(user)))
}

/// Get a staff user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = USERS_TAG,
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_user<R: UserRepository>(
    State(service): State<Arc<UserService<R>>>,
    UuidPath(id): UuidPath,
) -> UserResult<Json<UserResponse>> {
    Ok(Json(service.get_user(id).await?))
}
