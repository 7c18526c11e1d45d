use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use axum_helpers::{
    AuditEvent, AuditOutcome, AuthUser, JwtAuth, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestResponse, BadRequestUuidResponse, BadRequestValidationResponse,
        ConflictResponse, ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse,
        UnauthorizedResponse,
    },
    require_staff,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::CatalogResult;
use crate::models::{
    Category, CategoryWithProducts, CreateCategory, CreateProduct, Product, ProductFilter,
    ProductWithCategory, UpdateCategory, UpdateProduct,
};
use crate::repository::{CategoryRepository, ProductRepository};
use crate::service::{CategoryService, ProductService};

const CATEGORIES_TAG: &str = "categories";
const PRODUCTS_TAG: &str = "products";

/// OpenAPI documentation for the catalog
#[derive(OpenApi)]
#[openapi(
    paths(
        list_categories,
        list_categories_with_products,
        get_category_by_slug,
        get_category,
        create_category,
        update_category,
        delete_category,
        list_products,
        featured_products,
        get_product_by_slug,
        get_product,
        create_product,
        update_product,
        delete_product
    ),
    components(
        schemas(
            Category,
            CategoryWithProducts,
            CreateCategory,
            UpdateCategory,
            Product,
            ProductWithCategory,
            CreateProduct,
            UpdateProduct,
            ProductFilter
        ),
        responses(
            NotFoundResponse,
            BadRequestResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = CATEGORIES_TAG, description = "Product categories"),
        (name = PRODUCTS_TAG, description = "Product catalog")
    )
)]
pub struct ApiDoc;

/// Routes for `/categories/*`; reads are public, writes need a staff token
pub fn categories_router<R: CategoryRepository + 'static>(
    service: CategoryService<R>,
    auth: JwtAuth,
) -> Router {
    let shared_service = Arc::new(service);

    let public = Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/with-products", get(list_categories_with_products))
        .route("/categories/slug/{slug}", get(get_category_by_slug))
        .route("/categories/{id}", get(get_category))
        .with_state(shared_service.clone());

    let staff = Router::new()
        .route("/categories", post(create_category))
        .route(
            "/categories/{id}",
            patch(update_category).delete(delete_category),
        )
        .route_layer(middleware::from_fn_with_state(auth, require_staff))
        .with_state(shared_service);

    public.merge(staff)
}

/// Routes for `/products/*`; reads are public, writes need a staff token
pub fn products_router<R: ProductRepository + 'static>(
    service: ProductService<R>,
    auth: JwtAuth,
) -> Router {
    let shared_service = Arc::new(service);

    let public = Router::new()
        .route("/products", get(list_products))
        .route("/products/featured", get(featured_products))
        .route("/products/slug/{slug}", get(get_product_by_slug))
        .route("/products/{id}", get(get_product))
        .with_state(shared_service.clone());

    let staff = Router::new()
        .route("/products", post(create_product))
        .route(
            "/products/{id}",
            patch(update_product).delete(delete_product),
        )
        .route_layer(middleware::from_fn_with_state(auth, require_staff))
        .with_state(shared_service);

    public.merge(staff)
}

/// List categories by display order
#[utoipa::path(
    get,
    path = "/categories",
    tag = CATEGORIES_TAG,
    responses(
        (status = 200, description = "Categories", body = Vec<Category>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_categories<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
) -> CatalogResult<Json<Vec<Category>>> {
    Ok(Json(service.list().await?))
}

/// List categories with their products
#[utoipa::path(
    get,
    path = "/categories/with-products",
    tag = CATEGORIES_TAG,
    responses(
        (status = 200, description = "Categories with products", body = Vec<CategoryWithProducts>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_categories_with_products<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
) -> CatalogResult<Json<Vec<CategoryWithProducts>>> {
    Ok(Json(service.list_with_products().await?))
}

#[utoipa::path(
    get,
    path = "/categories/slug/{slug}",
    tag = CATEGORIES_TAG,
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_category_by_slug<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    Path(slug): Path<String>,
) -> CatalogResult<Json<Category>> {
    Ok(Json(service.get_by_slug(&slug).await?))
}

#[utoipa::path(
    get,
    path = "/categories/{id}",
    tag = CATEGORIES_TAG,
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category found", body = Category),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    UuidPath(id): UuidPath,
) -> CatalogResult<Json<Category>> {
    Ok(Json(service.get(id).await?))
}

/// Create a category
#[utoipa::path(
    post,
    path = "/categories",
    tag = CATEGORIES_TAG,
    security(("bearer_auth" = [])),
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Category created", body = Category),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn create_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    AuthUser(claims): AuthUser,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateCategory>,
) -> CatalogResult<impl IntoResponse> {
    let category = service.create(input).await?;

    AuditEvent::new(
        Some(claims.sub),
        "category.create",
        Some(format!("category:{}", category.id)),
        AuditOutcome::Success,
    )
    .with_headers(&headers)
    .with_details(json!({ "slug": category.slug }))
    .log();

    Ok((StatusCode::CREATED, Json(category)))
}

/// Partially update a category
#[utoipa::path(
    patch,
    path = "/categories/{id}",
    tag = CATEGORIES_TAG,
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = UpdateCategory,
    responses(
        (status = 200, description = "Category updated", body = Category),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn update_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateCategory>,
) -> CatalogResult<Json<Category>> {
    Ok(Json(service.update(id, input).await?))
}

/// Delete a category without products
#[utoipa::path(
    delete,
    path = "/categories/{id}",
    tag = CATEGORIES_TAG,
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn delete_category<R: CategoryRepository>(
    State(service): State<Arc<CategoryService<R>>>,
    AuthUser(claims): AuthUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> CatalogResult<StatusCode> {
    service.delete(id).await?;

    AuditEvent::new(
        Some(claims.sub),
        "category.delete",
        Some(format!("category:{}", id)),
        AuditOutcome::Success,
    )
    .with_headers(&headers)
    .log();

    Ok(StatusCode::NO_CONTENT)
}

/// List products, newest first
#[utoipa::path(
    get,
    path = "/products",
    tag = PRODUCTS_TAG,
    params(ProductFilter),
    responses(
        (status = 200, description = "Products", body = Vec<ProductWithCategory>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Query(filter): Query<ProductFilter>,
) -> CatalogResult<Json<Vec<ProductWithCategory>>> {
    Ok(Json(service.list(filter).await?))
}

/// Featured, active products
#[utoipa::path(
    get,
    path = "/products/featured",
    tag = PRODUCTS_TAG,
    responses(
        (status = 200, description = "Featured products", body = Vec<ProductWithCategory>)
    )
)]
async fn featured_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
) -> CatalogResult<Json<Vec<ProductWithCategory>>> {
    Ok(Json(service.featured().await?))
}

#[utoipa::path(
    get,
    path = "/products/slug/{slug}",
    tag = PRODUCTS_TAG,
    params(("slug" = String, Path, description = "Product slug")),
    responses(
        (status = 200, description = "Product found", body = ProductWithCategory),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_product_by_slug<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(slug): Path<String>,
) -> CatalogResult<Json<ProductWithCategory>> {
    Ok(Json(service.get_by_slug(&slug).await?))
}

#[utoipa::path(
    get,
    path = "/products/{id}",
    tag = PRODUCTS_TAG,
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product found", body = ProductWithCategory),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse)
    )
)]
async fn get_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    UuidPath(id): UuidPath,
) -> CatalogResult<Json<ProductWithCategory>> {
    Ok(Json(service.get(id).await?))
}

/// Create a product
#[utoipa::path(
    post,
    path = "/products",
    tag = PRODUCTS_TAG,
    security(("bearer_auth" = [])),
    request_body = CreateProduct,
    responses(
        (status = 201, description = "Product created", body = ProductWithCategory),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    AuthUser(claims): AuthUser,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateProduct>,
) -> CatalogResult<impl IntoResponse> {
    let created = service.create(input).await?;

    AuditEvent::new(
        Some(claims.sub),
        "product.create",
        Some(format!("product:{}", created.product.id)),
        AuditOutcome::Success,
    )
    .with_headers(&headers)
    .with_details(json!({ "slug": created.product.slug, "price": created.product.price }))
    .log();

    Ok((StatusCode::CREATED, Json(created)))
}

/// Partially update a product
#[utoipa::path(
    patch,
    path = "/products/{id}",
    tag = PRODUCTS_TAG,
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Product ID")),
    request_body = UpdateProduct,
    responses(
        (status = 200, description = "Product updated", body = ProductWithCategory),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateProduct>,
) -> CatalogResult<Json<ProductWithCategory>> {
    Ok(Json(service.update(id, input).await?))
}

/// Delete a product that no order references
#[utoipa::path(
    delete,
    path = "/products/{id}",
    tag = PRODUCTS_TAG,
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse)
    )
)]
async fn delete_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    AuthUser(claims): AuthUser,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> CatalogResult<StatusCode> {
    service.delete(id).await?;

    AuditEvent::new(
        Some(claims.sub),
        "product.delete",
        Some(format!("product:{}", id)),
        AuditOutcome::Success,
    )
    .with_headers(&headers)
    .log();

    Ok(StatusCode::NO_CONTENT)
}
