//! Handler tests for the catalog domain
//!
//! Public reads, staff-only writes and the conflict rules around slugs and
//! deletes, all against in-memory storage.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum_helpers::{JwtAuth, JwtConfig};
use domain_catalog::*;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "catalog-handler-secret-at-least-32-chars";

struct TestApp {
    app: Router,
    repo: InMemoryCatalogRepository,
    staff_token: String,
    customer_token: String,
}

fn setup() -> TestApp {
    let repo = InMemoryCatalogRepository::new();
    let auth = JwtAuth::new(&JwtConfig::new(SECRET, 3600).unwrap());

    let app = handlers::categories_router(CategoryService::new(repo.clone()), auth.clone())
        .merge(handlers::products_router(
            ProductService::new(repo.clone()),
            auth.clone(),
        ));

    TestApp {
        app,
        repo,
        staff_token: auth
            .create_staff_token(Uuid::now_v7(), "admin", "admin")
            .unwrap(),
        customer_token: auth
            .create_customer_token(Uuid::now_v7(), "buyer@example.com")
            .unwrap(),
    }
}

async fn json_body(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn request(method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn create_category(t: &TestApp, name: &str, slug: &str, sort_order: i32) -> Value {
    let response = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/categories",
            Some(json!({ "name": name, "slug": slug, "sort_order": sort_order })),
            Some(&t.staff_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response.into_body()).await
}

async fn create_product(t: &TestApp, category_id: &str, slug: &str, featured: bool) -> Value {
    let response = t
        .app
        .clone()
        .oneshot(request(
            "POST",
            "/products",
            Some(json!({
                "name": slug,
                "price": "19990.00",
                "slug": slug,
                "stock": 4,
                "is_featured": featured,
                "category_id": category_id
            })),
            Some(&t.staff_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response.into_body()).await
}

#[tokio::test]
async fn test_categories_are_public_and_ordered() {
    let t = setup();
    create_category(&t, "Otros", "otros", 4).await;
    create_category(&t, "JBL", "jbl", 2).await;

    let response = t
        .app
        .oneshot(request("GET", "/categories", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response.into_body()).await;
    let slugs: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["slug"].as_str().unwrap())
        .collect();
    assert_eq!(slugs, vec!["jbl", "otros"]);
}

#[tokio::test]
async fn test_writes_require_staff() {
    let t = setup();
    let body = json!({ "name": "Gamer", "slug": "gamer" });

    let response = t
        .app
        .clone()
        .oneshot(request("POST", "/categories", Some(body.clone()), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = t
        .app
        .oneshot(request(
            "POST",
            "/categories",
            Some(body),
            Some(&t.customer_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_duplicate_category_slug_conflicts() {
    let t = setup();
    create_category(&t, "Gamer", "gamer", 0).await;

    let response = t
        .app
        .oneshot(request(
            "POST",
            "/categories",
            Some(json!({ "name": "Gaming", "slug": "gamer" })),
            Some(&t.staff_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_slug_is_rejected() {
    let t = setup();

    let response = t
        .app
        .oneshot(request(
            "POST",
            "/categories",
            Some(json!({ "name": "Gamer", "slug": "Gamer Zone" })),
            Some(&t.staff_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response.into_body()).await;
    assert!(body["details"].get("slug").is_some());
}

#[tokio::test]
async fn test_category_lookup_by_slug_and_id() {
    let t = setup();
    let created = create_category(&t, "Carcasas", "carcasas", 3).await;
    let id = created["id"].as_str().unwrap();

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/categories/slug/carcasas", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response.into_body()).await["id"], id);

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/categories/slug/missing", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = t
        .app
        .oneshot(request("GET", "/categories/not-a-uuid", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_patch_category() {
    let t = setup();
    let created = create_category(&t, "Samsung", "samsung", 6).await;
    let uri = format!("/categories/{}", created["id"].as_str().unwrap());

    let response = t
        .app
        .clone()
        .oneshot(request(
            "PATCH",
            &uri,
            Some(json!({ "is_active": false })),
            Some(&t.staff_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["is_active"], false);
    assert_eq!(body["name"], "Samsung");

    let response = t
        .app
        .oneshot(request(
            "PATCH",
            &format!("/categories/{}", Uuid::now_v7()),
            Some(json!({ "name": "X" })),
            Some(&t.staff_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_category_in_use_then_free() {
    let t = setup();
    let category = create_category(&t, "JBL", "jbl", 2).await;
    let category_id = category["id"].as_str().unwrap();
    let product = create_product(&t, category_id, "jbl-go-3", false).await;

    let uri = format!("/categories/{}", category_id);
    let response = t
        .app
        .clone()
        .oneshot(request("DELETE", &uri, None, Some(&t.staff_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = t
        .app
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/products/{}", product["id"].as_str().unwrap()),
            None,
            Some(&t.staff_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = t
        .app
        .clone()
        .oneshot(request("DELETE", &uri, None, Some(&t.staff_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = t
        .app
        .oneshot(request("DELETE", &uri, None, Some(&t.staff_token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_embeds_category() {
    let t = setup();
    let category = create_category(&t, "Gamer", "gamer", 7).await;
    let created = create_product(&t, category["id"].as_str().unwrap(), "mouse-rgb", true).await;

    assert_eq!(created["price"], "19990.00");
    assert_eq!(created["category"]["slug"], "gamer");

    let response = t
        .app
        .oneshot(request("GET", "/products/slug/mouse-rgb", None, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["id"], created["id"]);
    assert_eq!(body["category"]["name"], "Gamer");
}

#[tokio::test]
async fn test_product_with_unknown_category_is_bad_request() {
    let t = setup();

    let response = t
        .app
        .oneshot(request(
            "POST",
            "/products",
            Some(json!({
                "name": "Orphan",
                "price": 1000,
                "slug": "orphan",
                "category_id": Uuid::now_v7()
            })),
            Some(&t.staff_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_product_slug_conflicts() {
    let t = setup();
    let category = create_category(&t, "Otros", "otros", 4).await;
    let category_id = category["id"].as_str().unwrap();
    create_product(&t, category_id, "cable-usb-c", false).await;

    let response = t
        .app
        .oneshot(request(
            "POST",
            "/products",
            Some(json!({
                "name": "Otro cable",
                "price": "5990",
                "slug": "cable-usb-c",
                "category_id": category_id
            })),
            Some(&t.staff_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_featured_and_filtered_listing() {
    let t = setup();
    let a = create_category(&t, "A", "a", 0).await;
    let b = create_category(&t, "B", "b", 1).await;
    let a_id = a["id"].as_str().unwrap();

    create_product(&t, a_id, "a-featured", true).await;
    create_product(&t, a_id, "a-plain", false).await;
    create_product(&t, b["id"].as_str().unwrap(), "b-featured", true).await;

    let response = t
        .app
        .clone()
        .oneshot(request("GET", "/products/featured", None, None))
        .await
        .unwrap();
    let featured = json_body(response.into_body()).await;
    assert_eq!(featured.as_array().unwrap().len(), 2);

    let response = t
        .app
        .clone()
        .oneshot(request(
            "GET",
            &format!("/products?category_id={}", a_id),
            None,
            None,
        ))
        .await
        .unwrap();
    let in_a = json_body(response.into_body()).await;
    assert_eq!(in_a.as_array().unwrap().len(), 2);

    let response = t
        .app
        .oneshot(request("GET", "/products?limit=1&offset=0", None, None))
        .await
        .unwrap();
    let page = json_body(response.into_body()).await;
    assert_eq!(page.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_referenced_product_delete_conflicts() {
    let t = setup();
    let category = create_category(&t, "Otros", "otros", 4).await;
    let product = create_product(&t, category["id"].as_str().unwrap(), "sold", false).await;
    let id: Uuid = product["id"].as_str().unwrap().parse().unwrap();

    t.repo.mark_referenced([id]).await;

    let response = t
        .app
        .oneshot(request(
            "DELETE",
            &format!("/products/{}", id),
            None,
            Some(&t.staff_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_patch_product_price() {
    let t = setup();
    let category = create_category(&t, "Otros", "otros", 4).await;
    let product = create_product(&t, category["id"].as_str().unwrap(), "adapter", false).await;

    let response = t
        .app
        .oneshot(request(
            "PATCH",
            &format!("/products/{}", product["id"].as_str().unwrap()),
            Some(json!({ "price": "14990.00", "stock": 0 })),
            Some(&t.staff_token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response.into_body()).await;
    assert_eq!(body["price"], "14990.00");
    assert_eq!(body["stock"], 0);
}
