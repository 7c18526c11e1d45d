//! Integration tests for the customers domain against real PostgreSQL

use axum_helpers::{JwtAuth, JwtConfig};
use chrono::{Duration, Utc};
use domain_customers::*;
use domain_orders::PgOrderRepository;
use std::sync::Arc;
use test_utils::{TestDataBuilder, TestDatabase, assertions::*};

fn auth() -> JwtAuth {
    JwtAuth::new(&JwtConfig::new("integration-secret-at-least-32-chars", 3600).unwrap())
}

fn service(db: &TestDatabase) -> CustomerService<PgCustomerRepository> {
    CustomerService::new(
        PgCustomerRepository::new(db.connection()),
        Arc::new(PgOrderRepository::new(db.connection())),
        auth(),
    )
}

fn registration(email: String, city: &str) -> RegisterCustomer {
    RegisterCustomer {
        full_name: "Fernanda Araya".to_string(),
        email,
        phone: "+56988888888".to_string(),
        password: "secret1".to_string(),
        address: Some("Av. Alemania 500".to_string()),
        city: Some(city.to_string()),
        region: Some("Araucanía".to_string()),
    }
}

#[tokio::test]
async fn test_register_and_login() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("customers_register_login");
    let service = service(&db);
    let email = builder.email("buyer");

    let registered = service
        .register(registration(email.clone(), "Temuco"))
        .await
        .unwrap();
    assert!(registered.customer.is_active);

    let logged_in = service
        .login(LoginCustomer {
            email: email.clone(),
            password: "secret1".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(logged_in.customer.id, registered.customer.id);

    let again = service.register(registration(email, "Temuco")).await;
    assert!(matches!(again, Err(CustomerError::EmailTaken(_))));
}

#[tokio::test]
async fn test_last_login_is_persisted() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("customers_last_login");
    let repo = PgCustomerRepository::new(db.connection());

    let customer = Customer::new(registration(builder.email("a"), "Temuco"), "hash".into());
    let created = repo.create(customer).await.unwrap();

    let at = Utc::now() + Duration::minutes(5);
    repo.touch_last_login(created.id, at).await.unwrap();

    let fetched = assert_some(repo.get_by_id(created.id).await.unwrap(), "customer");
    let stored = assert_some(fetched.last_login, "last login");
    assert!((stored - at).num_milliseconds().abs() < 1);
}

#[tokio::test]
async fn test_list_filters_and_stats() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("customers_list");
    let service = service(&db);

    let temuco = service
        .register(registration(builder.email("temuco"), "Temuco"))
        .await
        .unwrap();
    let osorno = service
        .register(registration(builder.email("osorno"), "Osorno"))
        .await
        .unwrap();
    service.set_active(osorno.customer.id, false).await.unwrap();

    let found = service
        .list(CustomerFilter {
            search: Some(builder.email("temuco").to_uppercase()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_uuid_eq(found[0].id, temuco.customer.id, "search hit");

    let inactive = service
        .list(CustomerFilter {
            is_active: Some(false),
            city: Some("Osorno".to_string()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(inactive.len(), 1);
    assert_uuid_eq(inactive[0].id, osorno.customer.id, "inactive filter");

    let today = Utc::now().date_naive();
    let registered_today = service
        .list(CustomerFilter {
            date_from: Some(today),
            date_to: Some(today),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(registered_today.len(), 2);

    let stats = service.stats().await.unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.active, 1);
    assert_eq!(stats.inactive, 1);
    assert_eq!(stats.with_orders, 0);
}

#[tokio::test]
async fn test_update_email_conflict() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("customers_update");
    let service = service(&db);

    let first = service
        .register(registration(builder.email("first"), "Temuco"))
        .await
        .unwrap();
    service
        .register(registration(builder.email("second"), "Temuco"))
        .await
        .unwrap();

    let result = service
        .update(
            first.customer.id,
            UpdateCustomer {
                email: Some(builder.email("second")),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(CustomerError::EmailTaken(_))));

    let detail = service.get_with_orders(first.customer.id).await.unwrap();
    assert!(detail.orders.is_empty());
}

#[tokio::test]
async fn test_status_change_does_not_rewrite_login_or_password() {
    let db = TestDatabase::new().await;
    let builder = TestDataBuilder::from_test_name("customers_status_columns");
    let repo = PgCustomerRepository::new(db.connection());

    let customer = Customer::new(registration(builder.email("a"), "Temuco"), "hash".into());
    let created = repo.create(customer).await.unwrap();

    // a login lands after the backoffice loaded the row
    let login_at = Utc::now() + Duration::minutes(5);
    repo.touch_last_login(created.id, login_at).await.unwrap();

    let updated = repo
        .update(created.id, CustomerChanges::status(false))
        .await
        .unwrap();
    assert!(!updated.is_active);
    assert_eq!(updated.password_hash, "hash");

    let stored = assert_some(updated.last_login, "last login");
    assert!((stored - login_at).num_milliseconds().abs() < 1);

    let missing = repo
        .update(uuid::Uuid::now_v7(), CustomerChanges::status(true))
        .await;
    assert!(matches!(missing, Err(CustomerError::NotFound(_))));
}
