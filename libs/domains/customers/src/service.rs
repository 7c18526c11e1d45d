use axum_helpers::{JwtAuth, hash_password, verify_password};
use chrono::Utc;
use domain_orders::OrderRepository;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{CustomerError, CustomerResult};
use crate::models::{
    AuthResponse, Customer, CustomerChanges, CustomerFilter, CustomerResponse, CustomerStats,
    CustomerWithOrders, LoginCustomer, RegisterCustomer, UpdateCustomer, normalize_email,
};
use crate::repository::CustomerRepository;

const MAX_PAGE_SIZE: usize = 100;

/// Service layer for storefront accounts and backoffice customer management
pub struct CustomerService<R: CustomerRepository> {
    repository: Arc<R>,
    orders: Arc<dyn OrderRepository>,
    auth: JwtAuth,
}

impl<R: CustomerRepository> Clone for CustomerService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            orders: Arc::clone(&self.orders),
            auth: self.auth.clone(),
        }
    }
}

impl<R: CustomerRepository> CustomerService<R> {
    pub fn new(repository: R, orders: Arc<dyn OrderRepository>, auth: JwtAuth) -> Self {
        Self {
            repository: Arc::new(repository),
            orders,
            auth,
        }
    }

    /// Create an account and sign it in
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: RegisterCustomer) -> CustomerResult<AuthResponse> {
        input
            .validate()
            .map_err(|e| CustomerError::Validation(e.to_string()))?;

        let email = normalize_email(&input.email);
        if self.repository.get_by_email(&email).await?.is_some() {
            return Err(CustomerError::EmailTaken(email));
        }

        let password_hash = hash(&input.password)?;
        let customer = self
            .repository
            .create(Customer::new(input, password_hash))
            .await?;

        self.signed_in(customer)
    }

    /// Check credentials and issue a customer token
    ///
    /// Unknown, inactive and wrong-password logins all fail the same way.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginCustomer) -> CustomerResult<AuthResponse> {
        let mut customer = self
            .repository
            .get_by_email(&normalize_email(&input.email))
            .await?
            .filter(|c| c.is_active)
            .ok_or(CustomerError::InvalidCredentials)?;

        if !verify_password(&input.password, &customer.password_hash) {
            return Err(CustomerError::InvalidCredentials);
        }

        let now = Utc::now();
        self.repository.touch_last_login(customer.id, now).await?;
        customer.last_login = Some(now);

        self.signed_in(customer)
    }

    pub async fn get(&self, id: Uuid) -> CustomerResult<CustomerResponse> {
        self.repository
            .get_by_id(id)
            .await?
            .map(Into::into)
            .ok_or(CustomerError::NotFound(id))
    }

    /// Profile plus every order the customer placed
    pub async fn get_with_orders(&self, id: Uuid) -> CustomerResult<CustomerWithOrders> {
        let customer = self.get(id).await?;
        let orders = self.orders.list_for_customer(id).await?;
        Ok(CustomerWithOrders { customer, orders })
    }

    pub async fn list(&self, mut filter: CustomerFilter) -> CustomerResult<Vec<CustomerResponse>> {
        filter.limit = filter.limit.clamp(1, MAX_PAGE_SIZE);
        let customers = self.repository.list(filter).await?;
        Ok(customers.into_iter().map(Into::into).collect())
    }

    pub async fn stats(&self) -> CustomerResult<CustomerStats> {
        let (total, active) = self.repository.count().await?;
        let with_orders = self.orders.count_customers_with_orders().await?;

        Ok(CustomerStats {
            total,
            active,
            inactive: total.saturating_sub(active),
            with_orders,
        })
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateCustomer) -> CustomerResult<CustomerResponse> {
        input
            .validate()
            .map_err(|e| CustomerError::Validation(e.to_string()))?;

        if let Some(email) = input.email.as_deref().map(normalize_email) {
            let taken = self
                .repository
                .get_by_email(&email)
                .await?
                .is_some_and(|other| other.id != id);
            if taken {
                return Err(CustomerError::EmailTaken(email));
            }
        }

        let password_hash = input.password.as_deref().map(hash).transpose()?;
        let changes = CustomerChanges::profile(input, password_hash);

        let updated = self.repository.update(id, changes).await?;
        Ok(updated.into())
    }

    #[instrument(skip(self))]
    pub async fn set_active(&self, id: Uuid, is_active: bool) -> CustomerResult<CustomerResponse> {
        let updated = self
            .repository
            .update(id, CustomerChanges::status(is_active))
            .await?;

        tracing::info!(customer_id = %id, is_active, "Changed customer status");
        Ok(updated.into())
    }

    fn signed_in(&self, customer: Customer) -> CustomerResult<AuthResponse> {
        let token = self
            .auth
            .create_customer_token(customer.id, &customer.email)
            .map_err(|e| {
                tracing::error!("Failed to create customer token: {:?}", e);
                CustomerError::Internal("Failed to create token".to_string())
            })?;

        Ok(AuthResponse {
            customer: customer.into(),
            token,
        })
    }
}

fn hash(password: &str) -> CustomerResult<String> {
    hash_password(password).map_err(|e| CustomerError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockCustomerRepository;
    use axum_helpers::JwtConfig;
    use domain_catalog::InMemoryCatalogRepository;
    use domain_orders::InMemoryOrderRepository;
    use mockall::predicate::eq;

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("test-secret-key-at-least-32-characters-long", 3600).unwrap())
    }

    fn orders() -> Arc<dyn OrderRepository> {
        Arc::new(InMemoryOrderRepository::new(InMemoryCatalogRepository::new()))
    }

    fn registration() -> RegisterCustomer {
        RegisterCustomer {
            full_name: "Valentina Muñoz".to_string(),
            email: "Valentina@Example.cl".to_string(),
            phone: "+56955555555".to_string(),
            password: "secret1".to_string(),
            address: Some("Av. Providencia 1234".to_string()),
            city: Some("Santiago".to_string()),
            region: Some("Metropolitana".to_string()),
        }
    }

    fn stored(password: &str, is_active: bool) -> Customer {
        let mut customer = Customer::new(registration(), hash_password(password).unwrap());
        customer.is_active = is_active;
        customer.last_login = None;
        customer
    }

    fn login(password: &str) -> LoginCustomer {
        LoginCustomer {
            email: "valentina@example.cl".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_issues_customer_token() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_get_by_email()
            .with(eq("valentina@example.cl"))
            .returning(|_| Ok(None));
        repo.expect_create()
            .withf(|c| c.password_hash != "secret1" && c.last_login.is_some())
            .returning(Ok);

        let service = CustomerService::new(repo, orders(), auth());
        let response = service.register(registration()).await.unwrap();

        assert_eq!(response.customer.email, "valentina@example.cl");
        let claims = auth().verify_token(&response.token).unwrap();
        assert!(claims.is_customer());
        assert_eq!(claims.principal_id().unwrap(), response.customer.id);
    }

    #[tokio::test]
    async fn test_register_rejects_taken_email() {
        let mut repo = MockCustomerRepository::new();
        let existing = stored("secret1", true);
        repo.expect_get_by_email()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_create().never();

        let service = CustomerService::new(repo, orders(), auth());
        let result = service.register(registration()).await;
        assert!(matches!(result, Err(CustomerError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn test_login_updates_last_login() {
        let mut repo = MockCustomerRepository::new();
        let customer = stored("secret1", true);
        let id = customer.id;
        repo.expect_get_by_email()
            .returning(move |_| Ok(Some(customer.clone())));
        repo.expect_touch_last_login()
            .withf(move |cid, _| *cid == id)
            .times(1)
            .returning(|_, _| Ok(()));

        let service = CustomerService::new(repo, orders(), auth());
        let response = service.login(login("secret1")).await.unwrap();
        assert!(response.customer.last_login.is_some());
    }

    #[tokio::test]
    async fn test_login_rejects_inactive_and_wrong_password() {
        for (password, active) in [("secret1", false), ("wrong-pass", true)] {
            let mut repo = MockCustomerRepository::new();
            let customer = stored("secret1", active);
            repo.expect_get_by_email()
                .returning(move |_| Ok(Some(customer.clone())));
            repo.expect_touch_last_login().never();

            let service = CustomerService::new(repo, orders(), auth());
            let result = service.login(login(password)).await;
            assert!(matches!(result, Err(CustomerError::InvalidCredentials)));
        }
    }

    #[tokio::test]
    async fn test_update_rejects_email_of_other_customer() {
        let mut repo = MockCustomerRepository::new();
        let id = stored("secret1", true).id;
        let other = stored("secret1", true);
        repo.expect_get_by_email()
            .returning(move |_| Ok(Some(other.clone())));
        repo.expect_update().never();

        let service = CustomerService::new(repo, orders(), auth());
        let result = service
            .update(
                id,
                UpdateCustomer {
                    email: Some("taken@example.cl".to_string()),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(CustomerError::EmailTaken(_))));
    }

    #[tokio::test]
    async fn test_update_rehashes_password() {
        let mut repo = MockCustomerRepository::new();
        let customer = stored("secret1", true);
        let id = customer.id;
        repo.expect_update()
            .withf(move |target, changes| {
                *target == id
                    && changes.full_name.is_none()
                    && changes
                        .password_hash
                        .as_deref()
                        .is_some_and(|hash| verify_password("new-secret", hash))
            })
            .returning(move |_, changes| {
                let mut updated = customer.clone();
                updated.apply(changes);
                Ok(updated)
            });

        let service = CustomerService::new(repo, orders(), auth());
        service
            .update(
                id,
                UpdateCustomer {
                    password: Some("new-secret".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_stats_derive_inactive() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_count().returning(|| Ok((10, 7)));

        let service = CustomerService::new(repo, orders(), auth());
        let stats = service.stats().await.unwrap();

        assert_eq!(
            stats,
            CustomerStats {
                total: 10,
                active: 7,
                inactive: 3,
                with_orders: 0
            }
        );
    }

    #[tokio::test]
    async fn test_list_clamps_limit() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_list()
            .withf(|f| f.limit == MAX_PAGE_SIZE)
            .returning(|_| Ok(Vec::new()));

        let service = CustomerService::new(repo, orders(), auth());
        let filter = CustomerFilter {
            limit: 10_000,
            ..Default::default()
        };
        assert!(service.list(filter).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_set_active_writes_only_status() {
        let mut repo = MockCustomerRepository::new();
        let customer = stored("secret1", true);
        let id = customer.id;
        repo.expect_update()
            .with(eq(id), eq(CustomerChanges::status(false)))
            .returning(move |_, changes| {
                let mut updated = customer.clone();
                updated.apply(changes);
                Ok(updated)
            });

        let service = CustomerService::new(repo, orders(), auth());
        let updated = service.set_active(id, false).await.unwrap();
        assert!(!updated.is_active);
    }

    #[tokio::test]
    async fn test_set_active_missing_customer() {
        let mut repo = MockCustomerRepository::new();
        repo.expect_update()
            .returning(|id, _| Err(CustomerError::NotFound(id)));

        let service = CustomerService::new(repo, orders(), auth());
        let result = service.set_active(Uuid::now_v7(), false).await;
        assert!(matches!(result, Err(CustomerError::NotFound(_))));
    }
}
