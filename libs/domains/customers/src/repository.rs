use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CustomerError, CustomerResult};
use crate::models::{Customer, CustomerChanges, CustomerFilter};

/// Repository trait for customer persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Insert a new customer; a taken email is an error
    async fn create(&self, customer: Customer) -> CustomerResult<Customer>;

    async fn get_by_id(&self, id: Uuid) -> CustomerResult<Option<Customer>>;

    /// Lookup by normalized email
    async fn get_by_email(&self, email: &str) -> CustomerResult<Option<Customer>>;

    /// Filtered page, newest first
    async fn list(&self, filter: CustomerFilter) -> CustomerResult<Vec<Customer>>;

    /// Write only the columns set in `changes`; a taken email is an error
    async fn update(&self, id: Uuid, changes: CustomerChanges) -> CustomerResult<Customer>;

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> CustomerResult<()>;

    /// `(total, active)` customer counts
    async fn count(&self) -> CustomerResult<(u64, u64)>;
}

/// In-memory implementation of CustomerRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryCustomerRepository {
    customers: Arc<RwLock<HashMap<Uuid, Customer>>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn create(&self, customer: Customer) -> CustomerResult<Customer> {
        let mut customers = self.customers.write().await;

        if customers.values().any(|c| c.email == customer.email) {
            return Err(CustomerError::EmailTaken(customer.email));
        }

        customers.insert(customer.id, customer.clone());
        tracing::info!(customer_id = %customer.id, "Created customer");
        Ok(customer)
    }

    async fn get_by_id(&self, id: Uuid) -> CustomerResult<Option<Customer>> {
        Ok(self.customers.read().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> CustomerResult<Option<Customer>> {
        let customers = self.customers.read().await;
        Ok(customers.values().find(|c| c.email == email).cloned())
    }

    async fn list(&self, filter: CustomerFilter) -> CustomerResult<Vec<Customer>> {
        let customers = self.customers.read().await;
        let mut result: Vec<Customer> = customers
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(result
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    async fn update(&self, id: Uuid, changes: CustomerChanges) -> CustomerResult<Customer> {
        let mut customers = self.customers.write().await;

        if let Some(email) = &changes.email {
            if customers.values().any(|c| c.id != id && &c.email == email) {
                return Err(CustomerError::EmailTaken(email.clone()));
            }
        }

        let customer = customers.get_mut(&id).ok_or(CustomerError::NotFound(id))?;
        customer.apply(changes);

        tracing::info!(customer_id = %id, "Updated customer");
        Ok(customer.clone())
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> CustomerResult<()>;

    /// `(total, active)` customer counts
    async fn count(&self) -> CustomerResult<(u64, u64)>;
}

/// In-memory implementation of CustomerRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryCustomerRepository {
    customers: Arc<RwLock<HashMap<Uuid, Customer>>>,
}

impl InMemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerRepository for InMemoryCustomerRepository {
    async fn create(&self, customer: Customer) -> CustomerResult<Customer> {
        let mut customers = self.customers.write().await;

        if customers.values().any(|c| c.email == customer.email) {
            return Err(CustomerError::EmailTaken(customer.email));
        }

        customers.insert(customer.id, customer.clone());
        tracing::info!(customer_id = %customer.id, "Created customer");
        Ok(customer)
    }

    async fn get_by_id(&self, id: Uuid) -> CustomerResult<Option<Customer>> {
        Ok(self.customers.read().await.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> CustomerResult<Option<Customer>> {
        let customers = self.customers.read().await;
        Ok(customers.values().find(|c| c.email == email).cloned())
    }

    async fn list(&self, filter: CustomerFilter) -> CustomerResult<Vec<Customer>> {
        let customers = self.customers.read().await;
        let mut result: Vec<Customer> = customers
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(result
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    async fn update(&self, mut customer: Customer) -> CustomerResult<Customer> {
        let mut customers = self.customers.write().await;

        if !customers.contains_key(&customer.id) {
            return Err(CustomerError::NotFound(customer.id));
        }
        if customers
            .values()
            .any(|c| c.id != customer.id && c.email == customer.email)
        {
            return Err(CustomerError::EmailTaken(customer.email));
        }

        customer.updated_at = Utc::now();
        customers.insert(customer.id, customer.clone());

        tracing::info!(customer_id = %customer.id, "Updated customer");
        Ok(customer)
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> CustomerResult<()> {
        let mut customers = self.customers.write().await;
        let customer = customers
            .get_mut(&id)
            .ok_or(CustomerError::NotFound(id))?;
        customer.last_login = Some(at);
        Ok(())
    }

    async fn count(&self) -> CustomerResult<(u64, u64)> {
        let customers = self.customers.read().await;
        let active = customers.values().filter(|c| c.is_active).count();
        Ok((customers.len() as u64, active as u64))
    }
}
