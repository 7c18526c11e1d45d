use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use domain_orders::OrderWithItems;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Storefront customer as stored, password hash included
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// New active customer from a registration; the email is normalized
    pub fn new(input: RegisterCustomer, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            full_name: input.full_name.trim().to_string(),
            email: normalize_email(&input.email),
            phone: input.phone.trim().to_string(),
            password_hash,
            address: input.address,
            city: input.city,
            region: input.region,
            is_active: true,
            last_login: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Overwrite the columns present in `changes`
    pub fn apply(&mut self, changes: CustomerChanges) {
        let CustomerChanges {
            full_name,
            email,
            phone,
            password_hash,
            address,
            city,
            region,
            is_active,
        } = changes;

        if let Some(full_name) = full_name {
            self.full_name = full_name;
        }
        if let Some(email) = email {
            self.email = email;
        }
        if let Some(phone) = phone {
            self.phone = phone;
        }
        if let Some(hash) = password_hash {
            self.password_hash = hash;
        }
        if address.is_some() {
            self.address = address;
        }
        if city.is_some() {
            self.city = city;
        }
        if region.is_some() {
            self.region = region;
        }
        if let Some(is_active) = is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
    }
}

/// Columns a backoffice edit writes; `None` leaves the stored value alone,
/// so a concurrent login or password change is never overwritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomerChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub is_active: Option<bool>,
}

impl CustomerChanges {
    /// Normalized columns for a profile edit; the password is already hashed
    pub fn profile(input: UpdateCustomer, password_hash: Option<String>) -> Self {
        Self {
            full_name: input.full_name.map(|name| name.trim().to_string()),
            email: input.email.as_deref().map(normalize_email),
            phone: input.phone.map(|phone| phone.trim().to_string()),
            password_hash,
            address: input.address,
            city: input.city,
            region: input.region,
            is_active: None,
        }
    }

    pub fn status(is_active: bool) -> Self {
        Self {
            is_active: Some(is_active),
            ..Default::default()
        }
    }
}

/// Emails are compared and stored trimmed and lowercase
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Customer as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            full_name: customer.full_name,
            email: customer.email,
            phone: customer.phone,
            address: customer.address,
            city: customer.city,
            region: customer.region,
            is_active: customer.is_active,
            last_login: customer.last_login,
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}

/// Storefront sign-up
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterCustomer {
    #[validate(length(min = 2, max = 200))]
    pub full_name: String,
    #[validate(email, length(max = 255))]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub phone: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginCustomer {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Profile plus a customer token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub customer: CustomerResponse,
    pub token: String,
}

/// Backoffice edit of a customer profile
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomer {
    #[validate(length(min = 2, max = 200))]
    pub full_name: Option<String>,
    #[validate(email, length(max = 255))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub phone: Option<String>,
    #[validate(length(min = 6))]
    pub password: Option<String>,
    pub address: Option<String>,
    #[validate(length(max = 100))]
    pub city: Option<String>,
    #[validate(length(max = 100))]
    pub region: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateCustomerStatus {
    pub is_active: bool,
}

/// Query filters for the backoffice customer list
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct CustomerFilter {
    /// Case-insensitive match on name, email or phone
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub city: Option<String>,
    pub region: Option<String>,
    /// First registration day, used only together with `date_to`
    pub date_from: Option<NaiveDate>,
    /// Last registration day, inclusive
    pub date_to: Option<NaiveDate>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for CustomerFilter {
    fn default() -> Self {
        Self {
            search: None,
            is_active: None,
            city: None,
            region: None,
            date_from: None,
            date_to: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

impl CustomerFilter {
    /// Trimmed search term, `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Half-open `[start, end)` registration window covering both days in full
    pub fn created_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let (from, to) = (self.date_from?, self.date_to?);
        let end = to.succ_opt().unwrap_or(to);
        Some((
            from.and_time(NaiveTime::MIN).and_utc(),
            end.and_time(NaiveTime::MIN).and_utc(),
        ))
    }

    /// Whether a customer passes every filter except paging
    pub fn matches(&self, customer: &Customer) -> bool {
        if let Some(term) = self.search_term() {
            let term = term.to_lowercase();
            let hit = [&customer.full_name, &customer.email, &customer.phone]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }
        if self.is_active.is_some_and(|active| active != customer.is_active) {
            return false;
        }
        if self
            .city
            .as_ref()
            .is_some_and(|city| customer.city.as_ref() != Some(city))
        {
            return false;
        }
        if self
            .region
            .as_ref()
            .is_some_and(|region| customer.region.as_ref() != Some(region))
        {
            return false;
        }
        if let Some((start, end)) = self.created_range() {
            if customer.created_at < start || customer.created_at >= end {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CustomerStats {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    /// Distinct customers with at least one order
    pub with_orders: u64,
}

/// Customer profile with their orders, newest first
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerWithOrders {
    #[serde(flatten)]
    pub customer: CustomerResponse,
    pub orders: Vec<OrderWithItems>,
}
