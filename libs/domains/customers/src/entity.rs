use crate::models::{Customer, CustomerChanges};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

/// Sea-ORM Entity for the customers table
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub full_name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: String,
    #[sea_orm(column_type = "Text")]
    pub password_hash: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub is_active: bool,
    pub last_login: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Customer {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            full_name: model.full_name,
            email: model.email,
            phone: model.phone,
            password_hash: model.password_hash,
            address: model.address,
            city: model.city,
            region: model.region,
            is_active: model.is_active,
            last_login: model.last_login.map(Into::into),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<Customer> for ActiveModel {
    fn from(customer: Customer) -> Self {
        ActiveModel {
            id: Set(customer.id),
            full_name: Set(customer.full_name),
            email: Set(customer.email),
            phone: Set(customer.phone),
            password_hash: Set(customer.password_hash),
            address: Set(customer.address),
            city: Set(customer.city),
            region: Set(customer.region),
            is_active: Set(customer.is_active),
            last_login: Set(customer.last_login.map(Into::into)),
            created_at: Set(customer.created_at.into()),
            updated_at: Set(customer.updated_at.into()),
        }
    }
}

impl ActiveModel {
    /// Mark the columns in `changes` for the UPDATE; everything else stays
    /// `Unchanged` and is left out of the statement.
    pub fn set_changes(&mut self, changes: CustomerChanges) {
        if let Some(full_name) = changes.full_name {
            self.full_name = Set(full_name);
        }
        if let Some(email) = changes.email {
            self.email = Set(email);
        }
        if let Some(phone) = changes.phone {
            self.phone = Set(phone);
        }
        if let Some(hash) = changes.password_hash {
            self.password_hash = Set(hash);
        }
        if changes.address.is_some() {
            self.address = Set(changes.address);
        }
        if changes.city.is_some() {
            self.city = Set(changes.city);
        }
        if changes.region.is_some() {
            self.region = Set(changes.region);
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = Set(is_active);
        }
        self.updated_at = Set(Utc::now().into());
    }
}
