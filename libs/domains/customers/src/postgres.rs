use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::BaseRepository;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait,
    IntoActiveModel, PaginatorTrait, QueryFilter, SqlErr, Statement, Value,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{CustomerError, CustomerResult},
    models::{Customer, CustomerChanges, CustomerFilter},
    repository::CustomerRepository,
};

const TOUCH_LAST_LOGIN: &str = "UPDATE customers SET last_login = $2 WHERE id = $1";

pub struct PgCustomerRepository {
    base: BaseRepository<entity::Entity>,
}

impl PgCustomerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    async fn email_taken(&self, email: &str, except: Option<Uuid>) -> CustomerResult<bool> {
        let mut query = entity::Entity::find().filter(entity::Column::Email.eq(email));
        if let Some(id) = except {
            query = query.filter(entity::Column::Id.ne(id));
        }
        Ok(query.one(self.base.db()).await?.is_some())
    }
}

/// Escape `%`, `_` and the escape character itself for a LIKE pattern
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// `SELECT` for the backoffice list with positional parameters
fn list_statement(filter: &CustomerFilter) -> Statement {
    let mut clauses: Vec<String> = Vec::new();
    let mut values: Vec<Value> = Vec::new();

    if let Some(term) = filter.search_term() {
        values.push(like_pattern(term).into());
        let n = values.len();
        clauses.push(format!(
            "(full_name ILIKE ${n} OR email ILIKE ${n} OR phone ILIKE ${n})"
        ));
    }
    if let Some(is_active) = filter.is_active {
        values.push(is_active.into());
        clauses.push(format!("is_active = ${}", values.len()));
    }
    if let Some(city) = &filter.city {
        values.push(city.clone().into());
        clauses.push(format!("city = ${}", values.len()));
    }
    if let Some(region) = &filter.region {
        values.push(region.clone().into());
        clauses.push(format!("region = ${}", values.len()));
    }
    if let Some((start, end)) = filter.created_range() {
        values.push(start.into());
        values.push(end.into());
        let n = values.len();
        clauses.push(format!("created_at >= ${} AND created_at < ${}", n - 1, n));
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    values.push((filter.limit as i64).into());
    values.push((filter.offset as i64).into());
    let n = values.len();

    Statement::from_sql_and_values(
        DbBackend::Postgres,
        format!(
            "SELECT * FROM customers {} ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
            where_clause,
            n - 1,
            n
        ),
        values,
    )
}

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn create(&self, customer: Customer) -> CustomerResult<Customer> {
        if self.email_taken(&customer.email, None).await? {
            return Err(CustomerError::EmailTaken(customer.email));
        }

        let active_model: entity::ActiveModel = customer.into();
        let model = self.base.insert(active_model).await?;

        tracing::info!(customer_id = %model.id, "Created customer");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> CustomerResult<Option<Customer>> {
        let model = self.base.find_by_id(id).await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_email(&self, email: &str) -> CustomerResult<Option<Customer>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Email.eq(email))
            .one(self.base.db())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn list(&self, filter: CustomerFilter) -> CustomerResult<Vec<Customer>> {
        let models = entity::Entity::find()
            .from_raw_sql(list_statement(&filter))
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn update(&self, id: Uuid, changes: CustomerChanges) -> CustomerResult<Customer> {
        let model = self
            .base
            .find_by_id(id)
            .await?
            .ok_or(CustomerError::NotFound(id))?;

        let email = changes.email.clone();
        if let Some(email) = &email {
            if self.email_taken(email, Some(id)).await? {
                return Err(CustomerError::EmailTaken(email.clone()));
            }
        }

        let mut active_model = model.into_active_model();
        active_model.set_changes(changes);
        let model = self.base.update(active_model).await.map_err(|e| {
            if matches!(e, DbErr::RecordNotUpdated) {
                return CustomerError::NotFound(id);
            }
            match (e.sql_err(), email) {
                (Some(SqlErr::UniqueConstraintViolation(_)), Some(email)) => {
                    CustomerError::EmailTaken(email)
                }
                _ => CustomerError::Database(e),
            }
        })?;

        tracing::info!(customer_id = %id, "Updated customer");
        Ok(model.into())
    }

    async fn touch_last_login(&self, id: Uuid, at: DateTime<Utc>) -> CustomerResult<()> {
        let result = self
            .base
            .db()
            .execute_raw(Statement::from_sql_and_values(
                DbBackend::Postgres,
                TOUCH_LAST_LOGIN,
                [id.into(), at.into()],
            ))
            .await?;

        if result.rows_affected() == 0 {
            return Err(CustomerError::NotFound(id));
        }
        Ok(())
    }

    async fn count(&self) -> CustomerResult<(u64, u64)> {
        let total = entity::Entity::find().count(self.base.db()).await?;
        let active = entity::Entity::find()
            .filter(entity::Column::IsActive.eq(true))
            .count(self.base.db())
            .await?;

        Ok((total, active))
    }
}
