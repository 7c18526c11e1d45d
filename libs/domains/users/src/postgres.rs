use async_trait::async_trait;
use database::BaseRepository;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use crate::{
    entity,
    error::{UserError, UserResult},
    models::User,
    repository::UserRepository,
};

pub struct PgUserRepository {
    base: BaseRepository<entity::Entity>,
}

impl PgUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        if self.exists(&user.username, &user.email).await? {
            return Err(UserError::Duplicate(user.username));
        }

        let active_model: entity::ActiveModel = user.into();
        let model = self.base.insert(active_model).await?;

        tracing::info!(user_id = %model.id, username = %model.username, "Created user");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let model = self.base.find_by_id(id).await?;
        Ok(model.map(Into::into))
    }

    async fn get_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let model = entity::Entity::find()
            .filter(entity::Column::Username.eq(username))
            .one(self.base.db())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn list(&self) -> UserResult<Vec<User>> {
        let models = entity::Entity::find()
            .order_by_desc(entity::Column::CreatedAt)
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn exists(&self, username: &str, email: &str) -> UserResult<bool> {
        let found = entity::Entity::find()
            .filter(
                Condition::any()
                    .add(entity::Column::Username.eq(username))
                    .add(entity::Column::Email.eq(email)),
            )
            .one(self.base.db())
            .await?
            .is_some();

        Ok(found)
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let id = user.id;
        if self.base.find_by_id(id).await?.is_none() {
            return Err(UserError::NotFound(id));
        }

        let active_model: entity::ActiveModel = user.into();
        let model = self.base.update(active_model).await?;

        tracing::info!(user_id = %id, "Updated user");
        Ok(model.into())
    }
}
