use async_trait::async_trait;
use database::BaseRepository;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    entity::{category, product},
    error::{CatalogError, CatalogResult},
    models::{
        Category, CategoryWithProducts, Product, ProductFilter, ProductWithCategory, UpdateProduct,
    },
    repository::{CategoryRepository, ProductRepository},
};

pub struct PgCategoryRepository {
    base: BaseRepository<category::Entity>,
}

impl PgCategoryRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn create(&self, category: Category) -> CatalogResult<Category> {
        let slug = category.slug.clone();
        let active_model: category::ActiveModel = category.into();
        let model = self
            .base
            .insert(active_model)
            .await
            .map_err(|e| CatalogError::from_write(e, format!("category {}", slug)))?;

        tracing::info!(category_id = %model.id, slug = %model.slug, "Created category");
        Ok(model.into())
    }

    async fn get_by_id(&self, id: Uuid) -> CatalogResult<Option<Category>> {
        Ok(self.base.find_by_id(id).await?.map(Into::into))
    }

    async fn get_by_slug(&self, slug: &str) -> CatalogResult<Option<Category>> {
        let model = category::Entity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(self.base.db())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self) -> CatalogResult<Vec<Category>> {
        let models = category::Entity::find()
            .order_by_asc(category::Column::SortOrder)
            .order_by_asc(category::Column::Name)
            .all(self.base.db())
            .await?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_with_products(&self) -> CatalogResult<Vec<CategoryWithProducts>> {
        let categories = self.list().await?;

        let mut by_category: HashMap<Uuid, Vec<Product>> = HashMap::new();
        for model in product::Entity::find()
            .order_by_desc(product::Column::CreatedAt)
            .all(self.base.db())
            .await?
        {
            by_category
                .entry(model.category_id)
                .or_default()
                .push(model.into());
        }

        Ok(categories
            .into_iter()
            .map(|category| {
                let products = by_category.remove(&category.id).unwrap_or_default();
                CategoryWithProducts { category, products }
            })
            .collect())
    }

    async fn update(&self, category: Category) -> CatalogResult<Category> {
        let id = category.id;
        if self.base.find_by_id(id).await?.is_none() {
            return Err(CatalogError::category_not_found(id));
        }

        let slug = category.slug.clone();
        let active_model: category::ActiveModel = category.into();
        let model = self
            .base
            .update(active_model)
            .await
            .map_err(|e| CatalogError::from_write(e, format!("category {}", slug)))?;

        tracing::info!(category_id = %id, "Updated category");
        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> CatalogResult<bool> {
        let in_use = product::Entity::find()
            .filter(product::Column::CategoryId.eq(id))
            .count(self.base.db())
            .await?;
        if in_use > 0 {
            return Err(CatalogError::InUse(format!(
                "category {} has {} products",
                id, in_use
            )));
        }

        let deleted = self
            .base
            .delete_by_id(id)
            .await
            .map_err(|e| CatalogError::from_write(e, format!("category {}", id)))?;

        if deleted > 0 {
            tracing::info!(category_id = %id, "Deleted category");
        }
        Ok(deleted > 0)
    }
}

pub struct PgProductRepository {
    base: BaseRepository<product::Entity>,
}

impl PgProductRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    async fn category(&self, id: Uuid) -> CatalogResult<Category> {
        category::Entity::find_by_id(id)
            .one(self.base.db())
            .await?
            .map(Into::into)
            .ok_or(CatalogError::UnknownCategory(id))
    }
}

fn embed(rows: Vec<(product::Model, Option<category::Model>)>) -> Vec<ProductWithCategory> {
    rows.into_iter()
        .filter_map(|(product, category)| {
            category.map(|category| ProductWithCategory {
                product: product.into(),
                category: category.into(),
            })
        })
        .collect()
}

#[async_trait]
impl ProductRepository for PgProductRepository {
    async fn create(&self, product: Product) -> CatalogResult<ProductWithCategory> {
        let slug = product.slug.clone();
        let category_id = product.category_id;
        let active_model: product::ActiveModel = product.into();
        let model = self
            .base
            .insert(active_model)
            .await
            .map_err(|e| CatalogError::from_product_write(e, &slug, category_id))?;

        tracing::info!(product_id = %model.id, slug = %model.slug, "Created product");
        Ok(ProductWithCategory {
            category: self.category(model.category_id).await?,
            product: model.into(),
        })
    }

    async fn get_by_id(&self, id: Uuid) -> CatalogResult<Option<ProductWithCategory>> {
        let rows = product::Entity::find_by_id(id)
            .find_also_related(category::Entity)
            .all(self.base.db())
            .await?;
        Ok(embed(rows).into_iter().next())
    }

    async fn get_by_slug(&self, slug: &str) -> CatalogResult<Option<ProductWithCategory>> {
        let rows = product::Entity::find()
            .filter(product::Column::Slug.eq(slug))
            .find_also_related(category::Entity)
            .all(self.base.db())
            .await?;
        Ok(embed(rows).into_iter().next())
    }

    async fn list(&self, filter: ProductFilter) -> CatalogResult<Vec<ProductWithCategory>> {
        let mut query = product::Entity::find();

        if let Some(category_id) = filter.category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }
        if let Some(is_active) = filter.is_active {
            query = query.filter(product::Column::IsActive.eq(is_active));
        }
        if let Some(is_featured) = filter.is_featured {
            query = query.filter(product::Column::IsFeatured.eq(is_featured));
        }

        let rows = query
            .order_by_desc(product::Column::CreatedAt)
            .limit(filter.limit as u64)
            .offset(filter.offset as u64)
            .find_also_related(category::Entity)
            .all(self.base.db())
            .await?;

        Ok(embed(rows))
    }

    async fn featured(&self) -> CatalogResult<Vec<ProductWithCategory>> {
        let rows = product::Entity::find()
            .filter(product::Column::IsFeatured.eq(true))
            .filter(product::Column::IsActive.eq(true))
            .order_by_desc(product::Column::CreatedAt)
            .find_also_related(category::Entity)
            .all(self.base.db())
            .await?;

        Ok(embed(rows))
    }

    async fn update(&self, id: Uuid, changes: UpdateProduct) -> CatalogResult<ProductWithCategory> {
        let model = self
            .base
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::product_not_found(id))?;

        let category_id = changes.category_id.unwrap_or(model.category_id);
        let slug = changes.slug.clone().unwrap_or_else(|| model.slug.clone());

        let mut active_model = model.into_active_model();
        active_model.set_changes(changes);
        let model = self
            .base
            .update(active_model)
            .await
            .map_err(|e| match e {
                DbErr::RecordNotUpdated => CatalogError::product_not_found(id),
                e => CatalogError::from_product_write(e, &slug, category_id),
            })?;

        tracing::info!(product_id = %id, "Updated product");
        Ok(ProductWithCategory {
            category: self.category(model.category_id).await?,
            product: model.into(),
        })
    }

    async fn delete(&self, id: Uuid) -> CatalogResult<bool> {
        let deleted = self
            .base
            .delete_by_id(id)
            .await
            .map_err(|e| CatalogError::from_write(e, format!("product {} is in orders", id)))?;

        if deleted > 0 {
            tracing::info!(product_id = %id, "Deleted product");
        }
        Ok(deleted > 0)
    }
}
