use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    Category, CategoryWithProducts, CreateCategory, CreateProduct, Product, ProductFilter,
    ProductWithCategory, UpdateCategory, UpdateProduct,
};
use crate::repository::{CategoryRepository, ProductRepository};

/// Largest page a product listing will return
pub const MAX_PAGE_SIZE: usize = 100;

/// Category management
pub struct CategoryService<R: CategoryRepository> {
    repository: Arc<R>,
}

impl<R: CategoryRepository> Clone for CategoryService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: CategoryRepository> CategoryService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub async fn list(&self) -> CatalogResult<Vec<Category>> {
        self.repository.list().await
    }

    pub async fn list_with_products(&self) -> CatalogResult<Vec<CategoryWithProducts>> {
        self.repository.list_with_products().await
    }

    pub async fn get(&self, id: Uuid) -> CatalogResult<Category> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::category_not_found(id))
    }

    pub async fn get_by_slug(&self, slug: &str) -> CatalogResult<Category> {
        self.repository
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Category '{}'", slug)))
    }

    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create(&self, input: CreateCategory) -> CatalogResult<Category> {
        input
            .validate()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        self.repository.create(Category::new(input)).await
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateCategory) -> CatalogResult<Category> {
        input
            .validate()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        let mut category = self.get(id).await?;
        category.apply_update(input);
        self.repository.update(category).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> CatalogResult<()> {
        if !self.repository.delete(id).await? {
            return Err(CatalogError::category_not_found(id));
        }
        Ok(())
    }
}

/// Product management and storefront queries
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: ProductRepository> ProductService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub async fn list(&self, mut filter: ProductFilter) -> CatalogResult<Vec<ProductWithCategory>> {
        filter.limit = filter.limit.clamp(1, MAX_PAGE_SIZE);
        self.repository.list(filter).await
    }

    pub async fn featured(&self) -> CatalogResult<Vec<ProductWithCategory>> {
        self.repository.featured().await
    }

    pub async fn get(&self, id: Uuid) -> CatalogResult<ProductWithCategory> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| CatalogError::product_not_found(id))
    }

    pub async fn get_by_slug(&self, slug: &str) -> CatalogResult<ProductWithCategory> {
        self.repository
            .get_by_slug(slug)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("Product '{}'", slug)))
    }

    #[instrument(skip(self, input), fields(slug = %input.slug))]
    pub async fn create(&self, input: CreateProduct) -> CatalogResult<ProductWithCategory> {
        input
            .validate()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        self.repository.create(Product::new(input)).await
    }

    #[instrument(skip(self, input))]
    pub async fn update(&self, id: Uuid, input: UpdateProduct) -> CatalogResult<ProductWithCategory> {
        input
            .validate()
            .map_err(|e| CatalogError::Validation(e.to_string()))?;

        self.repository.update(id, input).await
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> CatalogResult<()> {
        if !self.repository.delete(id).await? {
            return Err(CatalogError::product_not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{MockCategoryRepository, MockProductRepository};
    use mockall::predicate::eq;
    use rust_decimal::Decimal;

    fn sample_category() -> Category {
        Category::new(CreateCategory {
            name: "Smartwatch".to_string(),
            slug: "smartwatch".to_string(),
            description: None,
            image: None,
            sort_order: Some(5),
            is_active: None,
        })
    }

    fn sample_product(category_id: Uuid) -> Product {
        Product::new(CreateProduct {
            name: "Correa Apple Watch".to_string(),
            description: None,
            price: Decimal::from(12990),
            image: None,
            slug: "correa-apple-watch".to_string(),
            stock: Some(3),
            is_active: None,
            is_featured: None,
            category_id,
            compatible_model: Some("Apple Watch".to_string()),
            color: None,
        })
    }

    #[tokio::test]
    async fn test_get_missing_category_is_not_found() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_get_by_id().returning(|_| Ok(None));

        let service = CategoryService::new(repo);
        let result = service.get(Uuid::now_v7()).await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_category_rejects_bad_slug() {
        let repo = MockCategoryRepository::new();
        let service = CategoryService::new(repo);

        let result = service
            .create(CreateCategory {
                name: "Bad".to_string(),
                slug: "Bad Slug".to_string(),
                description: None,
                image: None,
                sort_order: None,
                is_active: None,
            })
            .await;
        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    #[tokio::test]
    async fn test_update_category_merges_fields() {
        let existing = sample_category();
        let id = existing.id;

        let mut repo = MockCategoryRepository::new();
        repo.expect_get_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_update()
            .withf(|c| c.name == "Relojes" && c.slug == "smartwatch")
            .returning(|c| Ok(c));

        let service = CategoryService::new(repo);
        let updated = service
            .update(
                id,
                UpdateCategory {
                    name: Some("Relojes".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Relojes");
    }

    #[tokio::test]
    async fn test_delete_missing_category_is_not_found() {
        let mut repo = MockCategoryRepository::new();
        repo.expect_delete().returning(|_| Ok(false));

        let service = CategoryService::new(repo);
        let result = service.delete(Uuid::now_v7()).await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_products_clamps_limit() {
        let mut repo = MockProductRepository::new();
        repo.expect_list()
            .withf(|f| f.limit == MAX_PAGE_SIZE && f.offset == 10)
            .returning(|_| Ok(vec![]));

        let service = ProductService::new(repo);
        let result = service
            .list(ProductFilter {
                limit: 10_000,
                offset: 10,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_update_product_passes_only_requested_fields() {
        let category = sample_category();
        let product = sample_product(category.id);
        let id = product.id;

        let mut repo = MockProductRepository::new();
        repo.expect_get_by_id().never();
        repo.expect_update()
            .withf(move |target, changes| {
                *target == id && changes.name.is_some() && changes.stock.is_none()
            })
            .returning(move |_, changes| {
                let mut updated = product.clone();
                updated.apply_update(changes);
                Ok(ProductWithCategory {
                    product: updated,
                    category: category.clone(),
                })
            });

        let service = ProductService::new(repo);
        let updated = service
            .update(
                id,
                UpdateProduct {
                    name: Some("Correa Milanese".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.product.name, "Correa Milanese");
        assert_eq!(updated.product.stock, 3);
        assert_eq!(updated.product.price, Decimal::from(12990));
    }

    #[tokio::test]
    async fn test_update_product_rejects_negative_stock() {
        let mut repo = MockProductRepository::new();
        repo.expect_update().never();

        let service = ProductService::new(repo);
        let result = service
            .update(
                Uuid::now_v7(),
                UpdateProduct {
                    stock: Some(-1),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(CatalogError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_product_rejects_negative_stock() {
        let repo = MockProductRepository::new();
        let service = ProductService::new(repo);

        let mut input = CreateProduct {
            name: "X".to_string(),
            description: None,
            price: Decimal::ONE,
            image: None,
            slug: "x".to_string(),
            stock: Some(-1),
            is_active: None,
            is_featured: None,
            category_id: Uuid::now_v7(),
            compatible_model: None,
            color: None,
        };
        assert!(matches!(
            service.create(input.clone()).await,
            Err(CatalogError::Validation(_))
        ));

        input.stock = Some(0);
        input.price = Decimal::NEGATIVE_ONE;
        assert!(matches!(
            service.create(input).await,
            Err(CatalogError::Validation(_))
        ));
    }
}
