use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{
    Category, CategoryWithProducts, Product, ProductFilter, ProductWithCategory, UpdateProduct,
};

/// Persistence for product categories
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// Insert a category; a taken name or slug is `Duplicate`
    async fn create(&self, category: Category) -> CatalogResult<Category>;

    async fn get_by_id(&self, id: Uuid) -> CatalogResult<Option<Category>>;

    async fn get_by_slug(&self, slug: &str) -> CatalogResult<Option<Category>>;

    /// All categories by `sort_order`, then `name`
    async fn list(&self) -> CatalogResult<Vec<Category>>;

    /// Same order as [`list`](Self::list), each with its products newest first
    async fn list_with_products(&self) -> CatalogResult<Vec<CategoryWithProducts>>;

    async fn update(&self, category: Category) -> CatalogResult<Category>;

    /// Returns false when nothing was deleted; `InUse` while products reference it
    async fn delete(&self, id: Uuid) -> CatalogResult<bool>;
}

/// Persistence for products, always read back with their category
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a product; unknown category is `UnknownCategory`, taken slug is `Duplicate`
    async fn create(&self, product: Product) -> CatalogResult<ProductWithCategory>;

    async fn get_by_id(&self, id: Uuid) -> CatalogResult<Option<ProductWithCategory>>;

    async fn get_by_slug(&self, slug: &str) -> CatalogResult<Option<ProductWithCategory>>;

    /// Filtered page, newest first
    async fn list(&self, filter: ProductFilter) -> CatalogResult<Vec<ProductWithCategory>>;

    /// Products both featured and active, newest first
    async fn featured(&self) -> CatalogResult<Vec<ProductWithCategory>>;

    /// Write only the fields present in `changes`; columns it leaves out,
    /// stock in particular, keep whatever value is stored at write time
    async fn update(&self, id: Uuid, changes: UpdateProduct) -> CatalogResult<ProductWithCategory>;

    /// Returns false when nothing was deleted; `InUse` while order items reference it
    async fn delete(&self, id: Uuid) -> CatalogResult<bool>;
}

pub type SharedProducts = Arc<RwLock<HashMap<Uuid, Product>>>;

/// In-memory catalog implementing both repositories (for development/testing)
///
/// The product table is shared so an in-memory order store can check and
/// decrement stock against the same data.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCatalogRepository {
    categories: Arc<RwLock<HashMap<Uuid, Category>>>,
    products: SharedProducts,
    referenced: Arc<RwLock<HashSet<Uuid>>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the product table
    pub fn products(&self) -> SharedProducts {
        Arc::clone(&self.products)
    }

    /// Record that order items now point at these products
    pub async fn mark_referenced(&self, ids: impl IntoIterator<Item = Uuid>) {
        self.referenced.write().await.extend(ids);
    }

    async fn with_category(&self, product: Product) -> CatalogResult<ProductWithCategory> {
        let categories = self.categories.read().await;
        let category = categories
            .get(&product.category_id)
            .cloned()
            .ok_or_else(|| CatalogError::Internal(format!("product {} lost its category", product.id)))?;
        Ok(ProductWithCategory { product, category })
    }

    async fn embed_all(&self, products: Vec<Product>) -> CatalogResult<Vec<ProductWithCategory>> {
        let mut result = Vec::with_capacity(products.len());
        for product in products {
            result.push(self.with_category(product).await?);
        }
        Ok(result)
    }
}

fn sort_categories(categories: &mut [Category]) {
    categories.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
}

fn newest_first(products: &mut [Product]) {
    products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[async_trait]
impl CategoryRepository for InMemoryCatalogRepository {
    async fn create(&self, category: Category) -> CatalogResult<Category> {
        let mut categories = self.categories.write().await;

        if categories
            .values()
            .any(|c| c.name == category.name || c.slug == category.slug)
        {
            return Err(CatalogError::Duplicate(format!("category {}", category.slug)));
        }

        categories.insert(category.id, category.clone());
        tracing::info!(category_id = %category.id, slug = %category.slug, "Created category");
        Ok(category)
    }

    async fn get_by_id(&self, id: Uuid) -> CatalogResult<Option<Category>> {
        Ok(self.categories.read().await.get(&id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> CatalogResult<Option<Category>> {
        let categories = self.categories.read().await;
        Ok(categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn list(&self) -> CatalogResult<Vec<Category>> {
        let mut result: Vec<Category> = self.categories.read().await.values().cloned().collect();
        sort_categories(&mut result);
        Ok(result)
    }

    async fn list_with_products(&self) -> CatalogResult<Vec<CategoryWithProducts>> {
        let categories = CategoryRepository::list(self).await?;
        let products = self.products.read().await;

        Ok(categories
            .into_iter()
            .map(|category| {
                let mut items: Vec<Product> = products
                    .values()
                    .filter(|p| p.category_id == category.id)
                    .cloned()
                    .collect();
                newest_first(&mut items);
                CategoryWithProducts {
                    category,
                    products: items,
                }
            })
            .collect())
    }

    async fn update(&self, category: Category) -> CatalogResult<Category> {
        let mut categories = self.categories.write().await;

        if !categories.contains_key(&category.id) {
            return Err(CatalogError::category_not_found(category.id));
        }
        if categories
            .values()
            .any(|c| c.id != category.id && (c.name == category.name || c.slug == category.slug))
        {
            return Err(CatalogError::Duplicate(format!("category {}", category.slug)));
        }

        categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete(&self, id: Uuid) -> CatalogResult<bool> {
        let mut categories = self.categories.write().await;
        if !categories.contains_key(&id) {
            return Ok(false);
        }

        if self.products.read().await.values().any(|p| p.category_id == id) {
            return Err(CatalogError::InUse(format!("category {} has products", id)));
        }

        categories.remove(&id);
        tracing::info!(category_id = %id, "Deleted category");
        Ok(true)
    }
}

#[async_trait]
impl ProductRepository for InMemoryCatalogRepository {
    async fn create(&self, product: Product) -> CatalogResult<ProductWithCategory> {
        if !self.categories.read().await.contains_key(&product.category_id) {
            return Err(CatalogError::UnknownCategory(product.category_id));
        }

        {
            let mut products = self.products.write().await;
            if products.values().any(|p| p.slug == product.slug) {
                return Err(CatalogError::Duplicate(format!("product {}", product.slug)));
            }
            products.insert(product.id, product.clone());
        }

        tracing::info!(product_id = %product.id, slug = %product.slug, "Created product");
        self.with_category(product).await
    }

    async fn get_by_id(&self, id: Uuid) -> CatalogResult<Option<ProductWithCategory>> {
        let product = self.products.read().await.get(&id).cloned();
        match product {
            Some(product) => Ok(Some(self.with_category(product).await?)),
            None => Ok(None),
        }
    }

    async fn get_by_slug(&self, slug: &str) -> CatalogResult<Option<ProductWithCategory>> {
        let product = self
            .products
            .read()
            .await
            .values()
            .find(|p| p.slug == slug)
            .cloned();
        match product {
            Some(product) => Ok(Some(self.with_category(product).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, filter: ProductFilter) -> CatalogResult<Vec<ProductWithCategory>> {
        let mut matching: Vec<Product> = self
            .products
            .read()
            .await
            .values()
            .filter(|p| filter.category_id.is_none_or(|id| p.category_id == id))
            .filter(|p| filter.is_active.is_none_or(|active| p.is_active == active))
            .filter(|p| filter.is_featured.is_none_or(|featured| p.is_featured == featured))
            .cloned()
            .collect();
        newest_first(&mut matching);

        let page = matching
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect();
        self.embed_all(page).await
    }

    async fn featured(&self) -> CatalogResult<Vec<ProductWithCategory>> {
        let mut matching: Vec<Product> = self
            .products
            .read()
            .await
            .values()
            .filter(|p| p.is_featured && p.is_active)
            .cloned()
            .collect();
        newest_first(&mut matching);
        self.embed_all(matching).await
    }

    async fn update(&self, id: Uuid, changes: UpdateProduct) -> CatalogResult<ProductWithCategory> {
        if let Some(category_id) = changes.category_id {
            if !self.categories.read().await.contains_key(&category_id) {
                return Err(CatalogError::UnknownCategory(category_id));
            }
        }

        let product = {
            let mut products = self.products.write().await;
            if let Some(slug) = &changes.slug {
                if products.values().any(|p| p.id != id && &p.slug == slug) {
                    return Err(CatalogError::Duplicate(format!("product {}", slug)));
                }
            }
            let product = products
                .get_mut(&id)
                .ok_or_else(|| CatalogError::product_not_found(id))?;
            product.apply_update(changes);
            product.clone()
        };

        self.with_category(product).await
    }

    async fn delete(&self, id: Uuid) -> CatalogResult<bool> {
        if self.referenced.read().await.contains(&id) {
            return Err(CatalogError::InUse(format!("product {} is in orders", id)));
        }

        let removed = self.products.write().await.remove(&id).is_some();
        if removed {
            tracing::info!(product_id = %id, "Deleted product");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateCategory, CreateProduct};
    use rust_decimal::Decimal;

    fn category(name: &str, slug: &str, sort_order: i32) -> Category {
        Category::new(CreateCategory {
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
            image: None,
            sort_order: Some(sort_order),
            is_active: None,
        })
    }

    fn product(slug: &str, category_id: Uuid, featured: bool) -> Product {
        Product::new(CreateProduct {
            name: slug.to_string(),
            description: None,
            price: Decimal::from(10000),
            image: None,
            slug: slug.to_string(),
            stock: Some(5),
            is_active: None,
            is_featured: Some(featured),
            category_id,
            compatible_model: None,
            color: None,
        })
    }

    #[tokio::test]
    async fn test_categories_ordered_by_sort_order_then_name() {
        let repo = InMemoryCatalogRepository::new();
        CategoryRepository::create(&repo, category("Otros", "otros", 4)).await.unwrap();
        CategoryRepository::create(&repo, category("JBL", "jbl", 2)).await.unwrap();
        CategoryRepository::create(&repo, category("Carcasas", "carcasas", 2)).await.unwrap();

        let slugs: Vec<String> = CategoryRepository::list(&repo)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.slug)
            .collect();
        assert_eq!(slugs, vec!["carcasas", "jbl", "otros"]);
    }

    #[tokio::test]
    async fn test_duplicate_category_name_conflicts() {
        let repo = InMemoryCatalogRepository::new();
        CategoryRepository::create(&repo, category("Gamer", "gamer", 0)).await.unwrap();

        let result = CategoryRepository::create(&repo, category("Gamer", "gamer-2", 0)).await;
        assert!(matches!(result, Err(CatalogError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_category_with_products_cannot_be_deleted() {
        let repo = InMemoryCatalogRepository::new();
        let cat = CategoryRepository::create(&repo, category("JBL", "jbl", 0)).await.unwrap();
        ProductRepository::create(&repo, product("jbl-go-3", cat.id, false))
            .await
            .unwrap();

        let result = CategoryRepository::delete(&repo, cat.id).await;
        assert!(matches!(result, Err(CatalogError::InUse(_))));
        assert!(!CategoryRepository::delete(&repo, Uuid::now_v7()).await.unwrap());
    }

    #[tokio::test]
    async fn test_product_requires_existing_category() {
        let repo = InMemoryCatalogRepository::new();
        let missing = Uuid::now_v7();

        let result = ProductRepository::create(&repo, product("orphan", missing, false)).await;
        assert!(matches!(result, Err(CatalogError::UnknownCategory(id)) if id == missing));
    }

    #[tokio::test]
    async fn test_featured_excludes_inactive() {
        let repo = InMemoryCatalogRepository::new();
        let cat = CategoryRepository::create(&repo, category("Gamer", "gamer", 0)).await.unwrap();

        ProductRepository::create(&repo, product("shown", cat.id, true)).await.unwrap();
        let mut hidden = product("hidden", cat.id, true);
        hidden.is_active = false;
        ProductRepository::create(&repo, hidden).await.unwrap();
        ProductRepository::create(&repo, product("plain", cat.id, false)).await.unwrap();

        let featured = repo.featured().await.unwrap();
        assert_eq!(featured.len(), 1);
        assert_eq!(featured[0].product.slug, "shown");
        assert_eq!(featured[0].category.id, cat.id);
    }

    #[tokio::test]
    async fn test_list_filters_and_pages() {
        let repo = InMemoryCatalogRepository::new();
        let a = CategoryRepository::create(&repo, category("A", "a", 0)).await.unwrap();
        let b = CategoryRepository::create(&repo, category("B", "b", 1)).await.unwrap();

        for i in 0..3 {
            ProductRepository::create(&repo, product(&format!("a-{}", i), a.id, false))
                .await
                .unwrap();
        }
        ProductRepository::create(&repo, product("b-0", b.id, false)).await.unwrap();

        let in_a = ProductRepository::list(
            &repo,
            ProductFilter {
                category_id: Some(a.id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(in_a.len(), 3);

        let page = ProductRepository::list(
            &repo,
            ProductFilter {
                limit: 2,
                offset: 3,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.len(), 1);
    }

    #[tokio::test]
    async fn test_name_edit_keeps_stock_taken_meanwhile() {
        let repo = InMemoryCatalogRepository::new();
        let cat = CategoryRepository::create(&repo, category("A", "a", 0)).await.unwrap();
        let created = ProductRepository::create(&repo, product("p", cat.id, false))
            .await
            .unwrap();
        let id = created.product.id;

        // checkout takes two units after the edit form was loaded
        repo.products().write().await.entry(id).and_modify(|p| p.stock -= 2);

        let updated = ProductRepository::update(
            &repo,
            id,
            UpdateProduct {
                name: Some("renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.product.name, "renamed");
        assert_eq!(updated.product.stock, 3);

        let missing_category = ProductRepository::update(
            &repo,
            id,
            UpdateProduct {
                category_id: Some(Uuid::now_v7()),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(missing_category, Err(CatalogError::UnknownCategory(_))));
    }

    #[tokio::test]
    async fn test_referenced_product_cannot_be_deleted() {
        let repo = InMemoryCatalogRepository::new();
        let cat = CategoryRepository::create(&repo, category("A", "a", 0)).await.unwrap();
        let created = ProductRepository::create(&repo, product("p", cat.id, false))
            .await
            .unwrap();

        repo.mark_referenced([created.product.id]).await;

        let result = ProductRepository::delete(&repo, created.product.id).await;
        assert!(matches!(result, Err(CatalogError::InUse(_))));
    }
}
