//! Catalog Domain
//!
//! Categories and products. Reads are public for the storefront, writes are
//! staff-only. Products are always served with their category embedded.
//!
//! ```rust,no_run
//! use axum_helpers::{JwtAuth, JwtConfig};
//! use domain_catalog::{handlers, CategoryService, InMemoryCatalogRepository, ProductService};
//!
//! let auth = JwtAuth::new(&JwtConfig::new("x".repeat(32), 3600).unwrap());
//! let repo = InMemoryCatalogRepository::new();
//! let router = handlers::categories_router(CategoryService::new(repo.clone()), auth.clone())
//!     .merge(handlers::products_router(ProductService::new(repo), auth));
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{CatalogError, CatalogResult};
pub use models::{
    Category, CategoryWithProducts, CreateCategory, CreateProduct, Product, ProductFilter,
    ProductWithCategory, UpdateCategory, UpdateProduct,
};
pub use postgres::{PgCategoryRepository, PgProductRepository};
pub use repository::{
    CategoryRepository, InMemoryCatalogRepository, ProductRepository, SharedProducts,
};
pub use service::{CategoryService, MAX_PAGE_SIZE, ProductService};
