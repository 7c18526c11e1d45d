use chrono::{DateTime, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Lowercase words joined by single dashes, e.g. `carcasa-iphone-15`
static SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug regex"));

fn validate_slug(slug: &str) -> Result<(), validator::ValidationError> {
    if !SLUG.is_match(slug) {
        return Err(validator::ValidationError::new("invalid_slug"));
    }
    Ok(())
}

fn validate_non_negative(value: &Decimal) -> Result<(), validator::ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(validator::ValidationError::new("negative_amount"));
    }
    Ok(())
}

/// Product category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image: Option<String>,
    /// Display position, ascending
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 100), custom(function = "validate_slug"))]
    pub slug: String,
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateCategory {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100), custom(function = "validate_slug"))]
    pub slug: Option<String>,
    pub description: Option<String>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    pub sort_order: Option<i32>,
    pub is_active: Option<bool>,
}

impl Category {
    pub fn new(input: CreateCategory) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            slug: input.slug,
            description: input.description,
            image: input.image,
            sort_order: input.sort_order.unwrap_or(0),
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: UpdateCategory) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(slug) = update.slug {
            self.slug = slug;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(image) = update.image {
            self.image = Some(image);
        }
        if let Some(sort_order) = update.sort_order {
            self.sort_order = sort_order;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        self.updated_at = Utc::now();
    }
}

/// Category together with all of its products
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryWithProducts {
    #[serde(flatten)]
    pub category: Category,
    pub products: Vec<Product>,
}

/// Sellable product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    /// Unit price, two decimal places
    #[schema(value_type = String, example = "15000.00")]
    pub price: Decimal,
    pub image: Option<String>,
    pub slug: String,
    pub stock: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub category_id: Uuid,
    pub compatible_model: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Product as served to clients, with its category embedded
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductWithCategory {
    #[serde(flatten)]
    pub product: Product,
    pub category: Category,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub description: Option<String>,
    #[validate(custom(function = "validate_non_negative"))]
    #[schema(value_type = String, example = "15000.00")]
    pub price: Decimal,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    #[validate(length(min = 1, max = 200), custom(function = "validate_slug"))]
    pub slug: String,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub category_id: Uuid,
    #[validate(length(max = 100))]
    pub compatible_model: Option<String>,
    #[validate(length(max = 50))]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateProduct {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(custom(function = "validate_non_negative"))]
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    #[validate(length(max = 500))]
    pub image: Option<String>,
    #[validate(length(min = 1, max = 200), custom(function = "validate_slug"))]
    pub slug: Option<String>,
    #[validate(range(min = 0))]
    pub stock: Option<i32>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub category_id: Option<Uuid>,
    #[validate(length(max = 100))]
    pub compatible_model: Option<String>,
    #[validate(length(max = 50))]
    pub color: Option<String>,
}

impl Product {
    pub fn new(input: CreateProduct) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: input.name,
            description: input.description,
            price: input.price.round_dp(2),
            image: input.image,
            slug: input.slug,
            stock: input.stock.unwrap_or(0),
            is_active: input.is_active.unwrap_or(true),
            is_featured: input.is_featured.unwrap_or(false),
            category_id: input.category_id,
            compatible_model: input.compatible_model,
            color: input.color,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_update(&mut self, update: UpdateProduct) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(price) = update.price {
            self.price = price.round_dp(2);
        }
        if let Some(image) = update.image {
            self.image = Some(image);
        }
        if let Some(slug) = update.slug {
            self.slug = slug;
        }
        if let Some(stock) = update.stock {
            self.stock = stock;
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
        if let Some(is_featured) = update.is_featured {
            self.is_featured = is_featured;
        }
        if let Some(category_id) = update.category_id {
            self.category_id = category_id;
        }
        if let Some(compatible_model) = update.compatible_model {
            self.compatible_model = Some(compatible_model);
        }
        if let Some(color) = update.color {
            self.color = Some(color);
        }
        self.updated_at = Utc::now();
    }
}

/// Query filters for listing products
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct ProductFilter {
    pub category_id: Option<Uuid>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for ProductFilter {
    fn default() -> Self {
        Self {
            category_id: None,
            is_active: None,
            is_featured: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}
