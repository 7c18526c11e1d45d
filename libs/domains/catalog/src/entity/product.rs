use crate::models::{Product, UpdateProduct};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    pub image: Option<String>,
    #[sea_orm(unique)]
    pub slug: String,
    pub stock: i32,
    pub is_active: bool,
    pub is_featured: bool,
    pub category_id: Uuid,
    pub compatible_model: Option<String>,
    pub color: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Product {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            image: model.image,
            slug: model.slug,
            stock: model.stock,
            is_active: model.is_active,
            is_featured: model.is_featured,
            category_id: model.category_id,
            compatible_model: model.compatible_model,
            color: model.color,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<Product> for ActiveModel {
    fn from(product: Product) -> Self {
        ActiveModel {
            id: Set(product.id),
            name: Set(product.name),
            description: Set(product.description),
            price: Set(product.price),
            image: Set(product.image),
            slug: Set(product.slug),
            stock: Set(product.stock),
            is_active: Set(product.is_active),
            is_featured: Set(product.is_featured),
            category_id: Set(product.category_id),
            compatible_model: Set(product.compatible_model),
            color: Set(product.color),
            created_at: Set(product.created_at.into()),
            updated_at: Set(product.updated_at.into()),
        }
    }
}

impl ActiveModel {
    /// Mark only the columns present in `changes`. Stock is written only when
    /// the edit names it, so checkout decrements committed meanwhile survive.
    pub fn set_changes(&mut self, changes: UpdateProduct) {
        if let Some(name) = changes.name {
            self.name = Set(name);
        }
        if changes.description.is_some() {
            self.description = Set(changes.description);
        }
        if let Some(price) = changes.price {
            self.price = Set(price.round_dp(2));
        }
        if changes.image.is_some() {
            self.image = Set(changes.image);
        }
        if let Some(slug) = changes.slug {
            self.slug = Set(slug);
        }
        if let Some(stock) = changes.stock {
            self.stock = Set(stock);
        }
        if let Some(is_active) = changes.is_active {
            self.is_active = Set(is_active);
        }
        if let Some(is_featured) = changes.is_featured {
            self.is_featured = Set(is_featured);
        }
        if let Some(category_id) = changes.category_id {
            self.category_id = Set(category_id);
        }
        if changes.compatible_model.is_some() {
            self.compatible_model = Set(changes.compatible_model);
        }
        if changes.color.is_some() {
            self.color = Set(changes.color);
        }
        self.updated_at = Set(Utc::now().into());
    }
}
