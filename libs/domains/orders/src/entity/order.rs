use crate::models::{Order, OrderStatus, PaymentMethod, PaymentStatus, ShippingType};
use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub order_number: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub shipping_address: Option<String>,
    pub shipping_type: Option<ShippingType>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub shipping_cost: Decimal,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub subtotal: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub discount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub webpay_token: Option<String>,
    pub webpay_transaction_id: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Order {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            order_number: model.order_number,
            customer_id: model.customer_id,
            customer_name: model.customer_name,
            customer_email: model.customer_email,
            customer_phone: model.customer_phone,
            shipping_address: model.shipping_address,
            shipping_type: model.shipping_type,
            shipping_cost: model.shipping_cost,
            tracking_number: model.tracking_number,
            estimated_delivery: model.estimated_delivery.map(Into::into),
            subtotal: model.subtotal,
            discount: model.discount,
            total: model.total,
            status: model.status,
            payment_method: model.payment_method,
            payment_status: model.payment_status,
            webpay_token: model.webpay_token,
            webpay_transaction_id: model.webpay_transaction_id,
            notes: model.notes,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<Order> for ActiveModel {
    fn from(order: Order) -> Self {
        ActiveModel {
            id: Set(order.id),
            order_number: Set(order.order_number),
            customer_id: Set(order.customer_id),
            customer_name: Set(order.customer_name),
            customer_email: Set(order.customer_email),
            customer_phone: Set(order.customer_phone),
            shipping_address: Set(order.shipping_address),
            shipping_type: Set(order.shipping_type),
            shipping_cost: Set(order.shipping_cost),
            tracking_number: Set(order.tracking_number),
            estimated_delivery: Set(order.estimated_delivery.map(Into::into)),
            subtotal: Set(order.subtotal),
            discount: Set(order.discount),
            total: Set(order.total),
            status: Set(order.status),
            payment_method: Set(order.payment_method),
            payment_status: Set(order.payment_status),
            webpay_token: Set(order.webpay_token),
            webpay_transaction_id: Set(order.webpay_transaction_id),
            notes: Set(order.notes),
            created_at: Set(order.created_at.into()),
            updated_at: Set(order.updated_at.into()),
        }
    }
}
