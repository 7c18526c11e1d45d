use chrono::{DateTime, Utc};
use domain_catalog::Product;
use rust_decimal::Decimal;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{OrderError, OrderResult};

/// Fulfilment state of an order
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "order_status")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "processing")]
    Processing,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_status")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "payment_method")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    #[sea_orm(string_value = "webpay")]
    Webpay,
    #[sea_orm(string_value = "transfer")]
    Transfer,
    #[sea_orm(string_value = "cash")]
    Cash,
}

/// Carrier or pickup used to deliver an order
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "shipping_type")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ShippingType {
    #[sea_orm(string_value = "chilexpress")]
    Chilexpress,
    #[sea_orm(string_value = "correos_chile")]
    CorreosChile,
    #[sea_orm(string_value = "starken")]
    Starken,
    #[sea_orm(string_value = "motocicleta")]
    Motocicleta,
    /// Store pickup
    #[sea_orm(string_value = "retiro_tienda")]
    RetiroTienda,
}

/// An order as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    /// `ORD-{year}-{sequence}`
    pub order_number: String,
    /// Set when a signed-in customer placed the order; `None` for guests
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: Option<String>,
    pub shipping_type: Option<ShippingType>,
    #[schema(value_type = String, example = "5000.00")]
    pub shipping_cost: Decimal,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<DateTime<Utc>>,
    #[schema(value_type = String, example = "45000.00")]
    pub subtotal: Decimal,
    #[schema(value_type = String, example = "0.00")]
    pub discount: Decimal,
    #[schema(value_type = String, example = "50000.00")]
    pub total: Decimal,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub webpay_token: Option<String>,
    pub webpay_transaction_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One line of an order with the product's name and price at purchase time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    #[schema(value_type = String, example = "15000.00")]
    pub unit_price: Decimal,
    pub quantity: i32,
    #[schema(value_type = String, example = "30000.00")]
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

fn validate_non_negative(value: &Decimal) -> Result<(), validator::ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(validator::ValidationError::new("negative_amount"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateOrderItem {
    pub product_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// Checkout request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateOrder {
    #[validate(length(min = 1, max = 200))]
    pub customer_name: String,
    #[validate(email)]
    pub customer_email: String,
    #[validate(length(min = 1, max = 50))]
    pub customer_phone: String,
    pub shipping_address: Option<String>,
    pub shipping_type: Option<ShippingType>,
    #[validate(length(min = 1, max = 100), nested)]
    pub items: Vec<CreateOrderItem>,
    pub payment_method: Option<PaymentMethod>,
    #[validate(custom(function = "validate_non_negative"))]
    #[schema(value_type = Option<String>)]
    pub discount: Option<Decimal>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateOrderStatus {
    pub status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ConfirmWebpay {
    #[validate(length(min = 1, max = 255))]
    pub token: String,
}

/// Where to send the buyer to pay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WebpayRedirect {
    pub token: String,
    pub url: String,
}

/// Query filters for the backoffice order list
#[derive(Debug, Clone, Deserialize, ToSchema, IntoParams)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub customer_id: Option<Uuid>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

impl Default for OrderFilter {
    fn default() -> Self {
        Self {
            status: None,
            payment_status: None,
            customer_id: None,
            limit: default_limit(),
            offset: 0,
        }
    }
}

/// A product and the quantity requested, after duplicate lines are merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Sum quantities of repeated products, keeping first-seen order
pub fn merge_lines(items: &[CreateOrderItem]) -> OrderResult<Vec<OrderLine>> {
    let mut lines: Vec<OrderLine> = Vec::with_capacity(items.len());

    for item in items {
        match lines.iter_mut().find(|l| l.product_id == item.product_id) {
            Some(line) => {
                line.quantity = line
                    .quantity
                    .checked_add(item.quantity)
                    .ok_or_else(|| OrderError::InvalidOrder("Quantity too large".to_string()))?;
            }
            None => lines.push(OrderLine {
                product_id: item.product_id,
                quantity: item.quantity,
            }),
        }
    }

    Ok(lines)
}

/// Everything needed to place an order except the figures that depend on
/// current product rows
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub customer_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub shipping_address: Option<String>,
    pub shipping_type: Option<ShippingType>,
    pub shipping_cost: Decimal,
    pub lines: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
    pub discount: Decimal,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

/// Order figures computed from product rows
#[derive(Debug, Clone, PartialEq)]
pub struct Pricing {
    pub lines: Vec<PricedLine>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
}

/// Validate lines against products and compute totals.
///
/// `total = subtotal - discount + shipping_cost`; each line is
/// `unit_price * quantity`.
pub fn price_order(
    lines: &[OrderLine],
    products: &HashMap<Uuid, Product>,
    discount: Decimal,
    shipping_cost: Decimal,
) -> OrderResult<Pricing> {
    if lines.is_empty() {
        return Err(OrderError::InvalidOrder(
            "Order must contain at least one item".to_string(),
        ));
    }

    if lines.iter().any(|l| !products.contains_key(&l.product_id)) {
        return Err(OrderError::InvalidOrder(
            "One or more products do not exist".to_string(),
        ));
    }

    let mut priced = Vec::with_capacity(lines.len());
    let mut subtotal = Decimal::ZERO;

    for line in lines {
        let Some(product) = products.get(&line.product_id) else {
            continue;
        };

        if !product.is_active {
            return Err(OrderError::InvalidOrder(format!(
                "Product {} is not available",
                product.name
            )));
        }
        if product.stock < line.quantity {
            return Err(OrderError::InvalidOrder(format!(
                "Insufficient stock for {}",
                product.name
            )));
        }

        let line_subtotal = product.price * Decimal::from(line.quantity);
        subtotal += line_subtotal;

        priced.push(PricedLine {
            product_id: product.id,
            product_name: product.name.clone(),
            unit_price: product.price,
            quantity: line.quantity,
            subtotal: line_subtotal,
        });
    }

    if discount > subtotal + shipping_cost {
        return Err(OrderError::InvalidOrder(
            "Discount exceeds the order amount".to_string(),
        ));
    }

    Ok(Pricing {
        lines: priced,
        subtotal,
        discount,
        shipping_cost,
        total: subtotal - discount + shipping_cost,
    })
}

/// `ORD-{year}-{n}` where `n` is one past the orders already placed this year
pub fn format_order_number(year: i32, placed_this_year: u64) -> String {
    format!("ORD-{}-{:04}", year, placed_this_year + 1)
}

impl OrderWithItems {
    /// Assemble a new pending order from a draft and its computed figures
    pub fn build(draft: OrderDraft, order_number: String, pricing: Pricing) -> Self {
        let now = Utc::now();
        let id = Uuid::now_v7();

        let items = pricing
            .lines
            .into_iter()
            .map(|line| OrderItem {
                id: Uuid::now_v7(),
                order_id: id,
                product_id: line.product_id,
                product_name: line.product_name,
                unit_price: line.unit_price,
                quantity: line.quantity,
                subtotal: line.subtotal,
                created_at: now,
            })
            .collect();

        let order = Order {
            id,
            order_number,
            customer_id: draft.customer_id,
            customer_name: draft.customer_name,
            customer_email: draft.customer_email,
            customer_phone: draft.customer_phone,
            shipping_address: draft.shipping_address,
            shipping_type: draft.shipping_type,
            shipping_cost: pricing.shipping_cost,
            tracking_number: None,
            estimated_delivery: None,
            subtotal: pricing.subtotal,
            discount: pricing.discount,
            total: pricing.total,
            status: OrderStatus::Pending,
            payment_method: draft.payment_method,
            payment_status: PaymentStatus::Pending,
            webpay_token: None,
            webpay_transaction_id: None,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };

        Self { order, items }
    }
}

/// Result of committing a payment with the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
    Approved { transaction_id: String },
    Rejected,
}
