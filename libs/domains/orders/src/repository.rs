use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use domain_catalog::{InMemoryCatalogRepository, Product, SharedProducts};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::{OrderError, OrderResult};
use crate::models::{
    Order, OrderDraft, OrderFilter, OrderStatus, OrderWithItems, PaymentOutcome, PaymentStatus,
    format_order_number, price_order,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Price, number and store an order and take its items out of stock, atomically
    async fn place_order(&self, draft: OrderDraft) -> OrderResult<OrderWithItems>;

    async fn get_by_id(&self, id: Uuid) -> OrderResult<Option<OrderWithItems>>;

    async fn get_by_number(&self, order_number: &str) -> OrderResult<Option<OrderWithItems>>;

    async fn get_by_token(&self, token: &str) -> OrderResult<Option<OrderWithItems>>;

    /// Filtered page, newest first
    async fn list(&self, filter: OrderFilter) -> OrderResult<Vec<OrderWithItems>>;

    /// All orders of one customer, newest first
    async fn list_for_customer(&self, customer_id: Uuid) -> OrderResult<Vec<OrderWithItems>>;

    /// Returns `None` when the order does not exist
    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> OrderResult<Option<OrderWithItems>>;

    async fn set_webpay_token(&self, id: Uuid, token: &str) -> OrderResult<OrderWithItems>;

    /// Settle a pending payment; `AlreadyProcessed` if it is no longer pending.
    /// A rejection puts the items back in stock.
    async fn resolve_payment(
        &self,
        id: Uuid,
        outcome: PaymentOutcome,
    ) -> OrderResult<OrderWithItems>;

    /// Store tracking data and mark the order shipped
    async fn record_shipment(
        &self,
        id: Uuid,
        tracking_number: String,
        estimated_delivery: DateTime<Utc>,
    ) -> OrderResult<OrderWithItems>;

    /// Distinct customers with at least one order
    async fn count_customers_with_orders(&self) -> OrderResult<u64>;
}

fn order_not_found(id: Uuid) -> OrderError {
    OrderError::NotFound(format!("Order with id {}", id))
}

/// In-memory order store (for development/testing)
///
/// Stock lives in the catalog's product table, so placing an order here is
/// visible through the in-memory catalog repositories.
#[derive(Clone)]
pub struct InMemoryOrderRepository {
    orders: Arc<RwLock<HashMap<Uuid, OrderWithItems>>>,
    catalog: InMemoryCatalogRepository,
    products: SharedProducts,
    numbering: Arc<Mutex<()>>,
}

impl InMemoryOrderRepository {
    pub fn new(catalog: InMemoryCatalogRepository) -> Self {
        Self {
            orders: Arc::new(RwLock::new(HashMap::new())),
            products: catalog.products(),
            catalog,
            numbering: Arc::new(Mutex::new(())),
        }
    }

    async fn modify<F>(&self, id: Uuid, change: F) -> OrderResult<OrderWithItems>
    where
        F: FnOnce(&mut Order) -> OrderResult<()> + Send,
    {
        let mut orders = self.orders.write().await;
        let stored = orders.get_mut(&id).ok_or_else(|| order_not_found(id))?;
        change(&mut stored.order)?;
        stored.order.updated_at = Utc::now();
        Ok(stored.clone())
    }

    fn newest_first(mut orders: Vec<OrderWithItems>) -> Vec<OrderWithItems> {
        orders.sort_by(|a, b| b.order.created_at.cmp(&a.order.created_at));
        orders
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn place_order(&self, draft: OrderDraft) -> OrderResult<OrderWithItems> {
        let _numbering = self.numbering.lock().await;
        let mut products = self.products.write().await;

        let referenced: HashMap<Uuid, Product> = draft
            .lines
            .iter()
            .filter_map(|l| products.get(&l.product_id).map(|p| (p.id, p.clone())))
            .collect();
        let pricing = price_order(&draft.lines, &referenced, draft.discount, draft.shipping_cost)?;

        let year = Utc::now().year();
        let placed_this_year = self
            .orders
            .read()
            .await
            .values()
            .filter(|o| o.order.created_at.year() == year)
            .count() as u64;

        let placed = OrderWithItems::build(
            draft,
            format_order_number(year, placed_this_year),
            pricing,
        );

        for item in &placed.items {
            if let Some(product) = products.get_mut(&item.product_id) {
                product.stock -= item.quantity;
            }
        }
        drop(products);

        self.catalog
            .mark_referenced(placed.items.iter().map(|i| i.product_id))
            .await;
        self.orders
            .write()
            .await
            .insert(placed.order.id, placed.clone());

        tracing::info!(
            order_id = %placed.order.id,
            order_number = %placed.order.order_number,
            total = %placed.order.total,
            "Placed order"
        );
        Ok(placed)
    }

    async fn get_by_id(&self, id: Uuid) -> OrderResult<Option<OrderWithItems>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn get_by_number(&self, order_number: &str) -> OrderResult<Option<OrderWithItems>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .find(|o| o.order.order_number == order_number)
            .cloned())
    }

    async fn get_by_token(&self, token: &str) -> OrderResult<Option<OrderWithItems>> {
        let orders = self.orders.read().await;
        Ok(orders
            .values()
            .find(|o| o.order.webpay_token.as_deref() == Some(token))
            .cloned())
    }

    async fn list(&self, filter: OrderFilter) -> OrderResult<Vec<OrderWithItems>> {
        let orders = self.orders.read().await;

        let matching: Vec<OrderWithItems> = orders
            .values()
            .filter(|o| filter.status.is_none_or(|s| o.order.status == s))
            .filter(|o| {
                filter
                    .payment_status
                    .is_none_or(|s| o.order.payment_status == s)
            })
            .filter(|o| {
                filter
                    .customer_id
                    .is_none_or(|c| o.order.customer_id == Some(c))
            })
            .cloned()
            .collect();

        Ok(Self::newest_first(matching)
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .collect())
    }

    async fn list_for_customer(&self, customer_id: Uuid) -> OrderResult<Vec<OrderWithItems>> {
        let orders = self.orders.read().await;
        let mine = orders
            .values()
            .filter(|o| o.order.customer_id == Some(customer_id))
            .cloned()
            .collect();
        Ok(Self::newest_first(mine))
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> OrderResult<Option<OrderWithItems>> {
        let result = self
            .modify(id, |order| {
                order.status = status;
                if let Some(payment_status) = payment_status {
                    order.payment_status = payment_status;
                }
                Ok(())
            })
            .await;

        match result {
            Ok(order) => Ok(Some(order)),
            Err(OrderError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn set_webpay_token(&self, id: Uuid, token: &str) -> OrderResult<OrderWithItems> {
        let token = token.to_string();
        self.modify(id, move |order| {
            order.webpay_token = Some(token);
            Ok(())
        })
        .await
    }

    async fn resolve_payment(
        &self,
        id: Uuid,
        outcome: PaymentOutcome,
    ) -> OrderResult<OrderWithItems> {
        let mut products = self.products.write().await;
        let mut orders = self.orders.write().await;
        let stored = orders.get_mut(&id).ok_or_else(|| order_not_found(id))?;

        if stored.order.payment_status != PaymentStatus::Pending {
            return Err(OrderError::AlreadyProcessed);
        }

        match outcome {
            PaymentOutcome::Approved { transaction_id } => {
                stored.order.payment_status = PaymentStatus::Approved;
                stored.order.status = OrderStatus::Paid;
                stored.order.webpay_transaction_id = Some(transaction_id);
            }
            PaymentOutcome::Rejected => {
                stored.order.payment_status = PaymentStatus::Rejected;
                for item in &stored.items {
                    if let Some(product) = products.get_mut(&item.product_id) {
                        product.stock += item.quantity;
                    }
                }
            }
        }
        stored.order.updated_at = Utc::now();

        tracing::info!(
            order_id = %id,
            payment_status = %stored.order.payment_status,
            "Resolved payment"
        );
        Ok(stored.clone())
    }

    async fn record_shipment(
        &self,
        id: Uuid,
        tracking_number: String,
        estimated_delivery: DateTime<Utc>,
    ) -> OrderResult<OrderWithItems> {
        self.modify(id, move |order| {
            if order.tracking_number.is_some() {
                return Err(OrderError::Conflict(
                    "Order already has a shipment".to_string(),
                ));
            }
            order.tracking_number = Some(tracking_number);
            order.estimated_delivery = Some(estimated_delivery);
            order.status = OrderStatus::Shipped;
            Ok(())
        })
        .await
    }

    async fn count_customers_with_orders(&self) -> OrderResult<u64> {
        let orders = self.orders.read().await;
        let mut customers: Vec<Uuid> = orders.values().filter_map(|o| o.order.customer_id).collect();
        customers.sort();
        customers.dedup();
        Ok(customers.len() as u64)
    }
}
