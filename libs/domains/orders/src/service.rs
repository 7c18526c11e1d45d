use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{OrderError, OrderResult};
use crate::models::{
    ConfirmWebpay, CreateOrder, OrderDraft, OrderFilter, OrderWithItems, PaymentOutcome,
    PaymentStatus, UpdateOrderStatus, WebpayRedirect, merge_lines,
};
use crate::payment::{CreateTransaction, PaymentGateway};
use crate::repository::OrderRepository;
use crate::shipping::{ShippingOption, ShippingService};

const MAX_PAGE_SIZE: usize = 100;

/// Checkout, payment and fulfilment of orders
pub struct OrderService<R: OrderRepository> {
    repository: Arc<R>,
    gateway: Arc<dyn PaymentGateway>,
    shipping: Arc<ShippingService>,
    frontend_url: String,
}

impl<R: OrderRepository> Clone for OrderService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            gateway: Arc::clone(&self.gateway),
            shipping: Arc::clone(&self.shipping),
            frontend_url: self.frontend_url.clone(),
        }
    }
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(
        repository: R,
        gateway: Arc<dyn PaymentGateway>,
        shipping: ShippingService,
        frontend_url: impl Into<String>,
    ) -> Self {
        Self {
            repository: Arc::new(repository),
            gateway,
            shipping: Arc::new(shipping),
            frontend_url: frontend_url.into(),
        }
    }

    /// Place an order; `customer_id` is set for signed-in customers
    #[instrument(skip(self, input), fields(items = input.items.len()))]
    pub async fn create(
        &self,
        input: CreateOrder,
        customer_id: Option<Uuid>,
    ) -> OrderResult<OrderWithItems> {
        input
            .validate()
            .map_err(|e| OrderError::Validation(e.to_string()))?;

        let lines = merge_lines(&input.items)?;

        let shipping_cost = match input.shipping_type {
            Some(shipping_type) => {
                self.shipping
                    .option(shipping_type)
                    .ok_or_else(|| {
                        OrderError::InvalidOrder(format!(
                            "Shipping option {} is not available",
                            shipping_type
                        ))
                    })?
                    .price
            }
            None => Decimal::ZERO,
        };

        let draft = OrderDraft {
            customer_id,
            customer_name: input.customer_name,
            customer_email: input.customer_email,
            customer_phone: input.customer_phone,
            shipping_address: input.shipping_address,
            shipping_type: input.shipping_type,
            shipping_cost,
            lines,
            payment_method: input.payment_method.unwrap_or_default(),
            discount: input.discount.unwrap_or(Decimal::ZERO),
            notes: input.notes,
        };

        self.repository.place_order(draft).await
    }

    pub async fn get(&self, id: Uuid) -> OrderResult<OrderWithItems> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("Order with id {}", id)))
    }

    pub async fn get_by_number(&self, order_number: &str) -> OrderResult<OrderWithItems> {
        self.repository
            .get_by_number(order_number)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("Order {}", order_number)))
    }

    pub async fn list(&self, mut filter: OrderFilter) -> OrderResult<Vec<OrderWithItems>> {
        filter.limit = filter.limit.clamp(1, MAX_PAGE_SIZE);
        self.repository.list(filter).await
    }

    /// Orders placed by a signed-in customer
    pub async fn mine(&self, customer_id: Uuid) -> OrderResult<Vec<OrderWithItems>> {
        self.repository.list_for_customer(customer_id).await
    }

    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        id: Uuid,
        input: UpdateOrderStatus,
    ) -> OrderResult<OrderWithItems> {
        self.repository
            .update_status(id, input.status, input.payment_status)
            .await?
            .ok_or_else(|| OrderError::NotFound(format!("Order with id {}", id)))
    }

    /// Open a Webpay transaction for a pending order
    #[instrument(skip(self))]
    pub async fn init_webpay(&self, id: Uuid) -> OrderResult<WebpayRedirect> {
        let order = self.get(id).await?.order;

        if order.payment_status != PaymentStatus::Pending {
            return Err(OrderError::AlreadyProcessed);
        }

        let created = self
            .gateway
            .create_transaction(CreateTransaction {
                amount: order.total,
                buy_order: order.order_number.clone(),
                session_id: order.id.to_string(),
                return_url: format!("{}/checkout/confirm", self.frontend_url),
            })
            .await?;

        self.repository
            .set_webpay_token(order.id, &created.token)
            .await?;

        tracing::info!(order_number = %order.order_number, "Webpay transaction opened");
        Ok(WebpayRedirect {
            token: created.token,
            url: created.url,
        })
    }

    /// Commit the transaction behind `token` and settle the order
    #[instrument(skip(self, input))]
    pub async fn confirm_webpay(&self, input: ConfirmWebpay) -> OrderResult<OrderWithItems> {
        input
            .validate()
            .map_err(|e| OrderError::Validation(e.to_string()))?;

        let order = self
            .repository
            .get_by_token(&input.token)
            .await?
            .ok_or_else(|| OrderError::NotFound("Order for this payment token".to_string()))?
            .order;

        if order.payment_status != PaymentStatus::Pending {
            return Err(OrderError::AlreadyProcessed);
        }

        let commit = self.gateway.commit_transaction(&input.token).await?;
        let outcome = if commit.is_approved() {
            PaymentOutcome::Approved {
                transaction_id: commit.buy_order,
            }
        } else {
            tracing::warn!(
                order_number = %order.order_number,
                response_code = commit.response_code,
                "Webpay payment rejected"
            );
            PaymentOutcome::Rejected
        };

        self.repository.resolve_payment(order.id, outcome).await
    }

    pub fn shipping_options(&self) -> Vec<ShippingOption> {
        self.shipping.available_options()
    }

    /// Book the carrier for an order and mark it shipped
    #[instrument(skip(self))]
    pub async fn create_shipment(&self, id: Uuid) -> OrderResult<OrderWithItems> {
        let order = self.get(id).await?.order;

        let shipping_type = order.shipping_type.ok_or_else(|| {
            OrderError::InvalidOrder("Order has no shipping type".to_string())
        })?;
        if order.tracking_number.is_some() {
            return Err(OrderError::Conflict(
                "Order already has a shipment".to_string(),
            ));
        }

        let shipment = self
            .shipping
            .create_shipment(shipping_type, &order.order_number);
        self.repository
            .record_shipment(id, shipment.tracking_number, shipment.estimated_delivery)
            .await
    }
}
