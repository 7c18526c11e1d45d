use async_trait::async_trait;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use database::BaseRepository;
use domain_catalog::Product;
use domain_catalog::entity::product;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    FromQueryResult, IntoActiveModel, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    Statement, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::{
    entity::{order, order_item},
    error::{OrderError, OrderResult},
    models::{
        OrderDraft, OrderFilter, OrderItem, OrderStatus, OrderWithItems, PaymentOutcome,
        PaymentStatus, format_order_number, price_order,
    },
    repository::OrderRepository,
};

/// Serializes order numbering across concurrent checkouts
const ORDER_NUMBER_LOCK: &str = "SELECT pg_advisory_xact_lock(hashtext('orders.order_number'))";

const TAKE_STOCK: &str = "UPDATE products SET stock = stock - $2 WHERE id = $1 AND stock >= $2";

const RETURN_STOCK: &str = "UPDATE products SET stock = stock + $2 WHERE id = $1";

pub struct PgOrderRepository {
    base: BaseRepository<order::Entity>,
}

impl PgOrderRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

fn order_not_found(id: Uuid) -> OrderError {
    OrderError::NotFound(format!("Order with id {}", id))
}

/// Attach items to orders, keeping the order of `orders`
async fn with_items<C: ConnectionTrait>(
    db: &C,
    orders: Vec<order::Model>,
) -> OrderResult<Vec<OrderWithItems>> {
    if orders.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
    let mut by_order: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for item in order_item::Entity::find()
        .filter(order_item::Column::OrderId.is_in(ids))
        .order_by_asc(order_item::Column::CreatedAt)
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?
    {
        by_order.entry(item.order_id).or_default().push(item.into());
    }

    Ok(orders
        .into_iter()
        .map(|model| OrderWithItems {
            items: by_order.remove(&model.id).unwrap_or_default(),
            order: model.into(),
        })
        .collect())
}

async fn one_with_items<C: ConnectionTrait>(
    db: &C,
    model: Option<order::Model>,
) -> OrderResult<Option<OrderWithItems>> {
    match model {
        Some(model) => Ok(with_items(db, vec![model]).await?.pop()),
        None => Ok(None),
    }
}

fn start_of_year(year: i32) -> OrderResult<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| OrderError::Internal(format!("invalid year {}", year)))
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
    async fn place_order(&self, draft: OrderDraft) -> OrderResult<OrderWithItems> {
        let txn = self.base.db().begin().await?;
        txn.execute_unprepared(ORDER_NUMBER_LOCK).await?;

        let product_ids: Vec<Uuid> = draft.lines.iter().map(|l| l.product_id).collect();
        let products: HashMap<Uuid, Product> = product::Entity::find()
            .filter(product::Column::Id.is_in(product_ids))
            .all(&txn)
            .await?
            .into_iter()
            .map(|m| (m.id, Product::from(m)))
            .collect();

        let pricing = price_order(&draft.lines, &products, draft.discount, draft.shipping_cost)?;

        let year = Utc::now().year();
        let placed_this_year = order::Entity::find()
            .filter(order::Column::CreatedAt.gte(start_of_year(year)?))
            .count(&txn)
            .await?;

        let placed = OrderWithItems::build(
            draft,
            format_order_number(year, placed_this_year),
            pricing,
        );

        order::ActiveModel::from(placed.order.clone())
            .insert(&txn)
            .await?;
        order_item::Entity::insert_many(
            placed
                .items
                .iter()
                .cloned()
                .map(order_item::ActiveModel::from),
        )
        .exec(&txn)
        .await?;

        for item in &placed.items {
            let taken = txn
                .execute_raw(Statement::from_sql_and_values(
                    DbBackend::Postgres,
                    TAKE_STOCK,
                    [item.product_id.into(), item.quantity.into()],
                ))
                .await?;

            // Dropping the transaction rolls everything back
            if taken.rows_affected() == 0 {
                return Err(OrderError::InvalidOrder(format!(
                    "Insufficient stock for {}",
                    item.product_name
                )));
            }
        }

        txn.commit().await?;

        tracing::info!(
            order_id = %placed.order.id,
            order_number = %placed.order.order_number,
            total = %placed.order.total,
            "Placed order"
        );
        Ok(placed)
    }

    async fn get_by_id(&self, id: Uuid) -> OrderResult<Option<OrderWithItems>> {
        let model = self.base.find_by_id(id).await?;
        one_with_items(self.base.db(), model).await
    }

    async fn get_by_number(&self, order_number: &str) -> OrderResult<Option<OrderWithItems>> {
        let model = order::Entity::find()
            .filter(order::Column::OrderNumber.eq(order_number))
            .one(self.base.db())
            .await?;
        one_with_items(self.base.db(), model).await
    }

    async fn get_by_token(&self, token: &str) -> OrderResult<Option<OrderWithItems>> {
        let model = order::Entity::find()
            .filter(order::Column::WebpayToken.eq(token))
            .one(self.base.db())
            .await?;
        one_with_items(self.base.db(), model).await
    }

    async fn list(&self, filter: OrderFilter) -> OrderResult<Vec<OrderWithItems>> {
        let mut query = order::Entity::find();

        if let Some(status) = filter.status {
            query = query.filter(order::Column::Status.eq(status));
        }
        if let Some(payment_status) = filter.payment_status {
            query = query.filter(order::Column::PaymentStatus.eq(payment_status));
        }
        if let Some(customer_id) = filter.customer_id {
            query = query.filter(order::Column::CustomerId.eq(customer_id));
        }

        let models = query
            .order_by_desc(order::Column::CreatedAt)
            .limit(filter.limit as u64)
            .offset(filter.offset as u64)
            .all(self.base.db())
            .await?;

        with_items(self.base.db(), models).await
    }

    async fn list_for_customer(&self, customer_id: Uuid) -> OrderResult<Vec<OrderWithItems>> {
        let models = order::Entity::find()
            .filter(order::Column::CustomerId.eq(customer_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(self.base.db())
            .await?;

        with_items(self.base.db(), models).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> OrderResult<Option<OrderWithItems>> {
        let Some(model) = self.base.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut active = model.into_active_model();
        active.status = Set(status);
        if let Some(payment_status) = payment_status {
            active.payment_status = Set(payment_status);
        }
        let model = self.base.update(active).await?;

        tracing::info!(order_id = %id, status = %status, "Updated order status");
        one_with_items(self.base.db(), Some(model)).await
    }

    async fn set_webpay_token(&self, id: Uuid, token: &str) -> OrderResult<OrderWithItems> {
        let model = self
            .base
            .find_by_id(id)
            .await?
            .ok_or_else(|| order_not_found(id))?;

        let mut active = model.into_active_model();
        active.webpay_token = Set(Some(token.to_string()));
        let model = self.base.update(active).await?;

        one_with_items(self.base.db(), Some(model))
            .await?
            .ok_or_else(|| order_not_found(id))
    }

    async fn resolve_payment(
        &self,
        id: Uuid,
        outcome: PaymentOutcome,
    ) -> OrderResult<OrderWithItems> {
        let txn = self.base.db().begin().await?;

        let model = order::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| order_not_found(id))?;

        if model.payment_status != PaymentStatus::Pending {
            return Err(OrderError::AlreadyProcessed);
        }

        let mut active = model.into_active_model();
        match outcome {
            PaymentOutcome::Approved { transaction_id } => {
                active.payment_status = Set(PaymentStatus::Approved);
                active.status = Set(OrderStatus::Paid);
                active.webpay_transaction_id = Set(Some(transaction_id));
            }
            PaymentOutcome::Rejected => {
                active.payment_status = Set(PaymentStatus::Rejected);

                let items = order_item::Entity::find()
                    .filter(order_item::Column::OrderId.eq(id))
                    .all(&txn)
                    .await?;
                for item in items {
                    txn.execute_raw(Statement::from_sql_and_values(
                        DbBackend::Postgres,
                        RETURN_STOCK,
                        [item.product_id.into(), item.quantity.into()],
                    ))
                    .await?;
                }
            }
        }

        let model = active.update(&txn).await?;
        let resolved = one_with_items(&txn, Some(model))
            .await?
            .ok_or_else(|| order_not_found(id))?;
        txn.commit().await?;

        tracing::info!(
            order_id = %id,
            payment_status = %resolved.order.payment_status,
            "Resolved payment"
        );
        Ok(resolved)
    }

    async fn record_shipment(
        &self,
        id: Uuid,
        tracking_number: String,
        estimated_delivery: DateTime<Utc>,
    ) -> OrderResult<OrderWithItems> {
        let model = self
            .base
            .find_by_id(id)
            .await?
            .ok_or_else(|| order_not_found(id))?;

        if model.tracking_number.is_some() {
            return Err(OrderError::Conflict(
                "Order already has a shipment".to_string(),
            ));
        }

        let mut active = model.into_active_model();
        active.tracking_number = Set(Some(tracking_number.clone()));
        active.estimated_delivery = Set(Some(estimated_delivery.into()));
        active.status = Set(OrderStatus::Shipped);
        let model = self.base.update(active).await?;

        tracing::info!(order_id = %id, tracking_number = %tracking_number, "Recorded shipment");
        one_with_items(self.base.db(), Some(model))
            .await?
            .ok_or_else(|| order_not_found(id))
    }

    async fn count_customers_with_orders(&self) -> OrderResult<u64> {
        #[derive(FromQueryResult)]
        struct CountResult {
            count: i64,
        }

        let stmt = Statement::from_string(
            DbBackend::Postgres,
            "SELECT COUNT(DISTINCT customer_id)::bigint AS count FROM orders WHERE customer_id IS NOT NULL",
        );
        let row = CountResult::find_by_statement(stmt)
            .one(self.base.db())
            .await?;

        Ok(row.map_or(0, |r| r.count.max(0) as u64))
    }
}
