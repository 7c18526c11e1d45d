use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(OrderStatus::Enum)
                    .values(order_status_values())
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(PaymentStatus::Enum)
                    .values(payment_status_values())
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(PaymentMethod::Enum)
                    .values(payment_method_values())
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(ShippingType::Enum)
                    .values(shipping_type_values())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(pk_uuid(Orders::Id))
                    .col(string_len_uniq(Orders::OrderNumber, 50))
                    .col(uuid_null(Orders::CustomerId))
                    .col(string_len(Orders::CustomerName, 200))
                    .col(string_len(Orders::CustomerEmail, 255))
                    .col(string_len(Orders::CustomerPhone, 50))
                    .col(text_null(Orders::ShippingAddress))
                    .col(
                        ColumnDef::new(Orders::ShippingType)
                            .enumeration(ShippingType::Enum, shipping_type_values())
                            .null(),
                    )
                    .col(decimal_len(Orders::ShippingCost, 10, 2).default(0))
                    .col(string_len_null(Orders::TrackingNumber, 100))
                    .col(timestamp_with_time_zone_null(Orders::EstimatedDelivery))
                    .col(decimal_len(Orders::Subtotal, 10, 2))
                    .col(decimal_len(Orders::Discount, 10, 2).default(0))
                    .col(decimal_len(Orders::Total, 10, 2))
                    .col(
                        ColumnDef::new(Orders::Status)
                            .enumeration(OrderStatus::Enum, order_status_values())
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Orders::PaymentMethod)
                            .enumeration(PaymentMethod::Enum, payment_method_values())
                            .not_null()
                            .default("webpay"),
                    )
                    .col(
                        ColumnDef::new(Orders::PaymentStatus)
                            .enumeration(PaymentStatus::Enum, payment_status_values())
                            .not_null()
                            .default("pending"),
                    )
                    .col(string_len_null(Orders::WebpayToken, 255))
                    .col(string_len_null(Orders::WebpayTransactionId, 255))
                    .col(text_null(Orders::Notes))
                    .col(
                        timestamp_with_time_zone(Orders::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Orders::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_customer_id")
                            .from(Orders::Table, Orders::CustomerId)
                            .to(Customers::Table, Customers::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_customer_id")
                    .table(Orders::Table)
                    .col(Orders::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_webpay_token")
                    .table(Orders::Table)
                    .col(Orders::WebpayToken)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_created_at")
                    .table(Orders::Table)
                    .col(Orders::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderItems::Table)
                    .if_not_exists()
                    .col(pk_uuid(OrderItems::Id))
                    .col(uuid(OrderItems::OrderId))
                    .col(uuid(OrderItems::ProductId))
                    .col(string_len(OrderItems::ProductName, 200))
                    .col(decimal_len(OrderItems::UnitPrice, 10, 2))
                    .col(integer(OrderItems::Quantity))
                    .col(decimal_len(OrderItems::Subtotal, 10, 2))
                    .col(
                        timestamp_with_time_zone(OrderItems::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_order_id")
                            .from(OrderItems::Table, OrderItems::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_items_product_id")
                            .from(OrderItems::Table, OrderItems::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_items_order_id")
                    .table(OrderItems::Table)
                    .col(OrderItems::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_order_items_product_id")
                    .table(OrderItems::Table)
                    .col(OrderItems::ProductId)
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();

        db.execute_unprepared(
            "ALTER TABLE order_items ADD CONSTRAINT order_items_quantity_positive CHECK (quantity >= 1)",
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TRIGGER orders_touch_updated_at
                BEFORE UPDATE ON orders
                FOR EACH ROW
                EXECUTE FUNCTION util.touch_updated_at()
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP TRIGGER IF EXISTS orders_touch_updated_at ON orders")
            .await?;

        manager
            .drop_table(Table::drop().table(OrderItems::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(ShippingType::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(PaymentMethod::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(PaymentStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(OrderStatus::Enum).to_owned())
            .await?;

        Ok(())
    }
}

fn order_status_values() -> [OrderStatus; 6] {
    [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Paid,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ]
}

fn payment_status_values() -> [PaymentStatus; 4] {
    [
        PaymentStatus::Pending,
        PaymentStatus::Approved,
        PaymentStatus::Rejected,
        PaymentStatus::Cancelled,
    ]
}

fn payment_method_values() -> [PaymentMethod; 3] {
    [
        PaymentMethod::Webpay,
        PaymentMethod::Transfer,
        PaymentMethod::Cash,
    ]
}

fn shipping_type_values() -> [ShippingType; 5] {
    [
        ShippingType::Chilexpress,
        ShippingType::CorreosChile,
        ShippingType::Starken,
        ShippingType::Motocicleta,
        ShippingType::RetiroTienda,
    ]
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    OrderNumber,
    CustomerId,
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    ShippingAddress,
    ShippingType,
    ShippingCost,
    TrackingNumber,
    EstimatedDelivery,
    Subtotal,
    Discount,
    Total,
    Status,
    PaymentMethod,
    PaymentStatus,
    WebpayToken,
    WebpayTransactionId,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum OrderItems {
    Table,
    Id,
    OrderId,
    ProductId,
    ProductName,
    UnitPrice,
    Quantity,
    Subtotal,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum OrderStatus {
    #[sea_orm(iden = "order_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "processing")]
    Processing,
    #[sea_orm(iden = "paid")]
    Paid,
    #[sea_orm(iden = "shipped")]
    Shipped,
    #[sea_orm(iden = "delivered")]
    Delivered,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
}

#[derive(DeriveIden)]
enum PaymentStatus {
    #[sea_orm(iden = "payment_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "approved")]
    Approved,
    #[sea_orm(iden = "rejected")]
    Rejected,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
}

#[derive(DeriveIden)]
enum PaymentMethod {
    #[sea_orm(iden = "payment_method")]
    Enum,
    #[sea_orm(iden = "webpay")]
    Webpay,
    #[sea_orm(iden = "transfer")]
    Transfer,
    #[sea_orm(iden = "cash")]
    Cash,
}

#[derive(DeriveIden)]
enum ShippingType {
    #[sea_orm(iden = "shipping_type")]
    Enum,
    #[sea_orm(iden = "chilexpress")]
    Chilexpress,
    #[sea_orm(iden = "correos_chile")]
    CorreosChile,
    #[sea_orm(iden = "starken")]
    Starken,
    #[sea_orm(iden = "motocicleta")]
    Motocicleta,
    #[sea_orm(iden = "retiro_tienda")]
    RetiroTienda,
}
