use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(pk_uuid(Customers::Id))
                    .col(string_len(Customers::FullName, 200))
                    .col(string_len_uniq(Customers::Email, 255))
                    .col(string_len(Customers::Phone, 50))
                    .col(text(Customers::PasswordHash))
                    .col(text_null(Customers::Address))
                    .col(string_len_null(Customers::City, 100))
                    .col(string_len_null(Customers::Region, 100))
                    .col(boolean(Customers::IsActive).default(true))
                    .col(timestamp_with_time_zone_null(Customers::LastLogin))
                    .col(
                        timestamp_with_time_zone(Customers::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Customers::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Listing sorts newest first and the monthly report groups by it
        manager
            .create_index(
                Index::create()
                    .name("idx_customers_created_at")
                    .table(Customers::Table)
                    .col(Customers::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r#"
                CREATE TRIGGER customers_touch_updated_at
                    BEFORE UPDATE ON customers
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
            .execute_unprepared("DROP TRIGGER IF EXISTS customers_touch_updated_at ON customers")
            .await?;

        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Customers {
    Table,
    Id,
    FullName,
    Email,
    Phone,
    PasswordHash,
    Address,
    City,
    Region,
    IsActive,
    LastLogin,
    CreatedAt,
    UpdatedAt,
}
