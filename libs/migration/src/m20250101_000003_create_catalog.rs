use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(pk_uuid(Categories::Id).default(Expr::cust("gen_random_uuid()")))
                    .col(string_len_uniq(Categories::Name, 100))
                    .col(string_len_uniq(Categories::Slug, 100))
                    .col(text_null(Categories::Description))
                    .col(string_len_null(Categories::Image, 500))
                    .col(integer(Categories::SortOrder).default(0))
                    .col(boolean(Categories::IsActive).default(true))
                    .col(
                        timestamp_with_time_zone(Categories::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Categories::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(pk_uuid(Products::Id).default(Expr::cust("gen_random_uuid()")))
                    .col(string_len(Products::Name, 200))
                    .col(text_null(Products::Description))
                    .col(decimal_len(Products::Price, 10, 2))
                    .col(string_len_null(Products::Image, 500))
                    .col(string_len_uniq(Products::Slug, 200))
                    .col(integer(Products::Stock).default(0))
                    .col(boolean(Products::IsActive).default(true))
                    .col(boolean(Products::IsFeatured).default(false))
                    .col(uuid(Products::CategoryId))
                    .col(string_len_null(Products::CompatibleModel, 100))
                    .col(string_len_null(Products::Color, 50))
                    .col(
                        timestamp_with_time_zone(Products::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Products::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_products_category_id")
                            .from(Products::Table, Products::CategoryId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_category_id")
                    .table(Products::Table)
                    .col(Products::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_created_at")
                    .table(Products::Table)
                    .col(Products::CreatedAt)
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();

        // Stock can never go negative, even under concurrent checkouts
        db.execute_unprepared(
            r#"
            ALTER TABLE products
                ADD CONSTRAINT products_price_non_negative CHECK (price >= 0),
                ADD CONSTRAINT products_stock_non_negative CHECK (stock >= 0)
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TRIGGER categories_touch_updated_at
                BEFORE UPDATE ON categories
                FOR EACH ROW
                EXECUTE FUNCTION util.touch_updated_at()
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            CREATE TRIGGER products_touch_updated_at
                BEFORE UPDATE ON products
                FOR EACH ROW
                EXECUTE FUNCTION util.touch_updated_at()
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP TRIGGER IF EXISTS products_touch_updated_at ON products")
            .await?;
        db.execute_unprepared("DROP TRIGGER IF EXISTS categories_touch_updated_at ON categories")
            .await?;

        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Categories {
    Table,
    Id,
    Name,
    Slug,
    Description,
    Image,
    SortOrder,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Name,
    Description,
    Price,
    Image,
    Slug,
    Stock,
    IsActive,
    IsFeatured,
    CategoryId,
    CompatibleModel,
    Color,
    CreatedAt,
    UpdatedAt,
}
