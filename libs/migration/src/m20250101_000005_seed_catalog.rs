use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            r#"
            INSERT INTO categories (name, slug, description, sort_order, is_active)
            VALUES
                ('Personalizadas', 'personalizadas', 'Carcasas personalizadas para tu dispositivo', 1, true),
                ('JBL', 'jbl', 'Productos y accesorios JBL', 2, true),
                ('Carcasas', 'carcasas', 'Carcasas para smartphones', 3, true),
                ('Otros', 'otros', 'Otros accesorios tecnológicos', 4, true),
                ('Smartwatch', 'smartwatch', 'Relojes inteligentes y accesorios', 5, true),
                ('Samsung', 'samsung', 'Productos y accesorios Samsung', 6, true),
                ('Gamer', 'gamer', 'Accesorios gaming', 7, true)
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .await?;

        // Categories are resolved by slug so reruns against an existing catalog still line up
        db.execute_unprepared(
            r#"
            INSERT INTO products (
                name, slug, description, price, stock, is_active, is_featured,
                category_id, compatible_model, color
            )
            SELECT p.name, p.slug, p.description, p.price, p.stock, true, p.is_featured,
                   c.id, p.compatible_model, p.color
            FROM (
                VALUES
                    ('Carcasa iPhone 15 Pro Personalizada', 'carcasa-iphone-15-pro-personalizada',
                     'Carcasa resistente con diseño personalizado para iPhone 15 Pro',
                     15000.00, 25, true, 'personalizadas', 'iPhone 15 Pro', 'Negro'),
                    ('Carcasa Samsung Galaxy S24 Ultra', 'carcasa-samsung-galaxy-s24-ultra',
                     'Carcasa de alta protección para Samsung Galaxy S24 Ultra',
                     18000.00, 20, true, 'carcasas', 'Samsung Galaxy S24 Ultra', 'Transparente'),
                    ('Auriculares JBL Tune 510BT', 'auriculares-jbl-tune-510bt',
                     'Auriculares inalámbricos JBL con sonido de calidad',
                     45000.00, 15, true, 'jbl', 'Universal', 'Negro'),
                    ('Carcasa iPhone 14 Pro Max', 'carcasa-iphone-14-pro-max',
                     'Carcasa resistente para iPhone 14 Pro Max',
                     14000.00, 30, false, 'carcasas', 'iPhone 14 Pro Max', 'Azul'),
                    ('Smartwatch Samsung Galaxy Watch 6', 'smartwatch-samsung-galaxy-watch-6',
                     'Reloj inteligente Samsung con múltiples funciones',
                     250000.00, 8, true, 'samsung', 'Universal', 'Negro'),
                    ('Carcasa Personalizada con Foto', 'carcasa-personalizada-con-foto',
                     'Carcasa personalizada con tu foto favorita',
                     20000.00, 50, true, 'personalizadas', 'Múltiples modelos', 'Personalizado'),
                    ('Control Xbox Series X', 'control-xbox-series-x',
                     'Control inalámbrico para Xbox Series X/S',
                     65000.00, 12, false, 'gamer', 'Xbox Series X/S', 'Negro'),
                    ('Auriculares JBL Quantum 100', 'auriculares-jbl-quantum-100',
                     'Auriculares gaming JBL con micrófono',
                     35000.00, 18, false, 'jbl', 'PC/Consola', 'Negro/Rojo'),
                    ('Carcasa iPad Pro 12.9"', 'carcasa-ipad-pro-12-9',
                     'Carcasa con teclado para iPad Pro 12.9"',
                     85000.00, 10, false, 'carcasas', 'iPad Pro 12.9"', 'Gris'),
                    ('Smartwatch Apple Watch Series 9', 'smartwatch-apple-watch-series-9',
                     'Reloj inteligente Apple con GPS y monitor de salud',
                     350000.00, 5, true, 'smartwatch', 'iPhone', 'Midnight'),
                    ('Cable USB-C Samsung', 'cable-usb-c-samsung',
                     'Cable USB-C original Samsung de carga rápida',
                     8000.00, 40, false, 'samsung', 'Universal', 'Blanco'),
                    ('Mouse Gaming RGB', 'mouse-gaming-rgb',
                     'Mouse gaming con iluminación RGB y alta precisión',
                     25000.00, 22, false, 'gamer', 'PC', 'Negro RGB')
            ) AS p(name, slug, description, price, stock, is_featured, category_slug, compatible_model, color)
            JOIN categories c ON c.slug = p.category_slug
            ON CONFLICT (slug) DO NOTHING
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            r#"
            DELETE FROM products
            WHERE slug IN (
                'carcasa-iphone-15-pro-personalizada', 'carcasa-samsung-galaxy-s24-ultra',
                'auriculares-jbl-tune-510bt', 'carcasa-iphone-14-pro-max',
                'smartwatch-samsung-galaxy-watch-6', 'carcasa-personalizada-con-foto',
                'control-xbox-series-x', 'auriculares-jbl-quantum-100', 'carcasa-ipad-pro-12-9',
                'smartwatch-apple-watch-series-9', 'cable-usb-c-samsung', 'mouse-gaming-rgb'
            )
            AND NOT EXISTS (SELECT 1 FROM order_items oi WHERE oi.product_id = products.id)
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            DELETE FROM categories
            WHERE slug IN ('personalizadas', 'jbl', 'carcasas', 'otros', 'smartwatch', 'samsung', 'gamer')
            AND NOT EXISTS (SELECT 1 FROM products p WHERE p.category_id = categories.id)
            "#,
        )
        .await?;

        Ok(())
    }
}
