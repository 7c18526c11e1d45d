pub use sea_orm_migration::prelude::*;

mod m20250101_000000_bootstrap;
mod m20250101_000001_create_users;
mod m20250101_000002_create_customers;
mod m20250101_000003_create_catalog;
mod m20250101_000004_create_orders;
mod m20250101_000005_seed_catalog;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000000_bootstrap::Migration),
            Box::new(m20250101_000001_create_users::Migration),
            Box::new(m20250101_000002_create_customers::Migration),
            Box::new(m20250101_000003_create_catalog::Migration),
            Box::new(m20250101_000004_create_orders::Migration),
            Box::new(m20250101_000005_seed_catalog::Migration),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered_by_name() {
        let names: Vec<String> = Migrator::migrations()
            .iter()
            .map(|m| m.name().to_string())
            .collect();

        let mut sorted = names.clone();
        sorted.sort();

        assert_eq!(names, sorted);
        assert_eq!(names.len(), 6);
        assert_eq!(names[0], "m20250101_000000_bootstrap");
    }
}
