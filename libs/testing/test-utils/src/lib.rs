//! Test support for the domain crates.
//!
//! - [`TestDatabase`] (feature `postgres`, on by default): a throwaway
//!   PostgreSQL container with the workspace migrations and catalog seed applied
//! - [`TestDataBuilder`]: per-test names, slugs and emails
//! - [`assertions`]: assertion helpers with context in the failure message
//!
//! ```rust,no_run
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn test_checkout() {
//!     let db = TestDatabase::new().await;
//!     let data = TestDataBuilder::from_test_name("test_checkout");
//!
//!     let category_id = db.create_test_category(&data, "main").await;
//!     let product_id = db.create_test_product(&data, category_id, "main", 12990, 5).await;
//! }
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

/// Values that stay the same across runs of one test and differ between tests,
/// so rows written by different tests never hit the same unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDataBuilder {
    tag: String,
}

impl TestDataBuilder {
    pub fn from_test_name(test_name: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        test_name.hash(&mut hasher);
        Self {
            tag: format!("{:010x}", hasher.finish() >> 24),
        }
    }

    /// `{kind}-{suffix}-{tag}`, e.g. `product-main-3f09a1c2bd`
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let data = TestDataBuilder::from_test_name("test_slugs");
    /// assert!(data.name("product", "main").starts_with("product-main-"));
    /// ```
    pub fn name(&self, kind: &str, suffix: &str) -> String {
        format!("{}-{}-{}", kind, suffix, self.tag)
    }

    /// Slug that passes the catalog's `lowercase-with-dashes` check
    pub fn slug(&self, kind: &str, suffix: &str) -> String {
        self.name(kind, suffix).to_ascii_lowercase().replace('_', "-")
    }

    pub fn email(&self, local: &str) -> String {
        format!("{}.{}@pruebas.example.cl", local, self.tag)
    }
}

pub mod assertions {
    use uuid::Uuid;

    pub fn assert_uuid_eq(actual: Uuid, expected: Uuid, context: &str) {
        assert_eq!(actual, expected, "{}: ids differ", context);
    }

    /// Unwrap `value`, failing with `context` when it is `None`
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        match value {
            Some(v) => v,
            None => panic!("{}: expected a value, found None", context),
        }
    }
}
