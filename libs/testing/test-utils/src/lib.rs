//! Shared test utilities for domain testing
//!
//! - `TestChroma`: Chroma container with automatic cleanup (feature: "chroma")
//! - `TestDataBuilder`: Deterministic collection names and documents (always available)
//! - `assertions`: Custom assertion helpers (always available)
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestChroma, TestDataBuilder};
//!
//! #[tokio::test]
//! async fn my_chroma_test() {
//!     let chroma = TestChroma::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_test");
//!
//!     let collection = builder.collection("main");
//!     let documents = builder.documents(3);
//! }
//! ```

#[cfg(feature = "chroma")]
mod chroma;

#[cfg(feature = "chroma")]
pub use chroma::TestChroma;

/// Builder for test data with deterministic randomization
///
/// This ensures tests are reproducible by using seeded random data.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    /// Create a new builder with a seed (for deterministic tests)
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (generates seed from test name hash)
    ///
    /// This is the recommended way to create a builder for consistent test data.
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_resource");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Collection name unique to this builder's seed
    pub fn collection(&self, suffix: &str) -> String {
        self.name("collection", suffix)
    }

    /// Distinct document texts tagged with the seed
    pub fn documents(&self, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| format!("document {} of test {}", i, self.seed))
            .collect()
    }

    /// Generate a unique name for testing
    ///
    /// # Arguments
    ///
    /// * `prefix` - The type of resource (e.g., "collection")
    /// * `suffix` - A unique identifier within the test (e.g., "main", "backup")
    ///
    /// # Example
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("my_test");
    /// let name = builder.name("collection", "main");
    /// // Returns: "test-collection-12345-main"
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }
}

/// Test assertion helpers
pub mod assertions {
    /// Assert that ranked distances never decrease
    pub fn assert_ranked(distances: &[f32], context: &str) {
        for pair in distances.windows(2) {
            assert!(
                pair[0] <= pair[1],
                "{}: distances not ascending: {:?}",
                context, distances
            );
        }
    }

    /// Assert that an optional value is Some
    pub fn assert_some<T>(value: Option<T>, context: &str) -> T {
        value.unwrap_or_else(|| panic!("{}: expected Some, got None", context))
    }
}
