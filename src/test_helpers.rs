//! Shared test utilities: recipe fixtures and a recording [`RecipeSource`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let source = MockSource::new()
//!     .with_recipe(sample_recipe("U1", "H1", "Dal"))
//!     .with_category("c1", "Dinner");
//! let report = export(&source, &options).await.unwrap();
//! assert_eq!(source.fetched_recipes(), vec!["U1"]);
//! ```

use crate::api::{ApiError, RecipeSource};
use crate::types::{CanonicalRecipe, CategoryMapping, RemoteRecipeSummary};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

// =========================================================================
// Fixtures
// =========================================================================

/// A fully populated recipe with no categories and no photo.
pub fn sample_recipe(uid: &str, hash: &str, name: &str) -> CanonicalRecipe {
    CanonicalRecipe {
        uid: uid.to_string(),
        hash: hash.to_string(),
        name: Some(name.to_string()),
        ingredients: Some("1 cup red lentils\n1 tsp cumin".to_string()),
        servings: Some("4".to_string()),
        nutritional_info: Some(String::new()),
        rating: Some(4.into()),
        prep_time: Some("10 minutes".to_string()),
        cook_time: Some("30 minutes".to_string()),
        total_time: Some("40 minutes".to_string()),
        source: Some("Grandma".to_string()),
        source_url: Some("https://example.com/dal".to_string()),
        difficulty: Some("Easy".to_string()),
        categories: Vec::new(),
        description: Some("A weeknight staple.".to_string()),
        directions: Some("Rinse.\nSimmer.".to_string()),
        notes: None,
        created: Some("2024-01-15 18:30:00".to_string()),
        image_url: None,
        photo_url: None,
    }
}

// =========================================================================
// Mock source
// =========================================================================

/// Every call the pipeline made against a [`MockSource`], in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    ListRecipes,
    Categories,
    Recipe(String),
    Photo(String),
}

/// In-memory [`RecipeSource`] that records calls.
///
/// Uses `Mutex` (not `RefCell`) so it is `Sync` and can be shared across the
/// pipeline's concurrent futures.
#[derive(Default)]
pub struct MockSource {
    recipes: Vec<CanonicalRecipe>,
    categories: CategoryMapping,
    photos: HashMap<String, Vec<u8>>,
    failing_photos: Vec<String>,
    failing_recipes: Vec<String>,
    failing_list: Option<u16>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a recipe; it appears in the list with its own hash.
    pub fn with_recipe(mut self, recipe: CanonicalRecipe) -> Self {
        self.recipes.push(recipe);
        self
    }

    pub fn with_category(mut self, uid: &str, name: &str) -> Self {
        self.categories.insert(uid, name);
        self
    }

    pub fn with_photo(mut self, url: &str, bytes: &[u8]) -> Self {
        self.photos.insert(url.to_string(), bytes.to_vec());
        self
    }

    /// Make fetching this photo URL fail with a 404.
    pub fn with_failing_photo(mut self, url: &str) -> Self {
        self.failing_photos.push(url.to_string());
        self
    }

    /// Make fetching this recipe fail with a 500.
    pub fn with_failing_recipe(mut self, uid: &str) -> Self {
        self.failing_recipes.push(uid.to_string());
        self
    }

    /// Make the recipe list call fail with `status`.
    pub fn with_failing_list(mut self, status: u16) -> Self {
        self.failing_list = Some(status);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// uids passed to `recipe()`, in call order.
    pub fn fetched_recipes(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                RecordedCall::Recipe(uid) => Some(uid),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RecipeSource for MockSource {
    async fn list_recipes(&self) -> Result<Vec<RemoteRecipeSummary>, ApiError> {
        self.record(RecordedCall::ListRecipes);
        if let Some(status) = self.failing_list {
            return Err(ApiError::Status {
                status,
                operation: "recipes list",
            });
        }
        Ok(self
            .recipes
            .iter()
            .map(|r| RemoteRecipeSummary {
                uid: r.uid.clone(),
                hash: r.hash.clone(),
            })
            .collect())
    }

    async fn categories(&self) -> Result<CategoryMapping, ApiError> {
        self.record(RecordedCall::Categories);
        Ok(self.categories.clone())
    }

    async fn recipe(&self, uid: &str) -> Result<CanonicalRecipe, ApiError> {
        self.record(RecordedCall::Recipe(uid.to_string()));
        if self.failing_recipes.iter().any(|f| f == uid) {
            return Err(ApiError::Status {
                status: 500,
                operation: "recipe",
            });
        }
        self.recipes
            .iter()
            .find(|r| r.uid == uid)
            .cloned()
            .ok_or(ApiError::Status {
                status: 404,
                operation: "recipe",
            })
    }

    async fn photo(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        self.record(RecordedCall::Photo(url.to_string()));
        if self.failing_photos.iter().any(|f| f == url) {
            return Err(ApiError::Status {
                status: 404,
                operation: "photo",
            });
        }
        self.photos.get(url).cloned().ok_or(ApiError::Status {
            status: 404,
            operation: "photo",
        })
    }
}
