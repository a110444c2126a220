//! Recipe data shared across the export pipeline.
//!
//! These mirror the Paprika sync API's JSON. Field names are the wire names:
//! they flow unchanged into the `.paprikarecipe` archive, which the Paprika
//! app matches on by name.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// One entry of the recipe list endpoint. Only used for change detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecipeSummary {
    pub uid: String,
    /// Opaque content hash; changes whenever the recipe changes upstream.
    pub hash: String,
}

/// A full recipe as returned by the single-recipe endpoint.
///
/// Apart from `uid` and `hash`, Paprika may send any field as `null` or
/// leave it out, so everything else is optional. `None` is kept distinct
/// from the empty string all the way to the output files.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecipe {
    pub uid: String,
    pub hash: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Newline-delimited ingredient lines.
    #[serde(default)]
    pub ingredients: Option<String>,
    #[serde(default)]
    pub servings: Option<String>,
    #[serde(default)]
    pub nutritional_info: Option<String>,
    /// Star rating, normally a whole number from 0 to 5. Kept as whatever
    /// number the server sent.
    #[serde(default)]
    pub rating: Option<serde_json::Number>,
    #[serde(default)]
    pub prep_time: Option<String>,
    #[serde(default)]
    pub cook_time: Option<String>,
    #[serde(default)]
    pub total_time: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    /// Usually "Easy", "Medium" or "Hard", but never validated upstream.
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Category uids as fetched; category names once
    /// [`CategoryMapping::resolve_in_place`] has run.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub directions: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl CanonicalRecipe {
    /// Recipe name for log lines; falls back to the uid for unnamed recipes.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.uid)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("recipe {recipe:?} references unknown category {category}")]
pub struct UnknownCategory {
    pub recipe: String,
    pub category: String,
}

/// Category uid → display name, fetched once per run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMapping(HashMap<String, String>);

impl CategoryMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, uid: impl Into<String>, name: impl Into<String>) {
        self.0.insert(uid.into(), name.into());
    }

    pub fn name(&self, uid: &str) -> Option<&str> {
        self.0.get(uid).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Replace the recipe's category uids with their names.
    ///
    /// Fails on the first uid that has no name; the recipe is left
    /// untouched in that case.
    pub fn resolve_in_place(&self, recipe: &mut CanonicalRecipe) -> Result<(), UnknownCategory> {
        let names = recipe
            .categories
            .iter()
            .map(|uid| {
                self.name(uid).map(str::to_string).ok_or_else(|| UnknownCategory {
                    recipe: recipe.display_name().to_string(),
                    category: uid.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        recipe.categories = names;
        Ok(())
    }
}

impl FromIterator<(String, String)> for CategoryMapping {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_sparse_recipe() {
        let recipe: CanonicalRecipe = serde_json::from_str(
            r#"{"uid": "ABC", "hash": "h1", "name": "Soup", "notes": null, "categories": null, "in_trash": false}"#,
        )
        .unwrap();
        assert_eq!(recipe.uid, "ABC");
        assert_eq!(recipe.name.as_deref(), Some("Soup"));
        assert_eq!(recipe.notes, None);
        assert!(recipe.categories.is_empty());
        assert_eq!(recipe.rating, None);
    }

    #[test]
    fn fractional_rating_is_accepted() {
        let recipe: CanonicalRecipe =
            serde_json::from_str(r#"{"uid": "ABC", "hash": "h1", "rating": 3.5}"#).unwrap();
        assert_eq!(recipe.rating.and_then(|r| r.as_f64()), Some(3.5));
    }

    #[test]
    fn resolves_categories_to_names() {
        let mapping: CategoryMapping = [
            ("c1".to_string(), "Dinner".to_string()),
            ("c2".to_string(), "Soup".to_string()),
        ]
        .into_iter()
        .collect();
        let mut recipe = CanonicalRecipe {
            uid: "r".into(),
            categories: vec!["c2".into(), "c1".into()],
            ..Default::default()
        };

        mapping.resolve_in_place(&mut recipe).unwrap();
        assert_eq!(recipe.categories, vec!["Soup", "Dinner"]);
    }

    #[test]
    fn unknown_category_is_an_error_and_leaves_recipe_alone() {
        let mut mapping = CategoryMapping::new();
        mapping.insert("c1", "Dinner");
        let mut recipe = CanonicalRecipe {
            uid: "r".into(),
            name: Some("Stew".into()),
            categories: vec!["c1".into(), "gone".into()],
            ..Default::default()
        };

        let err = mapping.resolve_in_place(&mut recipe).unwrap_err();
        assert_eq!(
            err,
            UnknownCategory {
                recipe: "Stew".into(),
                category: "gone".into()
            }
        );
        assert_eq!(recipe.categories, vec!["c1", "gone"]);
    }

    #[test]
    fn display_name_falls_back_to_uid() {
        let recipe = CanonicalRecipe {
            uid: "XYZ".into(),
            ..Default::default()
        };
        assert_eq!(recipe.display_name(), "XYZ");
    }
}
