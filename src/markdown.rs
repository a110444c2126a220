//! Markdown + frontmatter rendering of a recipe.
//!
//! The document is meant for static-site generators: structured fields go in
//! YAML frontmatter where templates can reach them, and the prose goes in the
//! body.
//!
//! ```text
//! ---
//! layout: recipe
//! uid: 5A3D…
//! hash: 9f1c…
//! name: Weeknight Dal
//! ingredients:
//! - 1 cup red lentils
//! - 1 tsp cumin
//! cook_time: 1 hour 30 minutes
//! iso_cook_time: PT1H30M
//! tags:
//! - Dinner
//! ---
//! A description, trimmed.
//!
//! ## Directions
//!
//! Rinse the lentils…
//!
//! ## Notes
//!
//! Freezes well.
//! ```
//!
//! Keys with no value are left out entirely; an empty string or a zero rating
//! is still a value and is written. The description paragraph and the Notes
//! section appear only when they have non-blank text; Directions is always
//! present. `uid` and `hash` are the remote values verbatim, since the
//! [`index`](crate::index) reads them back on the next run.

use crate::duration;
use crate::naming;
use crate::types::CanonicalRecipe;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const EXTENSION: &str = "md";

#[derive(Error, Debug)]
pub enum MarkdownError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Frontmatter {
    pub layout: String,
    pub uid: String,
    pub hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servings: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutritional_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<serde_json::Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cook_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prep_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso_cook_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso_prep_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso_total_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    /// Category names; expects categories already resolved.
    pub tags: Vec<String>,
}

impl Frontmatter {
    pub fn from_recipe(recipe: &CanonicalRecipe, layout: &str) -> Self {
        Self {
            layout: layout.to_string(),
            uid: recipe.uid.clone(),
            hash: recipe.hash.clone(),
            name: recipe.name.clone(),
            image_url: recipe.image_url.clone(),
            ingredients: recipe.ingredients.as_deref().map(split_ingredients),
            servings: recipe.servings.clone(),
            nutritional_info: recipe.nutritional_info.clone(),
            rating: recipe.rating.clone(),
            cook_time: recipe.cook_time.clone(),
            prep_time: recipe.prep_time.clone(),
            total_time: recipe.total_time.clone(),
            iso_cook_time: recipe.cook_time.as_deref().and_then(duration::normalize),
            iso_prep_time: recipe.prep_time.as_deref().and_then(duration::normalize),
            iso_total_time: recipe.total_time.as_deref().and_then(duration::normalize),
            source: recipe.source.clone(),
            source_url: recipe.source_url.clone(),
            difficulty: recipe.difficulty.clone(),
            tags: recipe.categories.clone(),
        }
    }
}

/// Split an ingredient block on runs of newlines.
///
/// Entries are not trimmed. A leading or trailing newline yields one empty
/// entry at that end.
pub fn split_ingredients(text: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut after_newline = false;
    for c in text.chars() {
        if c == '\n' {
            if !after_newline {
                lines.push(std::mem::take(&mut current));
            }
            after_newline = true;
        } else {
            current.push(c);
            after_newline = false;
        }
    }
    lines.push(current);
    lines
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.filter(|t| !t.trim().is_empty())
}

/// Document body: description, Directions, then Notes.
pub fn render_body(recipe: &CanonicalRecipe) -> String {
    let mut body = String::new();

    if let Some(description) = non_blank(recipe.description.as_deref()) {
        body.push_str(description.trim());
        body.push_str("\n\n");
    }

    body.push_str("## Directions\n\n");
    body.push_str(recipe.directions.as_deref().unwrap_or_default().trim_end());

    if let Some(notes) = non_blank(recipe.notes.as_deref()) {
        body.push_str("\n\n## Notes\n\n");
        body.push_str(notes.trim_end());
    }

    body
}

/// Full document text: `---`-fenced YAML frontmatter followed by the body.
pub fn render_document(recipe: &CanonicalRecipe, layout: &str) -> Result<String, MarkdownError> {
    let yaml = serde_yaml::to_string(&Frontmatter::from_recipe(recipe, layout))?;
    Ok(format!("---\n{yaml}---\n{}\n", render_body(recipe)))
}

/// `<slug>.md`, or `<uid>.md` when the name has nothing to slugify.
pub fn document_filename(recipe: &CanonicalRecipe) -> String {
    let slug = recipe
        .name
        .as_deref()
        .map(naming::slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| recipe.uid.clone());
    format!("{slug}.{EXTENSION}")
}

/// Render and write the recipe's document into `dir`, returning its path.
pub async fn write_document(
    recipe: &CanonicalRecipe,
    dir: &Path,
    layout: &str,
) -> Result<PathBuf, MarkdownError> {
    let path = dir.join(document_filename(recipe));
    let content = render_document(recipe, layout)?;
    tokio::fs::write(&path, content).await?;
    Ok(path)
}
