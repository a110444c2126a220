//! `.paprikarecipe` archives: the Paprika app's single-recipe import format.
//!
//! An archive is the recipe as a JSON object, gzip-compressed. Paprika
//! matches fields by name, so the field names below are the import format
//! and must not change. Besides the recipe fields it carries:
//!
//! - `photos: []` and `photo_large: null`, which the importer expects.
//! - `photo`: the photo filename, taken from the basename of `photo_url`.
//! - `photo_data`: the photo bytes, base64-encoded.
//! - `photo_hash`: SHA-256 of the raw photo bytes, as uppercase hex.
//!
//! The photo is downloaded from `image_url`. If the download fails, the
//! archive is still written, just without `photo`, `photo_data` and
//! `photo_hash`. A missing photo is never worth losing the recipe over.

use crate::api::RecipeSource;
use crate::naming;
use crate::types::CanonicalRecipe;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const EXTENSION: &str = "paprikarecipe";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The JSON object inside a `.paprikarecipe` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportableRecipe {
    pub photos: Vec<serde_json::Value>,
    pub photo_large: Option<String>,
    pub created: Option<String>,
    pub categories: Vec<String>,
    pub cook_time: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub directions: Option<String>,
    pub hash: String,
    pub image_url: Option<String>,
    pub ingredients: Option<String>,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub nutritional_info: Option<String>,
    pub prep_time: Option<String>,
    pub rating: Option<serde_json::Number>,
    pub servings: Option<String>,
    pub source: Option<String>,
    pub source_url: Option<String>,
    pub total_time: Option<String>,
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_hash: Option<String>,
}

/// A downloaded photo, ready to embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedPhoto {
    /// Base64 of the raw bytes.
    pub data: String,
    /// Uppercase hex SHA-256 of the raw bytes.
    pub hash: String,
}

impl EmbeddedPhoto {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            data: STANDARD.encode(bytes),
            hash: format!("{:X}", Sha256::digest(bytes)),
        }
    }
}

/// What happened to a recipe's photo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Photo {
    /// The recipe has no `image_url`.
    None,
    Embedded(EmbeddedPhoto),
    /// There was an `image_url` but it could not be fetched.
    Unavailable,
}

/// Map a recipe (categories already resolved) into the import schema.
pub fn build(recipe: &CanonicalRecipe, photo: &Photo) -> ImportableRecipe {
    let filename = recipe
        .photo_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
        .map(|url| naming::basename(url).to_string());

    let (photo_name, photo_data, photo_hash) = match photo {
        Photo::Embedded(embedded) => (
            filename,
            Some(embedded.data.clone()),
            Some(embedded.hash.clone()),
        ),
        Photo::None => (filename, None, None),
        Photo::Unavailable => (None, None, None),
    };

    ImportableRecipe {
        photos: Vec::new(),
        photo_large: None,
        created: recipe.created.clone(),
        categories: recipe.categories.clone(),
        cook_time: recipe.cook_time.clone(),
        description: recipe.description.clone(),
        difficulty: recipe.difficulty.clone(),
        directions: recipe.directions.clone(),
        hash: recipe.hash.clone(),
        image_url: recipe.image_url.clone(),
        ingredients: recipe.ingredients.clone(),
        name: recipe.name.clone(),
        notes: recipe.notes.clone(),
        nutritional_info: recipe.nutritional_info.clone(),
        prep_time: recipe.prep_time.clone(),
        rating: recipe.rating.clone(),
        servings: recipe.servings.clone(),
        source: recipe.source.clone(),
        source_url: recipe.source_url.clone(),
        total_time: recipe.total_time.clone(),
        uid: recipe.uid.clone(),
        photo: photo_name,
        photo_data,
        photo_hash,
    }
}

/// JSON-serialize and gzip at maximum compression.
pub fn encode(recipe: &ImportableRecipe) -> Result<Vec<u8>, ArchiveError> {
    let json = serde_json::to_vec(recipe)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(&json)?;
    Ok(encoder.finish()?)
}

/// Inverse of [`encode`].
pub fn decode(bytes: &[u8]) -> Result<ImportableRecipe, ArchiveError> {
    let mut json = Vec::new();
    GzDecoder::new(bytes).read_to_end(&mut json)?;
    Ok(serde_json::from_slice(&json)?)
}

/// `<name>.paprikarecipe`, or `<uid>.paprikarecipe` when the name is unusable.
pub fn archive_filename(recipe: &CanonicalRecipe) -> String {
    let stem = recipe
        .name
        .as_deref()
        .and_then(naming::archive_file_stem)
        .unwrap_or_else(|| recipe.uid.clone());
    format!("{stem}.{EXTENSION}")
}

/// Download the recipe's photo, downgrading any failure to a warning.
pub async fn fetch_photo(source: &dyn RecipeSource, recipe: &CanonicalRecipe) -> Photo {
    let Some(url) = recipe.image_url.as_deref().filter(|u| !u.trim().is_empty()) else {
        return Photo::None;
    };
    match source.photo(url).await {
        Ok(bytes) => Photo::Embedded(EmbeddedPhoto::from_bytes(&bytes)),
        Err(e) => {
            warn!(
                "Could not fetch photo for {}, exporting without it: {e}",
                recipe.display_name()
            );
            Photo::Unavailable
        }
    }
}

/// Result of writing one archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArchive {
    pub path: PathBuf,
    /// True when the recipe had a photo that could not be embedded.
    pub photo_unavailable: bool,
}

/// Fetch the photo, build, encode and write the recipe's archive into `dir`.
pub async fn write_archive(
    source: &dyn RecipeSource,
    recipe: &CanonicalRecipe,
    dir: &Path,
) -> Result<WrittenArchive, ArchiveError> {
    let photo = fetch_photo(source, recipe).await;
    let bytes = encode(&build(recipe, &photo))?;
    let path = dir.join(archive_filename(recipe));
    tokio::fs::write(&path, bytes).await?;
    Ok(WrittenArchive {
        path,
        photo_unavailable: photo == Photo::Unavailable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{MockSource, RecordedCall, sample_recipe};
    use tempfile::TempDir;

    const IMAGE_URL: &str = "https://uploads.example.com/images/dal-full.jpg";
    const PHOTO_URL: &str = "https://uploads.example.com/photos/5A3D.jpg";

    fn recipe_with_photo() -> CanonicalRecipe {
        let mut recipe = sample_recipe("U1", "H1", "Dal");
        recipe.image_url = Some(IMAGE_URL.into());
        recipe.photo_url = Some(PHOTO_URL.into());
        recipe
    }

    // =========================================================================
    // Schema
    // =========================================================================

    #[test]
    fn json_has_import_fields_and_placeholders() {
        let archive = build(&sample_recipe("U1", "H1", "Dal"), &Photo::None);
        let value = serde_json::to_value(&archive).unwrap();

        assert_eq!(value["photos"], serde_json::json!([]));
        assert!(value["photo_large"].is_null());
        assert_eq!(value["uid"], "U1");
        assert_eq!(value["hash"], "H1");
        for key in [
            "created",
            "categories",
            "cook_time",
            "description",
            "difficulty",
            "directions",
            "image_url",
            "ingredients",
            "name",
            "notes",
            "nutritional_info",
            "prep_time",
            "rating",
            "servings",
            "source",
            "source_url",
            "total_time",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
    }

    #[test]
    fn null_recipe_fields_stay_null() {
        let archive = build(&sample_recipe("U1", "H1", "Dal"), &Photo::None);
        let value = serde_json::to_value(&archive).unwrap();
        assert!(value["notes"].is_null());
        assert!(value["image_url"].is_null());
    }

    #[test]
    fn no_photo_fields_without_photo() {
        let archive = build(&sample_recipe("U1", "H1", "Dal"), &Photo::None);
        let value = serde_json::to_value(&archive).unwrap();
        let obj = value.as_object().unwrap();
        assert!(!obj.contains_key("photo"));
        assert!(!obj.contains_key("photo_data"));
        assert!(!obj.contains_key("photo_hash"));
    }

    #[test]
    fn photo_name_comes_from_photo_url_basename() {
        let photo = Photo::Embedded(EmbeddedPhoto::from_bytes(b"jpeg"));
        let archive = build(&recipe_with_photo(), &photo);
        assert_eq!(archive.photo.as_deref(), Some("5A3D.jpg"));
    }

    #[test]
    fn photo_name_without_image_url_still_set() {
        let mut recipe = sample_recipe("U1", "H1", "Dal");
        recipe.photo_url = Some(PHOTO_URL.into());
        let archive = build(&recipe, &Photo::None);
        assert_eq!(archive.photo.as_deref(), Some("5A3D.jpg"));
        assert_eq!(archive.photo_data, None);
    }

    #[test]
    fn unavailable_photo_drops_all_photo_fields() {
        let archive = build(&recipe_with_photo(), &Photo::Unavailable);
        assert_eq!(archive.photo, None);
        assert_eq!(archive.photo_data, None);
        assert_eq!(archive.photo_hash, None);
    }

    #[test]
    fn embedded_photo_hash_is_uppercase_sha256() {
        let photo = EmbeddedPhoto::from_bytes(b"abc");
        assert_eq!(
            photo.hash,
            "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD"
        );
        assert_eq!(photo.data, "YWJj");
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    #[test]
    fn encoded_archive_is_gzip() {
        let bytes = encode(&build(&sample_recipe("U1", "H1", "Dal"), &Photo::None)).unwrap();
        assert_eq!(&bytes[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn encode_decode_preserves_recipe() {
        let archive = build(&recipe_with_photo(), &Photo::None);
        assert_eq!(decode(&encode(&archive).unwrap()).unwrap(), archive);
    }

    #[test]
    fn filename_keeps_raw_name() {
        let recipe = sample_recipe("U1", "H1", "Mac & Cheese");
        assert_eq!(archive_filename(&recipe), "Mac & Cheese.paprikarecipe");
    }

    #[test]
    fn filename_strips_path_components() {
        let recipe = sample_recipe("U1", "H1", "1/2 Batch Brownies");
        assert_eq!(archive_filename(&recipe), "2 Batch Brownies.paprikarecipe");
    }

    #[test]
    fn filename_falls_back_to_uid() {
        let mut recipe = sample_recipe("U1", "H1", "");
        assert_eq!(archive_filename(&recipe), "U1.paprikarecipe");
        recipe.name = None;
        assert_eq!(archive_filename(&recipe), "U1.paprikarecipe");
    }

    // =========================================================================
    // Writing
    // =========================================================================

    #[tokio::test]
    async fn written_archive_embeds_photo() {
        let tmp = TempDir::new().unwrap();
        let source = MockSource::new().with_photo(IMAGE_URL, b"\xff\xd8jpeg bytes");
        let recipe = recipe_with_photo();

        let written = write_archive(&source, &recipe, tmp.path()).await.unwrap();
        assert!(!written.photo_unavailable);
        assert_eq!(written.path, tmp.path().join("Dal.paprikarecipe"));

        let archive = decode(&std::fs::read(&written.path).unwrap()).unwrap();
        assert_eq!(archive.uid, "U1");
        assert_eq!(archive.hash, "H1");
        let raw = STANDARD.decode(archive.photo_data.unwrap()).unwrap();
        assert_eq!(raw, b"\xff\xd8jpeg bytes");
        assert_eq!(
            archive.photo_hash.unwrap(),
            format!("{:X}", Sha256::digest(&raw))
        );
        assert_eq!(source.calls(), vec![RecordedCall::Photo(IMAGE_URL.into())]);
    }

    #[tokio::test]
    async fn photo_failure_still_writes_archive() {
        let tmp = TempDir::new().unwrap();
        let source = MockSource::new().with_failing_photo(IMAGE_URL);

        let written = write_archive(&source, &recipe_with_photo(), tmp.path())
            .await
            .unwrap();
        assert!(written.photo_unavailable);

        let archive = decode(&std::fs::read(&written.path).unwrap()).unwrap();
        assert_eq!(archive.uid, "U1");
        assert_eq!(archive.photo_data, None);
        assert_eq!(archive.photo_hash, None);
        assert_eq!(archive.photo, None);
    }

    #[tokio::test]
    async fn blank_image_url_skips_fetch() {
        let source = MockSource::new();
        let mut recipe = sample_recipe("U1", "H1", "Dal");
        recipe.image_url = Some("  ".into());

        assert_eq!(fetch_photo(&source, &recipe).await, Photo::None);
        assert!(source.calls().is_empty());
    }
}
