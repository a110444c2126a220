//! The export run: change detection, fetch, and dual-format write.
//!
//! ```text
//! 1. index     markdown dir  →  uid → hash of what was exported last time
//! 2. list      API           →  uid → hash of what exists now
//! 3. categories API          →  category uid → name
//! 4. resolve   (1) vs (2)    →  change set (stop here if empty)
//! 5. fetch     API           →  full recipes, all requested at once
//! 6. tags      (3)           →  category uids replaced by names
//! 7. markdown  ┐ per recipe, both concurrently,
//! 8. archive   ┘ all recipes concurrently
//! ```
//!
//! Steps 1–6 are all-or-nothing: any failure ends the run before a single
//! file is touched. Steps 7–8 isolate failures per recipe and per artifact,
//! and the [`ExportReport`] says what was written and what was not.
//!
//! The Markdown document is the record that a recipe was exported, so it
//! only survives when the archive was written too. If the archive fails, the
//! fresh document is removed again and the recipe looks stale next run.
//! There is no retry within a run. Once both files are written, older
//! documents for the same uid (left behind by a rename upstream) are
//! deleted, so the index never holds two hashes for one recipe.

use crate::api::{ApiError, RecipeSource};
use crate::archive::{self, ArchiveError, WrittenArchive};
use crate::changes;
use crate::index::{self, IndexError, LocalIndex};
use crate::markdown::{self, MarkdownError};
use crate::types::{CanonicalRecipe, UnknownCategory};
use futures_util::future::{join_all, try_join_all};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Could not read existing recipes: {0}")]
    Index(#[from] IndexError),
    #[error("Archive directory does not exist: {0}")]
    MissingArchiveDirectory(PathBuf),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    UnknownCategory(#[from] UnknownCategory),
}

/// Where to write and whether to bypass change detection.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub markdown_dir: PathBuf,
    pub archive_dir: PathBuf,
    /// Re-export every remote recipe regardless of stored hashes.
    pub force: bool,
    /// Value of the `layout` frontmatter key.
    pub layout: String,
}

impl ExportOptions {
    pub fn new(markdown_dir: &Path, archive_dir: &Path, force: bool, layout: &str) -> Self {
        Self {
            markdown_dir: markdown_dir.to_path_buf(),
            archive_dir: archive_dir.to_path_buf(),
            force,
            layout: layout.to_string(),
        }
    }
}

/// Which of a recipe's two output files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Markdown,
    Archive,
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Artifact::Markdown => write!(f, "markdown"),
            Artifact::Archive => write!(f, "archive"),
        }
    }
}

/// A recipe whose two files were both written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedRecipe {
    pub uid: String,
    pub name: String,
    pub markdown: PathBuf,
    pub archive: PathBuf,
    pub photo_unavailable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFailure {
    pub name: String,
    pub artifact: Artifact,
    pub error: String,
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Recipes on the server.
    pub remote: usize,
    /// Recipes selected for export.
    pub changed: usize,
    pub exported: Vec<ExportedRecipe>,
    pub failures: Vec<RecipeFailure>,
}

impl ExportReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn photos_unavailable(&self) -> usize {
        self.exported.iter().filter(|r| r.photo_unavailable).count()
    }

    fn record(
        &mut self,
        recipe: &CanonicalRecipe,
        markdown: Result<PathBuf, MarkdownError>,
        archive: Result<WrittenArchive, ArchiveError>,
    ) {
        let name = recipe.display_name().to_string();
        match (markdown, archive) {
            (Ok(markdown), Ok(archive)) => self.exported.push(ExportedRecipe {
                uid: recipe.uid.clone(),
                name,
                markdown,
                archive: archive.path,
                photo_unavailable: archive.photo_unavailable,
            }),
            (markdown, archive) => {
                if let Err(e) = markdown {
                    self.fail(&name, Artifact::Markdown, e.to_string());
                }
                if let Err(e) = archive {
                    self.fail(&name, Artifact::Archive, e.to_string());
                }
            }
        }
    }

    fn fail(&mut self, name: &str, artifact: Artifact, error: String) {
        warn!("Failed to write {artifact} for {name}: {error}");
        self.failures.push(RecipeFailure {
            name: name.to_string(),
            artifact,
            error,
        });
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.changed == 0 {
            return write!(f, "Up to date ({} recipes)", self.remote);
        }
        write!(
            f,
            "{} exported, {} failed ({} changed of {} recipes)",
            self.exported.len(),
            self.changed - self.exported.len(),
            self.changed,
            self.remote
        )
    }
}

/// Run a full export against `source`.
pub async fn export(
    source: &dyn RecipeSource,
    options: &ExportOptions,
) -> Result<ExportReport, ExportError> {
    info!(
        "Reading existing recipes from {}",
        options.markdown_dir.display()
    );
    let local = index::read_index(&options.markdown_dir)?;
    if !options.archive_dir.is_dir() {
        return Err(ExportError::MissingArchiveDirectory(
            options.archive_dir.clone(),
        ));
    }

    info!("Fetching recipe list from Paprika API");
    let remote = source.list_recipes().await?;

    info!("Fetching recipe categories from Paprika API");
    let categories = source.categories().await?;

    let stale = changes::resolve(&remote, &local, options.force);
    let mut report = ExportReport {
        remote: remote.len(),
        changed: stale.len(),
        ..Default::default()
    };
    if options.force {
        info!("Skipping cache check, refreshing all {} recipes", stale.len());
    } else {
        info!("Found {} recipes needing update", stale.len());
    }
    if stale.is_empty() {
        return Ok(report);
    }

    for uid in &stale {
        match local.get(uid) {
            Some(existing) => info!(
                "Recipe \"{}\" needs update",
                existing.name.as_deref().unwrap_or(uid)
            ),
            None => info!("New recipe with ID {uid}"),
        }
    }

    info!("Fetching recipes that need update");
    let mut recipes = try_join_all(stale.iter().map(|uid| source.recipe(uid))).await?;

    info!("Updating recipe categories");
    for recipe in &mut recipes {
        categories.resolve_in_place(recipe)?;
    }

    warn_on_collisions(&recipes);

    info!("Writing recipe Markdown and .paprikarecipe files");
    let outcomes = join_all(
        recipes
            .iter()
            .map(|recipe| write_recipe(source, recipe, options)),
    )
    .await;
    for (recipe, (markdown, archive)) in recipes.iter().zip(outcomes) {
        report.record(recipe, markdown, archive);
    }

    remove_superseded(&local, &report.exported).await;

    Ok(report)
}

async fn write_recipe(
    source: &dyn RecipeSource,
    recipe: &CanonicalRecipe,
    options: &ExportOptions,
) -> (
    Result<PathBuf, MarkdownError>,
    Result<WrittenArchive, ArchiveError>,
) {
    let (markdown, archive) = tokio::join!(
        markdown::write_document(recipe, &options.markdown_dir, &options.layout),
        archive::write_archive(source, recipe, &options.archive_dir),
    );
    if let Ok(path) = &markdown {
        debug!("Wrote {} to {}", recipe.display_name(), path.display());
    }
    match (&markdown, &archive) {
        (_, Ok(written)) => {
            debug!("Wrote {} to {}", recipe.display_name(), written.path.display());
        }
        (Ok(path), Err(_)) => {
            // The document carries the new hash; without its archive the
            // recipe must stay stale.
            if let Err(e) = tokio::fs::remove_file(path).await {
                warn!(
                    "Could not remove {} after its archive failed: {e}",
                    path.display()
                );
            }
        }
        (Err(_), Err(_)) => {}
    }
    (markdown, archive)
}

/// Delete older documents for recipes that were just exported again.
///
/// A renamed recipe gets a new slug, so its previous document would
/// otherwise linger with a stale hash. Paths written in this run are never
/// removed, and neither is anything that names the same file up to ASCII
/// case.
async fn remove_superseded(local: &LocalIndex, exported: &[ExportedRecipe]) {
    let written: HashSet<String> = exported
        .iter()
        .filter_map(|r| file_key(&r.markdown))
        .collect();

    for recipe in exported {
        for old in local.paths(&recipe.uid) {
            let Some(key) = file_key(old) else { continue };
            if written.contains(&key) {
                continue;
            }
            match tokio::fs::remove_file(old).await {
                Ok(()) => info!(
                    "Removed outdated {} for \"{}\"",
                    old.display(),
                    recipe.name
                ),
                Err(e) => warn!("Could not remove outdated {}: {e}", old.display()),
            }
        }
    }
}

/// Lowercased file name, for comparing documents within one directory.
fn file_key(path: &Path) -> Option<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_ascii_lowercase())
}

/// Warn when two recipes in this run would write the same file.
fn warn_on_collisions(recipes: &[CanonicalRecipe]) {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for recipe in recipes {
        for filename in [
            markdown::document_filename(recipe),
            archive::archive_filename(recipe),
        ] {
            if let Some(previous) = seen.insert(filename.clone(), recipe.display_name()) {
                warn!(
                    "\"{previous}\" and \"{}\" both export to {filename}; only one will be kept",
                    recipe.display_name()
                );
            }
        }
    }
}
