//! Index of previously exported recipes.
//!
//! The Markdown output directory doubles as the exporter's state: every
//! document it writes carries the recipe's `uid` and remote `hash` in its
//! frontmatter. Reading those back gives the uid → hash map that change
//! detection compares against, with no separate database to keep in sync.
//!
//! ## Scan rules
//!
//! - Only `*.md` files directly inside the directory are read (no recursion).
//! - Frontmatter is the block between a leading `---` line and the next
//!   `---` line, parsed as YAML.
//! - A file without frontmatter, with invalid YAML, or without a `uid` is
//!   skipped with a warning. Its recipe then looks absent and gets exported
//!   again, which rewrites the file in a readable form.
//! - If two files claim the same uid, the one sorting last wins. The others
//!   are remembered so the export can remove them once the recipe has been
//!   written again.
//! - A missing directory is an error: it almost always means a typo in the
//!   command line, and exporting everything into a fresh tree is rarely what
//!   was wanted.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Markdown directory does not exist: {0}")]
    MissingDirectory(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("no frontmatter block")]
    Missing,
    #[error("frontmatter block is not closed")]
    Unterminated,
    #[error("invalid frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Frontmatter fields read back from an exported document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocalExportedRecipe {
    pub uid: String,
    /// Remote hash at the time of export. Missing means "always stale".
    #[serde(default)]
    pub hash: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub rating: Option<serde_json::Number>,
    #[serde(default)]
    pub difficulty: Option<String>,
    /// File the entry was read from.
    #[serde(skip)]
    pub path: PathBuf,
}

/// uid → last exported state, built once per run and read-only after.
#[derive(Debug, Default)]
pub struct LocalIndex {
    entries: HashMap<String, LocalExportedRecipe>,
    /// Files that lost to a later file claiming the same uid.
    superseded: HashMap<String, Vec<PathBuf>>,
    skipped: Vec<PathBuf>,
}

impl LocalIndex {
    pub fn get(&self, uid: &str) -> Option<&LocalExportedRecipe> {
        self.entries.get(uid)
    }

    /// Stored hash for a uid, if the recipe was exported and the hash recorded.
    pub fn hash(&self, uid: &str) -> Option<&str> {
        self.get(uid).and_then(|r| r.hash.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Markdown files that were present but could not be indexed.
    pub fn skipped(&self) -> &[PathBuf] {
        &self.skipped
    }

    /// Every file that claims `uid`, the indexed one first.
    pub fn paths(&self, uid: &str) -> Vec<&Path> {
        self.get(uid)
            .map(|r| r.path.as_path())
            .into_iter()
            .chain(
                self.superseded
                    .get(uid)
                    .into_iter()
                    .flatten()
                    .map(PathBuf::as_path),
            )
            .collect()
    }

    pub fn insert(&mut self, recipe: LocalExportedRecipe) {
        let uid = recipe.uid.clone();
        if let Some(previous) = self.entries.insert(uid.clone(), recipe) {
            warn!(
                "Recipe {uid} is exported twice ({} and {}); using the latter",
                previous.path.display(),
                self.entries[&uid].path.display()
            );
            self.superseded.entry(uid).or_default().push(previous.path);
        }
    }
}

impl FromIterator<LocalExportedRecipe> for LocalIndex {
    fn from_iter<I: IntoIterator<Item = LocalExportedRecipe>>(iter: I) -> Self {
        let mut index = LocalIndex::default();
        for recipe in iter {
            index.insert(recipe);
        }
        index
    }
}

/// Split a document into its YAML frontmatter and body.
pub fn split_frontmatter(content: &str) -> Result<(&str, &str), FrontmatterError> {
    let content = content.trim_start_matches('\u{feff}');
    let rest = content.strip_prefix("---").ok_or(FrontmatterError::Missing)?;
    let rest = strip_newline(rest).ok_or(FrontmatterError::Missing)?;

    let (yaml, after) = match rest.strip_prefix("---") {
        Some(after) => ("", after),
        None => {
            let end = rest.find("\n---").ok_or(FrontmatterError::Unterminated)?;
            (&rest[..end], &rest[end + "\n---".len()..])
        }
    };

    Ok((yaml, strip_newline(after).unwrap_or(after)))
}

fn strip_newline(s: &str) -> Option<&str> {
    s.strip_prefix("\r\n").or_else(|| s.strip_prefix('\n'))
}

/// Parse the frontmatter of one exported document.
pub fn parse_frontmatter(content: &str) -> Result<LocalExportedRecipe, FrontmatterError> {
    let (yaml, _) = split_frontmatter(content)?;
    Ok(serde_yaml::from_str(yaml)?)
}

/// Build the index from every Markdown document in `dir`.
pub fn read_index(dir: &Path) -> Result<LocalIndex, IndexError> {
    if !dir.is_dir() {
        return Err(IndexError::MissingDirectory(dir.to_path_buf()));
    }

    let mut md_files = Vec::new();
    for entry in fs::read_dir(dir)? {
        md_files.push(entry?.path());
    }
    md_files.retain(|p| {
            p.is_file()
                && p.extension()
                    .map(|e| e.eq_ignore_ascii_case("md"))
                    .unwrap_or(false)
    });
    md_files.sort();

    let mut index = LocalIndex::default();
    for path in md_files {
        let parsed = fs::read_to_string(&path)
            .map_err(|e| e.to_string())
            .and_then(|content| parse_frontmatter(&content).map_err(|e| e.to_string()));
        match parsed {
            Ok(mut recipe) => {
                recipe.path = path;
                index.insert(recipe);
            }
            Err(e) => {
                warn!("Skipping {}: {e}", path.display());
                index.skipped.push(path);
            }
        }
    }
    Ok(index)
}
