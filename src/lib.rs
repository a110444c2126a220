//! # Paprika Export
//!
//! Exports recipes from a Paprika Recipe Manager cloud account into two
//! local formats per recipe:
//!
//! - a Markdown document with YAML frontmatter, for static-site generators;
//! - a `.paprikarecipe` archive the Paprika app can import again.
//!
//! # Architecture: Incremental Export
//!
//! The Markdown directory is the exporter's only state. Each document records
//! the recipe's `uid` and the server's content `hash`, so a run only fetches
//! what changed since the last one:
//!
//! ```text
//! 1. Index     markdown dir  →  uid → hash          (what we exported)
//! 2. List      sync API      →  uid → hash          (what exists now)
//! 3. Resolve   (1) vs (2)    →  change set          (what to fetch)
//! 4. Fetch     sync API      →  full recipes + category names
//! 5. Write     each recipe   →  <slug>.md + <name>.paprikarecipe
//! ```
//!
//! Deleting a Markdown file, or passing `--skip-cache-check`, forces that
//! recipe (or all of them) to be exported again.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`api`] | Sync API client behind the [`api::RecipeSource`] trait |
//! | [`auth`] | Cached token, validation, credential prompt and login |
//! | [`index`] | Reads frontmatter of previously exported documents |
//! | [`changes`] | Decides which recipes need exporting |
//! | [`export`] | Orchestrates a run and reports per-recipe outcomes |
//! | [`markdown`] | Renders and writes the Markdown document |
//! | [`archive`] | Builds and writes the gzip'd JSON import archive |
//! | [`duration`] | Free-text durations to ISO 8601 |
//! | [`naming`] | Slugs and archive filenames |
//! | [`types`] | Recipe, summary and category types shared by all stages |
//! | [`config`] | `config.toml` loading, merging and validation |
//! | [`output`] | End-of-run summary formatting |
//!
//! # Design Decisions
//!
//! ## No Local Database
//!
//! Change detection reads the documents it wrote. A user can delete, move or
//! hand-edit the output and the next run reconciles against what is actually
//! on disk. The price is that a document whose frontmatter no longer parses
//! is treated as absent and overwritten.
//!
//! ## Fetch All or Nothing, Write Best Effort
//!
//! Any failure before the first write (listing, categories, any single
//! recipe) ends the run with nothing written, so a half-fetched run never
//! leaves a mix of old and new files. Once writing starts, one recipe's
//! failure does not stop the others, and a missing photo only drops the
//! photo from that archive.

pub mod api;
pub mod archive;
pub mod auth;
pub mod changes;
pub mod config;
pub mod duration;
pub mod export;
pub mod index;
pub mod markdown;
pub mod naming;
pub mod output;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
