//! Which remote recipes need exporting this run.

use crate::index::LocalIndex;
use crate::types::RemoteRecipeSummary;

/// Resolve the change set: uids to re-export, in remote list order.
///
/// With `force`, every remote recipe is included. Otherwise a recipe is
/// included when it has no local document or when the local document's hash
/// is missing or differs from the remote hash. Hashes are compared for exact
/// equality.
pub fn resolve(remote: &[RemoteRecipeSummary], local: &LocalIndex, force: bool) -> Vec<String> {
    remote
        .iter()
        .filter(|summary| force || local.hash(&summary.uid) != Some(summary.hash.as_str()))
        .map(|summary| summary.uid.clone())
        .collect()
}
