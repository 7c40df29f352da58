//! Display-name resolution for participant ids.
//!
//! Names come from an external directory that only accepts bounded batches.
//! [`NameResolver`] chunks requests to fit, and any id the directory cannot
//! answer for (or any batch that fails outright) degrades to a placeholder
//! name. Resolution never fails as a whole.

use std::collections::{HashMap, HashSet};

use crate::error::{OverlapError, Result};

/// Batch cap enforced by the deployed directory function.
pub const MAX_LOOKUP_BATCH: usize = 40;

/// Upper bound a resolver may be configured with.
pub const HARD_LOOKUP_LIMIT: usize = 100;

/// Name shown for participants whose display name cannot be resolved.
pub const DEFAULT_PLACEHOLDER: &str = "anonymous";

/// A directory that maps participant ids to display names.
pub trait DisplayNameLookup {
    /// Look up a batch of ids. Ids absent from the returned map are unknown.
    ///
    /// # Errors
    /// Implementations reject empty batches with `OverlapError::EmptyBatch` and
    /// batches over their cap with `OverlapError::BatchTooLarge`.
    fn lookup(&self, ids: &[String]) -> Result<HashMap<String, String>>;
}

/// Validate a batch against a directory's size limit.
///
/// # Errors
/// `OverlapError::EmptyBatch` for no ids, `OverlapError::BatchTooLarge` for more
/// than `max`.
pub fn check_batch(ids: &[String], max: usize) -> Result<()> {
    if ids.is_empty() {
        return Err(OverlapError::EmptyBatch);
    }
    if ids.len() > max {
        return Err(OverlapError::BatchTooLarge {
            requested: ids.len(),
            max,
        });
    }
    Ok(())
}

/// In-memory directory with the same batch rules as the deployed one.
#[derive(Debug, Clone)]
pub struct StaticDirectory {
    names: HashMap<String, String>,
    max_batch: usize,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self {
            names: HashMap::new(),
            max_batch: MAX_LOOKUP_BATCH,
        }
    }

    pub fn with_max_batch(mut self, max_batch: usize) -> Self {
        self.max_batch = max_batch;
        self
    }

    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        self.names.insert(id.into(), name.into());
    }
}

impl Default for StaticDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StaticDirectory {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut directory = Self::new();
        for (id, name) in iter {
            directory.insert(id, name);
        }
        directory
    }
}

impl DisplayNameLookup for StaticDirectory {
    fn lookup(&self, ids: &[String]) -> Result<HashMap<String, String>> {
        check_batch(ids, self.max_batch)?;
        Ok(ids
            .iter()
            .filter_map(|id| self.names.get(id).map(|name| (id.clone(), name.clone())))
            .collect())
    }
}

/// Resolves display names in directory-sized batches with a placeholder fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameResolver {
    placeholder: String,
    batch_size: usize,
}

impl Default for NameResolver {
    fn default() -> Self {
        Self {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            batch_size: MAX_LOOKUP_BATCH,
        }
    }
}

impl NameResolver {
    /// `batch_size` is clamped to `1..=HARD_LOOKUP_LIMIT`.
    pub fn new(placeholder: impl Into<String>, batch_size: usize) -> Self {
        Self {
            placeholder: placeholder.into(),
            batch_size: batch_size.clamp(1, HARD_LOOKUP_LIMIT),
        }
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Resolve a name for every id in `ids`.
    ///
    /// Duplicate ids are looked up once. Unknown ids, blank names and every id of
    /// a failed batch map to the placeholder.
    pub fn resolve<L: DisplayNameLookup + ?Sized>(
        &self,
        lookup: &L,
        ids: &[String],
    ) -> HashMap<String, String> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let mut resolved = HashMap::with_capacity(unique.len());
        for batch in unique.chunks(self.batch_size) {
            let found = match lookup.lookup(batch) {
                Ok(found) => found,
                Err(err) => {
                    tracing::warn!(batch = batch.len(), error = %err, "display-name lookup failed");
                    HashMap::new()
                }
            };
            for id in batch {
                let name = found
                    .get(id)
                    .filter(|name| !name.trim().is_empty())
                    .cloned()
                    .unwrap_or_else(|| self.placeholder.clone());
                resolved.insert(id.clone(), name);
            }
        }
        resolved
    }
}
