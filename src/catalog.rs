//! Read-only catalog index over ingested [`ArchiveItem`]s.
//!
//! The catalog is an immutable snapshot: the ingestion feed builds it once
//! per batch and every scoring component reads it through `&` references.
//! No mutation surface exists in this crate, so concurrent matching and
//! ranking need no locking.

use std::collections::HashMap;

use crate::error::IntelError;
use crate::models::{ArchiveItem, Category};

/// Immutable set of archive items with an id lookup index.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    items: Vec<ArchiveItem>,
    by_id: HashMap<String, usize>,
}

impl Catalog {
    /// Build a catalog from already-validated items.
    ///
    /// Id uniqueness is the ingestion layer's invariant; a duplicate here
    /// would mean a bug upstream, so later duplicates simply never win the
    /// index entry.
    pub fn new(items: Vec<ArchiveItem>) -> Self {
        let mut by_id = HashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            by_id.entry(item.id.clone()).or_insert(idx);
        }
        Catalog { items, by_id }
    }

    /// Look up one item by id.
    pub fn get(&self, id: &str) -> Result<&ArchiveItem, IntelError> {
        self.by_id
            .get(id)
            .map(|&idx| &self.items[idx])
            .ok_or_else(|| IntelError::NotFound(id.to_string()))
    }

    /// Items in a category. `"all"` returns the full set; anything else
    /// outside the closed category enum is an `InvalidCategory` error.
    pub fn filter_by_category(&self, label: &str) -> Result<Vec<&ArchiveItem>, IntelError> {
        if label == "all" {
            return Ok(self.items.iter().collect());
        }
        let category = Category::parse(label)
            .ok_or_else(|| IntelError::InvalidCategory(label.to_string()))?;
        Ok(self
            .items
            .iter()
            .filter(|item| item.category == category)
            .collect())
    }

    /// Generic predicate filter, used by the matcher and ranker.
    pub fn search<P>(&self, predicate: P) -> Vec<&ArchiveItem>
    where
        P: Fn(&ArchiveItem) -> bool,
    {
        self.items.iter().filter(|item| predicate(item)).collect()
    }

    pub fn items(&self) -> &[ArchiveItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
