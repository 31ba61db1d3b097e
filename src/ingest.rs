//! Batch ingestion of JSON-shaped archive records into a [`Catalog`].
//!
//! The content feed delivers one JSON object per item. Records are
//! deserialized and validated independently so one malformed record never
//! sinks the batch: accepted items go into the catalog, rejects come back
//! to the caller with the index and reason. Byte-identical duplicates of an
//! already-accepted record are skipped, not rejected.

use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

use crate::catalog::Catalog;
use crate::models::ArchiveItem;

/// Why one record was rejected.
#[derive(Debug, Clone)]
pub struct RecordError {
    /// Position of the record in the submitted batch.
    pub index: usize,
    /// The record's id, when one could be read before rejection.
    pub id: Option<String>,
    pub reason: String,
}

/// Outcome of one batch load.
#[derive(Debug)]
pub struct BatchReport {
    pub catalog: Catalog,
    pub accepted: usize,
    pub skipped_duplicates: usize,
    pub rejected: Vec<RecordError>,
}

/// Load a batch of feed records, validating each against the catalog
/// invariants. Partial success: valid records are indexed even when others
/// are rejected.
pub fn load_batch(records: &[Value]) -> BatchReport {
    let mut items: Vec<ArchiveItem> = Vec::with_capacity(records.len());
    let mut rejected: Vec<RecordError> = Vec::new();
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut seen_hashes: HashSet<String> = HashSet::new();
    let mut skipped_duplicates = 0usize;

    for (index, record) in records.iter().enumerate() {
        let hash = record_hash(record);
        if seen_hashes.contains(&hash) {
            skipped_duplicates += 1;
            continue;
        }

        let id_hint = record
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string);

        let item: ArchiveItem = match serde_json::from_value(record.clone()) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!(index, id = ?id_hint, error = %e, "rejected feed record");
                rejected.push(RecordError {
                    index,
                    id: id_hint,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if let Err(reason) = validate(&item, &seen_ids) {
            tracing::warn!(index, id = %item.id, %reason, "rejected feed record");
            rejected.push(RecordError {
                index,
                id: Some(item.id),
                reason,
            });
            continue;
        }

        seen_ids.insert(item.id.clone());
        seen_hashes.insert(hash);
        items.push(item);
    }

    tracing::info!(
        accepted = items.len(),
        rejected = rejected.len(),
        skipped_duplicates,
        "catalog batch loaded"
    );

    BatchReport {
        accepted: items.len(),
        skipped_duplicates,
        rejected,
        catalog: Catalog::new(items),
    }
}

fn validate(item: &ArchiveItem, seen_ids: &HashSet<String>) -> Result<(), String> {
    if item.id.trim().is_empty() {
        return Err("id must be non-empty".to_string());
    }
    if seen_ids.contains(&item.id) {
        return Err(format!("duplicate id in batch: {}", item.id));
    }
    if !(0.0..=5.0).contains(&item.rating) || !item.rating.is_finite() {
        return Err(format!("rating out of range 0.0-5.0: {}", item.rating));
    }
    if item.title.trim().is_empty() {
        return Err("title must be non-empty".to_string());
    }
    Ok(())
}

fn record_hash(record: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(record.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}
