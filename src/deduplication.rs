// 🔁 Deduplicator - First-occurrence-wins identity resolution
// Key priority: well-formed tax ID first, normalized full name second.
// Order-dependent by design: when the same provider appears in two files,
// whichever file was processed first determines the surviving record.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::classifier::is_valid_tax_id;
use crate::record::ProviderRecord;

// ============================================================================
// RESULT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupResult {
    /// Surviving records, in their original order.
    pub kept: Vec<ProviderRecord>,

    /// Records dropped because their key was already seen.
    pub duplicates_removed: usize,
}

// ============================================================================
// KEY & ALGORITHM
// ============================================================================

/// The identity key of a record. Computed, never stored: the tax ID when
/// present and well-formed, otherwise the lower-cased trimmed full name.
pub fn dedup_key(record: &ProviderRecord) -> String {
    let tax_id = record.tax_id.trim();
    if !tax_id.is_empty() && is_valid_tax_id(tax_id) {
        tax_id.to_string()
    } else {
        record.full_name.trim().to_lowercase()
    }
}

/// Drop records whose key was already seen. Ties are never merged
/// field-by-field; no attempt is made to pick the "more complete" record.
pub fn dedupe(records: Vec<ProviderRecord>) -> DedupResult {
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());
    let mut duplicates_removed = 0;

    for record in records {
        let key = dedup_key(&record);
        if seen.insert(key) {
            kept.push(record);
        } else {
            duplicates_removed += 1;
        }
    }

    DedupResult {
        kept,
        duplicates_removed,
    }
}

// ============================================================================
// TESTS
// ============================================================================
