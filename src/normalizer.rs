// 🧹 Normalizer - Draft → canonical ProviderRecord
// Deterministic, side-effect-free transform. Never raises: missing data
// degrades to placeholders and empty strings, not errors.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::categories::infer_categories;
use crate::record::{DraftRecord, ProviderRecord, DEFAULT_CATEGORY, NO_NAME_PLACEHOLDER};

/// Normalize a draft, stamping the current time as `imported_at`.
pub fn normalize(draft: DraftRecord) -> ProviderRecord {
    normalize_at(draft, Utc::now())
}

/// Normalize a draft with an explicit import timestamp.
///
/// - `full_name`: the complete name when the source supplied one, else the
///   single-space join of the name parts, else [`NO_NAME_PLACEHOLDER`].
/// - every optional field defaults to an empty string,
/// - `categories`: as supplied, else inferred from the name, else General,
/// - `id`: generated when the source supplied none (stable for the lifetime
///   of one import run).
pub fn normalize_at(draft: DraftRecord, imported_at: DateTime<Utc>) -> ProviderRecord {
    let first_name = text(draft.first_name);
    let last_name = text(draft.last_name);
    let second_last_name = text(draft.second_last_name);

    let full_name = match draft.name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => join_name_parts(&first_name, &last_name, &second_last_name),
    };
    let full_name = if full_name.is_empty() {
        NO_NAME_PLACEHOLDER.to_string()
    } else {
        full_name
    };

    let categories = if draft.categories.is_empty() {
        if full_name == NO_NAME_PLACEHOLDER {
            vec![DEFAULT_CATEGORY.to_string()]
        } else {
            infer_categories(&full_name)
        }
    } else {
        draft.categories
    };

    ProviderRecord {
        id: draft
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string()),
        tax_id: text(draft.tax_id),
        first_name,
        last_name,
        second_last_name,
        full_name,
        profession: text(draft.profession),
        registration_date: text(draft.registration_date),
        phone: text(draft.phone),
        email: text(draft.email),
        address: text(draft.address),
        website: text(draft.website),
        contact_person: text(draft.contact_person),
        categories,
        description: text(draft.description),
        raw_lines: draft.raw_lines,
        source_file: draft.source_file,
        source_format: draft.source_format,
        imported_at,
    }
}

fn text(value: Option<String>) -> String {
    value.map(|v| v.trim().to_string()).unwrap_or_default()
}

fn join_name_parts(first: &str, last: &str, second_last: &str) -> String {
    [first, last, second_last]
        .iter()
        .filter(|p| !p.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" ")
}

// ============================================================================
// TESTS
// ============================================================================
