// 📇 Provider Records - Draft and canonical entity types
// DraftRecord is mutable and owned by one accumulator run;
// ProviderRecord is immutable once it leaves the normalizer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel used when a record carries no usable name at all.
pub const NO_NAME_PLACEHOLDER: &str = "Sin nombre";

/// Category assigned when nothing can be inferred from the name.
pub const DEFAULT_CATEGORY: &str = "General";

// ============================================================================
// DRAFT FIELDS
// ============================================================================

/// The single-valued fields of a draft. Population always goes through
/// `DraftRecord::set_if_absent` so the first-match-wins rule lives in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    FirstName,
    LastName,
    SecondLastName,
    /// Complete name as given by the source (entity headings, name columns).
    Name,
    TaxId,
    Profession,
    RegistrationDate,
    Phone,
    Email,
    Address,
    Website,
    ContactPerson,
    Description,
}

// ============================================================================
// DRAFT RECORD
// ============================================================================

/// Partially-populated provider entity still under construction.
///
/// All fields are optional; `raw_lines` keeps every source row/line verbatim
/// regardless of how (or whether) it was interpreted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftRecord {
    pub id: Option<String>,
    pub tax_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub second_last_name: Option<String>,
    pub name: Option<String>,
    pub profession: Option<String>,
    pub registration_date: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub contact_person: Option<String>,
    pub categories: Vec<String>,
    pub description: Option<String>,

    /// Verbatim provenance: every row/line that contributed to this draft.
    pub raw_lines: Vec<String>,

    pub source_file: String,
    pub source_format: String,
}

impl DraftRecord {
    /// Create an empty draft tagged with its provenance.
    pub fn new(source_file: &str, source_format: &str) -> Self {
        DraftRecord {
            source_file: source_file.to_string(),
            source_format: source_format.to_string(),
            ..Default::default()
        }
    }

    /// Set a field only if it has not been claimed yet.
    ///
    /// Returns `true` when the value was taken. Empty/whitespace-only values
    /// never claim a field.
    pub fn set_if_absent(&mut self, field: DraftField, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() {
            return false;
        }

        let slot = match field {
            DraftField::FirstName => &mut self.first_name,
            DraftField::LastName => &mut self.last_name,
            DraftField::SecondLastName => &mut self.second_last_name,
            DraftField::Name => &mut self.name,
            DraftField::TaxId => &mut self.tax_id,
            DraftField::Profession => &mut self.profession,
            DraftField::RegistrationDate => &mut self.registration_date,
            DraftField::Phone => &mut self.phone,
            DraftField::Email => &mut self.email,
            DraftField::Address => &mut self.address,
            DraftField::Website => &mut self.website,
            DraftField::ContactPerson => &mut self.contact_person,
            DraftField::Description => &mut self.description,
        };

        if slot.is_none() {
            *slot = Some(value.to_string());
            true
        } else {
            false
        }
    }

    /// Append a category tag (explicit tags from the source, in order).
    pub fn add_category(&mut self, category: &str) {
        let category = category.trim();
        if !category.is_empty() && !self.categories.iter().any(|c| c == category) {
            self.categories.push(category.to_string());
        }
    }

    /// Record one raw source row/line verbatim.
    pub fn push_raw_line(&mut self, line: &str) {
        self.raw_lines.push(line.to_string());
    }

    /// Minimal validity: the draft carries some kind of name.
    pub fn has_name(&self) -> bool {
        self.name.as_deref().is_some_and(|n| !n.trim().is_empty())
            || self
                .first_name
                .as_deref()
                .is_some_and(|n| !n.trim().is_empty())
    }

    /// A draft with no semantic field at all (raw lines do not count).
    pub fn is_blank(&self) -> bool {
        !self.has_name()
            && self.tax_id.is_none()
            && self.last_name.is_none()
            && self.second_last_name.is_none()
            && self.profession.is_none()
            && self.registration_date.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.address.is_none()
            && self.website.is_none()
            && self.contact_person.is_none()
            && self.categories.is_empty()
            && self.description.is_none()
    }
}

// ============================================================================
// PROVIDER RECORD
// ============================================================================

/// Canonical provider entity as stored and served by the application.
///
/// Every optional source field is an empty string when absent (never null),
/// so downstream comparisons stay total. Treated as immutable once the
/// normalizer produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRecord {
    pub id: String,

    /// RUT as seen in the source (`12.345.678-5` when well-formed); acts as
    /// the strongest identity key when present.
    pub tax_id: String,

    pub first_name: String,
    pub last_name: String,
    pub second_last_name: String,

    /// Derived; never empty (falls back to [`NO_NAME_PLACEHOLDER`]).
    pub full_name: String,

    pub profession: String,
    pub registration_date: String,

    pub phone: String,
    pub email: String,
    pub address: String,
    pub website: String,
    pub contact_person: String,

    /// Ordered tags; never empty (defaults to [`DEFAULT_CATEGORY`]).
    pub categories: Vec<String>,

    /// Free-text remainder not matched to any other field.
    pub description: String,

    /// Verbatim provenance carried over from the draft.
    pub raw_lines: Vec<String>,

    pub source_file: String,
    pub source_format: String,
    pub imported_at: DateTime<Utc>,
}

impl ProviderRecord {
    /// At least one way to reach this provider.
    pub fn has_contact_info(&self) -> bool {
        !self.phone.is_empty() || !self.email.is_empty() || !self.address.is_empty()
    }

    /// Whether the record carries a real name (not the placeholder).
    pub fn has_real_name(&self) -> bool {
        !self.full_name.is_empty() && self.full_name != NO_NAME_PLACEHOLDER
    }
}

/// Re-validation path: a normalized record can be treated as a draft again
/// (normalization is idempotent except for the import timestamp).
impl From<&ProviderRecord> for DraftRecord {
    fn from(record: &ProviderRecord) -> Self {
        fn opt(s: &str) -> Option<String> {
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        }

        DraftRecord {
            id: opt(&record.id),
            tax_id: opt(&record.tax_id),
            first_name: opt(&record.first_name),
            last_name: opt(&record.last_name),
            second_last_name: opt(&record.second_last_name),
            name: opt(&record.full_name),
            profession: opt(&record.profession),
            registration_date: opt(&record.registration_date),
            phone: opt(&record.phone),
            email: opt(&record.email),
            address: opt(&record.address),
            website: opt(&record.website),
            contact_person: opt(&record.contact_person),
            categories: record.categories.clone(),
            description: opt(&record.description),
            raw_lines: record.raw_lines.clone(),
            source_file: record.source_file.clone(),
            source_format: record.source_format.clone(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_if_absent_first_match_wins() {
        let mut draft = DraftRecord::new("test.csv", "fixed");

        assert!(draft.set_if_absent(DraftField::Phone, "22345678"));
        assert!(!draft.set_if_absent(DraftField::Phone, "98765432"));

        assert_eq!(draft.phone.as_deref(), Some("22345678"));
    }

    #[test]
    fn test_set_if_absent_ignores_empty_values() {
        let mut draft = DraftRecord::new("test.csv", "fixed");

        assert!(!draft.set_if_absent(DraftField::Email, "   "));
        assert!(draft.email.is_none());

        // An empty candidate must not claim the slot
        assert!(draft.set_if_absent(DraftField::Email, "contacto@acme.cl"));
        assert_eq!(draft.email.as_deref(), Some("contacto@acme.cl"));
    }

    #[test]
    fn test_set_if_absent_trims_values() {
        let mut draft = DraftRecord::new("test.csv", "fixed");
        draft.set_if_absent(DraftField::Name, "  ACME LTDA  ");
        assert_eq!(draft.name.as_deref(), Some("ACME LTDA"));
    }

    #[test]
    fn test_has_name_from_parts_or_whole() {
        let mut by_parts = DraftRecord::new("a.csv", "fixed");
        assert!(!by_parts.has_name());
        by_parts.set_if_absent(DraftField::FirstName, "JUAN");
        assert!(by_parts.has_name());

        let mut whole = DraftRecord::new("a.txt", "freetext");
        whole.set_if_absent(DraftField::Name, "ACME CONSTRUCTORA LTDA");
        assert!(whole.has_name());
    }

    #[test]
    fn test_blank_draft_detection() {
        let mut draft = DraftRecord::new("a.txt", "freetext");
        assert!(draft.is_blank());

        // Raw provenance alone does not make a draft substantive
        draft.push_raw_line("------");
        assert!(draft.is_blank());

        draft.set_if_absent(DraftField::Phone, "22345678");
        assert!(!draft.is_blank());
    }

    #[test]
    fn test_add_category_deduplicates() {
        let mut draft = DraftRecord::new("a.csv", "header");
        draft.add_category("Materiales");
        draft.add_category("Materiales");
        draft.add_category("Transporte");
        assert_eq!(draft.categories, vec!["Materiales", "Transporte"]);
    }
}
