// 🔎 Token Classifier - Field-level semantic classification
// One raw value in, one FieldClass out. The rule list is an ordered policy
// table: first match wins, and the ordering is load-bearing (a RUT and a
// plain numeric id can both look numeric).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

// ============================================================================
// FIELD CLASS
// ============================================================================

/// Semantic category a raw field/line value most likely represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldClass {
    Empty,
    NumericId,
    TaxId,
    PersonOrEntityName,
    Phone,
    Email,
    Address,
    Website,
    Unclassified,
}

impl FieldClass {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            FieldClass::Empty => "Empty",
            FieldClass::NumericId => "Numeric ID",
            FieldClass::TaxId => "Tax ID",
            FieldClass::PersonOrEntityName => "Person/Entity Name",
            FieldClass::Phone => "Phone",
            FieldClass::Email => "Email",
            FieldClass::Address => "Address",
            FieldClass::Website => "Website",
            FieldClass::Unclassified => "Unclassified",
        }
    }
}

// ============================================================================
// SHAPE PATTERNS
// ============================================================================

// RUT chileno: 1-2 digits, dot-grouped thousands, hyphen, check digit or K.
// Example: "12.345.678-5", "1.234.567-K"
static TAX_ID_EXACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}\.\d{3}\.\d{3}-[0-9kK]$").unwrap());

static TAX_ID_SEARCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}\.\d{3}\.\d{3}-[0-9kK]").unwrap());

static EMAIL_EXACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.+-]+@[\w-]+(\.[\w-]+)*\.[A-Za-z]{2,}$").unwrap());

static EMAIL_SEARCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\w.+-]+@[\w-]+(\.[\w-]+)*\.[A-Za-z]{2,}").unwrap());

// National mobile/landline shape, optional +56 country code, separators
// allowed. An all-digit value never reaches this rule (NumericId wins first).
static PHONE_EXACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\+?56[\s.\-]?)?(\(?\d{1,2}\)?[\s.\-]?)?\d{4}[\s.\-]?\d{4}$").unwrap()
});

static PHONE_SEARCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\+?56[\s.\-]?)?(\(?\d{1,2}\)?[\s.\-]?)?\d{4}[\s.\-]?\d{4}").unwrap()
});

static WEBSITE_EXACT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)(https?://)?(www\.)?[a-z0-9-]+(\.[a-z0-9-]+)*\.[a-z]{2,}(/\S*)?$").unwrap()
});

// Unit-number marker (#742, N° 12) or a postal-code-like digit run.
static ADDRESS_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(#\s*\d+|n[°º]\s*\d+|\b\d{7}\b)").unwrap());

/// Street/avenue/unit keywords that indicate an address line.
const ADDRESS_KEYWORDS: &[&str] = &[
    "avenida",
    "av.",
    "av ",
    "calle",
    "pasaje",
    "psje",
    "camino",
    "ruta",
    "carretera",
    "kilometro",
    "kilómetro",
    "km ",
    "oficina",
    "of.",
    "depto",
    "departamento",
    "local ",
    "bodega",
    "parcela",
    "galpon",
    "galpón",
    "sector",
    "poblacion",
    "población",
    "villa ",
];

// ============================================================================
// POLICY TABLE
// ============================================================================

/// One entry of the classification policy.
pub struct ClassifierRule {
    pub class: FieldClass,
    matches: fn(&str) -> bool,
}

/// Ordered classification policy. Evaluated top to bottom, first match wins.
/// New locales/formats extend this table without touching `classify`.
pub static CLASSIFIER_RULES: &[ClassifierRule] = &[
    ClassifierRule {
        class: FieldClass::TaxId,
        matches: is_tax_id,
    },
    ClassifierRule {
        class: FieldClass::NumericId,
        matches: is_numeric_id,
    },
    ClassifierRule {
        class: FieldClass::Email,
        matches: is_email,
    },
    ClassifierRule {
        class: FieldClass::Phone,
        matches: is_phone,
    },
    ClassifierRule {
        class: FieldClass::Address,
        matches: is_address,
    },
    ClassifierRule {
        class: FieldClass::Website,
        matches: is_website,
    },
    ClassifierRule {
        class: FieldClass::PersonOrEntityName,
        matches: is_person_or_entity_name,
    },
];

/// Classify one raw field/line value. Pure, total, order-sensitive.
pub fn classify(value: &str) -> FieldClass {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return FieldClass::Empty;
    }

    for rule in CLASSIFIER_RULES {
        if (rule.matches)(trimmed) {
            return rule.class;
        }
    }

    FieldClass::Unclassified
}

// ============================================================================
// SHAPE CHECKS
// ============================================================================

fn is_tax_id(value: &str) -> bool {
    TAX_ID_EXACT.is_match(value)
}

fn is_numeric_id(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_digit())
}

fn is_email(value: &str) -> bool {
    EMAIL_EXACT.is_match(value)
}

fn is_phone(value: &str) -> bool {
    PHONE_EXACT.is_match(value)
}

fn is_address(value: &str) -> bool {
    let len = value.chars().count();
    if !(8..=120).contains(&len) {
        return false;
    }

    let lower = value.to_lowercase();
    ADDRESS_KEYWORDS.iter().any(|kw| lower.contains(kw)) || ADDRESS_MARKER.is_match(value)
}

fn is_website(value: &str) -> bool {
    WEBSITE_EXACT.is_match(value)
}

fn is_person_or_entity_name(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_uppercase() => {}
        _ => return false,
    }

    value.chars().count() > 1 && value.chars().all(|c| c.is_alphabetic() || c == ' ')
}

// ============================================================================
// SEARCH HELPERS (used by the free-text adapter)
// ============================================================================

/// Find a tax-ID shape anywhere inside a line.
pub fn find_tax_id(line: &str) -> Option<&str> {
    TAX_ID_SEARCH.find(line).map(|m| m.as_str())
}

/// Find an email shape anywhere inside a line.
pub fn find_email(line: &str) -> Option<&str> {
    EMAIL_SEARCH.find(line).map(|m| m.as_str())
}

/// Find a phone shape anywhere inside a line (labels like "Fono:" included).
pub fn find_phone(line: &str) -> Option<&str> {
    PHONE_SEARCH
        .find(line)
        .map(|m| m.as_str().trim())
        .filter(|p| p.chars().filter(|c| c.is_ascii_digit()).count() >= 8)
}

/// Exact tax-ID shape check (the dedup key predicate).
pub fn is_valid_tax_id(value: &str) -> bool {
    is_tax_id(value.trim())
}

/// Address-likeness of a whole line, without the classifier's precedence.
pub fn looks_like_address(line: &str) -> bool {
    is_address(line.trim())
}

/// Website-likeness of a whole line.
pub fn looks_like_website(line: &str) -> bool {
    is_website(line.trim())
}

/// Verify the RUT check digit (módulo 11). Shape must already match;
/// a well-shaped RUT with a wrong check digit is flagged by data quality,
/// not rejected.
pub fn tax_id_check_digit_ok(value: &str) -> bool {
    let value = value.trim();
    if !is_tax_id(value) {
        return false;
    }

    let Some((body, dv)) = value.split_once('-') else {
        return false;
    };
    let digits: Vec<u32> = body.chars().filter_map(|c| c.to_digit(10)).collect();

    let mut factor = 2;
    let mut sum = 0;
    for d in digits.iter().rev() {
        sum += d * factor;
        factor = if factor == 7 { 2 } else { factor + 1 };
    }

    let expected = match 11 - (sum % 11) {
        11 => "0".to_string(),
        10 => "K".to_string(),
        n => n.to_string(),
    };

    dv.eq_ignore_ascii_case(&expected)
}

// ============================================================================
// TESTS
// ============================================================================
