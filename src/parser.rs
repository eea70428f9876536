// 🏗️ Format Adapters - Polymorphic parser system for provider sources
// Four raw input shapes converge on one stream of DraftRecords:
// fixed-column CSV exports, free text extracted from documents,
// header-based CSV, and ad-hoc JSON arrays.

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::accumulator::{Accumulator, AccumulatorEvent};
use crate::classifier::{
    classify, find_email, find_phone, find_tax_id, looks_like_address, looks_like_website,
    FieldClass,
};
use crate::record::{DraftField, DraftRecord};

// ============================================================================
// CORE TYPES
// ============================================================================

/// SourceFormat - Identifica la forma del archivo/blob de origen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// Positional rows, up to four fields, no reliable header.
    FixedColumn,
    /// Line-oriented text (e.g. extracted from a PDF).
    FreeText,
    /// Generic CSV with a recognizable header row.
    HeaderCsv,
    /// Array of loosely-keyed JSON objects.
    Json,
}

impl SourceFormat {
    /// Human-readable name for display
    pub fn name(&self) -> &'static str {
        match self {
            SourceFormat::FixedColumn => "Fixed-column CSV",
            SourceFormat::FreeText => "Free text",
            SourceFormat::HeaderCsv => "Header CSV",
            SourceFormat::Json => "JSON",
        }
    }

    /// Short code for provenance metadata
    pub fn code(&self) -> &'static str {
        match self {
            SourceFormat::FixedColumn => "fixed",
            SourceFormat::FreeText => "freetext",
            SourceFormat::HeaderCsv => "header",
            SourceFormat::Json => "json",
        }
    }

    /// Parse a format code back (API clients declare formats by code).
    pub fn from_code(code: &str) -> Option<SourceFormat> {
        match code.trim().to_lowercase().as_str() {
            "fixed" | "fixedcolumn" => Some(SourceFormat::FixedColumn),
            "freetext" | "text" | "pdf" => Some(SourceFormat::FreeText),
            "header" | "csv" => Some(SourceFormat::HeaderCsv),
            "json" => Some(SourceFormat::Json),
            _ => None,
        }
    }
}

/// ProviderParser - Core trait
///
/// Adapters are synchronous pure computation over already-read content;
/// file I/O lives in the orchestrator (the only suspension point).
pub trait ProviderParser: Send + Sync {
    /// Parse one source unit into draft records.
    fn parse(&self, source_name: &str, content: &str) -> Result<Vec<DraftRecord>>;

    /// Get the source format this parser handles
    fn source_format(&self) -> SourceFormat;
}

// ============================================================================
// FACTORY FUNCTIONS
// ============================================================================

/// Column tokens that mark a CSV first row as a header.
const NAME_HEADER_TOKENS: &[&str] = &["nombre", "name", "razon social", "razón social", "proveedor"];

/// Detect the source format from filename and a content sample.
///
/// # Strategy:
/// 1. JSON by extension or a leading bracket/brace.
/// 2. CSV by extension; header row decides header-based vs fixed-column.
/// 3. Everything else is treated as free text.
pub fn detect_format(source_name: &str, content: &str) -> SourceFormat {
    let name_lower = source_name.to_lowercase();
    let trimmed = content.trim_start();

    if name_lower.ends_with(".json") || trimmed.starts_with('[') || trimmed.starts_with('{') {
        return SourceFormat::Json;
    }

    if name_lower.ends_with(".csv") || name_lower.ends_with(".tsv") {
        let first_line = content.lines().next().unwrap_or("").to_lowercase();
        if NAME_HEADER_TOKENS.iter().any(|t| first_line.contains(t)) {
            return SourceFormat::HeaderCsv;
        }
        return SourceFormat::FixedColumn;
    }

    SourceFormat::FreeText
}

/// Get the appropriate parser for a source format.
pub fn get_parser(format: SourceFormat) -> Box<dyn ProviderParser> {
    match format {
        SourceFormat::FixedColumn => Box::new(FixedColumnParser::new()),
        SourceFormat::FreeText => Box::new(FreeTextParser::new()),
        SourceFormat::HeaderCsv => Box::new(HeaderCsvParser::new()),
        SourceFormat::Json => Box::new(JsonParser::new()),
    }
}

// ============================================================================
// FIXED-COLUMN PARSER
// ============================================================================

/// Positional export with up to four fields per row and no header.
///
/// Row interpretation by the class of field 0:
/// - NumericId: a new record begins; fields 1-2 are the tentative name pair,
///   field 3 the second last name.
/// - TaxId: attaches to the record in progress (fields 1-2 carry profession
///   and registration date verbatim); ignored when nothing is in progress.
/// - two leading name fields while the record has no name yet: name
///   correction/continuation line.
///
/// All four raw values of every row are retained verbatim in `raw_lines`.
pub struct FixedColumnParser;

impl FixedColumnParser {
    pub fn new() -> Self {
        FixedColumnParser
    }
}

impl Default for FixedColumnParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderParser for FixedColumnParser {
    fn parse(&self, source_name: &str, content: &str) -> Result<Vec<DraftRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut acc = Accumulator::new();

        for (line_num, result) in reader.records().enumerate() {
            let row = result.with_context(|| {
                format!("Failed to parse CSV line {} in {}", line_num + 1, source_name)
            })?;

            let fields: Vec<String> = (0..4)
                .map(|i| row.get(i).unwrap_or("").trim().to_string())
                .collect();
            if fields.iter().all(|f| f.is_empty()) {
                continue;
            }
            let raw = fields.join(" | ");

            match classify(&fields[0]) {
                FieldClass::NumericId => {
                    let mut seed =
                        DraftRecord::new(source_name, SourceFormat::FixedColumn.code());
                    seed.push_raw_line(&raw);

                    let f1_is_name = classify(&fields[1]) == FieldClass::PersonOrEntityName;
                    let f2_is_name = classify(&fields[2]) == FieldClass::PersonOrEntityName;
                    if f1_is_name && f2_is_name {
                        seed.set_if_absent(DraftField::FirstName, &fields[1]);
                        seed.set_if_absent(DraftField::LastName, &fields[2]);
                        if classify(&fields[3]) == FieldClass::PersonOrEntityName {
                            seed.set_if_absent(DraftField::SecondLastName, &fields[3]);
                        }
                    }

                    acc.apply(AccumulatorEvent::NewRecord(seed));
                }
                FieldClass::TaxId => {
                    // Attaches to the record in progress; a stray tax row
                    // before the first record is dropped by the accumulator.
                    if let Some(draft) = acc.current_mut() {
                        draft.push_raw_line(&raw);
                    }
                    for (field, value) in [
                        (DraftField::TaxId, &fields[0]),
                        (DraftField::Profession, &fields[1]),
                        (DraftField::RegistrationDate, &fields[2]),
                    ] {
                        acc.apply(AccumulatorEvent::Field {
                            field,
                            value: value.clone(),
                        });
                    }
                }
                _ => {
                    let Some(draft) = acc.current_mut() else {
                        continue;
                    };
                    draft.push_raw_line(&raw);
                    let needs_name = !draft.has_name();

                    let f0_is_name = classify(&fields[0]) == FieldClass::PersonOrEntityName;
                    let f1_is_name = classify(&fields[1]) == FieldClass::PersonOrEntityName;
                    if needs_name && f0_is_name && f1_is_name {
                        acc.apply(AccumulatorEvent::Field {
                            field: DraftField::FirstName,
                            value: fields[0].clone(),
                        });
                        acc.apply(AccumulatorEvent::Field {
                            field: DraftField::LastName,
                            value: fields[1].clone(),
                        });
                        if classify(&fields[2]) == FieldClass::PersonOrEntityName {
                            acc.apply(AccumulatorEvent::Field {
                                field: DraftField::SecondLastName,
                                value: fields[2].clone(),
                            });
                        }
                    }
                }
            }
        }

        Ok(acc.finish())
    }

    fn source_format(&self) -> SourceFormat {
        SourceFormat::FixedColumn
    }
}

// ============================================================================
// FREE-TEXT PARSER
// ============================================================================

/// Line-oriented text, e.g. the output of a PDF text extractor.
///
/// A line starts a new record when it looks like an entity heading; every
/// following line is scanned for the contact fields, first unclaimed match
/// wins each field, and plausible leftovers become the description.
pub struct FreeTextParser;

/// Legal-entity suffixes that mark a heading line (compared uppercase).
const LEGAL_SUFFIXES: &[&str] = &[
    " LTDA",
    " LTDA.",
    " LIMITADA",
    " SPA",
    " S.P.A.",
    " S.A.",
    " S.A",
    " EIRL",
    " E.I.R.L.",
    " Y CIA",
    " SAC",
];

/// Labels stripped before testing a line for a contact-person shape.
const CONTACT_LABELS: &[&str] = &["contacto:", "atención:", "atencion:", "contacto comercial:"];

impl FreeTextParser {
    pub fn new() -> Self {
        FreeTextParser
    }

    /// Entity-heading check. A heading is one of:
    /// - a run ending in a legal-entity suffix,
    /// - a leading index number followed by a name-like run,
    /// - a leading tax ID followed by a name-like run (tax id attaches),
    /// - a long capitalized run with no digits.
    fn heading_draft(&self, line: &str, source_name: &str) -> Option<DraftRecord> {
        let mut seed = DraftRecord::new(source_name, SourceFormat::FreeText.code());
        seed.push_raw_line(line);

        // Leading tax ID + name run: "12.345.678-5 ACME LTDA"
        if let Some(tax_id) = find_tax_id(line) {
            if line.starts_with(tax_id) {
                let rest = line[tax_id.len()..].trim_start_matches([' ', '\t', '-', ':', ',']);
                if name_run(rest) {
                    seed.set_if_absent(DraftField::TaxId, tax_id);
                    seed.set_if_absent(DraftField::Name, rest);
                    return Some(seed);
                }
            }
        }

        // Leading index number + name run: "12. ACME LTDA" / "3) Juan Pérez"
        let digits: String = line.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() && digits.len() <= 3 {
            let rest = line[digits.len()..].trim_start_matches(['.', ')', '-', ' ', '\t']);
            if name_run(rest) {
                seed.set_if_absent(DraftField::Name, rest);
                return Some(seed);
            }
        }

        // Legal-entity suffix
        let upper = line.to_uppercase();
        if line.chars().count() >= 8 && LEGAL_SUFFIXES.iter().any(|s| upper.ends_with(s)) {
            seed.set_if_absent(DraftField::Name, line);
            return Some(seed);
        }

        // Long capitalized run, no digits: "FERRETERIA EL CLAVO"
        if line.chars().count() >= 10
            && !line.chars().any(|c| c.is_ascii_digit())
            && line
                .chars()
                .all(|c| c.is_whitespace() || c == '&' || c == '.' || c.is_uppercase())
            && line.chars().any(|c| c.is_alphabetic())
        {
            seed.set_if_absent(DraftField::Name, line);
            return Some(seed);
        }

        None
    }

    /// Scan one continuation line into the record in progress.
    /// Substring matches (tax ID, email, phone) are claimed first; otherwise
    /// the whole line is interpreted as address, website, contact person, or
    /// the description fallback.
    fn scan_line(&self, draft: &mut DraftRecord, line: &str) {
        let mut claimed = false;

        if draft.tax_id.is_none() {
            if let Some(tax_id) = find_tax_id(line) {
                draft.set_if_absent(DraftField::TaxId, tax_id);
                claimed = true;
            }
        }
        if draft.email.is_none() {
            if let Some(email) = find_email(line) {
                draft.set_if_absent(DraftField::Email, email);
                claimed = true;
            }
        }
        if draft.phone.is_none() {
            if let Some(phone) = find_phone(line) {
                draft.set_if_absent(DraftField::Phone, phone);
                claimed = true;
            }
        }
        if claimed {
            return;
        }

        if draft.address.is_none() && looks_like_address(line) {
            draft.set_if_absent(DraftField::Address, line);
            return;
        }
        if draft.website.is_none() && looks_like_website(line) {
            draft.set_if_absent(DraftField::Website, line);
            return;
        }
        if draft.contact_person.is_none() {
            if let Some(person) = contact_person_candidate(line, draft.name.as_deref()) {
                draft.set_if_absent(DraftField::ContactPerson, &person);
                return;
            }
        }

        // Leftover of plausible length becomes the description
        let len = line.chars().count();
        if draft.description.is_none() && (3..=250).contains(&len) {
            draft.set_if_absent(DraftField::Description, line);
        }
    }
}

impl Default for FreeTextParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderParser for FreeTextParser {
    fn parse(&self, source_name: &str, content: &str) -> Result<Vec<DraftRecord>> {
        let mut acc = Accumulator::new();

        for raw_line in content.lines() {
            let line = raw_line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(seed) = self.heading_draft(line, source_name) {
                acc.apply(AccumulatorEvent::NewRecord(seed));
                continue;
            }

            // Continuation line before the first heading drops harmlessly
            let Some(draft) = acc.current_mut() else {
                continue;
            };
            draft.push_raw_line(line);
            self.scan_line(draft, line);
        }

        Ok(acc.finish())
    }

    fn source_format(&self) -> SourceFormat {
        SourceFormat::FreeText
    }
}

/// A name-like run: starts uppercase, mostly letters, more than one char.
fn name_run(value: &str) -> bool {
    let value = value.trim();
    if value.chars().count() <= 1 {
        return false;
    }
    match value.chars().next() {
        Some(first) if first.is_uppercase() => {}
        _ => return false,
    }
    value
        .chars()
        .all(|c| c.is_alphabetic() || c.is_whitespace() || c == '.' || c == '&')
}

/// Short "Firstname Lastname [Middlename]" shape that is not the record's
/// own name. Accepts an optional "Contacto:"-style label prefix.
fn contact_person_candidate(line: &str, own_name: Option<&str>) -> Option<String> {
    let lower = line.to_lowercase();
    let candidate = CONTACT_LABELS
        .iter()
        .find(|label| lower.starts_with(*label))
        .map(|label| line[label.len()..].trim())
        .unwrap_or_else(|| line.trim());

    let words: Vec<&str> = candidate.split_whitespace().collect();
    if !(2..=3).contains(&words.len()) {
        return None;
    }

    for word in &words {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) if first.is_uppercase() => {}
            _ => return None,
        }
        if !chars.all(|c| c.is_lowercase() && c.is_alphabetic()) {
            return None;
        }
    }

    if let Some(own) = own_name {
        if own.trim().to_lowercase() == candidate.to_lowercase() {
            return None;
        }
    }

    Some(candidate.to_string())
}

// ============================================================================
// HEADER-CSV PARSER
// ============================================================================

/// Generic CSV export with a header row. Rows map positionally to
/// name / phone / email / address / website / categories / description;
/// categories split on ";". One draft per row, no accumulation needed.
pub struct HeaderCsvParser;

impl HeaderCsvParser {
    pub fn new() -> Self {
        HeaderCsvParser
    }
}

impl Default for HeaderCsvParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderParser for HeaderCsvParser {
    fn parse(&self, source_name: &str, content: &str) -> Result<Vec<DraftRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut drafts = Vec::new();

        for (line_num, result) in reader.records().enumerate() {
            let row = result.with_context(|| {
                format!("Failed to parse CSV line {} in {}", line_num + 1, source_name)
            })?;

            let cell = |i: usize| row.get(i).unwrap_or("").trim().to_string();

            if line_num == 0 {
                let first_row_lower = (0..row.len())
                    .map(|i| cell(i).to_lowercase())
                    .collect::<Vec<_>>()
                    .join(",");
                if NAME_HEADER_TOKENS.iter().any(|t| first_row_lower.contains(t)) {
                    continue; // header row
                }
            }

            let mut draft = DraftRecord::new(source_name, SourceFormat::HeaderCsv.code());
            draft.push_raw_line(&(0..row.len()).map(cell).collect::<Vec<_>>().join(" | "));

            draft.set_if_absent(DraftField::Name, &cell(0));
            draft.set_if_absent(DraftField::Phone, &cell(1));
            draft.set_if_absent(DraftField::Email, &cell(2));
            draft.set_if_absent(DraftField::Address, &cell(3));
            draft.set_if_absent(DraftField::Website, &cell(4));
            for category in cell(5).split(';') {
                draft.add_category(category);
            }
            draft.set_if_absent(DraftField::Description, &cell(6));

            if !draft.is_blank() {
                drafts.push(draft);
            }
        }

        Ok(drafts)
    }

    fn source_format(&self) -> SourceFormat {
        SourceFormat::HeaderCsv
    }
}

// ============================================================================
// JSON PARSER
// ============================================================================

/// Array-of-objects input read through tolerant key aliasing (Spanish or
/// English spelling per field). Each element is already one record, so no
/// accumulation state machine is needed.
pub struct JsonParser;

impl JsonParser {
    pub fn new() -> Self {
        JsonParser
    }
}

impl Default for JsonParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderParser for JsonParser {
    fn parse(&self, source_name: &str, content: &str) -> Result<Vec<DraftRecord>> {
        let value: Value = serde_json::from_str(content)
            .with_context(|| format!("Failed to parse JSON from {}", source_name))?;
        parse_json_array(source_name, &value)
    }

    fn source_format(&self) -> SourceFormat {
        SourceFormat::Json
    }
}

/// Parse an already-decoded JSON value. The value must be an array of
/// objects; anything else is an error (there is no meaningful unit to
/// salvage from a malformed payload).
pub fn parse_json_array(source_name: &str, value: &Value) -> Result<Vec<DraftRecord>> {
    let items = value
        .as_array()
        .ok_or_else(|| anyhow::anyhow!("JSON payload is not an array of provider objects"))?;

    let mut drafts = Vec::new();

    for item in items {
        let Some(obj) = item.as_object() else {
            continue; // tolerate stray scalars inside the array
        };

        let mut draft = DraftRecord::new(source_name, SourceFormat::Json.code());
        draft.push_raw_line(&serde_json::to_string(item).unwrap_or_else(|_| "{}".to_string()));

        let field = |keys: &[&str]| -> Option<String> {
            keys.iter().find_map(|k| {
                obj.get(*k).and_then(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
            })
        };

        draft.id = field(&["id", "_id"]);
        if let Some(name) = field(&["nombre", "name", "razonSocial"]) {
            draft.set_if_absent(DraftField::Name, &name);
        }
        if let Some(first) = field(&["nombres", "firstName"]) {
            draft.set_if_absent(DraftField::FirstName, &first);
        }
        if let Some(last) = field(&["apellidoPaterno", "lastName"]) {
            draft.set_if_absent(DraftField::LastName, &last);
        }
        if let Some(second) = field(&["apellidoMaterno", "secondLastName"]) {
            draft.set_if_absent(DraftField::SecondLastName, &second);
        }
        if let Some(tax_id) = field(&["rut", "taxId"]) {
            draft.set_if_absent(DraftField::TaxId, &tax_id);
        }
        if let Some(profession) = field(&["profesion", "profession"]) {
            draft.set_if_absent(DraftField::Profession, &profession);
        }
        if let Some(date) = field(&["fechaRegistro", "registrationDate"]) {
            draft.set_if_absent(DraftField::RegistrationDate, &date);
        }
        if let Some(phone) = field(&["telefono", "fono", "phone"]) {
            draft.set_if_absent(DraftField::Phone, &phone);
        }
        if let Some(email) = field(&["correo", "email"]) {
            draft.set_if_absent(DraftField::Email, &email);
        }
        if let Some(address) = field(&["direccion", "address"]) {
            draft.set_if_absent(DraftField::Address, &address);
        }
        if let Some(website) = field(&["sitioWeb", "website"]) {
            draft.set_if_absent(DraftField::Website, &website);
        }
        if let Some(contact) = field(&["contacto", "contactPerson"]) {
            draft.set_if_absent(DraftField::ContactPerson, &contact);
        }
        if let Some(description) = field(&["descripcion", "description"]) {
            draft.set_if_absent(DraftField::Description, &description);
        }

        match obj.get("rubros").or_else(|| obj.get("categories")) {
            Some(Value::Array(tags)) => {
                for tag in tags.iter().filter_map(|t| t.as_str()) {
                    draft.add_category(tag);
                }
            }
            Some(Value::String(joined)) => {
                for tag in joined.split(';') {
                    draft.add_category(tag);
                }
            }
            _ => {}
        }

        if !draft.is_blank() {
            drafts.push(draft);
        }
    }

    Ok(drafts)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ------------------------------------------------------------------
    // Format detection
    // ------------------------------------------------------------------

    #[test]
    fn test_detect_format_json() {
        assert_eq!(detect_format("proveedores.json", "[]"), SourceFormat::Json);
        assert_eq!(detect_format("pegado.txt", "  [{\"nombre\":\"X\"}]"), SourceFormat::Json);
    }

    #[test]
    fn test_detect_format_csv_header_vs_fixed() {
        assert_eq!(
            detect_format("export.csv", "Nombre,Fono,Correo\nACME,2,x@y.cl"),
            SourceFormat::HeaderCsv
        );
        assert_eq!(
            detect_format("export.csv", "1,JUAN,PEREZ,GOMEZ"),
            SourceFormat::FixedColumn
        );
    }

    #[test]
    fn test_detect_format_free_text_fallback() {
        assert_eq!(
            detect_format("listado.txt", "ACME CONSTRUCTORA LTDA\n12.345.678-5"),
            SourceFormat::FreeText
        );
    }

    #[test]
    fn test_format_codes_round_trip() {
        for format in [
            SourceFormat::FixedColumn,
            SourceFormat::FreeText,
            SourceFormat::HeaderCsv,
            SourceFormat::Json,
        ] {
            assert_eq!(SourceFormat::from_code(format.code()), Some(format));
        }
        assert_eq!(SourceFormat::from_code("xml"), None);
    }

    #[test]
    fn test_get_parser_matches_format() {
        assert_eq!(
            get_parser(SourceFormat::FreeText).source_format(),
            SourceFormat::FreeText
        );
        assert_eq!(
            get_parser(SourceFormat::Json).source_format(),
            SourceFormat::Json
        );
    }

    // ------------------------------------------------------------------
    // Fixed-column adapter
    // ------------------------------------------------------------------

    #[test]
    fn test_fixed_column_person_with_tax_row() {
        let content = "1,JUAN,PEREZ,GOMEZ\n12.345.678-5,INGENIERO,2024-01-10,\n";
        let drafts = FixedColumnParser::new().parse("padron.csv", content).unwrap();

        assert_eq!(drafts.len(), 1);
        let d = &drafts[0];
        assert_eq!(d.first_name.as_deref(), Some("JUAN"));
        assert_eq!(d.last_name.as_deref(), Some("PEREZ"));
        assert_eq!(d.second_last_name.as_deref(), Some("GOMEZ"));
        assert_eq!(d.tax_id.as_deref(), Some("12.345.678-5"));
        assert_eq!(d.profession.as_deref(), Some("INGENIERO"));
        assert_eq!(d.registration_date.as_deref(), Some("2024-01-10"));
    }

    #[test]
    fn test_fixed_column_multiple_records() {
        let content = "\
1,JUAN,PEREZ,GOMEZ
12.345.678-5,INGENIERO,2024-01-10,
2,MARIA,SOTO,
9.876.543-3,CONSTRUCTORA,2023-11-02,
";
        let drafts = FixedColumnParser::new().parse("padron.csv", content).unwrap();

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].first_name.as_deref(), Some("JUAN"));
        assert_eq!(drafts[1].first_name.as_deref(), Some("MARIA"));
        assert_eq!(drafts[1].tax_id.as_deref(), Some("9.876.543-3"));
    }

    #[test]
    fn test_fixed_column_stray_tax_row_before_first_record() {
        // Tax row with no record in progress: dropped, not crashed on
        let content = "12.345.678-5,INGENIERO,,\n1,JUAN,PEREZ,\n";
        let drafts = FixedColumnParser::new().parse("padron.csv", content).unwrap();

        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].tax_id.is_none());
    }

    #[test]
    fn test_fixed_column_name_continuation_line() {
        // Record starts with an id-only row; the name arrives on the next line
        let content = "7,,,\nJUAN,PEREZ,GOMEZ,\n";
        let drafts = FixedColumnParser::new().parse("padron.csv", content).unwrap();

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].first_name.as_deref(), Some("JUAN"));
        assert_eq!(drafts[0].last_name.as_deref(), Some("PEREZ"));
        assert_eq!(drafts[0].second_last_name.as_deref(), Some("GOMEZ"));
    }

    #[test]
    fn test_fixed_column_retains_raw_rows_verbatim() {
        let content = "1,JUAN,PEREZ,GOMEZ\nalgo sin clasificar,,,\n";
        let drafts = FixedColumnParser::new().parse("padron.csv", content).unwrap();

        assert_eq!(drafts.len(), 1);
        // Both rows land in the provenance array, interpreted or not
        assert_eq!(drafts[0].raw_lines.len(), 2);
        assert!(drafts[0].raw_lines[1].contains("algo sin clasificar"));
    }

    // ------------------------------------------------------------------
    // Free-text adapter
    // ------------------------------------------------------------------

    #[test]
    fn test_free_text_acme_block() {
        let content = "ACME CONSTRUCTORA LTDA\n12.345.678-5\nFono: 22345678\ncontacto@acme.cl\nAv. Siempre Viva 742";
        let drafts = FreeTextParser::new().parse("listado.pdf.txt", content).unwrap();

        assert_eq!(drafts.len(), 1);
        let d = &drafts[0];
        assert_eq!(d.name.as_deref(), Some("ACME CONSTRUCTORA LTDA"));
        assert_eq!(d.tax_id.as_deref(), Some("12.345.678-5"));
        assert_eq!(d.phone.as_deref(), Some("22345678"));
        assert_eq!(d.email.as_deref(), Some("contacto@acme.cl"));
        assert_eq!(d.address.as_deref(), Some("Av. Siempre Viva 742"));
    }

    #[test]
    fn test_free_text_heading_shapes() {
        let parser = FreeTextParser::new();

        // Legal suffix
        assert!(parser.heading_draft("ACME CONSTRUCTORA LTDA", "t").is_some());
        // Index number + name
        assert!(parser.heading_draft("3) Ferretería El Clavo", "t").is_some());
        // Tax id + name
        let seeded = parser.heading_draft("12.345.678-5 ACME LTDA", "t").unwrap();
        assert_eq!(seeded.tax_id.as_deref(), Some("12.345.678-5"));
        assert_eq!(seeded.name.as_deref(), Some("ACME LTDA"));
        // Long capitalized run, no digits
        assert!(parser.heading_draft("FERRETERIA EL CLAVO", "t").is_some());

        // Contact lines are not headings
        assert!(parser.heading_draft("Fono: 22345678", "t").is_none());
        assert!(parser.heading_draft("contacto@acme.cl", "t").is_none());
        assert!(parser.heading_draft("Av. Siempre Viva 742", "t").is_none());
        // A bare tax-id line continues the current record
        assert!(parser.heading_draft("12.345.678-5", "t").is_none());
    }

    #[test]
    fn test_free_text_two_records_and_first_match_wins() {
        let content = "\
ACME CONSTRUCTORA LTDA
Fono: 22345678
Fono alternativo: 98765432
TRANSPORTES DEL MAIPO LIMITADA
9.876.543-3
";
        let drafts = FreeTextParser::new().parse("listado.txt", content).unwrap();

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].phone.as_deref(), Some("22345678"));
        assert_eq!(drafts[1].name.as_deref(), Some("TRANSPORTES DEL MAIPO LIMITADA"));
        assert_eq!(drafts[1].tax_id.as_deref(), Some("9.876.543-3"));
    }

    #[test]
    fn test_free_text_contact_person_and_description() {
        let content = "\
ACME CONSTRUCTORA LTDA
Contacto: Juan Pérez
especialistas en obras menores y ampliaciones
";
        let drafts = FreeTextParser::new().parse("listado.txt", content).unwrap();

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].contact_person.as_deref(), Some("Juan Pérez"));
        assert_eq!(
            drafts[0].description.as_deref(),
            Some("especialistas en obras menores y ampliaciones")
        );
    }

    #[test]
    fn test_free_text_lines_before_first_heading_are_dropped() {
        let content = "Fono: 22345678\nACME CONSTRUCTORA LTDA\n9.876.543-3\n";
        let drafts = FreeTextParser::new().parse("listado.txt", content).unwrap();

        assert_eq!(drafts.len(), 1);
        // The stray phone belonged to nobody
        assert!(drafts[0].phone.is_none());
        assert_eq!(drafts[0].tax_id.as_deref(), Some("9.876.543-3"));
    }

    #[test]
    fn test_free_text_website_line() {
        let content = "ACME CONSTRUCTORA LTDA\nwww.acme.cl\n";
        let drafts = FreeTextParser::new().parse("listado.txt", content).unwrap();
        assert_eq!(drafts[0].website.as_deref(), Some("www.acme.cl"));
    }

    #[test]
    fn test_contact_person_shape() {
        assert_eq!(
            contact_person_candidate("Juan Pérez", None),
            Some("Juan Pérez".to_string())
        );
        assert_eq!(
            contact_person_candidate("Contacto: María Soto Rojas", None),
            Some("María Soto Rojas".to_string())
        );
        // Not the record's own name
        assert_eq!(contact_person_candidate("Acme Ltda", Some("ACME LTDA")), None);
        // All-caps runs and long phrases are not person shapes
        assert_eq!(contact_person_candidate("ACME LTDA", None), None);
        assert_eq!(contact_person_candidate("atiende de lunes a viernes", None), None);
    }

    // ------------------------------------------------------------------
    // Header-CSV adapter
    // ------------------------------------------------------------------

    #[test]
    fn test_header_csv_skips_header_and_maps_columns() {
        let content = "\
Nombre,Fono,Correo,Dirección,Sitio Web,Rubros,Descripción
Ferretería El Clavo,226544321,ventas@elclavo.cl,Calle Larga 120,www.elclavo.cl,Herramientas;Materiales,despacho a obra
";
        let drafts = HeaderCsvParser::new().parse("export.csv", content).unwrap();

        assert_eq!(drafts.len(), 1);
        let d = &drafts[0];
        assert_eq!(d.name.as_deref(), Some("Ferretería El Clavo"));
        assert_eq!(d.phone.as_deref(), Some("226544321"));
        assert_eq!(d.email.as_deref(), Some("ventas@elclavo.cl"));
        assert_eq!(d.address.as_deref(), Some("Calle Larga 120"));
        assert_eq!(d.website.as_deref(), Some("www.elclavo.cl"));
        assert_eq!(d.categories, vec!["Herramientas", "Materiales"]);
        assert_eq!(d.description.as_deref(), Some("despacho a obra"));
    }

    #[test]
    fn test_header_csv_without_header_row_keeps_first_row() {
        let content = "Ferretería El Clavo,226544321,,,,,\n";
        let drafts = HeaderCsvParser::new().parse("export.csv", content).unwrap();

        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].name.as_deref(), Some("Ferretería El Clavo"));
    }

    #[test]
    fn test_header_csv_missing_columns_default() {
        let content = "Nombre,Fono\nACME Constructora,22345678\n";
        let drafts = HeaderCsvParser::new().parse("export.csv", content).unwrap();

        assert_eq!(drafts.len(), 1);
        assert!(drafts[0].email.is_none());
        assert!(drafts[0].categories.is_empty()); // normalizer infers later
    }

    // ------------------------------------------------------------------
    // JSON adapter
    // ------------------------------------------------------------------

    #[test]
    fn test_json_spanish_keys() {
        let content = r#"[{
            "nombre": "ACME CONSTRUCTORA LTDA",
            "rut": "12.345.678-5",
            "telefono": "22345678",
            "correo": "contacto@acme.cl",
            "direccion": "Av. Siempre Viva 742",
            "rubros": ["Construcción"]
        }]"#;
        let drafts = JsonParser::new().parse("proveedores.json", content).unwrap();

        assert_eq!(drafts.len(), 1);
        let d = &drafts[0];
        assert_eq!(d.name.as_deref(), Some("ACME CONSTRUCTORA LTDA"));
        assert_eq!(d.tax_id.as_deref(), Some("12.345.678-5"));
        assert_eq!(d.phone.as_deref(), Some("22345678"));
        assert_eq!(d.email.as_deref(), Some("contacto@acme.cl"));
        assert_eq!(d.categories, vec!["Construcción"]);
    }

    #[test]
    fn test_json_english_keys_and_name_parts() {
        let content = r#"[{
            "firstName": "JUAN",
            "lastName": "PEREZ",
            "secondLastName": "GOMEZ",
            "taxId": "12.345.678-5",
            "phone": "22345678",
            "categories": "Servicios;Transporte"
        }]"#;
        let drafts = JsonParser::new().parse("providers.json", content).unwrap();

        assert_eq!(drafts.len(), 1);
        let d = &drafts[0];
        assert_eq!(d.first_name.as_deref(), Some("JUAN"));
        assert_eq!(d.second_last_name.as_deref(), Some("GOMEZ"));
        assert_eq!(d.categories, vec!["Servicios", "Transporte"]);
    }

    #[test]
    fn test_json_rejects_non_array_payload() {
        let content = r#"{"nombre": "ACME"}"#;
        let result = JsonParser::new().parse("proveedores.json", content);
        assert!(result.is_err());
    }

    #[test]
    fn test_json_tolerates_stray_scalars_in_array() {
        let content = r#"[{"nombre": "ACME LTDA"}, 42, "ruido"]"#;
        let drafts = JsonParser::new().parse("proveedores.json", content).unwrap();
        assert_eq!(drafts.len(), 1);
    }
}
