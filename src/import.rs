// 🚚 Import Orchestrator - Source units in, deduplicated records out
// Units are processed sequentially (dedup is order-dependent: first file
// wins) with a fresh accumulator per unit. Per-unit failures become entries
// in the errors list; they never abort the remaining units.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::deduplication::dedupe;
use crate::normalizer::normalize;
use crate::parser::{detect_format, get_parser, parse_json_array, SourceFormat};
use crate::record::ProviderRecord;

// ============================================================================
// SOURCES
// ============================================================================

/// One source unit submitted for import.
#[derive(Debug, Clone)]
pub enum ImportSource {
    /// A file on disk; format detected from name and content.
    File(PathBuf),

    /// A pasted blob with a declared format.
    Blob {
        name: String,
        format: SourceFormat,
        content: String,
    },

    /// An already-decoded structured payload.
    Json { name: String, value: Value },
}

impl ImportSource {
    /// Display name used in error entries and provenance.
    pub fn name(&self) -> String {
        match self {
            ImportSource::File(path) => path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("unknown")
                .to_string(),
            ImportSource::Blob { name, .. } => name.clone(),
            ImportSource::Json { name, .. } => name.clone(),
        }
    }
}

// ============================================================================
// REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportMetadata {
    pub total_sources: usize,
    pub processed_sources: usize,
    pub total_records_before_dedup: usize,
    pub unique_records: usize,
    pub duplicates_removed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// False only when sources were submitted and none could be processed.
    /// An import that ran but yielded zero records is still a success.
    pub success: bool,
    pub data: Vec<ProviderRecord>,
    pub metadata: ImportMetadata,
    pub errors: Vec<String>,
}

/// The one abort case: the overall payload is not a collection of the
/// expected shape, so there is no meaningful unit to salvage.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid import payload: {0}")]
    InvalidPayload(String),
}

// ============================================================================
// ORCHESTRATION
// ============================================================================

/// Import a batch of source units: adapter → accumulator → normalizer per
/// unit, then one dedup pass over the full concatenation.
pub fn import_providers(sources: &[ImportSource]) -> ImportReport {
    let mut all_records = Vec::new();
    let mut errors = Vec::new();
    let mut processed_sources = 0;

    for source in sources {
        // Narrowest scope: one failed unit is one error entry
        match import_one(source) {
            Ok(mut records) => {
                processed_sources += 1;
                all_records.append(&mut records);
            }
            Err(err) => errors.push(format!("{}: {:#}", source.name(), err)),
        }
    }

    let total_records_before_dedup = all_records.len();
    let result = dedupe(all_records);

    ImportReport {
        success: processed_sources > 0 || sources.is_empty(),
        metadata: ImportMetadata {
            total_sources: sources.len(),
            processed_sources,
            total_records_before_dedup,
            unique_records: result.kept.len(),
            duplicates_removed: result.duplicates_removed,
        },
        data: result.kept,
        errors,
    }
}

fn import_one(source: &ImportSource) -> Result<Vec<ProviderRecord>> {
    let drafts = match source {
        ImportSource::File(path) => {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read source file: {}", path.display()))?;
            let name = source.name();
            let format = detect_format(&name, &content);
            get_parser(format).parse(&name, &content)?
        }
        ImportSource::Blob {
            name,
            format,
            content,
        } => get_parser(*format).parse(name, content)?,
        ImportSource::Json { name, value } => parse_json_array(name, value)?,
    };

    Ok(drafts.into_iter().map(normalize).collect())
}

/// Import every regular file of a directory, in name order (the order
/// decides which duplicate survives). Errors when the directory itself is
/// missing: that is "the operation could not run", not a per-unit failure.
pub fn import_directory(dir: &Path) -> Result<ImportReport> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Source directory not found: {}", dir.display()))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();

    let sources: Vec<ImportSource> = paths.into_iter().map(ImportSource::File).collect();
    Ok(import_providers(&sources))
}

// ============================================================================
// WIRE PAYLOAD
// ============================================================================

/// Turn a decoded request body into source units.
///
/// Accepted shapes: `{ "sources": [ {name, format?, content} ] }` or the
/// bare array. `content` is either a string blob or a structured array.
/// Anything else aborts with [`ImportError::InvalidPayload`].
pub fn sources_from_payload(payload: &Value) -> Result<Vec<ImportSource>, ImportError> {
    let items = payload
        .get("sources")
        .and_then(|s| s.as_array())
        .or_else(|| payload.as_array())
        .ok_or_else(|| {
            ImportError::InvalidPayload("expected an array of sources".to_string())
        })?;

    let mut sources = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        let obj = item.as_object().ok_or_else(|| {
            ImportError::InvalidPayload(format!("source #{} is not an object", idx + 1))
        })?;

        let name = obj
            .get("name")
            .and_then(|n| n.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| format!("source-{}", idx + 1));

        match obj.get("content") {
            Some(Value::String(content)) => {
                let format = obj
                    .get("format")
                    .and_then(|f| f.as_str())
                    .and_then(SourceFormat::from_code)
                    .unwrap_or_else(|| detect_format(&name, content));
                sources.push(ImportSource::Blob {
                    name,
                    format,
                    content: content.clone(),
                });
            }
            Some(value @ Value::Array(_)) => sources.push(ImportSource::Json {
                name,
                value: value.clone(),
            }),
            _ => {
                return Err(ImportError::InvalidPayload(format!(
                    "source \"{}\" has no usable content",
                    name
                )))
            }
        }
    }

    Ok(sources)
}

// ============================================================================
// SEARCH
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub providers: Vec<ProviderRecord>,
    pub total_matches: usize,
}

/// Case-insensitive substring search across name, tax ID and profession.
/// Returns at most `limit` records plus the total match count.
pub fn search_providers(records: &[ProviderRecord], query: &str, limit: usize) -> SearchResult {
    let query = query.trim().to_lowercase();

    let matches: Vec<&ProviderRecord> = records
        .iter()
        .filter(|r| {
            r.full_name.to_lowercase().contains(&query)
                || r.tax_id.to_lowercase().contains(&query)
                || r.profession.to_lowercase().contains(&query)
        })
        .collect();

    let total_matches = matches.len();
    SearchResult {
        providers: matches.into_iter().take(limit).cloned().collect(),
        total_matches,
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(name: &str, format: SourceFormat, content: &str) -> ImportSource {
        ImportSource::Blob {
            name: name.to_string(),
            format,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_free_text_scenario_end_to_end() {
        let content = "ACME CONSTRUCTORA LTDA\n12.345.678-5\nFono: 22345678\ncontacto@acme.cl\nAv. Siempre Viva 742";
        let report = import_providers(&[blob("listado.txt", SourceFormat::FreeText, content)]);

        assert!(report.success);
        assert_eq!(report.data.len(), 1);

        let record = &report.data[0];
        assert!(record.full_name.contains("ACME CONSTRUCTORA LTDA"));
        assert_eq!(record.tax_id, "12.345.678-5");
        assert!(!record.phone.is_empty());
        assert_eq!(record.email, "contacto@acme.cl");
        assert!(record.address.contains("Av. Siempre Viva 742"));
        assert_eq!(record.categories, vec!["Construcción"]);
        assert_eq!(record.source_file, "listado.txt");
        assert_eq!(record.source_format, "freetext");
    }

    #[test]
    fn test_partial_batch_resilience() {
        let sources = vec![
            blob(
                "unidad1.txt",
                SourceFormat::FreeText,
                "ACME CONSTRUCTORA LTDA\n12.345.678-5",
            ),
            // Corrupt unit: declared JSON but not decodable
            blob("unidad2.json", SourceFormat::Json, "{{{ no es json"),
            blob(
                "unidad3.txt",
                SourceFormat::FreeText,
                "TRANSPORTES DEL MAIPO LIMITADA\n9.876.543-3",
            ),
        ];

        let report = import_providers(&sources);

        assert!(report.success);
        assert_eq!(report.data.len(), 2);
        assert_eq!(report.metadata.total_sources, 3);
        assert_eq!(report.metadata.processed_sources, 2);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("unidad2.json"));
    }

    #[test]
    fn test_dedup_across_sources_first_file_wins() {
        let sources = vec![
            blob(
                "a.txt",
                SourceFormat::FreeText,
                "ACME CONSTRUCTORA LTDA\n12.345.678-5",
            ),
            blob("b.txt", SourceFormat::FreeText, "ACME SPA\n12.345.678-5"),
        ];

        let report = import_providers(&sources);

        assert_eq!(report.metadata.total_records_before_dedup, 2);
        assert_eq!(report.metadata.unique_records, 1);
        assert_eq!(report.metadata.duplicates_removed, 1);
        assert_eq!(report.data[0].full_name, "ACME CONSTRUCTORA LTDA");
        assert_eq!(report.data[0].source_file, "a.txt");
    }

    #[test]
    fn test_zero_records_is_still_success() {
        let report = import_providers(&[blob("vacio.txt", SourceFormat::FreeText, "\n\n")]);

        assert!(report.success);
        assert!(report.data.is_empty());
        assert_eq!(report.metadata.processed_sources, 1);
    }

    #[test]
    fn test_all_units_failing_is_not_success() {
        let report = import_providers(&[blob("roto.json", SourceFormat::Json, "not json")]);

        assert!(!report.success);
        assert_eq!(report.metadata.processed_sources, 0);
        assert_eq!(report.errors.len(), 1);
    }

    #[test]
    fn test_import_directory_missing_dir_errors() {
        let result = import_directory(Path::new("/no/existe/proveedores"));
        assert!(result.is_err());
    }

    #[test]
    fn test_import_file_sources() {
        let dir = std::env::temp_dir().join(format!("provider_import_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let file_a = dir.join("a_padron.csv");
        fs::write(&file_a, "1,JUAN,PEREZ,GOMEZ\n12.345.678-5,INGENIERO,2024-01-10,\n").unwrap();
        let file_b = dir.join("b_export.csv");
        fs::write(
            &file_b,
            "Nombre,Fono,Correo\nFerretería El Clavo,226544321,ventas@elclavo.cl\n",
        )
        .unwrap();

        let report = import_directory(&dir).unwrap();

        assert!(report.success);
        assert_eq!(report.metadata.processed_sources, 2);
        assert_eq!(report.data.len(), 2);
        assert_eq!(report.data[0].full_name, "JUAN PEREZ GOMEZ");
        assert_eq!(report.data[0].profession, "INGENIERO");
        assert_eq!(report.data[1].full_name, "Ferretería El Clavo");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_sources_from_payload() {
        let payload = serde_json::json!({
            "sources": [
                { "name": "pegado.txt", "format": "freetext", "content": "ACME LTDA\n12.345.678-5" },
                { "name": "directo.json", "content": [ { "nombre": "SODIMAC SA" } ] }
            ]
        });

        let sources = sources_from_payload(&payload).unwrap();
        assert_eq!(sources.len(), 2);

        let report = import_providers(&sources);
        assert_eq!(report.data.len(), 2);
    }

    #[test]
    fn test_payload_of_wrong_shape_aborts() {
        let payload = serde_json::json!({ "proveedores": "no" });
        let err = sources_from_payload(&payload).unwrap_err();
        assert!(matches!(err, ImportError::InvalidPayload(_)));

        let payload = serde_json::json!({ "sources": [ { "name": "x" } ] });
        assert!(sources_from_payload(&payload).is_err());
    }

    #[test]
    fn test_search_providers() {
        let report = import_providers(&[
            blob("a.txt", SourceFormat::FreeText, "ACME CONSTRUCTORA LTDA\n12.345.678-5"),
            blob("b.txt", SourceFormat::FreeText, "TRANSPORTES DEL MAIPO LIMITADA"),
            blob("c.txt", SourceFormat::FreeText, "FERRETERIA ACME DOS LIMITADA"),
        ]);

        let by_name = search_providers(&report.data, "acme", 10);
        assert_eq!(by_name.total_matches, 2);
        assert_eq!(by_name.providers.len(), 2);

        let by_tax = search_providers(&report.data, "12.345", 10);
        assert_eq!(by_tax.total_matches, 1);

        // Limit caps the rows but not the count
        let limited = search_providers(&report.data, "", 2);
        assert_eq!(limited.providers.len(), 2);
        assert_eq!(limited.total_matches, 3);
    }
}
