// Provider Import Engine - Core Library
// Exposes all modules for use in the CLI, API server, and tests

pub mod accumulator;
pub mod categories;
pub mod classifier;
pub mod data_quality;
pub mod deduplication;
pub mod import;
pub mod normalizer;
pub mod parser;
pub mod record;
pub mod store;

// Re-export commonly used types
pub use accumulator::{Accumulator, AccumulatorEvent};
pub use categories::{icon_for, infer_categories, CategoryFamily, CATEGORY_FAMILIES};
pub use classifier::{classify, is_valid_tax_id, FieldClass};
pub use data_quality::{
    BatchSummary, DataQualityEngine, QualityIssue, QualityReport, Severity, ValidationResult,
};
pub use deduplication::{dedup_key, dedupe, DedupResult};
pub use import::{
    import_directory, import_providers, search_providers, sources_from_payload, ImportError,
    ImportMetadata, ImportReport, ImportSource, SearchResult,
};
pub use normalizer::{normalize, normalize_at};
pub use parser::{
    detect_format, get_parser, parse_json_array, FixedColumnParser, FreeTextParser,
    HeaderCsvParser, JsonParser, ProviderParser, SourceFormat,
};
pub use record::{DraftField, DraftRecord, ProviderRecord, DEFAULT_CATEGORY, NO_NAME_PLACEHOLDER};
pub use store::{
    get_all_providers, insert_providers, open_database, search_stored, setup_database,
    verify_count,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
