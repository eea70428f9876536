// ✅ Data Quality - Record-level validation before anything is committed
// Issues are reported, never enforced: a record missing a name or a contact
// field is still emitted, flagged so a human reviewer can decide.

use serde::{Deserialize, Serialize};

use crate::classifier::{is_valid_tax_id, tax_id_check_digit_ok};
use crate::record::ProviderRecord;

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub rule_name: String,
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationResult {
    pub fn pass(rule_name: &str, field: &str, message: &str) -> Self {
        ValidationResult {
            passed: true,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            severity: Severity::Info,
        }
    }

    pub fn fail(rule_name: &str, field: &str, message: &str, severity: Severity) -> Self {
        ValidationResult {
            passed: false,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            severity,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// An invariant of the record shape is broken
    Critical,
    /// Data is questionable or incomplete; needs a human decision
    Warning,
    /// Data is valid but could be improved
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    pub field: String,
    pub issue: String,
    pub recommendation: String,
}

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub record_id: String,
    pub full_name: String,
    pub validations: Vec<ValidationResult>,
    pub issues: Vec<QualityIssue>,
    pub passed_count: usize,
    pub failed_count: usize,
    pub needs_review: bool,
}

impl QualityReport {
    pub fn summary(&self) -> String {
        format!(
            "{}: {}/{} checks passed, {} issues",
            self.full_name,
            self.passed_count,
            self.passed_count + self.failed_count,
            self.issues.len()
        )
    }

    pub fn has_critical_issues(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Critical)
    }
}

// ============================================================================
// QUALITY ENGINE
// ============================================================================

pub struct DataQualityEngine;

impl DataQualityEngine {
    pub fn new() -> Self {
        DataQualityEngine
    }

    /// Validate one normalized record and generate its quality report.
    pub fn validate(&self, record: &ProviderRecord) -> QualityReport {
        let mut validations = Vec::new();
        let mut issues = Vec::new();

        let mut check = |result: ValidationResult, recommendation: &str| {
            if !result.passed {
                issues.push(QualityIssue {
                    severity: result.severity,
                    field: result.field.clone(),
                    issue: result.message.clone(),
                    recommendation: recommendation.to_string(),
                });
            }
            validations.push(result);
        };

        // Rule 1: record carries a real name
        if record.has_real_name() {
            check(
                ValidationResult::pass("name_present", "fullName", "Name present"),
                "",
            );
        } else {
            check(
                ValidationResult::fail(
                    "name_present",
                    "fullName",
                    "Record has no usable name",
                    Severity::Warning,
                ),
                "Complete the provider name before committing",
            );
        }

        // Rule 2: tax id shape and check digit (absent is only informational)
        if record.tax_id.is_empty() {
            check(
                ValidationResult::fail(
                    "tax_id_present",
                    "taxId",
                    "No tax ID; the name acts as the identity key",
                    Severity::Info,
                ),
                "Add the RUT to strengthen deduplication",
            );
        } else if !is_valid_tax_id(&record.tax_id) {
            check(
                ValidationResult::fail(
                    "tax_id_shape",
                    "taxId",
                    "Tax ID does not match the national shape",
                    Severity::Warning,
                ),
                "Expected NN.NNN.NNN-D with check digit",
            );
        } else if !tax_id_check_digit_ok(&record.tax_id) {
            check(
                ValidationResult::fail(
                    "tax_id_check_digit",
                    "taxId",
                    "Tax ID check digit does not verify",
                    Severity::Warning,
                ),
                "Confirm the RUT against the source document",
            );
        } else {
            check(
                ValidationResult::pass("tax_id_valid", "taxId", "Tax ID verifies"),
                "",
            );
        }

        // Rule 3: at least one way to reach the provider
        if record.has_contact_info() {
            check(
                ValidationResult::pass("contact_present", "contact", "Contact information present"),
                "",
            );
        } else {
            check(
                ValidationResult::fail(
                    "contact_present",
                    "contact",
                    "No phone, email or address",
                    Severity::Warning,
                ),
                "Add at least one contact channel",
            );
        }

        // Rule 4: categories invariant (the normalizer guarantees >= 1)
        if record.categories.is_empty() {
            check(
                ValidationResult::fail(
                    "categories_nonempty",
                    "categories",
                    "Record has no categories",
                    Severity::Critical,
                ),
                "Re-normalize the record",
            );
        } else {
            check(
                ValidationResult::pass("categories_nonempty", "categories", "Categories present"),
                "",
            );
        }

        // Rule 5: provenance for the audit trail
        if record.source_file.is_empty() {
            check(
                ValidationResult::fail(
                    "provenance_present",
                    "sourceFile",
                    "Record has no source file",
                    Severity::Info,
                ),
                "Keep source provenance for auditability",
            );
        } else {
            check(
                ValidationResult::pass("provenance_present", "sourceFile", "Provenance present"),
                "",
            );
        }

        let passed_count = validations.iter().filter(|v| v.passed).count();
        let failed_count = validations.len() - passed_count;
        let needs_review = issues.iter().any(|i| i.severity != Severity::Info);

        QualityReport {
            record_id: record.id.clone(),
            full_name: record.full_name.clone(),
            validations,
            issues,
            passed_count,
            failed_count,
            needs_review,
        }
    }

    /// Batch validate multiple records
    pub fn validate_batch(&self, records: &[ProviderRecord]) -> Vec<QualityReport> {
        records.iter().map(|r| self.validate(r)).collect()
    }

    /// Generate summary statistics for batch validation
    pub fn batch_summary(&self, reports: &[QualityReport]) -> BatchSummary {
        BatchSummary {
            total: reports.len(),
            clean: reports.iter().filter(|r| r.issues.is_empty()).count(),
            needs_review: reports.iter().filter(|r| r.needs_review).count(),
            with_critical: reports.iter().filter(|r| r.has_critical_issues()).count(),
        }
    }
}

impl Default for DataQualityEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub clean: usize,
    pub needs_review: usize,
    pub with_critical: usize,
}

// ============================================================================
// TESTS
// ============================================================================
