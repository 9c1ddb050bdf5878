//! Error taxonomy emitted by the five-stage Validator.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Schema,
    BusinessRules,
    ReferentialIntegrity,
    UnitConsistency,
    MissingDataScan,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Schema => "schema",
            Stage::BusinessRules => "business_rules",
            Stage::ReferentialIntegrity => "referential_integrity",
            Stage::UnitConsistency => "unit_consistency",
            Stage::MissingDataScan => "missing_data_scan",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

/// One entry of the error taxonomy: a single offending cell or row
/// property found by one validation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFinding {
    pub source_row_number: i64,
    pub stage: Stage,
    pub field_path: String,
    pub error_code: String,
    pub message: String,
    pub raw_value: Option<String>,
    pub severity: Severity,
}

impl ValidationFinding {
    pub fn error(
        source_row_number: i64,
        stage: Stage,
        field_path: impl Into<String>,
        error_code: impl Into<String>,
        message: impl Into<String>,
        raw_value: Option<String>,
    ) -> Self {
        Self {
            source_row_number,
            stage,
            field_path: field_path.into(),
            error_code: error_code.into(),
            message: message.into(),
            raw_value,
            severity: Severity::Error,
        }
    }

    pub fn warning(
        source_row_number: i64,
        stage: Stage,
        field_path: impl Into<String>,
        error_code: impl Into<String>,
        message: impl Into<String>,
        raw_value: Option<String>,
    ) -> Self {
        Self {
            source_row_number,
            stage,
            field_path: field_path.into(),
            error_code: error_code.into(),
            message: message.into(),
            raw_value,
            severity: Severity::Warning,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }
}

/// Aggregate outcome of `Validator::validate`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub findings: Vec<ValidationFinding>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        !self.findings.iter().any(|f| f.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings.len() - self.error_count()
    }
}
