//! Error taxonomy for AttriSense.
//!
//! Fatal configuration problems, caller-side validation failures and
//! per-request inference failures each get their own type. Provider failures
//! are never errors at this level; they resolve to the fallback
//! recommendation (see `recommend`).

use std::path::PathBuf;
use thiserror::Error;

/// Startup-only failures. The process must not accept requests after one.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Model artifact not found at {}", .0.display())]
    ArtifactMissing(PathBuf),

    #[error("Failed to read model artifact {}: {source}", .path.display())]
    ArtifactUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Model artifact is corrupt: {0}")]
    ArtifactCorrupt(#[from] serde_json::Error),

    #[error("Model schema version {found} does not match feature contract {expected}")]
    SchemaVersion { expected: u32, found: u32 },

    #[error("Model feature names do not match the feature contract: {0}")]
    FeatureMismatch(String),

    #[error("Model categories for {field} do not match: expected {expected:?}, found {found:?}")]
    CategoryMismatch {
        field: &'static str,
        expected: Vec<String>,
        found: Vec<String>,
    },

    #[error("Invalid model parameter: {0}")]
    InvalidParameter(String),
}

/// A raw input field that violates the feature contract.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field {field} expects {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Field {field} value {value} is outside {min}..={}", .max.map(|m| m.to_string()).unwrap_or_else(|| "inf".to_string()))]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: Option<i64>,
    },

    #[error("Field {field} has unknown category '{value}'")]
    UnknownCategory { field: &'static str, value: String },
}

/// Every contract violation found in one input set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} invalid field(s): {}", .0.len(), join_errors(.0))]
pub struct ValidationReport(pub Vec<ValidationError>);

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure inside a single predict call. Aborts that request only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InferenceError {
    #[error("Feature record schema {found} does not match model schema {expected}")]
    SchemaMismatch { expected: u32, found: u32 },

    #[error("Feature {0} missing from record")]
    MissingFeature(String),

    #[error("Encoder has no category '{value}' for {field}")]
    UnknownCategory { field: String, value: String },

    #[error("Classifier produced a non-finite score")]
    NonFiniteScore,

    #[error("Classifier probability {0} is outside [0, 1]")]
    ProbabilityOutOfRange(f64),

    #[error("Classifier failed: {0}")]
    Classifier(String),
}

/// Umbrella error for one orchestrated request or startup.
#[derive(Error, Debug)]
pub enum AttriSenseError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[from] ConfigurationError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationReport),

    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),
}

impl AttriSenseError {
    /// Process exit code family for the command-line front end.
    pub fn code(&self) -> i32 {
        match self {
            AttriSenseError::Validation(_) => 2,
            AttriSenseError::ModelUnavailable(_) => 3,
            AttriSenseError::Inference(_) => 4,
        }
    }
}

impl From<ValidationError> for ValidationReport {
    fn from(error: ValidationError) -> Self {
        ValidationReport(vec![error])
    }
}

impl From<ValidationError> for AttriSenseError {
    fn from(error: ValidationError) -> Self {
        AttriSenseError::Validation(error.into())
    }
}
