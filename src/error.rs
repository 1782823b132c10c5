use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

use crate::validation::ValidationReport;

/// A label, attribute or object that does not comply with a schema.
///
/// Every variant names the offending label or attribute so that callers can
/// report it without re-inspecting the data.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SchemaError {
    #[error("label {found:?} does not match schema label {expected:?}")]
    LabelMismatch {
        expected: Option<String>,
        found: Option<String>,
    },

    #[error("None label is not allowed by the schema (expected {expected:?})")]
    NoneLabelNotAllowed { expected: Option<String> },

    #[error("event label {0:?} is not allowed by the schema")]
    UnknownEventLabel(Option<String>),

    #[error("object label {0:?} is not allowed by the schema")]
    UnknownObjectLabel(Option<String>),

    #[error("attribute '{0}' is not allowed by the schema")]
    UnknownAttribute(String),

    #[error("attribute '{name}' has kind {found} but the schema expects {expected}")]
    AttributeKindMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("value {value} of attribute '{name}' is not allowed by the schema")]
    InvalidAttributeValue { name: String, value: String },

    #[error("numeric attribute '{name}' has non-finite value {value}")]
    NonFiniteAttributeValue { name: String, value: f64 },

    #[error("schema for '{name}' is not a subset: {reason}")]
    NotSubset { name: String, reason: String },
}

/// A missing identity that an operation requires before it can run.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("{kind} must have its `uuid` set")]
    MissingUuid { kind: &'static str },

    #[error("either a frame number must be provided or the {kind} must have its `frame_number` set")]
    MissingFrameNumber { kind: &'static str },

    #[error("uuid {0} is already present in the label graph")]
    DuplicateUuid(Uuid),
}

/// Failure to turn a dictionary back into a label.
#[derive(Debug, Error)]
pub enum SerialError {
    #[error("invalid label dictionary: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown event type '{0}'")]
    UnknownType(String),
}

/// The top-level error type for the eventlabel CLI.
#[derive(Debug, Error)]
pub enum EventlabelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse labels JSON from {path}: {source}")]
    JsonParse {
        path: PathBuf,
        #[source]
        source: SerialError,
    },

    #[error("Failed to write labels JSON: {0}")]
    JsonWrite(#[source] serde_json::Error),

    #[error("Schema violation: {0}")]
    Schema(#[from] SchemaError),

    #[error("Precondition violation: {0}")]
    Precondition(#[from] PreconditionError),

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },
}
