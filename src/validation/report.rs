//! Reports produced by batch validation.
//!
//! A report renders as text for the terminal and as JSON for `--output json`.

use serde::Serialize;
use std::fmt;

/// Every issue found while validating a container, in discovery order.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    fn count(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }

    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    /// No errors; warnings are allowed.
    pub fn is_ok(&self) -> bool {
        self.error_count() == 0
    }

    /// Neither errors nor warnings.
    pub fn is_ok_strict(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues.iter().any(|i| i.code == code)
    }

    /// The JSON form used by `--output json`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "error_count": self.error_count(),
            "warning_count": self.warning_count(),
            "issues": self.issues,
        })
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok_strict() {
            return writeln!(f, "Validation passed: no issues found");
        }
        writeln!(
            f,
            "Validation completed with {} error(s) and {} warning(s):\n",
            self.error_count(),
            self.warning_count()
        )?;
        self.issues
            .iter()
            .try_for_each(|issue| writeln!(f, "  {}", issue))
    }
}

/// A single validation issue (error or warning).
#[derive(Clone, Debug, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,

    /// A stable code for the issue type.
    pub code: IssueCode,

    pub message: String,

    /// Where the issue occurred.
    #[serde(serialize_with = "serialize_display")]
    pub context: IssueContext,
}

impl ValidationIssue {
    pub fn new(
        severity: Severity,
        code: IssueCode,
        message: impl Into<String>,
        context: IssueContext,
    ) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            context,
        }
    }

    pub fn error(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Error, code, message, context)
    }

    pub fn warning(code: IssueCode, message: impl Into<String>, context: IssueContext) -> Self {
        Self::new(Severity::Warning, code, message, context)
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "ERROR",
            Severity::Warning => "WARN ",
        };
        write!(
            f,
            "[{}] {:?} in {}: {}",
            severity, self.code, self.context, self.message
        )
    }
}

fn serialize_display<S: serde::Serializer>(
    value: &impl fmt::Display,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

/// The severity of a validation issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Suspicious but well-formed labels.
    Warning,
    /// Labels that violate the schema or are malformed.
    Error,
}

/// Machine-readable issue kind, serialized by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum IssueCode {
    // Schema issues
    /// An event has no label, or one the schema does not know.
    UnknownEventLabel,
    /// An event-level attribute is not allowed by the event's schema.
    EventAttributeViolation,
    /// A frame-level attribute is not allowed by the event's schema.
    FrameAttributeViolation,
    /// An object (temporal or per-frame) violates the event's schema.
    ObjectViolation,

    // Geometry issues
    /// A bounding box has non-finite coordinates (NaN or Infinity).
    BBoxNotFinite,
    /// A bounding box has incorrect ordering (top-left below or right of
    /// bottom-right).
    InvalidBBoxOrdering,
    /// A mask's data length does not match its dimensions.
    MaskShapeMismatch,

    // Graph issues
    /// A child object uuid does not resolve.
    DanglingChildObject,
    /// A child event uuid does not resolve.
    DanglingChildEvent,

    /// A video event covers no frames.
    EmptySupport,
    /// An event, detection or object confidence lies outside `[0, 1]`.
    ConfidenceOutOfRange,
}

/// Where in the container an issue was found.
#[derive(Clone, Debug)]
pub enum IssueContext {
    /// Issue with the event at a container position.
    Event { index: usize, label: Option<String> },
    /// Issue with a stored detection of an event.
    Frame { event: usize, frame_number: u64 },
}

impl fmt::Display for IssueContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueContext::Event {
                index,
                label: Some(label),
            } => write!(f, "event {} ('{}')", index, label),
            IssueContext::Event { index, label: None } => write!(f, "event {}", index),
            IssueContext::Frame {
                event,
                frame_number,
            } => write!(f, "event {} frame {}", event, frame_number),
        }
    }
}
