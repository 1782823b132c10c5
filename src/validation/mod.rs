//! Batch validation of video events.
//!
//! Unlike the schema `validate_*` methods, which stop at the first
//! violation, this module walks a whole container and collects every
//! problem it finds:
//! - Schema compliance (event labels, event/frame attributes, objects)
//! - Geometric validity (finite, ordered bounding boxes; consistent masks)
//! - Graph integrity (dangling child references) and empty supports
//! - Confidences outside `[0, 1]`

mod report;

pub use report::{IssueCode, IssueContext, Severity, ValidationIssue, ValidationReport};

use crate::events::{
    DanglingChild, DetectedEvent, EventContainerSchema, EventSchema, LabelGraph, VideoEvent,
    VideoEventContainer,
};
use crate::geometry::{BoundingBox, Mask};
use crate::labels::HasLabelsSupport;

/// Options for validation behavior.
#[derive(Clone, Debug, Default)]
pub struct ValidateOptions {
    /// If true, treat warnings as errors.
    pub strict: bool,
}

/// Validates every event of the container and returns a report of all
/// issues found.
///
/// Events whose label the schema does not know are reported once and not
/// checked further against the schema; their geometry and children are
/// still checked.
pub fn validate_events(
    events: &VideoEventContainer,
    schema: &EventContainerSchema,
    graph: &LabelGraph,
    _opts: &ValidateOptions,
) -> ValidationReport {
    let mut report = ValidationReport::new();

    for (index, event) in events.iter().enumerate() {
        let context = IssueContext::Event {
            index,
            label: event.label.clone(),
        };

        match schema.get_event_schema(event.label.as_deref()) {
            Ok(event_schema) => {
                validate_against_schema(index, event, event_schema, &context, &mut report)
            }
            Err(e) => report.add(ValidationIssue::error(
                IssueCode::UnknownEventLabel,
                e.to_string(),
                context.clone(),
            )),
        }

        validate_confidence("Event", event.confidence, &context, &mut report);
        for obj in event.iter_video_objects() {
            validate_confidence("Object", obj.confidence, &context, &mut report);
        }

        for (frame_number, devent) in &event.frames {
            let frame = IssueContext::Frame {
                event: index,
                frame_number: *frame_number,
            };
            validate_geometry(devent, &frame, &mut report);
            validate_confidence("Detection", devent.confidence, &frame, &mut report);
            for obj in &devent.objects {
                validate_confidence("Object", obj.confidence, &frame, &mut report);
            }
        }

        for child in graph.dangling_children(event) {
            let (code, message) = match child {
                DanglingChild::Object(uuid) => (
                    IssueCode::DanglingChildObject,
                    format!("Child object {} is not in the label graph", uuid),
                ),
                DanglingChild::Event(uuid) => (
                    IssueCode::DanglingChildEvent,
                    format!("Child event {} is not in the label graph", uuid),
                ),
            };
            report.add(ValidationIssue::warning(code, message, context.clone()));
        }

        if event.support().is_empty() {
            report.add(ValidationIssue::warning(
                IssueCode::EmptySupport,
                "Event covers no frames",
                context,
            ));
        }
    }

    tracing::debug!(
        events = events.len(),
        errors = report.error_count(),
        warnings = report.warning_count(),
        "validated events"
    );
    report
}

/// Reports every schema violation of an event whose label is known.
fn validate_against_schema(
    index: usize,
    event: &VideoEvent,
    schema: &EventSchema,
    context: &IssueContext,
    report: &mut ValidationReport,
) {
    for attr in &event.attrs {
        if let Err(e) = schema.validate_event_attribute(attr) {
            report.add(ValidationIssue::error(
                IssueCode::EventAttributeViolation,
                e.to_string(),
                context.clone(),
            ));
        }
    }

    for obj in event.iter_video_objects() {
        if let Err(e) = schema.validate_object(obj) {
            report.add(ValidationIssue::error(
                IssueCode::ObjectViolation,
                e.to_string(),
                context.clone(),
            ));
        }
    }

    for (frame_number, devent) in &event.frames {
        let frame = IssueContext::Frame {
            event: index,
            frame_number: *frame_number,
        };
        for attr in &devent.attrs {
            if let Err(e) = schema.validate_frame_attribute(attr) {
                report.add(ValidationIssue::error(
                    IssueCode::FrameAttributeViolation,
                    e.to_string(),
                    frame.clone(),
                ));
            }
        }
        for obj in &devent.objects {
            if let Err(e) = schema.validate_object(obj) {
                report.add(ValidationIssue::error(
                    IssueCode::ObjectViolation,
                    e.to_string(),
                    frame.clone(),
                ));
            }
        }
    }
}

/// Checks the bounding boxes and mask of a detection and of its objects.
fn validate_geometry(devent: &DetectedEvent, context: &IssueContext, report: &mut ValidationReport) {
    if let Some(bbox) = &devent.bounding_box {
        validate_bbox("Event", bbox, context, report);
    }
    if let Some(mask) = &devent.mask {
        validate_mask(mask, context, report);
    }
    for obj in &devent.objects {
        if let Some(bbox) = &obj.bounding_box {
            validate_bbox("Object", bbox, context, report);
        }
    }
}

fn validate_bbox(
    owner: &str,
    bbox: &BoundingBox,
    context: &IssueContext,
    report: &mut ValidationReport,
) {
    // Skip the ordering check if coordinates are invalid
    if !bbox.is_finite() {
        report.add(ValidationIssue::error(
            IssueCode::BBoxNotFinite,
            format!("{} bounding box has non-finite coordinates {:?}", owner, bbox),
            context.clone(),
        ));
        return;
    }

    if !bbox.is_ordered() {
        report.add(ValidationIssue::error(
            IssueCode::InvalidBBoxOrdering,
            format!(
                "{} bounding box top-left ({}, {}) should be <= bottom-right ({}, {})",
                owner,
                bbox.top_left.x,
                bbox.top_left.y,
                bbox.bottom_right.x,
                bbox.bottom_right.y
            ),
            context.clone(),
        ));
    }
}

fn validate_confidence(
    owner: &str,
    confidence: Option<f64>,
    context: &IssueContext,
    report: &mut ValidationReport,
) {
    match confidence {
        Some(c) if !(0.0..=1.0).contains(&c) => report.add(ValidationIssue::warning(
            IssueCode::ConfidenceOutOfRange,
            format!("{} confidence {} is outside [0, 1]", owner, c),
            context.clone(),
        )),
        _ => {}
    }
}

fn validate_mask(mask: &Mask, context: &IssueContext, report: &mut ValidationReport) {
    if !mask.is_consistent() {
        report.add(ValidationIssue::error(
            IssueCode::MaskShapeMismatch,
            format!(
                "Mask of {}x{} has {} values",
                mask.height,
                mask.width,
                mask.data.len()
            ),
            context.clone(),
        ));
    }
}
