//! Temporal event labels.
//!
//! Events come in two levels:
//!
//! - [`DetectedEvent`]: what happens in a single frame. Every field is
//!   optional, so the same type serves as a standalone frame label and as
//!   a per-frame entry stored inside a video event.
//! - [`VideoEvent`]: an event spanning time, with event-level attributes,
//!   temporal objects, sparse per-frame detections and uuid references to
//!   child objects and child events.
//!
//! [`EventSchema`] and [`EventContainerSchema`] describe which labels,
//! attributes and objects are allowed, and can be grown from data
//! (`build_active_schema`), validated against, merged and compared.
//! [`VideoEventFrameRenderer`] projects a video event onto frames, and
//! [`LabelGraph`] resolves child references.

mod detected;
mod graph;
mod registry;
mod render;
mod schema;
mod video;

pub use detected::{DetectedEvent, DetectedEventContainer, DETECTED_EVENT_TYPE};
pub use graph::{DanglingChild, LabelGraph};
pub use registry::{EventConstructor, EventTypeRegistry};
pub use render::{VideoEventContainerFrameRenderer, VideoEventFrameRenderer};
pub use schema::{EventContainerSchema, EventSchema};
pub use video::{VideoEvent, VideoEventContainer, VIDEO_EVENT_TYPE};

/// A borrowed event of either level.
#[derive(Clone, Copy, Debug)]
pub enum EventRef<'a> {
    Detected(&'a DetectedEvent),
    Video(&'a VideoEvent),
}

impl<'a> EventRef<'a> {
    pub fn label(&self) -> Option<&'a str> {
        match self {
            EventRef::Detected(event) => event.label.as_deref(),
            EventRef::Video(event) => event.label.as_deref(),
        }
    }
}

impl<'a> From<&'a DetectedEvent> for EventRef<'a> {
    fn from(event: &'a DetectedEvent) -> Self {
        EventRef::Detected(event)
    }
}

impl<'a> From<&'a VideoEvent> for EventRef<'a> {
    fn from(event: &'a VideoEvent) -> Self {
        EventRef::Video(event)
    }
}
