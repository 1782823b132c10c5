//! Objects that events contain.
//!
//! Objects follow the same two-level model as events: a [`DetectedObject`]
//! is a single-frame observation, a [`VideoObject`] spans time and owns its
//! per-frame detections. Events consume these types structurally (adding,
//! filtering, validating and rendering them) without depending on their
//! internals.

mod detected;
mod schema;
mod video;

pub use detected::{DetectedObject, DetectedObjectContainer};
pub use schema::{ObjectContainerSchema, ObjectSchema};
pub use video::{
    VideoObject, VideoObjectContainer, VideoObjectContainerFrameRenderer,
    VideoObjectFrameRenderer,
};

/// A borrowed object of either level.
#[derive(Clone, Copy, Debug)]
pub enum ObjectRef<'a> {
    Detected(&'a DetectedObject),
    Video(&'a VideoObject),
}

impl<'a> ObjectRef<'a> {
    pub fn label(&self) -> Option<&'a str> {
        match self {
            ObjectRef::Detected(obj) => obj.label.as_deref(),
            ObjectRef::Video(obj) => obj.label.as_deref(),
        }
    }
}

impl<'a> From<&'a DetectedObject> for ObjectRef<'a> {
    fn from(obj: &'a DetectedObject) -> Self {
        ObjectRef::Detected(obj)
    }
}

impl<'a> From<&'a VideoObject> for ObjectRef<'a> {
    fn from(obj: &'a VideoObject) -> Self {
        ObjectRef::Video(obj)
    }
}

/// An owned object of either level.
#[derive(Clone, Debug, PartialEq)]
pub enum Object {
    Detected(DetectedObject),
    Video(VideoObject),
}

impl From<DetectedObject> for Object {
    fn from(obj: DetectedObject) -> Self {
        Object::Detected(obj)
    }
}

impl From<VideoObject> for Object {
    fn from(obj: VideoObject) -> Self {
        Object::Video(obj)
    }
}

/// An owned container of objects of either level.
#[derive(Clone, Debug, PartialEq)]
pub enum Objects {
    Detected(DetectedObjectContainer),
    Video(VideoObjectContainer),
}

impl From<DetectedObjectContainer> for Objects {
    fn from(objects: DetectedObjectContainer) -> Self {
        Objects::Detected(objects)
    }
}

impl From<VideoObjectContainer> for Objects {
    fn from(objects: VideoObjectContainer) -> Self {
        Objects::Video(objects)
    }
}

/// Returns true if `label` passes an optional label restriction.
pub(crate) fn label_selected(label: Option<&str>, labels: Option<&[&str]>) -> bool {
    match labels {
        None => true,
        Some(labels) => label.is_some_and(|l| labels.contains(&l)),
    }
}
