use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

use super::detected::{DetectedEvent, DetectedEventContainer};
use super::registry::EventTypeRegistry;
use super::render::VideoEventFrameRenderer;
use super::schema::{EventContainerSchema, EventSchema};
use crate::attrs::{Attribute, AttributeContainer};
use crate::error::{PreconditionError, SchemaError, SerialError};
use crate::frames::FrameRanges;
use crate::labels::{sort_none_last, FrameRenderer, HasFramewiseView, HasLabelsSupport, Labels};
use crate::objects::{DetectedObject, Object, Objects, VideoObject, VideoObjectContainer};

/// Type tag written into the `type` field of serialized video events.
pub const VIDEO_EVENT_TYPE: &str = "eventlabel.events.VideoEvent";

fn default_video_event_type() -> String {
    VIDEO_EVENT_TYPE.to_string()
}

/// A spatiotemporal event in a video.
///
/// A `VideoEvent` holds time-invariant, event-level attributes and
/// spatiotemporal objects alongside a sparse map of per-frame
/// [`DetectedEvent`]s. Its identity (label, confidence, index) belongs to
/// the event as a whole; detections stored under it are unlabeled.
///
/// `child_objects` and `child_events` are weak references: uuids only,
/// resolved through a [`LabelGraph`](super::LabelGraph). The event never
/// owns the entities they name.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoEvent {
    #[serde(rename = "type", default = "default_video_event_type")]
    pub event_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Frozen support. When `None` the support is computed on demand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<FrameRanges>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,

    #[serde(default, skip_serializing_if = "AttributeContainer::is_empty")]
    pub attrs: AttributeContainer,

    #[serde(default, skip_serializing_if = "VideoObjectContainer::is_empty")]
    pub objects: VideoObjectContainer,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub frames: BTreeMap<u64, DetectedEvent>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub child_objects: BTreeSet<Uuid>,

    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub child_events: BTreeSet<Uuid>,
}

impl Default for VideoEvent {
    fn default() -> Self {
        Self {
            event_type: default_video_event_type(),
            label: None,
            confidence: None,
            support: None,
            index: None,
            uuid: None,
            attrs: AttributeContainer::new(),
            objects: VideoObjectContainer::new(),
            frames: BTreeMap::new(),
            child_objects: BTreeSet::new(),
            child_events: BTreeSet::new(),
        }
    }
}

impl VideoEvent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a simple contiguous event whose support is frozen to
    /// `first..=last`.
    pub fn build_simple(
        first: u64,
        last: u64,
        label: impl Into<String>,
        confidence: Option<f64>,
        index: Option<i64>,
        uuid: Option<Uuid>,
    ) -> Self {
        Self {
            label: Some(label.into()),
            confidence,
            support: Some(FrameRanges::build_simple(first, last)),
            index,
            uuid,
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }

    pub fn with_support(mut self, support: FrameRanges) -> Self {
        self.support = Some(support);
        self
    }

    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attrs.add(attr);
        self
    }

    /// Whether the event has event- or frame-level attributes.
    pub fn has_attributes(&self) -> bool {
        self.has_event_attributes() || self.has_frame_attributes()
    }

    pub fn has_event_attributes(&self) -> bool {
        !self.attrs.is_empty()
    }

    pub fn has_frame_attributes(&self) -> bool {
        self.iter_detections().any(DetectedEvent::has_attributes)
    }

    pub fn has_video_objects(&self) -> bool {
        !self.objects.is_empty()
    }

    pub fn has_detected_objects(&self) -> bool {
        self.iter_detections().any(DetectedEvent::has_objects)
    }

    pub fn has_child_objects(&self) -> bool {
        !self.child_objects.is_empty()
    }

    pub fn has_child_events(&self) -> bool {
        !self.child_events.is_empty()
    }

    pub fn iter_video_objects(&self) -> std::slice::Iter<'_, VideoObject> {
        self.objects.iter()
    }

    /// Iterates over the stored detections in ascending frame order.
    pub fn iter_detections(&self) -> impl Iterator<Item = &DetectedEvent> {
        self.frames.values()
    }

    pub fn add_event_attribute(&mut self, attr: Attribute) {
        self.attrs.add(attr);
    }

    pub fn add_event_attributes(&mut self, attrs: AttributeContainer) {
        self.attrs.add_container(attrs);
    }

    /// Adds a frame-level attribute, creating the frame's detection if
    /// needed.
    pub fn add_frame_attribute(&mut self, attr: Attribute, frame_number: u64) {
        self.ensure_frame(frame_number).add_attribute(attr);
    }

    pub fn add_frame_attributes(&mut self, attrs: AttributeContainer, frame_number: u64) {
        self.ensure_frame(frame_number).add_attributes(attrs);
    }

    /// Adds a temporal object to `objects`, or a detected object to the
    /// detection at its frame.
    ///
    /// A `DetectedObject` needs either `frame_number` or its own
    /// `frame_number`; otherwise nothing is changed.
    pub fn add_object(
        &mut self,
        obj: impl Into<Object>,
        frame_number: Option<u64>,
    ) -> Result<(), PreconditionError> {
        match obj.into() {
            Object::Detected(obj) => self.add_detected_object(obj, frame_number),
            Object::Video(obj) => {
                self.objects.add(obj);
                Ok(())
            }
        }
    }

    /// Adds every object; detected objects are checked for a resolvable
    /// frame number before any is added.
    pub fn add_objects(
        &mut self,
        objects: impl Into<Objects>,
        frame_number: Option<u64>,
    ) -> Result<(), PreconditionError> {
        match objects.into() {
            Objects::Detected(objects) => {
                if frame_number.is_none() && !objects.iter().all(DetectedObject::has_frame_number)
                {
                    return Err(PreconditionError::MissingFrameNumber {
                        kind: "DetectedObject",
                    });
                }
                for obj in objects {
                    self.add_detected_object(obj, frame_number)?;
                }
                Ok(())
            }
            Objects::Video(objects) => {
                self.objects.add_container(objects);
                Ok(())
            }
        }
    }

    /// Stores the detection at a frame, overwriting any existing one.
    ///
    /// With `clean`, the detection's `label` and `index` are cleared: the
    /// enclosing event owns that identity.
    pub fn add_detection(
        &mut self,
        mut event: DetectedEvent,
        frame_number: Option<u64>,
        clean: bool,
    ) -> Result<(), PreconditionError> {
        let frame_number = frame_number.or(event.frame_number).ok_or(
            PreconditionError::MissingFrameNumber {
                kind: "DetectedEvent",
            },
        )?;
        if clean {
            event.label = None;
            event.index = None;
        }
        event.frame_number = Some(frame_number);
        self.frames.insert(frame_number, event);
        Ok(())
    }

    /// Adds detections that all carry their own frame numbers.
    pub fn add_detections(
        &mut self,
        events: DetectedEventContainer,
        clean: bool,
    ) -> Result<(), PreconditionError> {
        if !events.iter().all(DetectedEvent::has_frame_number) {
            return Err(PreconditionError::MissingFrameNumber {
                kind: "DetectedEvent",
            });
        }
        for event in events {
            self.add_detection(event, None, clean)?;
        }
        Ok(())
    }

    /// Records `obj` as a child of this event. The object must have a uuid.
    pub fn add_child_object(&mut self, obj: &VideoObject) -> Result<(), PreconditionError> {
        let uuid = obj
            .uuid
            .ok_or(PreconditionError::MissingUuid { kind: "VideoObject" })?;
        self.child_objects.insert(uuid);
        Ok(())
    }

    /// Records `event` as a child of this event. The event must have a uuid.
    pub fn add_child_event(&mut self, event: &VideoEvent) -> Result<(), PreconditionError> {
        let uuid = event
            .uuid
            .ok_or(PreconditionError::MissingUuid { kind: "VideoEvent" })?;
        self.child_events.insert(uuid);
        Ok(())
    }

    pub fn clear_attributes(&mut self) {
        self.clear_event_attributes();
        self.clear_frame_attributes();
    }

    pub fn clear_event_attributes(&mut self) {
        self.attrs.clear();
    }

    pub fn clear_frame_attributes(&mut self) {
        for event in self.frames.values_mut() {
            event.clear_attributes();
        }
    }

    pub fn clear_video_objects(&mut self) {
        self.objects = VideoObjectContainer::new();
    }

    pub fn clear_detected_objects(&mut self) {
        for event in self.frames.values_mut() {
            event.clear_objects();
        }
    }

    pub fn clear_detections(&mut self) {
        self.frames.clear();
    }

    pub fn clear_child_objects(&mut self) {
        self.child_objects.clear();
    }

    pub fn clear_child_events(&mut self) {
        self.child_events.clear();
    }

    /// Freezes the current (possibly computed) support.
    pub fn freeze_support(&mut self) {
        self.support = Some(self.support());
    }

    /// Drops any frozen support so that it is computed again.
    pub fn unfreeze_support(&mut self) {
        self.support = None;
    }

    /// Filters the event by the given schema.
    ///
    /// The label must match the schema. Event-level attributes and temporal
    /// objects are then filtered, and so is every stored detection, against
    /// the same schema. Stored detections are not label-checked since they
    /// take their identity from this event.
    ///
    /// Child objects and child events are not filtered: the uuid sets are
    /// left as they are.
    pub fn filter_by_schema(&mut self, schema: &EventSchema) -> Result<(), SchemaError> {
        schema.validate_label(self.label.as_deref())?;
        self.attrs.filter_by_schema(&schema.attrs);
        self.objects.filter_by_schema(&schema.objects);
        for event in self.frames.values_mut() {
            event.filter_contents_by_schema(schema);
        }
        Ok(())
    }

    pub fn remove_objects_without_attrs(&mut self, labels: Option<&[&str]>) {
        self.objects.remove_objects_without_attrs(labels);
        for event in self.frames.values_mut() {
            event.remove_objects_without_attrs(labels);
        }
    }

    /// Names of the fields that are serialized, in order.
    pub fn attributes(&self) -> Vec<&'static str> {
        let mut attrs = vec!["type"];
        let optional = [
            ("label", self.label.is_some()),
            ("confidence", self.confidence.is_some()),
            ("support", self.is_support_frozen()),
            ("index", self.index.is_some()),
            ("uuid", self.uuid.is_some()),
            ("attrs", self.has_event_attributes()),
            ("objects", self.has_video_objects()),
            ("frames", !self.frames.is_empty()),
            ("child_objects", self.has_child_objects()),
            ("child_events", self.has_child_events()),
        ];
        attrs.extend(optional.iter().filter(|(_, set)| *set).map(|(name, _)| *name));
        attrs
    }

    pub fn to_dict(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Rebuilds an event from its dictionary form, dispatching on the
    /// `type` tag through the built-in [`EventTypeRegistry`].
    pub fn from_dict(d: &Value) -> Result<Self, SerialError> {
        EventTypeRegistry::builtin().from_dict(d)
    }

    /// Decodes the dictionary as a plain `VideoEvent`, ignoring the tag.
    ///
    /// This is the constructor registered for [`VIDEO_EVENT_TYPE`].
    pub fn decode_dict(d: &Value) -> Result<Self, SerialError> {
        Ok(Self::deserialize(d)?)
    }

    fn ensure_frame(&mut self, frame_number: u64) -> &mut DetectedEvent {
        self.frames
            .entry(frame_number)
            .or_insert_with(|| DetectedEvent::at_frame(frame_number))
    }

    fn add_detected_object(
        &mut self,
        mut obj: DetectedObject,
        frame_number: Option<u64>,
    ) -> Result<(), PreconditionError> {
        let frame_number = frame_number.or(obj.frame_number).ok_or(
            PreconditionError::MissingFrameNumber {
                kind: "DetectedObject",
            },
        )?;
        obj.frame_number = Some(frame_number);
        self.ensure_frame(frame_number).add_object(obj);
        Ok(())
    }
}

impl Labels for VideoEvent {
    /// A video event is never empty: its identity alone may anchor edges
    /// from other labels.
    fn is_empty(&self) -> bool {
        false
    }
}

impl HasLabelsSupport for VideoEvent {
    fn frozen_support(&self) -> Option<&FrameRanges> {
        self.support.as_ref()
    }

    fn compute_support(&self) -> FrameRanges {
        let mut support = FrameRanges::from_iterable(self.frames.keys().copied());
        for obj in self.objects.iter() {
            support.merge(&obj.support());
        }
        support
    }
}

impl HasFramewiseView for VideoEvent {
    /// Returns an event whose only state is the rendered `frames`.
    fn render_framewise_labels(&self) -> Self {
        let frames = VideoEventFrameRenderer::new(self).render_all_frames();
        VideoEvent {
            frames,
            ..VideoEvent::default()
        }
    }
}

/// An ordered collection of [`VideoEvent`]s.
///
/// Deserialization dispatches every element through the built-in
/// [`EventTypeRegistry`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VideoEventContainer {
    pub events: Vec<VideoEvent>,
}

impl VideoEventContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VideoEvent> {
        self.events.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, VideoEvent> {
        self.events.iter_mut()
    }

    pub fn add(&mut self, event: VideoEvent) {
        self.events.push(event);
    }

    pub fn add_container(&mut self, other: VideoEventContainer) {
        self.events.extend(other.events);
    }

    pub fn get_labels(&self) -> BTreeSet<Option<&str>> {
        self.events.iter().map(|e| e.label.as_deref()).collect()
    }

    /// Events without a confidence always go last.
    pub fn sort_by_confidence(&mut self, reverse: bool) {
        sort_none_last(&mut self.events, |e| e.confidence, reverse);
    }

    /// Events without an index always go last.
    pub fn sort_by_index(&mut self, reverse: bool) {
        sort_none_last(&mut self.events, |e| e.index, reverse);
    }

    pub fn filter_elements(&mut self, keep: impl FnMut(&VideoEvent) -> bool) {
        self.events.retain(keep);
    }

    /// Removes events whose label the schema does not know, then filters
    /// each remaining event by its label's schema.
    pub fn filter_by_schema(&mut self, schema: &EventContainerSchema) -> Result<(), SchemaError> {
        let before = self.events.len();
        self.filter_elements(|e| schema.has_event_label(e.label.as_deref()));
        tracing::debug!(
            removed = before - self.events.len(),
            "filtered video events by event label"
        );
        for event in &mut self.events {
            let event_schema = schema.get_event_schema(event.label.as_deref())?;
            event.filter_by_schema(event_schema)?;
        }
        Ok(())
    }

    pub fn remove_objects_without_attrs(&mut self, labels: Option<&[&str]>) {
        for event in &mut self.events {
            event.remove_objects_without_attrs(labels);
        }
    }

    pub fn to_dict(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_dict(d: &Value) -> Result<Self, SerialError> {
        Ok(Self::deserialize(d)?)
    }
}

impl<'de> Deserialize<'de> for VideoEventContainer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct ContainerData {
            #[serde(default)]
            events: Vec<Value>,
        }
        let data = ContainerData::deserialize(deserializer)?;
        let events = data
            .events
            .iter()
            .map(VideoEvent::from_dict)
            .collect::<Result<Vec<_>, _>>()
            .map_err(D::Error::custom)?;
        Ok(Self { events })
    }
}

impl From<Vec<VideoEvent>> for VideoEventContainer {
    fn from(events: Vec<VideoEvent>) -> Self {
        Self { events }
    }
}

impl<'a> IntoIterator for &'a VideoEventContainer {
    type Item = &'a VideoEvent;
    type IntoIter = std::slice::Iter<'a, VideoEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}
