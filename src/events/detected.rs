use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

use super::schema::{EventContainerSchema, EventSchema};
use crate::attrs::{Attribute, AttributeContainer};
use crate::error::{SchemaError, SerialError};
use crate::geometry::{BoundingBox, Mask};
use crate::labels::{sort_none_last, Labels};
use crate::objects::{DetectedObject, DetectedObjectContainer};

/// Type tag written into the `type` field of serialized detections.
pub const DETECTED_EVENT_TYPE: &str = "eventlabel.events.DetectedEvent";

fn default_detected_event_type() -> String {
    DETECTED_EVENT_TYPE.to_string()
}

/// A single frame's observation of an event.
///
/// Every field is optional; `attrs` and `objects` are empty containers when
/// unset. Field order matches [`DetectedEvent::attributes`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectedEvent {
    #[serde(rename = "type", default = "default_detected_event_type")]
    pub event_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<Mask>,

    /// Label confidence in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Label → probability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k_probs: Option<BTreeMap<String, f64>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_number: Option<u64>,

    #[serde(default, skip_serializing_if = "AttributeContainer::is_empty")]
    pub attrs: AttributeContainer,

    #[serde(default, skip_serializing_if = "DetectedObjectContainer::is_empty")]
    pub objects: DetectedObjectContainer,
}

impl Default for DetectedEvent {
    fn default() -> Self {
        Self {
            event_type: default_detected_event_type(),
            label: None,
            bounding_box: None,
            mask: None,
            confidence: None,
            top_k_probs: None,
            index: None,
            frame_number: None,
            attrs: AttributeContainer::new(),
            objects: DetectedObjectContainer::new(),
        }
    }
}

impl DetectedEvent {
    /// Creates a detection with no fields set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an unlabeled detection for the given frame.
    pub fn at_frame(frame_number: u64) -> Self {
        Self {
            frame_number: Some(frame_number),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    pub fn with_mask(mut self, mask: Mask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_top_k_probs(mut self, top_k_probs: BTreeMap<String, f64>) -> Self {
        self.top_k_probs = Some(top_k_probs);
        self
    }

    pub fn with_index(mut self, index: i64) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_frame_number(mut self, frame_number: u64) -> Self {
        self.frame_number = Some(frame_number);
        self
    }

    pub fn with_attribute(mut self, attr: Attribute) -> Self {
        self.attrs.add(attr);
        self
    }

    pub fn with_object(mut self, obj: DetectedObject) -> Self {
        self.objects.add(obj);
        self
    }

    pub fn has_label(&self) -> bool {
        self.label.is_some()
    }

    pub fn has_bounding_box(&self) -> bool {
        self.bounding_box.is_some()
    }

    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    pub fn has_confidence(&self) -> bool {
        self.confidence.is_some()
    }

    pub fn has_top_k_probs(&self) -> bool {
        self.top_k_probs.is_some()
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    pub fn has_frame_number(&self) -> bool {
        self.frame_number.is_some()
    }

    pub fn has_attributes(&self) -> bool {
        !self.attrs.is_empty()
    }

    pub fn has_objects(&self) -> bool {
        !self.objects.is_empty()
    }

    pub fn add_attribute(&mut self, attr: Attribute) {
        self.attrs.add(attr);
    }

    pub fn add_attributes(&mut self, attrs: AttributeContainer) {
        self.attrs.add_container(attrs);
    }

    pub fn add_object(&mut self, obj: DetectedObject) {
        self.objects.add(obj);
    }

    pub fn add_objects(&mut self, objects: DetectedObjectContainer) {
        self.objects.add_container(objects);
    }

    pub fn clear_attributes(&mut self) {
        self.attrs.clear();
    }

    pub fn clear_objects(&mut self) {
        self.objects = DetectedObjectContainer::new();
    }

    pub fn clear_object_attributes(&mut self) {
        for obj in self.objects.iter_mut() {
            obj.clear_attributes();
        }
    }

    /// Filters the detection by the given schema.
    ///
    /// The label must match the schema, or be `None` when
    /// `allow_none_label` is set or the schema is for unlabeled events. The label is checked before anything is
    /// removed, so a failing call leaves the detection untouched.
    pub fn filter_by_schema(
        &mut self,
        schema: &EventSchema,
        allow_none_label: bool,
    ) -> Result<(), SchemaError> {
        match self.label.as_deref() {
            None if allow_none_label => {}
            None if schema.label.is_some() => {
                return Err(SchemaError::NoneLabelNotAllowed {
                    expected: schema.label.clone(),
                })
            }
            label => schema.validate_label(label)?,
        }
        self.filter_contents_by_schema(schema);
        Ok(())
    }

    /// Filters attributes and objects without looking at the label.
    pub(crate) fn filter_contents_by_schema(&mut self, schema: &EventSchema) {
        self.attrs.filter_by_schema(&schema.frames);
        self.objects.filter_by_schema(&schema.objects);
    }

    pub fn remove_objects_without_attrs(&mut self, labels: Option<&[&str]>) {
        self.objects.remove_objects_without_attrs(labels);
    }

    /// Names of the fields that are serialized, in order; unset fields are
    /// omitted.
    pub fn attributes(&self) -> Vec<&'static str> {
        let mut attrs = vec!["type"];
        let optional = [
            ("label", self.has_label()),
            ("bounding_box", self.has_bounding_box()),
            ("mask", self.has_mask()),
            ("confidence", self.has_confidence()),
            ("top_k_probs", self.has_top_k_probs()),
            ("index", self.has_index()),
            ("frame_number", self.has_frame_number()),
            ("attrs", self.has_attributes()),
            ("objects", self.has_objects()),
        ];
        attrs.extend(optional.iter().filter(|(_, set)| *set).map(|(name, _)| *name));
        attrs
    }

    pub fn to_dict(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    /// Rebuilds a detection from its dictionary form; omitted fields take
    /// their empty defaults.
    pub fn from_dict(d: &Value) -> Result<Self, SerialError> {
        Ok(Self::deserialize(d)?)
    }
}

impl Labels for DetectedEvent {
    fn is_empty(&self) -> bool {
        !(self.has_label()
            || self.has_bounding_box()
            || self.has_mask()
            || self.has_attributes()
            || self.has_objects())
    }
}

/// An ordered collection of [`DetectedEvent`]s.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedEventContainer {
    #[serde(default)]
    pub events: Vec<DetectedEvent>,
}

impl DetectedEventContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DetectedEvent> {
        self.events.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DetectedEvent> {
        self.events.iter_mut()
    }

    pub fn add(&mut self, event: DetectedEvent) {
        self.events.push(event);
    }

    pub fn add_container(&mut self, other: DetectedEventContainer) {
        self.events.extend(other.events);
    }

    /// Returns the set of labels in the container.
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

    /// Events without a frame number always go last.
    pub fn sort_by_frame_number(&mut self, reverse: bool) {
        sort_none_last(&mut self.events, |e| e.frame_number, reverse);
    }

    /// Keeps only the events for which `keep` returns true.
    pub fn filter_elements(&mut self, keep: impl FnMut(&DetectedEvent) -> bool) {
        self.events.retain(keep);
    }

    /// Removes events whose label the schema does not know, then filters
    /// each remaining event by its label's schema.
    pub fn filter_by_schema(&mut self, schema: &EventContainerSchema) -> Result<(), SchemaError> {
        let before = self.events.len();
        self.filter_elements(|e| schema.has_event_label(e.label.as_deref()));
        tracing::debug!(
            removed = before - self.events.len(),
            "filtered detections by event label"
        );
        for event in &mut self.events {
            let event_schema = schema.get_event_schema(event.label.as_deref())?;
            event.filter_by_schema(event_schema, false)?;
        }
        Ok(())
    }

    pub fn remove_objects_without_attrs(&mut self, labels: Option<&[&str]>) {
        for event in &mut self.events {
            event.remove_objects_without_attrs(labels);
        }
    }
}

impl From<Vec<DetectedEvent>> for DetectedEventContainer {
    fn from(events: Vec<DetectedEvent>) -> Self {
        Self { events }
    }
}

impl<'a> IntoIterator for &'a DetectedEventContainer {
    type Item = &'a DetectedEvent;
    type IntoIter = std::slice::Iter<'a, DetectedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

impl IntoIterator for DetectedEventContainer {
    type Item = DetectedEvent;
    type IntoIter = std::vec::IntoIter<DetectedEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BoundingBox;

    fn schema_for(label: &str) -> EventSchema {
        let mut schema = EventSchema::new(label);
        schema
            .add_frame_attribute(&Attribute::categorical("lane", "left"))
            .unwrap();
        schema
    }

    #[test]
    fn test_emptiness() {
        assert!(DetectedEvent::new().is_empty());
        assert!(DetectedEvent::at_frame(3).with_confidence(0.4).is_empty());
        assert!(!DetectedEvent::new().with_label("crash").is_empty());
        assert!(!DetectedEvent::new()
            .with_bounding_box(BoundingBox::from_coords(0.0, 0.0, 0.5, 0.5))
            .is_empty());
        assert!(!DetectedEvent::new()
            .with_attribute(Attribute::boolean("night", true))
            .is_empty());
    }

    #[test]
    fn test_attributes_omit_unset_fields() {
        let event = DetectedEvent::at_frame(7)
            .with_label("crash")
            .with_attribute(Attribute::boolean("night", true));
        assert_eq!(
            event.attributes(),
            vec!["type", "label", "frame_number", "attrs"]
        );

        let dict = event.to_dict().unwrap();
        let keys: Vec<&str> = dict.as_object().unwrap().keys().map(String::as_str).collect();
        let mut expected = event.attributes();
        expected.sort_unstable();
        let mut keys_sorted = keys.clone();
        keys_sorted.sort_unstable();
        assert_eq!(keys_sorted, expected);
    }

    #[test]
    fn test_dict_roundtrip() {
        let event = DetectedEvent::at_frame(2)
            .with_label("crash")
            .with_confidence(0.75)
            .with_index(4)
            .with_top_k_probs(BTreeMap::from([("crash".to_string(), 0.75)]))
            .with_bounding_box(BoundingBox::from_coords(0.1, 0.2, 0.3, 0.4))
            .with_mask(Mask::zeros(2, 2))
            .with_attribute(Attribute::numeric("speed", 12.5))
            .with_object(DetectedObject::new("car"));

        let restored = DetectedEvent::from_dict(&event.to_dict().unwrap()).unwrap();
        assert_eq!(restored, event);

        let bare = DetectedEvent::from_dict(&serde_json::json!({})).unwrap();
        assert_eq!(bare, DetectedEvent::new());
    }

    #[test]
    fn test_filter_rejects_unknown_label() {
        let mut event = DetectedEvent::new()
            .with_label("X")
            .with_attribute(Attribute::categorical("lane", "right"));
        let before = event.clone();

        let err = event.filter_by_schema(&schema_for("Y"), false).unwrap_err();
        assert_eq!(
            err,
            SchemaError::LabelMismatch {
                expected: Some("Y".into()),
                found: Some("X".into())
            }
        );
        assert_eq!(event, before);
    }

    #[test]
    fn test_filter_none_label() {
        let mut event = DetectedEvent::new()
            .with_attribute(Attribute::categorical("lane", "left"))
            .with_attribute(Attribute::categorical("lane", "right"));

        assert!(matches!(
            event.filter_by_schema(&schema_for("Y"), false),
            Err(SchemaError::NoneLabelNotAllowed { .. })
        ));
        assert_eq!(event.attrs.len(), 2);

        event.filter_by_schema(&schema_for("Y"), true).unwrap();
        assert_eq!(event.attrs.len(), 1);
    }

    #[test]
    fn test_sort_by_confidence_puts_none_last() {
        let mut events: DetectedEventContainer = vec![
            DetectedEvent::new().with_confidence(0.9),
            DetectedEvent::new(),
            DetectedEvent::new().with_confidence(0.3),
        ]
        .into();

        events.sort_by_confidence(true);
        let confs: Vec<_> = events.iter().map(|e| e.confidence).collect();
        assert_eq!(confs, vec![Some(0.9), Some(0.3), None]);

        events.sort_by_confidence(false);
        let confs: Vec<_> = events.iter().map(|e| e.confidence).collect();
        assert_eq!(confs, vec![Some(0.3), Some(0.9), None]);
    }

    #[test]
    fn test_sort_by_frame_number_and_index() {
        let mut events: DetectedEventContainer = vec![
            DetectedEvent::at_frame(5).with_index(1),
            DetectedEvent::new().with_index(0),
            DetectedEvent::at_frame(2),
        ]
        .into();

        events.sort_by_frame_number(false);
        let frames: Vec<_> = events.iter().map(|e| e.frame_number).collect();
        assert_eq!(frames, vec![Some(2), Some(5), None]);

        events.sort_by_index(true);
        let indices: Vec<_> = events.iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![Some(1), Some(0), None]);
    }

    #[test]
    fn test_container_filter_drops_unknown_labels() {
        let mut schema = EventContainerSchema::new();
        schema
            .add_frame_attribute("crash", &Attribute::categorical("lane", "left"))
            .unwrap();

        let mut events: DetectedEventContainer = vec![
            DetectedEvent::new()
                .with_label("crash")
                .with_attribute(Attribute::categorical("lane", "left"))
                .with_attribute(Attribute::boolean("night", true)),
            DetectedEvent::new().with_label("turn"),
            DetectedEvent::new(),
        ]
        .into();

        events.filter_by_schema(&schema).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events.events[0].attrs.len(), 1);
        assert_eq!(events.get_labels(), BTreeSet::from([Some("crash")]));
    }

    #[test]
    fn test_container_filter_keeps_unlabeled_when_schema_allows() {
        let mut schema = EventContainerSchema::new();
        schema
            .add_event(&DetectedEvent::new().with_attribute(Attribute::boolean("night", true)))
            .unwrap();

        let mut events: DetectedEventContainer = vec![
            DetectedEvent::new()
                .with_attribute(Attribute::boolean("night", true))
                .with_attribute(Attribute::categorical("lane", "left")),
            DetectedEvent::new().with_label("crash"),
        ]
        .into();

        events.filter_by_schema(&schema).unwrap();
        assert_eq!(events.get_labels(), BTreeSet::from([None]));
        assert_eq!(events.events[0].attrs.len(), 1);
    }
}
