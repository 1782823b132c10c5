use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::detected::{DetectedObject, DetectedObjectContainer};
use super::label_selected;
use super::schema::{ObjectContainerSchema, ObjectSchema};
use crate::attrs::{Attribute, AttributeContainer};
use crate::error::PreconditionError;
use crate::frames::FrameRanges;
use crate::labels::{FrameRenderer, HasLabelsSupport, Labels};

/// A spatiotemporal object in a video.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// Frozen support; computed from `frames` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support: Option<FrameRanges>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<Uuid>,

    /// Object-level attributes, constant over the support.
    #[serde(default, skip_serializing_if = "AttributeContainer::is_empty")]
    pub attrs: AttributeContainer,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub frames: BTreeMap<u64, DetectedObject>,
}

impl VideoObject {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
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

    /// Whether the object has object-level or frame-level attributes.
    pub fn has_attributes(&self) -> bool {
        !self.attrs.is_empty() || self.frames.values().any(DetectedObject::has_attributes)
    }

    /// Iterates over the per-frame detections in ascending frame order.
    pub fn iter_detections(&self) -> impl Iterator<Item = &DetectedObject> {
        self.frames.values()
    }

    /// Stores the detection at a frame, overwriting any existing one.
    pub fn add_detection(
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
        self.frames.insert(frame_number, obj);
        Ok(())
    }

    pub fn clear_attributes(&mut self) {
        self.attrs.clear();
        for obj in self.frames.values_mut() {
            obj.clear_attributes();
        }
    }

    /// Removes the object- and frame-level attributes the schema does not
    /// allow.
    pub fn filter_by_schema(&mut self, schema: &ObjectSchema) {
        self.attrs.filter_by_schema(&schema.attrs);
        for obj in self.frames.values_mut() {
            obj.filter_by_schema(schema);
        }
    }
}

impl Labels for VideoObject {
    fn is_empty(&self) -> bool {
        false
    }
}

impl HasLabelsSupport for VideoObject {
    fn frozen_support(&self) -> Option<&FrameRanges> {
        self.support.as_ref()
    }

    fn compute_support(&self) -> FrameRanges {
        FrameRanges::from_iterable(self.frames.keys().copied())
    }
}

/// An ordered collection of [`VideoObject`]s.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoObjectContainer {
    #[serde(default)]
    pub objects: Vec<VideoObject>,
}

impl VideoObjectContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VideoObject> {
        self.objects.iter()
    }

    pub fn add(&mut self, obj: VideoObject) {
        self.objects.push(obj);
    }

    pub fn add_container(&mut self, other: VideoObjectContainer) {
        self.objects.extend(other.objects);
    }

    /// Removes objects whose label the schema does not know, then filters
    /// the remaining ones.
    pub fn filter_by_schema(&mut self, schema: &ObjectContainerSchema) {
        self.objects
            .retain(|obj| schema.has_object_label(obj.label.as_deref()));
        for obj in &mut self.objects {
            if let Ok(obj_schema) = schema.get_object_schema(obj.label.as_deref()) {
                obj.filter_by_schema(obj_schema);
            }
        }
    }

    /// Removes objects without attributes, optionally restricted to the
    /// given labels.
    pub fn remove_objects_without_attrs(&mut self, labels: Option<&[&str]>) {
        self.objects
            .retain(|obj| obj.has_attributes() || !label_selected(obj.label.as_deref(), labels));
    }
}

impl From<Vec<VideoObject>> for VideoObjectContainer {
    fn from(objects: Vec<VideoObject>) -> Self {
        Self { objects }
    }
}

impl<'a> IntoIterator for &'a VideoObjectContainer {
    type Item = &'a VideoObject;
    type IntoIter = std::slice::Iter<'a, VideoObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

/// Renders a [`VideoObject`] as per-frame [`DetectedObject`]s.
pub struct VideoObjectFrameRenderer<'a> {
    object: &'a VideoObject,
}

impl<'a> VideoObjectFrameRenderer<'a> {
    pub fn new(object: &'a VideoObject) -> Self {
        Self { object }
    }

    fn render(&self, frame_number: u64) -> DetectedObject {
        let mut obj = match self.object.frames.get(&frame_number) {
            Some(obj) => obj.clone(),
            None => DetectedObject::default().with_frame_number(frame_number),
        };
        if !self.object.attrs.is_empty() {
            obj.attrs.prepend_container(self.object.attrs.clone());
        }
        if self.object.label.is_some() {
            obj.label = self.object.label.clone();
        }
        if self.object.confidence.is_some() {
            obj.confidence = self.object.confidence;
        }
        if self.object.index.is_some() {
            obj.index = self.object.index;
        }
        obj
    }
}

impl FrameRenderer for VideoObjectFrameRenderer<'_> {
    type Frame = DetectedObject;

    fn render_frame(&self, frame_number: u64) -> Option<DetectedObject> {
        if !self.object.support().contains(frame_number) {
            return None;
        }
        Some(self.render(frame_number))
    }

    fn render_all_frames(&self) -> BTreeMap<u64, DetectedObject> {
        self.object
            .support()
            .iter()
            .map(|f| (f, self.render(f)))
            .collect()
    }
}

/// Renders every object of a [`VideoObjectContainer`] and groups the
/// results by frame.
pub struct VideoObjectContainerFrameRenderer<'a> {
    objects: &'a VideoObjectContainer,
}

impl<'a> VideoObjectContainerFrameRenderer<'a> {
    pub fn new(objects: &'a VideoObjectContainer) -> Self {
        Self { objects }
    }
}

impl FrameRenderer for VideoObjectContainerFrameRenderer<'_> {
    type Frame = DetectedObjectContainer;

    fn render_frame(&self, frame_number: u64) -> Option<DetectedObjectContainer> {
        let rendered: DetectedObjectContainer = self
            .objects
            .iter()
            .filter_map(|obj| VideoObjectFrameRenderer::new(obj).render_frame(frame_number))
            .collect::<Vec<_>>()
            .into();
        if rendered.is_empty() {
            return None;
        }
        Some(rendered)
    }

    fn render_all_frames(&self) -> BTreeMap<u64, DetectedObjectContainer> {
        let mut frames: BTreeMap<u64, DetectedObjectContainer> = BTreeMap::new();
        for obj in self.objects {
            for (frame_number, dobj) in VideoObjectFrameRenderer::new(obj).render_all_frames() {
                frames.entry(frame_number).or_default().add(dobj);
            }
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walking_person() -> VideoObject {
        let mut obj = VideoObject::new("person")
            .with_attribute(Attribute::categorical("gender", "female"));
        obj.add_detection(
            DetectedObject::default().with_attribute(Attribute::boolean("occluded", true)),
            Some(3),
        )
        .unwrap();
        obj.add_detection(DetectedObject::default().with_frame_number(4), None)
            .unwrap();
        obj
    }

    #[test]
    fn test_add_detection_requires_frame_number() {
        let mut obj = VideoObject::new("person");
        let err = obj
            .add_detection(DetectedObject::default(), None)
            .unwrap_err();
        assert_eq!(
            err,
            PreconditionError::MissingFrameNumber {
                kind: "DetectedObject"
            }
        );
        assert!(obj.frames.is_empty());
    }

    #[test]
    fn test_support_is_computed_unless_frozen() {
        let obj = walking_person();
        assert_eq!(obj.support().ranges(), &[(3, 4)]);
        assert!(!obj.is_support_frozen());

        let frozen = obj.with_support(FrameRanges::build_simple(1, 10));
        assert_eq!(frozen.support().num_frames(), 10);
    }

    #[test]
    fn test_render_inherits_object_attributes() {
        let obj = walking_person();
        let rendered = VideoObjectFrameRenderer::new(&obj).render_frame(3).unwrap();
        let names: Vec<&str> = rendered.attrs.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["gender", "occluded"]);
        assert_eq!(rendered.label.as_deref(), Some("person"));
        assert!(VideoObjectFrameRenderer::new(&obj).render_frame(5).is_none());
    }

    #[test]
    fn test_container_render_groups_by_frame() {
        let car = VideoObject::new("car").with_support(FrameRanges::build_simple(4, 5));
        let objects: VideoObjectContainer = vec![walking_person(), car].into();
        let frames = VideoObjectContainerFrameRenderer::new(&objects).render_all_frames();

        assert_eq!(frames.keys().copied().collect::<Vec<_>>(), vec![3, 4, 5]);
        assert_eq!(frames[&4].len(), 2);
        assert_eq!(frames[&5].len(), 1);
    }
}
