use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::schema::{ObjectContainerSchema, ObjectSchema};
use super::label_selected;
use crate::attrs::{Attribute, AttributeContainer};
use crate::geometry::BoundingBox;
use crate::labels::Labels;

/// An object detected in a single frame.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_number: Option<u64>,

    #[serde(default, skip_serializing_if = "AttributeContainer::is_empty")]
    pub attrs: AttributeContainer,
}

impl DetectedObject {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn with_bounding_box(mut self, bounding_box: BoundingBox) -> Self {
        self.bounding_box = Some(bounding_box);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
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

    pub fn has_attributes(&self) -> bool {
        !self.attrs.is_empty()
    }

    pub fn has_frame_number(&self) -> bool {
        self.frame_number.is_some()
    }

    pub fn add_attribute(&mut self, attr: Attribute) {
        self.attrs.add(attr);
    }

    pub fn clear_attributes(&mut self) {
        self.attrs.clear();
    }

    /// Removes the attributes the object schema does not allow.
    pub fn filter_by_schema(&mut self, schema: &ObjectSchema) {
        self.attrs.filter_by_schema(&schema.frames);
    }
}

impl Labels for DetectedObject {
    fn is_empty(&self) -> bool {
        self.label.is_none() && self.bounding_box.is_none() && self.attrs.is_empty()
    }
}

/// An ordered collection of [`DetectedObject`]s.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedObjectContainer {
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
}

impl DetectedObjectContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DetectedObject> {
        self.objects.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DetectedObject> {
        self.objects.iter_mut()
    }

    pub fn add(&mut self, obj: DetectedObject) {
        self.objects.push(obj);
    }

    pub fn add_container(&mut self, other: DetectedObjectContainer) {
        self.objects.extend(other.objects);
    }

    /// Returns the set of object labels in the container.
    pub fn get_labels(&self) -> BTreeSet<Option<&str>> {
        self.objects.iter().map(|o| o.label.as_deref()).collect()
    }

    /// Removes objects whose label the schema does not know, then filters
    /// the attributes of the remaining ones.
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

impl From<Vec<DetectedObject>> for DetectedObjectContainer {
    fn from(objects: Vec<DetectedObject>) -> Self {
        Self { objects }
    }
}

impl<'a> IntoIterator for &'a DetectedObjectContainer {
    type Item = &'a DetectedObject;
    type IntoIter = std::slice::Iter<'a, DetectedObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.iter()
    }
}

impl IntoIterator for DetectedObjectContainer {
    type Item = DetectedObject;
    type IntoIter = std::vec::IntoIter<DetectedObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.into_iter()
    }
}
