use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::detected::DetectedEvent;
use super::EventRef;
use crate::attrs::{
    Attribute, AttributeContainer, AttributeContainerSchema, AttributeKind, AttributeSchema,
};
use crate::error::{SchemaError, SerialError};
use crate::objects::{ObjectContainerSchema, ObjectRef, ObjectSchema};

/// Schema describing the events of one label, or the unlabeled events when
/// `label` is `None`.
///
/// `attrs` covers event-level attributes of video events, `frames` the
/// attributes of individual detections, and `objects` every object the
/// event may contain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventSchema {
    #[serde(default)]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "AttributeContainerSchema::is_empty")]
    pub attrs: AttributeContainerSchema,

    #[serde(default, skip_serializing_if = "AttributeContainerSchema::is_empty")]
    pub frames: AttributeContainerSchema,

    #[serde(default, skip_serializing_if = "ObjectContainerSchema::is_empty")]
    pub objects: ObjectContainerSchema,
}

impl EventSchema {
    pub fn new(label: impl Into<String>) -> Self {
        let label: String = label.into();
        Self::for_label(Some(&label))
    }

    /// A schema for events without a label.
    pub fn unlabeled() -> Self {
        Self::for_label(None)
    }

    fn for_label(label: Option<&str>) -> Self {
        Self {
            label: label.map(str::to_string),
            attrs: AttributeContainerSchema::new(),
            frames: AttributeContainerSchema::new(),
            objects: ObjectContainerSchema::new(),
        }
    }

    /// Whether the schema allows nothing beyond its label.
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty() && self.frames.is_empty() && self.objects.is_empty()
    }

    pub fn has_label(&self, label: Option<&str>) -> bool {
        label == self.label.as_deref()
    }

    pub fn has_event_attribute(&self, attr_name: &str) -> bool {
        self.attrs.has_attribute(attr_name)
    }

    pub fn has_frame_attribute(&self, attr_name: &str) -> bool {
        self.frames.has_attribute(attr_name)
    }

    pub fn has_object_label<'a>(&self, label: impl Into<Option<&'a str>>) -> bool {
        self.objects.has_object_label(label)
    }

    pub fn has_object_attribute(&self, label: &str, attr_name: &str) -> bool {
        self.objects.has_object_attribute(label, attr_name)
    }

    pub fn has_object_frame_attribute(&self, label: &str, attr_name: &str) -> bool {
        self.objects.has_frame_attribute(label, attr_name)
    }

    pub fn get_event_attribute_schema(&self, attr_name: &str) -> Result<&AttributeSchema, SchemaError> {
        self.attrs.get_attribute_schema(attr_name)
    }

    pub fn get_event_attribute_kind(&self, attr_name: &str) -> Result<AttributeKind, SchemaError> {
        self.attrs.get_attribute_kind(attr_name)
    }

    pub fn get_frame_attribute_schema(&self, attr_name: &str) -> Result<&AttributeSchema, SchemaError> {
        self.frames.get_attribute_schema(attr_name)
    }

    pub fn get_frame_attribute_kind(&self, attr_name: &str) -> Result<AttributeKind, SchemaError> {
        self.frames.get_attribute_kind(attr_name)
    }

    pub fn get_object_schema<'a>(
        &self,
        label: impl Into<Option<&'a str>>,
    ) -> Result<&ObjectSchema, SchemaError> {
        self.objects.get_object_schema(label)
    }

    pub fn get_object_attribute_schema(
        &self,
        label: &str,
        attr_name: &str,
    ) -> Result<&AttributeSchema, SchemaError> {
        self.objects.get_object_attribute_schema(label, attr_name)
    }

    pub fn get_object_frame_attribute_schema(
        &self,
        label: &str,
        attr_name: &str,
    ) -> Result<&AttributeSchema, SchemaError> {
        self.objects.get_frame_attribute_schema(label, attr_name)
    }

    pub fn add_event_attribute(&mut self, attr: &Attribute) -> Result<(), SchemaError> {
        self.attrs.add_attribute(attr)
    }

    pub fn add_event_attributes(&mut self, attrs: &AttributeContainer) -> Result<(), SchemaError> {
        self.attrs.add_attributes(attrs)
    }

    pub fn add_frame_attribute(&mut self, attr: &Attribute) -> Result<(), SchemaError> {
        self.frames.add_attribute(attr)
    }

    pub fn add_frame_attributes(&mut self, attrs: &AttributeContainer) -> Result<(), SchemaError> {
        self.frames.add_attributes(attrs)
    }

    pub fn add_object_label(&mut self, label: &str) {
        self.objects.add_object_label(label);
    }

    pub fn add_object_attribute(&mut self, label: &str, attr: &Attribute) -> Result<(), SchemaError> {
        self.objects.add_object_attribute(label, attr)
    }

    pub fn add_object_attributes(
        &mut self,
        label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.objects.add_object_attributes(label, attrs)
    }

    pub fn add_object_frame_attribute(
        &mut self,
        label: &str,
        attr: &Attribute,
    ) -> Result<(), SchemaError> {
        self.objects.add_frame_attribute(label, attr)
    }

    pub fn add_object_frame_attributes(
        &mut self,
        label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.objects.add_frame_attributes(label, attrs)
    }

    pub fn add_object<'a>(&mut self, obj: impl Into<ObjectRef<'a>>) -> Result<(), SchemaError> {
        self.objects.add_object(obj.into())
    }

    pub fn add_objects<'a, T: Into<ObjectRef<'a>>>(
        &mut self,
        objects: impl IntoIterator<Item = T>,
    ) -> Result<(), SchemaError> {
        self.objects.add_objects(objects.into_iter().map(Into::into))
    }

    /// Grows the schema to describe `event`, whose label must match.
    ///
    /// For a video event this covers its event-level attributes, its
    /// temporal objects and every stored detection. All or nothing.
    pub fn add_event<'a>(&mut self, event: impl Into<EventRef<'a>>) -> Result<(), SchemaError> {
        let event = event.into();
        self.validate_label(event.label())?;
        let mut staged = self.clone();
        match event {
            EventRef::Detected(event) => staged.add_detected_event_contents(event)?,
            EventRef::Video(event) => {
                staged.attrs.add_attributes(&event.attrs)?;
                staged.add_objects(event.iter_video_objects())?;
                for devent in event.iter_detections() {
                    staged.add_detected_event_contents(devent)?;
                }
            }
        }
        *self = staged;
        Ok(())
    }

    /// Adds every event; all or nothing.
    pub fn add_events<'a, T: Into<EventRef<'a>>>(
        &mut self,
        events: impl IntoIterator<Item = T>,
    ) -> Result<(), SchemaError> {
        let mut staged = self.clone();
        for event in events {
            staged.add_event(event)?;
        }
        *self = staged;
        Ok(())
    }

    pub fn is_valid_event_attribute(&self, attr: &Attribute) -> bool {
        self.validate_event_attribute(attr).is_ok()
    }

    pub fn is_valid_event_attributes(&self, attrs: &AttributeContainer) -> bool {
        self.validate_event_attributes(attrs).is_ok()
    }

    pub fn is_valid_frame_attribute(&self, attr: &Attribute) -> bool {
        self.validate_frame_attribute(attr).is_ok()
    }

    pub fn is_valid_frame_attributes(&self, attrs: &AttributeContainer) -> bool {
        self.validate_frame_attributes(attrs).is_ok()
    }

    pub fn is_valid_object_label(&self, label: Option<&str>) -> bool {
        self.validate_object_label(label).is_ok()
    }

    pub fn is_valid_object_attribute(&self, label: &str, attr: &Attribute) -> bool {
        self.validate_object_attribute(label, attr).is_ok()
    }

    pub fn is_valid_object_attributes(&self, label: &str, attrs: &AttributeContainer) -> bool {
        self.validate_object_attributes(label, attrs).is_ok()
    }

    pub fn is_valid_object_frame_attribute(&self, label: &str, attr: &Attribute) -> bool {
        self.validate_object_frame_attribute(label, attr).is_ok()
    }

    pub fn is_valid_object_frame_attributes(&self, label: &str, attrs: &AttributeContainer) -> bool {
        self.validate_object_frame_attributes(label, attrs).is_ok()
    }

    pub fn is_valid_object<'a>(&self, obj: impl Into<ObjectRef<'a>>) -> bool {
        self.validate_object(obj).is_ok()
    }

    pub fn is_valid<'a>(&self, event: impl Into<EventRef<'a>>) -> bool {
        self.validate(event).is_ok()
    }

    pub fn validate_label(&self, label: Option<&str>) -> Result<(), SchemaError> {
        if !self.has_label(label) {
            return Err(SchemaError::LabelMismatch {
                expected: self.label.clone(),
                found: label.map(str::to_string),
            });
        }
        Ok(())
    }

    pub fn validate_event_attribute_name(&self, attr_name: &str) -> Result<(), SchemaError> {
        self.attrs.validate_attribute_name(attr_name)
    }

    pub fn validate_event_attribute(&self, attr: &Attribute) -> Result<(), SchemaError> {
        self.attrs.validate_attribute(attr)
    }

    pub fn validate_event_attributes(&self, attrs: &AttributeContainer) -> Result<(), SchemaError> {
        self.attrs.validate(attrs)
    }

    pub fn validate_frame_attribute_name(&self, attr_name: &str) -> Result<(), SchemaError> {
        self.frames.validate_attribute_name(attr_name)
    }

    pub fn validate_frame_attribute(&self, attr: &Attribute) -> Result<(), SchemaError> {
        self.frames.validate_attribute(attr)
    }

    pub fn validate_frame_attributes(&self, attrs: &AttributeContainer) -> Result<(), SchemaError> {
        self.frames.validate(attrs)
    }

    pub fn validate_object_label(&self, label: Option<&str>) -> Result<(), SchemaError> {
        self.objects.validate_object_label(label)
    }

    pub fn validate_object_attribute(&self, label: &str, attr: &Attribute) -> Result<(), SchemaError> {
        self.objects.validate_object_attribute(label, attr)
    }

    pub fn validate_object_attributes(
        &self,
        label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.objects.validate_object_attributes(label, attrs)
    }

    pub fn validate_object_frame_attribute(
        &self,
        label: &str,
        attr: &Attribute,
    ) -> Result<(), SchemaError> {
        self.objects.validate_frame_attribute(label, attr)
    }

    pub fn validate_object_frame_attributes(
        &self,
        label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.objects.validate_frame_attributes(label, attrs)
    }

    pub fn validate_object<'a>(&self, obj: impl Into<ObjectRef<'a>>) -> Result<(), SchemaError> {
        self.objects.validate_object(obj.into())
    }

    /// Checks that `event` complies with the schema.
    ///
    /// Detections stored under a video event are checked for attributes
    /// and objects only; their labels belong to the enclosing event.
    pub fn validate<'a>(&self, event: impl Into<EventRef<'a>>) -> Result<(), SchemaError> {
        match event.into() {
            EventRef::Detected(event) => {
                self.validate_label(event.label.as_deref())?;
                self.validate_detected_event_contents(event)
            }
            EventRef::Video(event) => {
                self.validate_label(event.label.as_deref())?;
                self.validate_event_attributes(&event.attrs)?;
                event
                    .iter_video_objects()
                    .try_for_each(|obj| self.validate_object(obj))?;
                event
                    .iter_detections()
                    .try_for_each(|devent| self.validate_detected_event_contents(devent))
            }
        }
    }

    /// Checks that everything this schema allows, `other` allows too.
    pub fn validate_subset_of_schema(&self, other: &EventSchema) -> Result<(), SchemaError> {
        if self.label != other.label {
            return Err(SchemaError::LabelMismatch {
                expected: other.label.clone(),
                found: self.label.clone(),
            });
        }
        self.attrs.validate_subset_of_schema(&other.attrs)?;
        self.frames.validate_subset_of_schema(&other.frames)?;
        self.objects.validate_subset_of_schema(&other.objects)
    }

    /// Merges `other`, whose label must match; all or nothing.
    pub fn merge_schema(&mut self, other: &EventSchema) -> Result<(), SchemaError> {
        self.validate_label(other.label.as_deref())?;
        let mut staged = self.clone();
        staged.attrs.merge_schema(&other.attrs)?;
        staged.frames.merge_schema(&other.frames)?;
        staged.objects.merge_schema(&other.objects)?;
        *self = staged;
        Ok(())
    }

    /// Builds the smallest schema that `event` complies with.
    ///
    /// Child objects and child events are not incorporated.
    pub fn build_active_schema<'a>(event: impl Into<EventRef<'a>>) -> Result<Self, SchemaError> {
        let event = event.into();
        let mut schema = Self::for_label(event.label());
        schema.add_event(event)?;
        Ok(schema)
    }

    /// Names of the fields that are serialized, in order.
    pub fn attributes(&self) -> Vec<&'static str> {
        let mut attrs = vec!["label"];
        if !self.attrs.is_empty() {
            attrs.push("attrs");
        }
        if !self.frames.is_empty() {
            attrs.push("frames");
        }
        if !self.objects.is_empty() {
            attrs.push("objects");
        }
        attrs
    }

    pub fn to_dict(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_dict(d: &Value) -> Result<Self, SerialError> {
        Ok(Self::deserialize(d)?)
    }

    fn add_detected_event_contents(&mut self, event: &DetectedEvent) -> Result<(), SchemaError> {
        self.frames.add_attributes(&event.attrs)?;
        self.add_objects(&event.objects)
    }

    fn validate_detected_event_contents(&self, event: &DetectedEvent) -> Result<(), SchemaError> {
        self.validate_frame_attributes(&event.attrs)?;
        event
            .objects
            .iter()
            .try_for_each(|obj| self.validate_object(obj))
    }
}

/// A mapping from event label to [`EventSchema`].
///
/// Unlabeled events live under `unlabeled`, which exists only once such an
/// event has been added.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EventContainerSchema {
    #[serde(default)]
    pub schema: BTreeMap<String, EventSchema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlabeled: Option<EventSchema>,
}

impl EventContainerSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_empty() && self.unlabeled.is_none()
    }

    /// Event labels in order, `None` first when unlabeled events are
    /// allowed.
    pub fn iter_event_labels(&self) -> impl Iterator<Item = Option<&str>> {
        self.iter_events().map(|(label, _)| label)
    }

    pub fn iter_events(&self) -> impl Iterator<Item = (Option<&str>, &EventSchema)> {
        self.unlabeled.iter().map(|s| (None, s)).chain(
            self.schema
                .iter()
                .map(|(label, s)| (Some(label.as_str()), s)),
        )
    }

    pub fn has_event_label<'a>(&self, label: impl Into<Option<&'a str>>) -> bool {
        self.entry(label.into()).is_some()
    }

    /// Strict lookup; an unknown label, or `None` when no unlabeled event
    /// was ever added, is a schema error.
    pub fn get_event_schema<'a>(
        &self,
        label: impl Into<Option<&'a str>>,
    ) -> Result<&EventSchema, SchemaError> {
        let label = label.into();
        self.entry(label)
            .ok_or_else(|| SchemaError::UnknownEventLabel(label.map(str::to_string)))
    }

    /// Returns the schema for `label`, inserting an empty one if needed.
    pub fn ensure_event_label<'a>(
        &mut self,
        label: impl Into<Option<&'a str>>,
    ) -> &mut EventSchema {
        match label.into() {
            Some(label) => self
                .schema
                .entry(label.to_string())
                .or_insert_with(|| EventSchema::new(label)),
            None => self.unlabeled.get_or_insert_with(EventSchema::unlabeled),
        }
    }

    pub fn has_event_attribute(&self, label: &str, attr_name: &str) -> bool {
        self.schema
            .get(label)
            .is_some_and(|s| s.has_event_attribute(attr_name))
    }

    pub fn has_frame_attribute(&self, label: &str, attr_name: &str) -> bool {
        self.schema
            .get(label)
            .is_some_and(|s| s.has_frame_attribute(attr_name))
    }

    pub fn has_object_label(&self, event_label: &str, obj_label: &str) -> bool {
        self.schema
            .get(event_label)
            .is_some_and(|s| s.has_object_label(obj_label))
    }

    pub fn has_object_attribute(&self, event_label: &str, obj_label: &str, attr_name: &str) -> bool {
        self.schema
            .get(event_label)
            .is_some_and(|s| s.has_object_attribute(obj_label, attr_name))
    }

    pub fn has_object_frame_attribute(
        &self,
        event_label: &str,
        obj_label: &str,
        attr_name: &str,
    ) -> bool {
        self.schema
            .get(event_label)
            .is_some_and(|s| s.has_object_frame_attribute(obj_label, attr_name))
    }

    pub fn get_event_attribute_schema(
        &self,
        label: &str,
        attr_name: &str,
    ) -> Result<&AttributeSchema, SchemaError> {
        self.get_event_schema(label)?
            .get_event_attribute_schema(attr_name)
    }

    pub fn get_frame_attribute_schema(
        &self,
        label: &str,
        attr_name: &str,
    ) -> Result<&AttributeSchema, SchemaError> {
        self.get_event_schema(label)?
            .get_frame_attribute_schema(attr_name)
    }

    pub fn get_object_schema(
        &self,
        event_label: &str,
        obj_label: &str,
    ) -> Result<&ObjectSchema, SchemaError> {
        self.get_event_schema(event_label)?
            .get_object_schema(obj_label)
    }

    pub fn get_object_attribute_schema(
        &self,
        event_label: &str,
        obj_label: &str,
        attr_name: &str,
    ) -> Result<&AttributeSchema, SchemaError> {
        self.get_event_schema(event_label)?
            .get_object_attribute_schema(obj_label, attr_name)
    }

    pub fn get_object_frame_attribute_schema(
        &self,
        event_label: &str,
        obj_label: &str,
        attr_name: &str,
    ) -> Result<&AttributeSchema, SchemaError> {
        self.get_event_schema(event_label)?
            .get_object_frame_attribute_schema(obj_label, attr_name)
    }

    pub fn add_event_label<'a>(&mut self, label: impl Into<Option<&'a str>>) {
        self.ensure_event_label(label);
    }

    pub fn add_event_attribute(&mut self, label: &str, attr: &Attribute) -> Result<(), SchemaError> {
        self.update(Some(label), |s| s.add_event_attribute(attr))
    }

    pub fn add_event_attributes(
        &mut self,
        label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.update(Some(label), |s| s.add_event_attributes(attrs))
    }

    pub fn add_frame_attribute(&mut self, label: &str, attr: &Attribute) -> Result<(), SchemaError> {
        self.update(Some(label), |s| s.add_frame_attribute(attr))
    }

    pub fn add_frame_attributes(
        &mut self,
        label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.update(Some(label), |s| s.add_frame_attributes(attrs))
    }

    pub fn add_object_label(&mut self, event_label: &str, obj_label: &str) {
        self.ensure_event_label(event_label).add_object_label(obj_label);
    }

    pub fn add_object_attribute(
        &mut self,
        event_label: &str,
        obj_label: &str,
        attr: &Attribute,
    ) -> Result<(), SchemaError> {
        self.update(Some(event_label), |s| s.add_object_attribute(obj_label, attr))
    }

    pub fn add_object_attributes(
        &mut self,
        event_label: &str,
        obj_label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.update(Some(event_label), |s| s.add_object_attributes(obj_label, attrs))
    }

    pub fn add_object_frame_attribute(
        &mut self,
        event_label: &str,
        obj_label: &str,
        attr: &Attribute,
    ) -> Result<(), SchemaError> {
        self.update(Some(event_label), |s| s.add_object_frame_attribute(obj_label, attr))
    }

    pub fn add_object_frame_attributes(
        &mut self,
        event_label: &str,
        obj_label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.update(Some(event_label), |s| s.add_object_frame_attributes(obj_label, attrs))
    }

    pub fn add_object<'a>(
        &mut self,
        event_label: &str,
        obj: impl Into<ObjectRef<'a>>,
    ) -> Result<(), SchemaError> {
        self.update(Some(event_label), |s| s.add_object(obj))
    }

    pub fn add_objects<'a, T: Into<ObjectRef<'a>>>(
        &mut self,
        event_label: &str,
        objects: impl IntoIterator<Item = T>,
    ) -> Result<(), SchemaError> {
        self.update(Some(event_label), |s| s.add_objects(objects))
    }

    /// Adds `event` under its own label; unlabeled events go to the
    /// unlabeled entry.
    pub fn add_event<'a>(&mut self, event: impl Into<EventRef<'a>>) -> Result<(), SchemaError> {
        let event = event.into();
        self.update(event.label(), |s| s.add_event(event))
    }

    /// Adds every event; all or nothing.
    pub fn add_events<'a, T: Into<EventRef<'a>>>(
        &mut self,
        events: impl IntoIterator<Item = T>,
    ) -> Result<(), SchemaError> {
        let mut staged = self.clone();
        for event in events {
            staged.add_event(event)?;
        }
        *self = staged;
        Ok(())
    }

    pub fn is_valid_event_label(&self, label: Option<&str>) -> bool {
        self.validate_event_label(label).is_ok()
    }

    pub fn is_valid_event_attribute(&self, label: &str, attr: &Attribute) -> bool {
        self.validate_event_attribute(label, attr).is_ok()
    }

    pub fn is_valid_event_attributes(&self, label: &str, attrs: &AttributeContainer) -> bool {
        self.validate_event_attributes(label, attrs).is_ok()
    }

    pub fn is_valid_frame_attribute(&self, label: &str, attr: &Attribute) -> bool {
        self.validate_frame_attribute(label, attr).is_ok()
    }

    pub fn is_valid_frame_attributes(&self, label: &str, attrs: &AttributeContainer) -> bool {
        self.validate_frame_attributes(label, attrs).is_ok()
    }

    pub fn is_valid_object_label(&self, event_label: &str, obj_label: Option<&str>) -> bool {
        self.validate_object_label(event_label, obj_label).is_ok()
    }

    pub fn is_valid_object_attribute(
        &self,
        event_label: &str,
        obj_label: &str,
        attr: &Attribute,
    ) -> bool {
        self.validate_object_attribute(event_label, obj_label, attr)
            .is_ok()
    }

    pub fn is_valid_object_attributes(
        &self,
        event_label: &str,
        obj_label: &str,
        attrs: &AttributeContainer,
    ) -> bool {
        self.validate_object_attributes(event_label, obj_label, attrs)
            .is_ok()
    }

    pub fn is_valid_object_frame_attribute(
        &self,
        event_label: &str,
        obj_label: &str,
        attr: &Attribute,
    ) -> bool {
        self.validate_object_frame_attribute(event_label, obj_label, attr)
            .is_ok()
    }

    pub fn is_valid_object_frame_attributes(
        &self,
        event_label: &str,
        obj_label: &str,
        attrs: &AttributeContainer,
    ) -> bool {
        self.validate_object_frame_attributes(event_label, obj_label, attrs)
            .is_ok()
    }

    pub fn is_valid_object<'a>(&self, event_label: &str, obj: impl Into<ObjectRef<'a>>) -> bool {
        self.validate_object(event_label, obj).is_ok()
    }

    pub fn is_valid_event<'a>(&self, event: impl Into<EventRef<'a>>) -> bool {
        self.validate_event(event).is_ok()
    }

    pub fn validate_event_label(&self, label: Option<&str>) -> Result<(), SchemaError> {
        self.get_event_schema(label).map(|_| ())
    }

    pub fn validate_event_attribute(&self, label: &str, attr: &Attribute) -> Result<(), SchemaError> {
        self.get_event_schema(label)?.validate_event_attribute(attr)
    }

    pub fn validate_event_attributes(
        &self,
        label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.get_event_schema(label)?.validate_event_attributes(attrs)
    }

    pub fn validate_frame_attribute(&self, label: &str, attr: &Attribute) -> Result<(), SchemaError> {
        self.get_event_schema(label)?.validate_frame_attribute(attr)
    }

    pub fn validate_frame_attributes(
        &self,
        label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.get_event_schema(label)?.validate_frame_attributes(attrs)
    }

    pub fn validate_object_label(
        &self,
        event_label: &str,
        obj_label: Option<&str>,
    ) -> Result<(), SchemaError> {
        self.get_event_schema(event_label)?
            .validate_object_label(obj_label)
    }

    pub fn validate_object_attribute(
        &self,
        event_label: &str,
        obj_label: &str,
        attr: &Attribute,
    ) -> Result<(), SchemaError> {
        self.get_event_schema(event_label)?
            .validate_object_attribute(obj_label, attr)
    }

    pub fn validate_object_attributes(
        &self,
        event_label: &str,
        obj_label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.get_event_schema(event_label)?
            .validate_object_attributes(obj_label, attrs)
    }

    pub fn validate_object_frame_attribute(
        &self,
        event_label: &str,
        obj_label: &str,
        attr: &Attribute,
    ) -> Result<(), SchemaError> {
        self.get_event_schema(event_label)?
            .validate_object_frame_attribute(obj_label, attr)
    }

    pub fn validate_object_frame_attributes(
        &self,
        event_label: &str,
        obj_label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.get_event_schema(event_label)?
            .validate_object_frame_attributes(obj_label, attrs)
    }

    pub fn validate_object<'a>(
        &self,
        event_label: &str,
        obj: impl Into<ObjectRef<'a>>,
    ) -> Result<(), SchemaError> {
        self.get_event_schema(event_label)?.validate_object(obj)
    }

    pub fn validate_event<'a>(&self, event: impl Into<EventRef<'a>>) -> Result<(), SchemaError> {
        let event = event.into();
        self.get_event_schema(event.label())?.validate(event)
    }

    /// Checks every event, stopping at the first violation.
    pub fn validate<'a, T: Into<EventRef<'a>>>(
        &self,
        events: impl IntoIterator<Item = T>,
    ) -> Result<(), SchemaError> {
        events
            .into_iter()
            .try_for_each(|event| self.validate_event(event))
    }

    pub fn validate_subset_of_schema(&self, other: &EventContainerSchema) -> Result<(), SchemaError> {
        for (label, schema) in self.iter_events() {
            let theirs = other.entry(label).ok_or_else(|| SchemaError::NotSubset {
                name: label.unwrap_or("None").to_string(),
                reason: "event label does not appear in the other schema".to_string(),
            })?;
            schema.validate_subset_of_schema(theirs)?;
        }
        Ok(())
    }

    /// Merges a single event schema under its label; all or nothing.
    pub fn merge_event_schema(&mut self, event_schema: &EventSchema) -> Result<(), SchemaError> {
        self.update(event_schema.label.as_deref(), |s| s.merge_schema(event_schema))
    }

    /// Merges `other` label by label; all or nothing.
    pub fn merge_schema(&mut self, other: &EventContainerSchema) -> Result<(), SchemaError> {
        let mut staged = self.clone();
        for (_, event_schema) in other.iter_events() {
            staged.merge_event_schema(event_schema)?;
        }
        tracing::debug!(
            merged = other.iter_events().count(),
            labels = staged.iter_events().count(),
            "merged event container schema"
        );
        *self = staged;
        Ok(())
    }

    /// Builds the smallest schema that every event complies with.
    pub fn build_active_schema<'a, T: Into<EventRef<'a>>>(
        events: impl IntoIterator<Item = T>,
    ) -> Result<Self, SchemaError> {
        let mut schema = Self::new();
        schema.add_events(events)?;
        Ok(schema)
    }

    pub fn attributes(&self) -> Vec<&'static str> {
        vec!["schema"]
    }

    pub fn to_dict(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(self)
    }

    pub fn from_dict(d: &Value) -> Result<Self, SerialError> {
        Ok(Self::deserialize(d)?)
    }

    /// Applies `f` to the schema for `label` (created if missing),
    /// committing only on success.
    fn update(
        &mut self,
        label: Option<&str>,
        f: impl FnOnce(&mut EventSchema) -> Result<(), SchemaError>,
    ) -> Result<(), SchemaError> {
        let mut schema = self
            .entry(label)
            .cloned()
            .unwrap_or_else(|| EventSchema::for_label(label));
        f(&mut schema)?;
        match label {
            Some(label) => {
                self.schema.insert(label.to_string(), schema);
            }
            None => self.unlabeled = Some(schema),
        }
        Ok(())
    }

    fn entry(&self, label: Option<&str>) -> Option<&EventSchema> {
        match label {
            Some(label) => self.schema.get(label),
            None => self.unlabeled.as_ref(),
        }
    }
}
