use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ObjectRef;
use crate::attrs::{Attribute, AttributeContainer, AttributeContainerSchema, AttributeSchema};
use crate::error::SchemaError;

/// Schema for the objects of one label, or for unlabeled objects when
/// `label` is `None`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectSchema {
    #[serde(default)]
    pub label: Option<String>,

    /// Object-level attributes of `VideoObject`s.
    #[serde(default, skip_serializing_if = "AttributeContainerSchema::is_empty")]
    pub attrs: AttributeContainerSchema,

    /// Frame-level attributes (including those of `DetectedObject`s).
    #[serde(default, skip_serializing_if = "AttributeContainerSchema::is_empty")]
    pub frames: AttributeContainerSchema,
}

impl ObjectSchema {
    pub fn new(label: impl Into<String>) -> Self {
        let label: String = label.into();
        Self::for_label(Some(&label))
    }

    /// A schema for objects without a label.
    pub fn unlabeled() -> Self {
        Self::for_label(None)
    }

    fn for_label(label: Option<&str>) -> Self {
        Self {
            label: label.map(str::to_string),
            attrs: AttributeContainerSchema::new(),
            frames: AttributeContainerSchema::new(),
        }
    }

    pub fn validate_label(&self, label: Option<&str>) -> Result<(), SchemaError> {
        if label != self.label.as_deref() {
            return Err(SchemaError::LabelMismatch {
                expected: self.label.clone(),
                found: label.map(str::to_string),
            });
        }
        Ok(())
    }

    /// Grows the schema to describe `obj`; all or nothing.
    pub fn add_object(&mut self, obj: ObjectRef<'_>) -> Result<(), SchemaError> {
        self.validate_label(obj.label())?;
        let mut staged = self.clone();
        match obj {
            ObjectRef::Detected(obj) => staged.frames.add_attributes(&obj.attrs)?,
            ObjectRef::Video(obj) => {
                staged.attrs.add_attributes(&obj.attrs)?;
                for dobj in obj.iter_detections() {
                    staged.frames.add_attributes(&dobj.attrs)?;
                }
            }
        }
        *self = staged;
        Ok(())
    }

    pub fn validate_object(&self, obj: ObjectRef<'_>) -> Result<(), SchemaError> {
        self.validate_label(obj.label())?;
        match obj {
            ObjectRef::Detected(obj) => self.frames.validate(&obj.attrs),
            ObjectRef::Video(obj) => {
                self.attrs.validate(&obj.attrs)?;
                obj.iter_detections()
                    .try_for_each(|dobj| self.frames.validate(&dobj.attrs))
            }
        }
    }

    pub fn validate_subset_of_schema(&self, other: &ObjectSchema) -> Result<(), SchemaError> {
        if self.label != other.label {
            return Err(SchemaError::LabelMismatch {
                expected: other.label.clone(),
                found: self.label.clone(),
            });
        }
        self.attrs.validate_subset_of_schema(&other.attrs)?;
        self.frames.validate_subset_of_schema(&other.frames)
    }

    pub fn merge_schema(&mut self, other: &ObjectSchema) -> Result<(), SchemaError> {
        self.validate_label(other.label.as_deref())?;
        let mut staged = self.clone();
        staged.attrs.merge_schema(&other.attrs)?;
        staged.frames.merge_schema(&other.frames)?;
        *self = staged;
        Ok(())
    }
}

/// A mapping from object label to [`ObjectSchema`].
///
/// Unlabeled objects have their own entry, `unlabeled`, which exists only
/// once such an object has been added.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectContainerSchema {
    #[serde(default)]
    pub schema: BTreeMap<String, ObjectSchema>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlabeled: Option<ObjectSchema>,
}

impl ObjectContainerSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_empty() && self.unlabeled.is_none()
    }

    /// Object labels in order, `None` first when unlabeled objects are
    /// allowed.
    pub fn iter_object_labels(&self) -> impl Iterator<Item = Option<&str>> {
        self.iter_objects().map(|(label, _)| label)
    }

    pub fn iter_objects(&self) -> impl Iterator<Item = (Option<&str>, &ObjectSchema)> {
        self.unlabeled.iter().map(|s| (None, s)).chain(
            self.schema
                .iter()
                .map(|(label, s)| (Some(label.as_str()), s)),
        )
    }

    pub fn has_object_label<'a>(&self, label: impl Into<Option<&'a str>>) -> bool {
        self.entry(label.into()).is_some()
    }

    pub fn has_object_attribute(&self, label: &str, attr_name: &str) -> bool {
        self.schema
            .get(label)
            .is_some_and(|s| s.attrs.has_attribute(attr_name))
    }

    pub fn has_frame_attribute(&self, label: &str, attr_name: &str) -> bool {
        self.schema
            .get(label)
            .is_some_and(|s| s.frames.has_attribute(attr_name))
    }

    /// Strict lookup; unknown labels, and `None` without an unlabeled
    /// entry, are a schema error.
    pub fn get_object_schema<'a>(
        &self,
        label: impl Into<Option<&'a str>>,
    ) -> Result<&ObjectSchema, SchemaError> {
        let label = label.into();
        self.entry(label)
            .ok_or_else(|| SchemaError::UnknownObjectLabel(label.map(str::to_string)))
    }

    pub fn get_object_attribute_schema(
        &self,
        label: &str,
        attr_name: &str,
    ) -> Result<&AttributeSchema, SchemaError> {
        self.get_object_schema(label)?
            .attrs
            .get_attribute_schema(attr_name)
    }

    pub fn get_frame_attribute_schema(
        &self,
        label: &str,
        attr_name: &str,
    ) -> Result<&AttributeSchema, SchemaError> {
        self.get_object_schema(label)?
            .frames
            .get_attribute_schema(attr_name)
    }

    /// Returns the schema for `label`, inserting an empty one if needed.
    pub fn ensure_object_label<'a>(
        &mut self,
        label: impl Into<Option<&'a str>>,
    ) -> &mut ObjectSchema {
        match label.into() {
            Some(label) => self
                .schema
                .entry(label.to_string())
                .or_insert_with(|| ObjectSchema::new(label)),
            None => self.unlabeled.get_or_insert_with(ObjectSchema::unlabeled),
        }
    }

    pub fn add_object_label(&mut self, label: &str) {
        self.ensure_object_label(label);
    }

    pub fn add_object_attribute(&mut self, label: &str, attr: &Attribute) -> Result<(), SchemaError> {
        self.update(Some(label), |s| s.attrs.add_attribute(attr))
    }

    pub fn add_object_attributes(
        &mut self,
        label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.update(Some(label), |s| s.attrs.add_attributes(attrs))
    }

    pub fn add_frame_attribute(&mut self, label: &str, attr: &Attribute) -> Result<(), SchemaError> {
        self.update(Some(label), |s| s.frames.add_attribute(attr))
    }

    pub fn add_frame_attributes(
        &mut self,
        label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.update(Some(label), |s| s.frames.add_attributes(attrs))
    }

    /// Adds `obj` under its label; unlabeled objects go to the unlabeled
    /// entry.
    pub fn add_object(&mut self, obj: ObjectRef<'_>) -> Result<(), SchemaError> {
        self.update(obj.label(), |s| s.add_object(obj))
    }

    /// Adds every object; all or nothing.
    pub fn add_objects<'a>(
        &mut self,
        objects: impl IntoIterator<Item = ObjectRef<'a>>,
    ) -> Result<(), SchemaError> {
        let mut staged = self.clone();
        for obj in objects {
            staged.add_object(obj)?;
        }
        *self = staged;
        Ok(())
    }

    pub fn validate_object_label(&self, label: Option<&str>) -> Result<(), SchemaError> {
        self.get_object_schema(label).map(|_| ())
    }

    pub fn validate_object_attribute(&self, label: &str, attr: &Attribute) -> Result<(), SchemaError> {
        self.get_object_schema(label)?.attrs.validate_attribute(attr)
    }

    pub fn validate_object_attributes(
        &self,
        label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.get_object_schema(label)?.attrs.validate(attrs)
    }

    pub fn validate_frame_attribute(&self, label: &str, attr: &Attribute) -> Result<(), SchemaError> {
        self.get_object_schema(label)?.frames.validate_attribute(attr)
    }

    pub fn validate_frame_attributes(
        &self,
        label: &str,
        attrs: &AttributeContainer,
    ) -> Result<(), SchemaError> {
        self.get_object_schema(label)?.frames.validate(attrs)
    }

    pub fn validate_object(&self, obj: ObjectRef<'_>) -> Result<(), SchemaError> {
        self.get_object_schema(obj.label())?.validate_object(obj)
    }

    pub fn is_valid_object_label(&self, label: Option<&str>) -> bool {
        self.validate_object_label(label).is_ok()
    }

    pub fn is_valid_object(&self, obj: ObjectRef<'_>) -> bool {
        self.validate_object(obj).is_ok()
    }

    pub fn validate_subset_of_schema(&self, other: &ObjectContainerSchema) -> Result<(), SchemaError> {
        for (label, schema) in self.iter_objects() {
            let theirs = other.entry(label).ok_or_else(|| SchemaError::NotSubset {
                name: label.unwrap_or("None").to_string(),
                reason: "object label does not appear in the other schema".to_string(),
            })?;
            schema.validate_subset_of_schema(theirs)?;
        }
        Ok(())
    }

    /// Merges `other` label by label; all or nothing.
    pub fn merge_schema(&mut self, other: &ObjectContainerSchema) -> Result<(), SchemaError> {
        let mut staged = self.clone();
        for (label, theirs) in other.iter_objects() {
            staged.ensure_object_label(label).merge_schema(theirs)?;
        }
        *self = staged;
        Ok(())
    }

    fn entry(&self, label: Option<&str>) -> Option<&ObjectSchema> {
        match label {
            Some(label) => self.schema.get(label),
            None => self.unlabeled.as_ref(),
        }
    }

    /// Applies `f` to the schema for `label` (created if missing),
    /// committing only on success.
    fn update(
        &mut self,
        label: Option<&str>,
        f: impl FnOnce(&mut ObjectSchema) -> Result<(), SchemaError>,
    ) -> Result<(), SchemaError> {
        let mut schema = self
            .entry(label)
            .cloned()
            .unwrap_or_else(|| ObjectSchema::for_label(label));
        f(&mut schema)?;
        match label {
            Some(label) => {
                self.schema.insert(label.to_string(), schema);
            }
            None => self.unlabeled = Some(schema),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{DetectedObject, VideoObject};

    #[test]
    fn test_add_and_validate_video_object() {
        let mut obj = VideoObject::new("car").with_attribute(Attribute::categorical("make", "vw"));
        obj.add_detection(
            DetectedObject::default().with_attribute(Attribute::boolean("moving", true)),
            Some(1),
        )
        .unwrap();

        let mut schema = ObjectContainerSchema::new();
        schema.add_object((&obj).into()).unwrap();
        assert!(schema.has_object_attribute("car", "make"));
        assert!(schema.has_frame_attribute("car", "moving"));
        assert!(schema.is_valid_object((&obj).into()));

        let other = VideoObject::new("truck");
        assert_eq!(
            schema.validate_object((&other).into()).unwrap_err(),
            SchemaError::UnknownObjectLabel(Some("truck".into()))
        );
    }

    #[test]
    fn test_failed_add_leaves_schema_unchanged() {
        let mut schema = ObjectContainerSchema::new();
        schema
            .add_frame_attribute("car", &Attribute::boolean("moving", true))
            .unwrap();
        let before = schema.clone();

        let bad = DetectedObject::new("car").with_attribute(Attribute::numeric("moving", 1.0));
        assert!(schema.add_object((&bad).into()).is_err());
        assert_eq!(schema, before);
    }

    #[test]
    fn test_unlabeled_objects_have_their_own_entry() {
        let mut schema = ObjectContainerSchema::new();
        schema.add_object_label("car");
        let unlabeled =
            DetectedObject::default().with_attribute(Attribute::categorical("color", "red"));
        assert_eq!(
            schema.validate_object((&unlabeled).into()).unwrap_err(),
            SchemaError::UnknownObjectLabel(None)
        );

        schema.add_object((&unlabeled).into()).unwrap();
        assert!(schema.has_object_label(None));
        assert!(schema.is_valid_object((&unlabeled).into()));
        assert_eq!(
            schema.iter_object_labels().collect::<Vec<_>>(),
            vec![None, Some("car")]
        );

        let other = DetectedObject::default().with_attribute(Attribute::categorical("color", "blue"));
        assert!(!schema.is_valid_object((&other).into()));
        assert!(!schema.is_valid_object((&DetectedObject::new("bus")).into()));

        let dict = serde_json::to_value(&schema).unwrap();
        assert!(dict["unlabeled"]["label"].is_null());
        let restored: ObjectContainerSchema = serde_json::from_value(dict).unwrap();
        assert_eq!(restored, schema);
    }

    #[test]
    fn test_merge_and_subset() {
        let mut a = ObjectContainerSchema::new();
        a.add_frame_attribute("car", &Attribute::categorical("color", "red"))
            .unwrap();
        let mut b = ObjectContainerSchema::new();
        b.add_frame_attribute("car", &Attribute::categorical("color", "blue"))
            .unwrap();
        b.add_object_label("person");

        assert!(a.validate_subset_of_schema(&b).is_err());

        let mut merged = a.clone();
        merged.merge_schema(&b).unwrap();
        assert!(a.validate_subset_of_schema(&merged).is_ok());
        assert!(b.validate_subset_of_schema(&merged).is_ok());
        assert!(merged.has_object_label("person"));

        let mut c = ObjectContainerSchema::new();
        c.add_object((&DetectedObject::default()).into()).unwrap();
        assert!(c.validate_subset_of_schema(&merged).is_err());
        merged.merge_schema(&c).unwrap();
        assert!(c.validate_subset_of_schema(&merged).is_ok());
    }
}
