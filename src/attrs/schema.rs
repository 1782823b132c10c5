use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::attribute::{Attribute, AttributeContainer, AttributeKind, AttributeValue};
use crate::error::SchemaError;

/// The allowed values of a single named attribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AttributeSchema {
    Categorical {
        #[serde(default)]
        categories: BTreeSet<String>,
    },
    Numeric {
        /// Inclusive `[min, max]`; `None` until a value has been seen.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        range: Option<(f64, f64)>,
    },
    Boolean {
        #[serde(default)]
        values: BTreeSet<bool>,
    },
}

impl AttributeSchema {
    /// Creates an empty schema of the given kind.
    pub fn empty(kind: AttributeKind) -> Self {
        match kind {
            AttributeKind::Categorical => AttributeSchema::Categorical {
                categories: BTreeSet::new(),
            },
            AttributeKind::Numeric => AttributeSchema::Numeric { range: None },
            AttributeKind::Boolean => AttributeSchema::Boolean {
                values: BTreeSet::new(),
            },
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeSchema::Categorical { .. } => AttributeKind::Categorical,
            AttributeSchema::Numeric { .. } => AttributeKind::Numeric,
            AttributeSchema::Boolean { .. } => AttributeKind::Boolean,
        }
    }

    /// Returns true if `value` is of the right kind and allowed.
    pub fn allows(&self, value: &AttributeValue) -> bool {
        match (self, value) {
            (AttributeSchema::Categorical { categories }, AttributeValue::Categorical(v)) => {
                categories.contains(v)
            }
            (AttributeSchema::Numeric { range }, AttributeValue::Numeric(v)) => {
                range.is_some_and(|(lo, hi)| lo <= *v && *v <= hi)
            }
            (AttributeSchema::Boolean { values }, AttributeValue::Boolean(v)) => {
                values.contains(v)
            }
            _ => false,
        }
    }

    /// Validates that `attr` complies with this schema.
    pub fn validate_attribute(&self, attr: &Attribute) -> Result<(), SchemaError> {
        self.validate_kind(&attr.name, attr.kind())?;
        validate_finite(attr)?;
        if !self.allows(&attr.value) {
            return Err(SchemaError::InvalidAttributeValue {
                name: attr.name.clone(),
                value: attr.value.to_string(),
            });
        }
        Ok(())
    }

    /// Grows the schema so that it allows `attr`.
    ///
    /// Fails without modifying the schema if the kinds differ or the value
    /// is a non-finite number, which no range can hold.
    pub fn add_attribute(&mut self, attr: &Attribute) -> Result<(), SchemaError> {
        self.validate_kind(&attr.name, attr.kind())?;
        validate_finite(attr)?;
        self.grow(&attr.value);
        Ok(())
    }

    /// Unions the allowed values of `other` into this schema.
    pub fn merge_schema(&mut self, name: &str, other: &AttributeSchema) -> Result<(), SchemaError> {
        self.validate_kind(name, other.kind())?;
        match (self, other) {
            (
                AttributeSchema::Categorical { categories },
                AttributeSchema::Categorical { categories: theirs },
            ) => categories.extend(theirs.iter().cloned()),
            (AttributeSchema::Numeric { range }, AttributeSchema::Numeric { range: theirs }) => {
                *range = union_range(*range, *theirs);
            }
            (AttributeSchema::Boolean { values }, AttributeSchema::Boolean { values: theirs }) => {
                values.extend(theirs.iter().copied());
            }
            _ => unreachable!("kinds checked above"),
        }
        Ok(())
    }

    /// Validates that every value this schema allows is allowed by `other`.
    pub fn validate_subset_of_schema(
        &self,
        name: &str,
        other: &AttributeSchema,
    ) -> Result<(), SchemaError> {
        self.validate_kind(name, other.kind())?;
        let not_subset = |reason: String| SchemaError::NotSubset {
            name: name.to_string(),
            reason,
        };
        match (self, other) {
            (
                AttributeSchema::Categorical { categories },
                AttributeSchema::Categorical { categories: theirs },
            ) => {
                if let Some(extra) = categories.difference(theirs).next() {
                    return Err(not_subset(format!("category '{}' is not allowed", extra)));
                }
            }
            (AttributeSchema::Numeric { range }, AttributeSchema::Numeric { range: theirs }) => {
                match (range, theirs) {
                    (None, _) => {}
                    (Some((lo, hi)), Some((their_lo, their_hi)))
                        if their_lo <= lo && hi <= their_hi => {}
                    (Some((lo, hi)), _) => {
                        return Err(not_subset(format!("range [{}, {}] is not covered", lo, hi)));
                    }
                }
            }
            (AttributeSchema::Boolean { values }, AttributeSchema::Boolean { values: theirs }) => {
                if let Some(extra) = values.difference(theirs).next() {
                    return Err(not_subset(format!("value {} is not allowed", extra)));
                }
            }
            _ => unreachable!("kinds checked above"),
        }
        Ok(())
    }

    fn validate_kind(&self, name: &str, found: AttributeKind) -> Result<(), SchemaError> {
        if self.kind() != found {
            return Err(SchemaError::AttributeKindMismatch {
                name: name.to_string(),
                expected: self.kind().as_str(),
                found: found.as_str(),
            });
        }
        Ok(())
    }

    fn grow(&mut self, value: &AttributeValue) {
        match (self, value) {
            (AttributeSchema::Categorical { categories }, AttributeValue::Categorical(v)) => {
                categories.insert(v.clone());
            }
            (AttributeSchema::Numeric { range }, AttributeValue::Numeric(v)) => {
                *range = union_range(*range, Some((*v, *v)));
            }
            (AttributeSchema::Boolean { values }, AttributeValue::Boolean(v)) => {
                values.insert(*v);
            }
            _ => {}
        }
    }
}

fn validate_finite(attr: &Attribute) -> Result<(), SchemaError> {
    match attr.value {
        AttributeValue::Numeric(v) if !v.is_finite() => Err(SchemaError::NonFiniteAttributeValue {
            name: attr.name.clone(),
            value: v,
        }),
        _ => Ok(()),
    }
}

fn union_range(a: Option<(f64, f64)>, b: Option<(f64, f64)>) -> Option<(f64, f64)> {
    match (a, b) {
        (Some((alo, ahi)), Some((blo, bhi))) => Some((alo.min(blo), ahi.max(bhi))),
        (a, None) => a,
        (None, b) => b,
    }
}

/// A mapping from attribute name to [`AttributeSchema`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeContainerSchema {
    #[serde(default)]
    pub schema: BTreeMap<String, AttributeSchema>,
}

impl AttributeContainerSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_empty()
    }

    pub fn iter_attribute_names(&self) -> impl Iterator<Item = &str> {
        self.schema.keys().map(String::as_str)
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.schema.contains_key(name)
    }

    /// Returns the schema of the named attribute, or a not-found error.
    pub fn get_attribute_schema(&self, name: &str) -> Result<&AttributeSchema, SchemaError> {
        self.schema
            .get(name)
            .ok_or_else(|| SchemaError::UnknownAttribute(name.to_string()))
    }

    /// Returns the value kind of the named attribute.
    pub fn get_attribute_kind(&self, name: &str) -> Result<AttributeKind, SchemaError> {
        self.get_attribute_schema(name).map(AttributeSchema::kind)
    }

    /// Grows the schema so that it allows `attr`.
    pub fn add_attribute(&mut self, attr: &Attribute) -> Result<(), SchemaError> {
        match self.schema.get_mut(&attr.name) {
            Some(schema) => schema.add_attribute(attr),
            None => {
                let mut schema = AttributeSchema::empty(attr.kind());
                schema.add_attribute(attr)?;
                self.schema.insert(attr.name.clone(), schema);
                Ok(())
            }
        }
    }

    /// Grows the schema so that it allows every attribute in `attrs`.
    ///
    /// Either every attribute is added or, on error, none is.
    pub fn add_attributes(&mut self, attrs: &AttributeContainer) -> Result<(), SchemaError> {
        let mut staged = self.clone();
        for attr in attrs {
            staged.add_attribute(attr)?;
        }
        *self = staged;
        Ok(())
    }

    pub fn validate_attribute_name(&self, name: &str) -> Result<(), SchemaError> {
        self.get_attribute_schema(name).map(|_| ())
    }

    pub fn validate_attribute(&self, attr: &Attribute) -> Result<(), SchemaError> {
        self.get_attribute_schema(&attr.name)?
            .validate_attribute(attr)
    }

    /// Validates every attribute of the container.
    pub fn validate(&self, attrs: &AttributeContainer) -> Result<(), SchemaError> {
        attrs.iter().try_for_each(|attr| self.validate_attribute(attr))
    }

    pub fn is_valid_attribute(&self, attr: &Attribute) -> bool {
        self.validate_attribute(attr).is_ok()
    }

    pub fn is_valid_attributes(&self, attrs: &AttributeContainer) -> bool {
        self.validate(attrs).is_ok()
    }

    /// Validates that this schema allows nothing `other` does not.
    pub fn validate_subset_of_schema(
        &self,
        other: &AttributeContainerSchema,
    ) -> Result<(), SchemaError> {
        for (name, schema) in &self.schema {
            let theirs = other.schema.get(name).ok_or_else(|| SchemaError::NotSubset {
                name: name.clone(),
                reason: "attribute does not appear in the other schema".to_string(),
            })?;
            schema.validate_subset_of_schema(name, theirs)?;
        }
        Ok(())
    }

    /// Unions `other` into this schema, attribute by attribute.
    ///
    /// Either the whole merge applies or, on a kind conflict, nothing does.
    pub fn merge_schema(&mut self, other: &AttributeContainerSchema) -> Result<(), SchemaError> {
        let mut staged = self.schema.clone();
        for (name, theirs) in &other.schema {
            match staged.get_mut(name) {
                Some(schema) => schema.merge_schema(name, theirs)?,
                None => {
                    staged.insert(name.clone(), theirs.clone());
                }
            }
        }
        self.schema = staged;
        Ok(())
    }

    /// Builds the schema that exactly describes `attrs`.
    pub fn build_active_schema(attrs: &AttributeContainer) -> Result<Self, SchemaError> {
        let mut schema = Self::new();
        schema.add_attributes(attrs)?;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather() -> AttributeContainer {
        vec![
            Attribute::categorical("weather", "rain"),
            Attribute::numeric("speed", 2.0),
            Attribute::numeric("speed", 5.0),
            Attribute::boolean("night", false),
        ]
        .into()
    }

    #[test]
    fn test_active_schema_validates_its_source() {
        let attrs = weather();
        let schema = AttributeContainerSchema::build_active_schema(&attrs).unwrap();
        assert!(schema.is_valid_attributes(&attrs));
        assert_eq!(
            schema.get_attribute_schema("speed").unwrap(),
            &AttributeSchema::Numeric {
                range: Some((2.0, 5.0))
            }
        );
    }

    #[test]
    fn test_validate_reports_offending_attribute() {
        let schema = AttributeContainerSchema::build_active_schema(&weather()).unwrap();

        let err = schema
            .validate_attribute(&Attribute::categorical("weather", "snow"))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidAttributeValue {
                name: "weather".into(),
                value: "'snow'".into()
            }
        );

        let err = schema
            .validate_attribute(&Attribute::boolean("fog", true))
            .unwrap_err();
        assert_eq!(err, SchemaError::UnknownAttribute("fog".into()));

        let err = schema
            .validate_attribute(&Attribute::numeric("weather", 1.0))
            .unwrap_err();
        assert!(matches!(err, SchemaError::AttributeKindMismatch { .. }));
    }

    #[test]
    fn test_add_attributes_is_all_or_nothing() {
        let mut schema = AttributeContainerSchema::build_active_schema(&weather()).unwrap();
        let before = schema.clone();

        let bad: AttributeContainer = vec![
            Attribute::categorical("lane", "left"),
            Attribute::categorical("speed", "fast"),
        ]
        .into();
        assert!(schema.add_attributes(&bad).is_err());
        assert_eq!(schema, before);
    }

    #[test]
    fn test_merge_is_commutative() {
        let a = AttributeContainerSchema::build_active_schema(&weather()).unwrap();
        let b = AttributeContainerSchema::build_active_schema(
            &vec![
                Attribute::categorical("weather", "sun"),
                Attribute::numeric("speed", 9.0),
            ]
            .into(),
        )
        .unwrap();

        let mut ab = a.clone();
        ab.merge_schema(&b).unwrap();
        let mut ba = b.clone();
        ba.merge_schema(&a).unwrap();
        assert_eq!(ab, ba);

        let mut again = ab.clone();
        again.merge_schema(&ab).unwrap();
        assert_eq!(again, ab);
    }

    #[test]
    fn test_subset() {
        let small = AttributeContainerSchema::build_active_schema(&weather()).unwrap();
        let mut large = small.clone();
        large
            .add_attribute(&Attribute::categorical("weather", "fog"))
            .unwrap();
        large.add_attribute(&Attribute::numeric("speed", 10.0)).unwrap();

        assert!(small.validate_subset_of_schema(&large).is_ok());
        assert!(small.validate_subset_of_schema(&small).is_ok());
        assert!(matches!(
            large.validate_subset_of_schema(&small),
            Err(SchemaError::NotSubset { .. })
        ));
    }

    #[test]
    fn test_filter_removes_disallowed_attributes() {
        let schema = AttributeContainerSchema::build_active_schema(
            &vec![Attribute::categorical("weather", "rain")].into(),
        )
        .unwrap();
        let mut attrs = weather();
        assert_eq!(attrs.filter_by_schema(&schema), 3);
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_schema_serde_shape() {
        let schema = AttributeContainerSchema::build_active_schema(&weather()).unwrap();
        let json = serde_json::to_value(&schema).unwrap();
        assert_eq!(json["schema"]["weather"]["type"], "categorical");
        assert_eq!(json["schema"]["weather"]["categories"][0], "rain");

        let restored: AttributeContainerSchema = serde_json::from_value(json).unwrap();
        assert_eq!(restored, schema);
    }

    #[test]
    fn test_non_finite_numeric_is_rejected() {
        let mut schema = AttributeContainerSchema::new();
        let nan = Attribute::numeric("speed", f64::NAN);
        assert!(matches!(
            schema.add_attribute(&nan).unwrap_err(),
            SchemaError::NonFiniteAttributeValue { ref name, value } if name == "speed" && value.is_nan()
        ));
        assert!(schema.is_empty());

        schema.add_attribute(&Attribute::numeric("speed", 1.0)).unwrap();
        let before = schema.clone();
        let attrs: AttributeContainer = vec![
            Attribute::numeric("speed", 2.0),
            Attribute::numeric("speed", f64::INFINITY),
        ]
        .into();
        assert!(matches!(
            schema.add_attributes(&attrs),
            Err(SchemaError::NonFiniteAttributeValue { .. })
        ));
        assert_eq!(schema, before);
        assert!(matches!(
            schema.validate_attribute(&nan),
            Err(SchemaError::NonFiniteAttributeValue { .. })
        ));
    }
}
