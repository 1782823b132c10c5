use serde::{Deserialize, Serialize};
use std::fmt;

use super::schema::AttributeContainerSchema;

/// The kind of value an attribute carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Categorical,
    Numeric,
    Boolean,
}

impl AttributeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::Categorical => "categorical",
            AttributeKind::Numeric => "numeric",
            AttributeKind::Boolean => "boolean",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of an attribute.
///
/// Serialized as a bare JSON boolean, number or string.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Boolean(bool),
    Numeric(f64),
    Categorical(String),
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Boolean(_) => AttributeKind::Boolean,
            AttributeValue::Numeric(_) => AttributeKind::Numeric,
            AttributeValue::Categorical(_) => AttributeKind::Categorical,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Boolean(v) => write!(f, "{}", v),
            AttributeValue::Numeric(v) => write!(f, "{}", v),
            AttributeValue::Categorical(v) => write!(f, "'{}'", v),
        }
    }
}

/// A named value with an optional confidence in `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: AttributeValue) -> Self {
        Self {
            name: name.into(),
            value,
            confidence: None,
        }
    }

    pub fn categorical(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, AttributeValue::Categorical(value.into()))
    }

    pub fn numeric(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, AttributeValue::Numeric(value))
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self::new(name, AttributeValue::Boolean(value))
    }

    /// Adds a confidence to the attribute.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn kind(&self) -> AttributeKind {
        self.value.kind()
    }
}

/// An ordered collection of attributes.
///
/// Order is meaningful: rendering prepends inherited attributes so that
/// they precede the frame's own.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeContainer {
    attrs: Vec<Attribute>,
}

impl AttributeContainer {
    pub fn new() -> Self {
        Self { attrs: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.attrs.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Attribute> {
        self.attrs.iter_mut()
    }

    pub fn add(&mut self, attr: Attribute) {
        self.attrs.push(attr);
    }

    pub fn add_container(&mut self, other: AttributeContainer) {
        self.attrs.extend(other.attrs);
    }

    /// Inserts the attributes of `other` before the existing ones,
    /// preserving their relative order.
    pub fn prepend_container(&mut self, other: AttributeContainer) {
        let mut attrs = other.attrs;
        attrs.append(&mut self.attrs);
        self.attrs = attrs;
    }

    /// Returns the first attribute with the given name.
    pub fn get_attr_with_name(&self, name: &str) -> Option<&Attribute> {
        self.attrs.iter().find(|a| a.name == name)
    }

    /// Returns the distinct attribute names, in first-seen order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for attr in &self.attrs {
            if !names.contains(&attr.name.as_str()) {
                names.push(&attr.name);
            }
        }
        names
    }

    /// Keeps only the attributes for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&Attribute) -> bool) {
        self.attrs.retain(keep);
    }

    /// Removes every attribute that the schema does not allow.
    ///
    /// Returns the number of attributes removed.
    pub fn filter_by_schema(&mut self, schema: &AttributeContainerSchema) -> usize {
        let before = self.attrs.len();
        self.attrs.retain(|attr| schema.is_valid_attribute(attr));
        before - self.attrs.len()
    }

    pub fn clear(&mut self) {
        self.attrs.clear();
    }
}

impl From<Vec<Attribute>> for AttributeContainer {
    fn from(attrs: Vec<Attribute>) -> Self {
        Self { attrs }
    }
}

impl FromIterator<Attribute> for AttributeContainer {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self {
            attrs: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a AttributeContainer {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.iter()
    }
}

impl IntoIterator for AttributeContainer {
    type Item = Attribute;
    type IntoIter = std::vec::IntoIter<Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.into_iter()
    }
}
