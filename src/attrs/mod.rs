//! Attributes and attribute schemas.
//!
//! Attributes are named values (categorical, numeric or boolean) attached to
//! events and objects at either the time-invariant level or the per-frame
//! level. An [`AttributeContainerSchema`] describes which names and values
//! are allowed and supports the same validate / subset / merge algebra as
//! the event schemas built on top of it.

mod attribute;
mod schema;

pub use attribute::{Attribute, AttributeContainer, AttributeKind, AttributeValue};
pub use schema::{AttributeContainerSchema, AttributeSchema};
