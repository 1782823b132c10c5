//! Dispatch of serialized video events on their `type` tag.
//!
//! Serialized events name their concrete type in a `type` field. A
//! registry maps those tags to constructors, so that libraries building on
//! this crate can register their own event types and still be decoded
//! through [`VideoEvent::from_dict`].

use serde_json::Value;
use std::collections::HashMap;
use std::sync::OnceLock;

use super::video::{VideoEvent, VIDEO_EVENT_TYPE};
use crate::error::SerialError;

/// Builds a video event from its dictionary form.
pub type EventConstructor = fn(&Value) -> Result<VideoEvent, SerialError>;

/// A mapping from `type` tag to event constructor.
///
/// Dictionaries without a `type` tag decode as plain [`VideoEvent`]s; a
/// tag that is not registered is an error.
#[derive(Clone, Debug)]
pub struct EventTypeRegistry {
    constructors: HashMap<String, EventConstructor>,
}

impl Default for EventTypeRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(VIDEO_EVENT_TYPE, VideoEvent::decode_dict);
        registry
    }
}

impl EventTypeRegistry {
    /// Creates a registry with the built-in event types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that knows no tags at all.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// The shared registry holding only the built-in event types.
    pub fn builtin() -> &'static EventTypeRegistry {
        static BUILTIN: OnceLock<EventTypeRegistry> = OnceLock::new();
        BUILTIN.get_or_init(EventTypeRegistry::default)
    }

    /// Registers `constructor` for `tag`, replacing any previous one.
    pub fn register(&mut self, tag: impl Into<String>, constructor: EventConstructor) {
        self.constructors.insert(tag.into(), constructor);
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.constructors.contains_key(tag)
    }

    /// Decodes `d` with the constructor registered for its `type` tag.
    pub fn from_dict(&self, d: &Value) -> Result<VideoEvent, SerialError> {
        match d.get("type").and_then(Value::as_str) {
            None => VideoEvent::decode_dict(d),
            Some(tag) => {
                let constructor = self
                    .constructors
                    .get(tag)
                    .ok_or_else(|| SerialError::UnknownType(tag.to_string()))?;
                constructor(d)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode_with_default_label(d: &Value) -> Result<VideoEvent, SerialError> {
        let mut event = VideoEvent::decode_dict(d)?;
        event.label.get_or_insert_with(|| "unlabeled".to_string());
        Ok(event)
    }

    #[test]
    fn test_untagged_dict_decodes_as_video_event() {
        let event = EventTypeRegistry::builtin()
            .from_dict(&json!({"label": "crash"}))
            .unwrap();
        assert_eq!(event.label.as_deref(), Some("crash"));
        assert_eq!(event.event_type, VIDEO_EVENT_TYPE);
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let err = VideoEvent::from_dict(&json!({"type": "acme.Mystery"})).unwrap_err();
        assert!(matches!(err, SerialError::UnknownType(tag) if tag == "acme.Mystery"));
    }

    #[test]
    fn test_registered_constructor_is_used() {
        let mut registry = EventTypeRegistry::new();
        registry.register("acme.Incident", decode_with_default_label);
        assert!(registry.is_registered("acme.Incident"));
        assert!(!EventTypeRegistry::builtin().is_registered("acme.Incident"));

        let event = registry
            .from_dict(&json!({"type": "acme.Incident"}))
            .unwrap();
        assert_eq!(event.label.as_deref(), Some("unlabeled"));
        assert_eq!(event.event_type, "acme.Incident");
    }
}
