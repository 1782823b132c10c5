//! JSON files of events and schemas.
//!
//! Events are stored in their dictionary form: a `VideoEventContainer`
//! serializes as `{"events": [...]}`, each event carrying its `type` tag,
//! and an `EventContainerSchema` as `{"schema": {label: ...}}`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{EventlabelError, SerialError};
use crate::events::{EventContainerSchema, VideoEventContainer};

/// Reads a video event container from a JSON file.
///
/// # Errors
/// Returns an error if the file cannot be read or parsed, or if an event
/// has an unknown `type` tag.
pub fn read_events_json(path: &Path) -> Result<VideoEventContainer, EventlabelError> {
    read_json(path)
}

/// Reads an event container schema from a JSON file.
pub fn read_schema_json(path: &Path) -> Result<EventContainerSchema, EventlabelError> {
    read_json(path)
}

/// Writes any label type to a JSON file, pretty-printed.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), EventlabelError> {
    let file = File::create(path).map_err(EventlabelError::Io)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(EventlabelError::JsonWrite)?;
    writer.flush().map_err(EventlabelError::Io)
}

/// Parses a video event container from a JSON string.
///
/// Useful for testing without file I/O.
pub fn from_json_str(json: &str) -> Result<VideoEventContainer, SerialError> {
    Ok(serde_json::from_str(json)?)
}

/// Serializes a video event container to a pretty JSON string.
pub fn to_json_string(events: &VideoEventContainer) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(events)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, EventlabelError> {
    let file = File::open(path).map_err(EventlabelError::Io)?;
    let reader = BufReader::new(file);

    serde_json::from_reader(reader).map_err(|e| EventlabelError::JsonParse {
        path: path.to_path_buf(),
        source: SerialError::Json(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::Attribute;
    use crate::events::VideoEvent;

    fn sample_events() -> VideoEventContainer {
        let mut event = VideoEvent::build_simple(10, 12, "crossing", Some(0.95), Some(1), None)
            .with_attribute(Attribute::categorical("weather", "rain"));
        event.add_frame_attribute(Attribute::boolean("occluded", true), 11);
        vec![event, VideoEvent::new().with_label("turn")].into()
    }

    #[test]
    fn test_json_roundtrip() {
        let original = sample_events();
        let json = to_json_string(&original).expect("serialization failed");
        let restored = from_json_str(&json).expect("deserialization failed");
        assert_eq!(restored, original);
    }

    #[test]
    fn test_json_format() {
        let json = to_json_string(&sample_events()).expect("serialization failed");
        assert!(json.contains("\"events\""));
        assert!(json.contains("\"eventlabel.events.VideoEvent\""));
        assert!(json.contains("\"11\""));
        assert!(json.contains("\"support\""));
    }

    #[test]
    fn test_unknown_type_tag_is_rejected() {
        let err = from_json_str(r#"{"events": [{"type": "acme.Mystery"}]}"#).unwrap_err();
        assert!(err.to_string().contains("acme.Mystery"));
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("events.json");
        let events = sample_events();
        write_json(&path, &events).expect("write failed");
        assert_eq!(read_events_json(&path).expect("read failed"), events);

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            read_events_json(&missing),
            Err(EventlabelError::Io(_))
        ));
    }

    #[test]
    fn test_parse_error_names_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schema.json");
        std::fs::write(&path, "{ not json").expect("write failed");
        let err = read_schema_json(&path).unwrap_err();
        assert!(err.to_string().contains("schema.json"));
    }
}
