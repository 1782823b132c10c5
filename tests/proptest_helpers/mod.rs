#![allow(dead_code)]

use std::collections::BTreeMap;

use eventlabel::attrs::Attribute;
use eventlabel::frames::FrameRanges;
use eventlabel::objects::{DetectedObject, VideoObject};
use eventlabel::{VideoEvent, VideoEventContainer};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};
use uuid::Uuid;

pub const EVENT_LABELS: &[&str] = &["crossing", "turn", "jump"];
pub const WEATHER: &[&str] = &["rain", "sun", "fog"];

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Confidences are multiples of 0.01 so they survive a JSON round trip
/// without tolerance checks.
pub fn arb_confidence() -> impl Strategy<Value = Option<f64>> {
    proptest::option::of((0u32..=100).prop_map(|n| n as f64 / 100.0))
}

pub fn arb_uuid() -> impl Strategy<Value = Option<Uuid>> {
    proptest::option::of(any::<u128>().prop_map(Uuid::from_u128))
}

/// Per-frame state: the `occluded` flag and, optionally, a detected
/// `person` with its `moving` flag.
fn arb_frames(max_frame: u64) -> impl Strategy<Value = BTreeMap<u64, (bool, Option<bool>)>> {
    proptest::collection::btree_map(
        0..max_frame,
        (any::<bool>(), proptest::option::of(any::<bool>())),
        0..6,
    )
}

/// A temporal `car` object with `moving` detections.
fn arb_video_object(max_frame: u64) -> impl Strategy<Value = VideoObject> {
    (
        arb_uuid(),
        proptest::collection::btree_map(0..max_frame, any::<bool>(), 1..4),
    )
        .prop_map(|(uuid, detections)| {
            let mut obj = VideoObject::new("car");
            obj.uuid = uuid;
            for (frame, moving) in detections {
                obj.add_detection(
                    DetectedObject::new("car").with_attribute(Attribute::boolean("moving", moving)),
                    Some(frame),
                )
                .expect("frame number given");
            }
            obj
        })
}

/// Video events, labeled or not, whose attribute names always keep the
/// same kind, so any mix of them has an active schema.
pub fn arb_video_event(max_frame: u64) -> BoxedStrategy<VideoEvent> {
    (
        proptest::option::of(proptest::sample::select(EVENT_LABELS)),
        arb_confidence(),
        proptest::option::of(0i64..50),
        arb_uuid(),
        proptest::option::of(proptest::sample::select(WEATHER)),
        arb_frames(max_frame),
        proptest::option::of(arb_video_object(max_frame)),
        proptest::option::of((0..max_frame, 0..max_frame)),
    )
        .prop_map(
            |(label, confidence, index, uuid, weather, frames, object, support)| {
                let mut event = VideoEvent::new();
                event.label = label.map(str::to_string);
                event.confidence = confidence;
                event.index = index;
                event.uuid = uuid;
                if let Some(weather) = weather {
                    event.add_event_attribute(Attribute::categorical("weather", weather));
                }
                for (frame, (occluded, person)) in frames {
                    event.add_frame_attribute(Attribute::boolean("occluded", occluded), frame);
                    if let Some(moving) = person {
                        event
                            .add_object(
                                DetectedObject::new("person")
                                    .with_attribute(Attribute::boolean("moving", moving)),
                                Some(frame),
                            )
                            .expect("frame number given");
                    }
                }
                if let Some(object) = object {
                    event.add_object(object, None).expect("video object");
                }
                if let Some((first, last)) = support {
                    event.support = Some(FrameRanges::build_simple(first, last));
                }
                event
            },
        )
        .boxed()
}

pub fn arb_video_events(max_events: usize, max_frame: u64) -> BoxedStrategy<VideoEventContainer> {
    proptest::collection::vec(arb_video_event(max_frame), 0..=max_events)
        .prop_map(VideoEventContainer::from)
        .boxed()
}
