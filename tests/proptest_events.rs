use eventlabel::attrs::Attribute;
use eventlabel::events::VideoEventFrameRenderer;
use eventlabel::io_json::{from_json_str, to_json_string};
use eventlabel::labels::{FrameRenderer, HasLabelsSupport};
use eventlabel::{EventContainerSchema, VideoEvent};
use proptest::prelude::*;

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn events_json_roundtrip_is_lossless(events in proptest_helpers::arb_video_events(4, 20)) {
        let json = to_json_string(&events).expect("serialize events");
        let restored = from_json_str(&json).expect("parse events");

        prop_assert_eq!(events, restored);
    }

    #[test]
    fn event_dict_roundtrip_is_lossless(event in proptest_helpers::arb_video_event(20)) {
        let dict = event.to_dict().expect("to_dict");
        let restored = VideoEvent::from_dict(&dict).expect("from_dict");

        prop_assert_eq!(event, restored);
    }

    #[test]
    fn active_schema_validates_its_events(events in proptest_helpers::arb_video_events(4, 20)) {
        let schema = EventContainerSchema::build_active_schema(&events).expect("active schema");

        prop_assert!(schema.validate(&events).is_ok());
        for event in &events {
            prop_assert!(schema.validate_event(event).is_ok());
        }
    }

    #[test]
    fn schema_is_subset_of_itself(events in proptest_helpers::arb_video_events(4, 20)) {
        let schema = EventContainerSchema::build_active_schema(&events).expect("active schema");

        prop_assert!(schema.validate_subset_of_schema(&schema).is_ok());
    }

    #[test]
    fn merged_schema_contains_both_inputs(
        a in proptest_helpers::arb_video_events(3, 20),
        b in proptest_helpers::arb_video_events(3, 20),
    ) {
        let schema_a = EventContainerSchema::build_active_schema(&a).expect("schema a");
        let schema_b = EventContainerSchema::build_active_schema(&b).expect("schema b");

        let mut merged = schema_a.clone();
        merged.merge_schema(&schema_b).expect("merge");

        prop_assert!(schema_a.validate_subset_of_schema(&merged).is_ok());
        prop_assert!(schema_b.validate_subset_of_schema(&merged).is_ok());
        prop_assert!(merged.validate(&a).is_ok());
        prop_assert!(merged.validate(&b).is_ok());
    }

    #[test]
    fn subset_is_transitive_across_grown_schemas(
        a in proptest_helpers::arb_video_events(3, 20),
        b in proptest_helpers::arb_video_events(3, 20),
        c in proptest_helpers::arb_video_events(3, 20),
        extra_label in proptest::option::of(proptest::sample::select(proptest_helpers::EVENT_LABELS)),
        night in any::<bool>(),
    ) {
        let s1 = EventContainerSchema::build_active_schema(&a).expect("schema a");

        let mut s2 = s1.clone();
        s2.add_events(&b).expect("grow with b");

        let mut s3 = s2.clone();
        s3.add_events(&c).expect("grow with c");
        s3.ensure_event_label(extra_label)
            .add_event_attribute(&Attribute::boolean("night", night))
            .expect("grow with attribute");

        prop_assert!(s1.validate_subset_of_schema(&s2).is_ok());
        prop_assert!(s2.validate_subset_of_schema(&s3).is_ok());
        prop_assert!(s1.validate_subset_of_schema(&s3).is_ok());
        prop_assert!(s3.validate(&a).is_ok());
    }

    #[test]
    fn rendered_frames_cover_exactly_the_support(event in proptest_helpers::arb_video_event(20)) {
        let before = event.clone();
        let frames = VideoEventFrameRenderer::new(&event).render_all_frames();

        let rendered: Vec<u64> = frames.keys().copied().collect();
        let expected: Vec<u64> = event.support().iter().collect();
        prop_assert_eq!(rendered, expected);
        prop_assert_eq!(&event, &before);

        for (frame, devent) in &frames {
            prop_assert_eq!(devent.frame_number, Some(*frame));
            prop_assert_eq!(&devent.label, &event.label);
            prop_assert_eq!(devent.confidence, event.confidence);
        }
    }

    #[test]
    fn sort_by_confidence_puts_none_last(
        mut events in proptest_helpers::arb_video_events(6, 5),
        reverse in any::<bool>(),
    ) {
        events.sort_by_confidence(reverse);
        let confidences: Vec<Option<f64>> = events.iter().map(|e| e.confidence).collect();

        let first_none = confidences.iter().position(Option::is_none).unwrap_or(confidences.len());
        prop_assert!(confidences[first_none..].iter().all(Option::is_none));

        let known: Vec<f64> = confidences[..first_none].iter().flatten().copied().collect();
        for pair in known.windows(2) {
            if reverse {
                prop_assert!(pair[0] >= pair[1]);
            } else {
                prop_assert!(pair[0] <= pair[1]);
            }
        }
    }
}
