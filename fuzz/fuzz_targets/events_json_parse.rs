//! Fuzz target for video event JSON parsing.
//!
//! Feeds arbitrary byte sequences to the event container parser; anything
//! that parses is rendered and has its active schema built, checking for
//! panics, crashes, or hangs along the way.

#![no_main]

use eventlabel::events::VideoEventContainerFrameRenderer;
use eventlabel::labels::{FrameRenderer, HasLabelsSupport};
use eventlabel::{EventContainerSchema, VideoEventContainer};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    let Ok(events) = serde_json::from_slice::<VideoEventContainer>(data) else {
        return;
    };

    // Supports can span huge ranges; only render the first frame of each.
    let renderer = VideoEventContainerFrameRenderer::new(&events);
    for event in &events {
        if let Some(first) = event.support().first() {
            let _ = renderer.render_frame(first);
        }
    }
    let _ = EventContainerSchema::build_active_schema(&events);
});
