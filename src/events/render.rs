//! Projection of video events onto individual frames.

use std::collections::BTreeMap;

use super::detected::{DetectedEvent, DetectedEventContainer};
use super::video::{VideoEvent, VideoEventContainer};
use crate::attrs::AttributeContainer;
use crate::labels::{FrameRenderer, HasLabelsSupport};
use crate::objects::{DetectedObjectContainer, VideoObjectContainerFrameRenderer};

/// Renders a [`VideoEvent`] as one [`DetectedEvent`] per supported frame.
///
/// Each rendered detection starts from a copy of the stored detection (or
/// an empty one carrying only the frame number), gets the event-level
/// attributes prepended and the temporal objects rendered at that frame
/// appended, and finally inherits the event's label, confidence and index
/// where those are set. The event itself is never modified.
pub struct VideoEventFrameRenderer<'a> {
    event: &'a VideoEvent,
}

impl<'a> VideoEventFrameRenderer<'a> {
    pub fn new(event: &'a VideoEvent) -> Self {
        Self { event }
    }

    fn event_attrs(&self) -> Option<AttributeContainer> {
        if !self.event.has_event_attributes() {
            return None;
        }
        Some(self.event.attrs.clone())
    }

    fn render(
        &self,
        frame_number: u64,
        event_attrs: Option<&AttributeContainer>,
        objects: Option<DetectedObjectContainer>,
    ) -> DetectedEvent {
        let mut devent = match self.event.frames.get(&frame_number) {
            Some(devent) => devent.clone(),
            None => DetectedEvent::at_frame(frame_number),
        };
        if let Some(attrs) = event_attrs {
            devent.attrs.prepend_container(attrs.clone());
        }
        if let Some(objects) = objects {
            devent.add_objects(objects);
        }
        if self.event.label.is_some() {
            devent.label = self.event.label.clone();
        }
        if self.event.confidence.is_some() {
            devent.confidence = self.event.confidence;
        }
        if self.event.index.is_some() {
            devent.index = self.event.index;
        }
        devent
    }
}

impl FrameRenderer for VideoEventFrameRenderer<'_> {
    type Frame = DetectedEvent;

    fn render_frame(&self, frame_number: u64) -> Option<DetectedEvent> {
        if !self.event.support().contains(frame_number) {
            return None;
        }
        let objects = if self.event.has_video_objects() {
            VideoObjectContainerFrameRenderer::new(&self.event.objects).render_frame(frame_number)
        } else {
            None
        };
        Some(self.render(frame_number, self.event_attrs().as_ref(), objects))
    }

    fn render_all_frames(&self) -> BTreeMap<u64, DetectedEvent> {
        let event_attrs = self.event_attrs();
        let mut objects = if self.event.has_video_objects() {
            VideoObjectContainerFrameRenderer::new(&self.event.objects).render_all_frames()
        } else {
            BTreeMap::new()
        };

        let support = self.event.support();
        tracing::debug!(
            label = self.event.label.as_deref().unwrap_or("<none>"),
            frames = support.num_frames(),
            "rendering video event"
        );
        support
            .iter()
            .map(|f| {
                let devent = self.render(f, event_attrs.as_ref(), objects.remove(&f));
                (f, devent)
            })
            .collect()
    }
}

/// Renders every event of a [`VideoEventContainer`] and groups the results
/// by frame, preserving container order within each frame.
pub struct VideoEventContainerFrameRenderer<'a> {
    events: &'a VideoEventContainer,
}

impl<'a> VideoEventContainerFrameRenderer<'a> {
    pub fn new(events: &'a VideoEventContainer) -> Self {
        Self { events }
    }
}

impl FrameRenderer for VideoEventContainerFrameRenderer<'_> {
    type Frame = DetectedEventContainer;

    fn render_frame(&self, frame_number: u64) -> Option<DetectedEventContainer> {
        let rendered: DetectedEventContainer = self
            .events
            .iter()
            .filter_map(|event| VideoEventFrameRenderer::new(event).render_frame(frame_number))
            .collect::<Vec<_>>()
            .into();
        if rendered.is_empty() {
            return None;
        }
        Some(rendered)
    }

    fn render_all_frames(&self) -> BTreeMap<u64, DetectedEventContainer> {
        let mut frames: BTreeMap<u64, DetectedEventContainer> = BTreeMap::new();
        for event in self.events {
            for (frame_number, devent) in VideoEventFrameRenderer::new(event).render_all_frames() {
                frames.entry(frame_number).or_default().add(devent);
            }
        }
        frames
    }
}
