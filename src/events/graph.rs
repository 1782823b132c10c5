//! Uuid-keyed storage that resolves the child references of events.
//!
//! Events only record the uuids of their children; the entities
//! themselves live here. A reference whose uuid is not in the graph is
//! reported as dangling rather than treated as an error.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use uuid::Uuid;

use super::video::{VideoEvent, VideoEventContainer};
use crate::error::PreconditionError;
use crate::objects::VideoObject;

/// A child reference that could not be resolved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DanglingChild {
    Object(Uuid),
    Event(Uuid),
}

/// Owns the video objects and video events that child references name.
#[derive(Clone, Debug, Default)]
pub struct LabelGraph {
    objects: BTreeMap<Uuid, VideoObject>,
    events: BTreeMap<Uuid, VideoEvent>,
}

impl LabelGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes every event of the container that has a uuid, along with
    /// each of their temporal objects that has one.
    pub fn from_events(events: &VideoEventContainer) -> Result<Self, PreconditionError> {
        let mut graph = Self::new();
        for event in events {
            for obj in event.iter_video_objects().filter(|o| o.uuid.is_some()) {
                graph.insert_object(obj.clone())?;
            }
            if event.uuid.is_some() {
                graph.insert_event(event.clone())?;
            }
        }
        tracing::debug!(
            objects = graph.objects.len(),
            events = graph.events.len(),
            "indexed label graph"
        );
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.objects.len() + self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty() && self.events.is_empty()
    }

    pub fn insert_object(&mut self, obj: VideoObject) -> Result<(), PreconditionError> {
        let uuid = obj
            .uuid
            .ok_or(PreconditionError::MissingUuid { kind: "VideoObject" })?;
        if self.objects.contains_key(&uuid) {
            return Err(PreconditionError::DuplicateUuid(uuid));
        }
        self.objects.insert(uuid, obj);
        Ok(())
    }

    pub fn insert_event(&mut self, event: VideoEvent) -> Result<(), PreconditionError> {
        let uuid = event
            .uuid
            .ok_or(PreconditionError::MissingUuid { kind: "VideoEvent" })?;
        if self.events.contains_key(&uuid) {
            return Err(PreconditionError::DuplicateUuid(uuid));
        }
        self.events.insert(uuid, event);
        Ok(())
    }

    pub fn get_object(&self, uuid: &Uuid) -> Option<&VideoObject> {
        self.objects.get(uuid)
    }

    pub fn get_event(&self, uuid: &Uuid) -> Option<&VideoEvent> {
        self.events.get(uuid)
    }

    /// Resolves the child objects of `event`, skipping dangling ones.
    pub fn child_objects_of<'g>(
        &'g self,
        event: &'g VideoEvent,
    ) -> impl Iterator<Item = &'g VideoObject> + 'g {
        event
            .child_objects
            .iter()
            .filter_map(move |uuid| self.objects.get(uuid))
    }

    /// Resolves the child events of `event`, skipping dangling ones.
    pub fn child_events_of<'g>(
        &'g self,
        event: &'g VideoEvent,
    ) -> impl Iterator<Item = &'g VideoEvent> + 'g {
        event
            .child_events
            .iter()
            .filter_map(move |uuid| self.events.get(uuid))
    }

    /// Returns the child references of `event` that the graph cannot
    /// resolve, objects first.
    pub fn dangling_children(&self, event: &VideoEvent) -> Vec<DanglingChild> {
        let objects = event
            .child_objects
            .iter()
            .filter(|uuid| !self.objects.contains_key(uuid))
            .map(|uuid| DanglingChild::Object(*uuid));
        let events = event
            .child_events
            .iter()
            .filter(|uuid| !self.events.contains_key(uuid))
            .map(|uuid| DanglingChild::Event(*uuid));
        objects.chain(events).collect()
    }

    /// Walks the child events of `event` breadth-first.
    ///
    /// Each descendant is yielded once; the event itself is never yielded,
    /// even when a cycle leads back to it.
    pub fn descendants<'g>(&'g self, event: &'g VideoEvent) -> Vec<&'g VideoEvent> {
        let mut visited: BTreeSet<Uuid> = event.uuid.into_iter().collect();
        let mut queue: VecDeque<&VideoEvent> = VecDeque::from([event]);
        let mut found = Vec::new();
        while let Some(current) = queue.pop_front() {
            for uuid in &current.child_events {
                if !visited.insert(*uuid) {
                    continue;
                }
                if let Some(child) = self.events.get(uuid) {
                    found.push(child);
                    queue.push_back(child);
                }
            }
        }
        found
    }
}
