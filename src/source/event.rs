//! Event-producing interface.

use super::interface::SourceInterface;
use super::track::TrackId;
use super::SourceHandle;
use crate::event_loop::Notifier;
use crate::types::TimeStamp;
use crossbeam_channel::Receiver;
use uuid::Uuid;

/// Identifies an event within the source that produced it. Same equality
/// rules as [`TrackId`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventId {
    pub source: SourceHandle,
    pub serial: i64,
    pub uuid: Option<Uuid>,
}

impl EventId {
    pub fn new(source: SourceHandle, serial: i64) -> Self {
        Self {
            source,
            serial,
            uuid: None,
        }
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self {
            source: SourceHandle::default(),
            serial: -1,
            uuid: None,
        }
    }
}

/// A detected activity spanning a time interval.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub id: EventId,
    /// Provider-defined activity type.
    pub kind: i32,
    pub start: TimeStamp,
    pub end: TimeStamp,
    pub probability: f64,
    pub tracks: Vec<TrackId>,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceEvent {
    Updated(EventRecord),
    Removed(EventId),
}

/// Interface of sources that emit events.
#[derive(Debug, Default)]
pub struct EventSourceInterface {
    events: Notifier<SourceEvent>,
}

impl SourceInterface for EventSourceInterface {}

impl EventSourceInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<SourceEvent> {
        self.events.subscribe()
    }

    pub fn update(&self, event: EventRecord) {
        self.events.emit(SourceEvent::Updated(event));
    }

    pub fn remove(&self, id: EventId) {
        self.events.emit(SourceEvent::Removed(id));
    }
}
