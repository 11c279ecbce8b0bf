//! Track-producing interface.

use super::interface::SourceInterface;
use super::SourceHandle;
use crate::event_loop::Notifier;
use crate::types::TimeStamp;
use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use uuid::Uuid;

/// Identifies a track within the source that produced it.
///
/// Two ids are equal only if the source handle, serial number and UUID all
/// match; serial numbers from different sources never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId {
    pub source: SourceHandle,
    /// Provider-scoped serial number, `-1` if unknown.
    pub serial: i64,
    pub uuid: Option<Uuid>,
}

impl TrackId {
    pub fn new(source: SourceHandle, serial: i64) -> Self {
        Self {
            source,
            serial,
            uuid: None,
        }
    }

    pub fn with_uuid(mut self, uuid: Uuid) -> Self {
        self.uuid = Some(uuid);
        self
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self {
            source: SourceHandle::default(),
            serial: -1,
            uuid: None,
        }
    }
}

/// One observed state of a track.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackState {
    pub time: TimeStamp,
    /// Image-space position.
    pub point: [f64; 2],
    /// Bounding box as `[min_x, min_y, max_x, max_y]`.
    pub bounds: Option<[f64; 4]>,
}

impl TrackState {
    pub fn new(time: TimeStamp, point: [f64; 2]) -> Self {
        Self {
            time,
            point,
            bounds: None,
        }
    }
}

/// Object-type probabilities for a track.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackClassification {
    pub person: f64,
    pub vehicle: f64,
    pub other: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrackEvent {
    NameAvailable {
        track: TrackId,
        name: String,
    },
    ClassificationAvailable {
        track: TrackId,
        classification: TrackClassification,
    },
    /// New or revised states, in time order.
    Updated {
        track: TrackId,
        states: Vec<TrackState>,
    },
    Closed {
        track: TrackId,
    },
}

impl TrackEvent {
    pub fn track(&self) -> TrackId {
        match self {
            TrackEvent::NameAvailable { track, .. }
            | TrackEvent::ClassificationAvailable { track, .. }
            | TrackEvent::Updated { track, .. }
            | TrackEvent::Closed { track } => *track,
        }
    }
}

/// Interface of sources that emit tracks.
#[derive(Debug, Default)]
pub struct TrackSourceInterface {
    events: Notifier<TrackEvent>,
}

impl SourceInterface for TrackSourceInterface {}

impl TrackSourceInterface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Receiver<TrackEvent> {
        self.events.subscribe()
    }

    pub fn emit(&self, event: TrackEvent) {
        self.events.emit(event);
    }

    pub fn name_available(&self, track: TrackId, name: impl Into<String>) {
        self.emit(TrackEvent::NameAvailable {
            track,
            name: name.into(),
        });
    }

    pub fn classification_available(&self, track: TrackId, classification: TrackClassification) {
        self.emit(TrackEvent::ClassificationAvailable {
            track,
            classification,
        });
    }

    pub fn update(&self, track: TrackId, state: TrackState) {
        self.update_batch(track, vec![state]);
    }

    pub fn update_batch(&self, track: TrackId, states: Vec<TrackState>) {
        self.emit(TrackEvent::Updated { track, states });
    }

    pub fn close(&self, track: TrackId) {
        self.emit(TrackEvent::Closed { track });
    }
}

/// Accumulated knowledge about one track.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackRecord {
    pub id: TrackId,
    pub name: Option<String>,
    pub classification: Option<TrackClassification>,
    /// States in time order; at most one per time stamp.
    pub states: Vec<TrackState>,
    pub closed: bool,
}

impl TrackRecord {
    pub fn new(id: TrackId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    fn merge_state(&mut self, state: TrackState) {
        if let Some(existing) = self.states.iter_mut().find(|s| s.time == state.time) {
            *existing = state;
            return;
        }
        let at = self
            .states
            .iter()
            .position(|s| s.time.compare(&state.time) == Some(Ordering::Greater))
            .unwrap_or(self.states.len());
        self.states.insert(at, state);
    }
}

/// Track records keyed by id, built from a stream of [`TrackEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct TrackModel {
    tracks: HashMap<TrackId, TrackRecord>,
}

impl TrackModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: TrackEvent) {
        let id = event.track();
        let record = self
            .tracks
            .entry(id)
            .or_insert_with(|| TrackRecord::new(id));
        match event {
            TrackEvent::NameAvailable { name, .. } => record.name = Some(name),
            TrackEvent::ClassificationAvailable { classification, .. } => {
                record.classification = Some(classification)
            }
            TrackEvent::Updated { states, .. } => {
                for state in states {
                    record.merge_state(state);
                }
            }
            TrackEvent::Closed { .. } => record.closed = true,
        }
    }

    pub fn get(&self, id: &TrackId) -> Option<&TrackRecord> {
        self.tracks.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackRecord> + '_ {
        self.tracks.values()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn into_records(self) -> Vec<TrackRecord> {
        self.tracks.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeId;

    #[test]
    fn test_track_id_equality_requires_all_parts() {
        let a = SourceHandle(NodeId(10));
        let b = SourceHandle(NodeId(11));
        assert_ne!(TrackId::new(a, 3), TrackId::new(b, 3));
        assert_eq!(TrackId::new(a, 3), TrackId::new(a, 3));
        let uuid = Uuid::new_v4();
        assert_ne!(TrackId::new(a, 3), TrackId::new(a, 3).with_uuid(uuid));
        assert_eq!(TrackId::default().serial, -1);
    }

    #[test]
    fn test_single_update_is_a_batch_of_one() {
        let iface = TrackSourceInterface::new();
        let rx = iface.subscribe();
        let id = TrackId::new(SourceHandle(NodeId(1)), 0);
        iface.update(id, TrackState::new(TimeStamp::from_time(5), [1.0, 2.0]));
        match rx.try_recv() {
            Ok(TrackEvent::Updated { track, states }) => {
                assert_eq!(track, id);
                assert_eq!(states.len(), 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_model_merges_states_in_time_order() {
        let id = TrackId::new(SourceHandle(NodeId(2)), 7);
        let at = |t: i64| TrackState::new(TimeStamp::from_time(t), [t as f64, 0.0]);
        let mut model = TrackModel::new();
        model.apply(TrackEvent::Updated {
            track: id,
            states: vec![at(30), at(10)],
        });
        model.apply(TrackEvent::Updated {
            track: id,
            states: vec![at(20)],
        });
        model.apply(TrackEvent::NameAvailable {
            track: id,
            name: "car".into(),
        });
        model.apply(TrackEvent::Closed { track: id });

        let record = model.get(&id).unwrap();
        let times: Vec<_> = record.states.iter().filter_map(|s| s.time.time).collect();
        assert_eq!(times, vec![10, 20, 30]);
        assert_eq!(record.name.as_deref(), Some("car"));
        assert!(record.closed);
    }

    #[test]
    fn test_model_replaces_state_at_same_time() {
        let id = TrackId::new(SourceHandle(NodeId(2)), 8);
        let mut model = TrackModel::new();
        let mut state = TrackState::new(TimeStamp::from_time(5), [1.0, 1.0]);
        model.apply(TrackEvent::Updated { track: id, states: vec![state] });
        state.point = [2.0, 2.0];
        model.apply(TrackEvent::Updated { track: id, states: vec![state] });
        let record = model.get(&id).unwrap();
        assert_eq!(record.states.len(), 1);
        assert_eq!(record.states[0].point, [2.0, 2.0]);
    }
}
