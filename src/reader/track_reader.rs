use super::{DataReader, ReaderBase};
use crate::event_loop::EventLoop;
use crate::source::{
    SourceHandle, SourceRef, TrackEvent, TrackModel, TrackRecord, TrackSourceInterface,
};
use crossbeam_channel::Receiver;

/// Reads every track from one or more track sources.
pub struct TrackReader {
    base: ReaderBase,
    receivers: Vec<(SourceHandle, Receiver<TrackEvent>)>,
    model: TrackModel,
}

impl TrackReader {
    pub fn new(ev: &EventLoop) -> Self {
        Self::with_base(ReaderBase::new(ev))
    }

    pub fn with_base(base: ReaderBase) -> Self {
        Self {
            base,
            receivers: Vec::new(),
            model: TrackModel::new(),
        }
    }

    pub fn tracks(&self) -> &TrackModel {
        &self.model
    }

    pub fn into_tracks(self) -> Vec<TrackRecord> {
        self.model.into_records()
    }
}

impl DataReader for TrackReader {
    fn reader_base(&self) -> &ReaderBase {
        &self.base
    }

    fn reader_base_mut(&mut self) -> &mut ReaderBase {
        &mut self.base
    }

    fn connect_source(&mut self, source: &SourceRef) -> bool {
        let source = source.borrow();
        let Some(tracks) = source.interface::<TrackSourceInterface>() else {
            return false;
        };
        self.receivers
            .push((source.source().handle(), tracks.subscribe()));
        true
    }

    fn disconnect_source(&mut self, source: &SourceRef) {
        self.collect();
        let handle = source.borrow().source().handle();
        self.receivers.retain(|(h, _)| *h != handle);
    }

    fn collect(&mut self) {
        for (_, rx) in &self.receivers {
            for event in rx.try_iter() {
                self.model.apply(event);
            }
        }
    }

    fn has_data(&self) -> bool {
        !self.model.is_empty()
    }
}
