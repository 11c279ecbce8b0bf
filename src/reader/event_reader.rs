use super::{DataReader, ReaderBase};
use crate::event_loop::EventLoop;
use crate::source::{EventId, EventRecord, EventSourceInterface, SourceEvent, SourceHandle, SourceRef};
use crossbeam_channel::Receiver;
use std::collections::HashMap;

/// Reads every event from one or more event sources.
pub struct EventReader {
    base: ReaderBase,
    receivers: Vec<(SourceHandle, Receiver<SourceEvent>)>,
    events: HashMap<EventId, EventRecord>,
    received: bool,
}

impl EventReader {
    pub fn new(ev: &EventLoop) -> Self {
        Self::with_base(ReaderBase::new(ev))
    }

    pub fn with_base(base: ReaderBase) -> Self {
        Self {
            base,
            receivers: Vec::new(),
            events: HashMap::new(),
            received: false,
        }
    }

    pub fn event(&self, id: &EventId) -> Option<&EventRecord> {
        self.events.get(id)
    }

    pub fn events(&self) -> impl Iterator<Item = &EventRecord> + '_ {
        self.events.values()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl DataReader for EventReader {
    fn reader_base(&self) -> &ReaderBase {
        &self.base
    }

    fn reader_base_mut(&mut self) -> &mut ReaderBase {
        &mut self.base
    }

    fn connect_source(&mut self, source: &SourceRef) -> bool {
        let source = source.borrow();
        let Some(events) = source.interface::<EventSourceInterface>() else {
            return false;
        };
        self.receivers
            .push((source.source().handle(), events.subscribe()));
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
                self.received = true;
                match event {
                    SourceEvent::Updated(record) => {
                        self.events.insert(record.id, record);
                    }
                    SourceEvent::Removed(id) => {
                        self.events.remove(&id);
                    }
                }
            }
        }
    }

    fn has_data(&self) -> bool {
        self.received
    }
}
