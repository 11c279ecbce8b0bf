//! Synchronous, one-shot consumption of data sources.
//!
//! A [`DataReader`] binds directly to a [`DataSource`](crate::source::DataSource),
//! starts it, pumps the event loop until the source settles in `Stopped` or
//! `Invalid`, and buffers everything delivered along the way. Readers are
//! additive: pointing one at a second source keeps what the first produced.

mod event_reader;
mod track_reader;

pub use event_reader::EventReader;
pub use track_reader::TrackReader;

use crate::config::ReaderConfig;
use crate::event_loop::EventLoop;
use crate::source::{SourceRef, Status};
use std::rc::Rc;
use std::time::Duration;

/// Source binding and wait policy shared by all readers.
///
/// The reader keeps its source alive for as long as it is bound to it.
#[derive(Clone)]
pub struct ReaderBase {
    source: Option<SourceRef>,
    ev: EventLoop,
    timeout: Option<Duration>,
}

impl ReaderBase {
    pub fn new(ev: &EventLoop) -> Self {
        Self::with_config(ev, &ReaderConfig::default())
    }

    pub fn with_config(ev: &EventLoop, config: &ReaderConfig) -> Self {
        Self {
            source: None,
            ev: ev.clone(),
            timeout: config.timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.ev
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

fn same_source(a: &SourceRef, b: &SourceRef) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}

/// Blocking reader over a data source.
pub trait DataReader {
    fn reader_base(&self) -> &ReaderBase;
    fn reader_base_mut(&mut self) -> &mut ReaderBase;

    /// Subscribe to `source`. Returns `false`, without side effects, if the
    /// source lacks the interfaces this reader consumes.
    fn connect_source(&mut self, source: &SourceRef) -> bool;

    /// Stop listening to `source`. Data already received is kept.
    fn disconnect_source(&mut self, source: &SourceRef);

    /// Move whatever has been delivered so far into the reader's buffer.
    fn collect(&mut self);

    /// Whether anything was ever received.
    fn has_data(&self) -> bool;

    fn source(&self) -> Option<SourceRef> {
        self.reader_base().source.clone()
    }

    /// Point the reader at `source` (or at nothing).
    ///
    /// Returns `false` if `source` is already the current source or cannot be
    /// connected.
    fn set_source(&mut self, source: Option<SourceRef>) -> bool {
        let current = self.source();
        let unchanged = match (&current, &source) {
            (Some(a), Some(b)) => same_source(a, b),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return false;
        }

        if let Some(new) = &source {
            if !self.connect_source(new) {
                return false;
            }
        }
        if let Some(old) = &current {
            self.disconnect_source(old);
        }
        self.reader_base_mut().source = source;
        true
    }

    /// Whether the current source ended `Invalid`.
    fn failed(&self) -> bool {
        self.source()
            .map(|s| s.borrow().status() == Status::Invalid)
            .unwrap_or(false)
    }

    /// Start the source if needed and wait for it to stop.
    ///
    /// Returns `true` if the source did not fail and data was received.
    fn exec(&mut self) -> bool {
        let Some(source) = self.source() else {
            return false;
        };

        if source.borrow().status() == Status::Unstarted {
            source.borrow_mut().start();
        }

        let ev = self.reader_base().ev.clone();
        let timeout = self.reader_base().timeout;
        let settled = ev.run_until(
            || {
                self.collect();
                source.borrow().status().is_terminal()
            },
            timeout,
        );
        self.collect();

        if !settled {
            tracing::warn!(
                "Gave up waiting for source to stop (status {})",
                source.borrow().status()
            );
        }
        !self.failed() && self.has_data()
    }
}
