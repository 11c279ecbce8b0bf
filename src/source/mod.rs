//! Data producers.
//!
//! A [`DataSource`] is a node that produces data through one or more typed
//! interfaces (see [`InterfaceRegistry`]) and reports its progress through a
//! [`Status`] state machine:
//!
//! ```text
//! Unstarted -> {Pending, Idle, Active} <-> Suspended -> {Stopped | Invalid}
//! ```
//!
//! Only the source itself moves its status, through [`SourceBase::set_status`].
//! Everyone else observes it through [`SourceBase::status_events`].

pub mod archive;
pub mod event;
pub mod interface;
pub mod track;

pub use archive::{ArchiveEmitter, ArchiveProcessor, ThreadedArchiveSource};
pub use event::{EventId, EventRecord, EventSourceInterface, SourceEvent};
pub use interface::{AncestorView, InterfaceEntry, InterfaceRegistry, SourceInterface};
pub use track::{
    TrackClassification, TrackEvent, TrackId, TrackModel, TrackRecord, TrackSourceInterface,
    TrackState,
};

use crate::event_loop::Notifier;
use crate::node::{Node, NodeBase, NodeId};
use serde::{Deserialize, Serialize};
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

/// Lifecycle of a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    #[default]
    Unstarted,
    Pending,
    Idle,
    Active,
    Suspended,
    Stopped,
    Invalid,
}

impl Status {
    /// `Stopped` and `Invalid` are final.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Stopped | Status::Invalid)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Unstarted => "Unstarted",
            Status::Pending => "Pending",
            Status::Idle => "Idle",
            Status::Active => "Active",
            Status::Suspended => "Suspended",
            Status::Stopped => "Stopped",
            Status::Invalid => "Invalid",
        };
        f.write_str(s)
    }
}

/// How a source obtains its data. Descriptive only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Mechanism {
    #[default]
    None,
    Archive,
    Stream,
    Process,
}

/// Opaque handle identifying the source that issued an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SourceHandle(pub NodeId);

impl SourceHandle {
    pub fn is_valid(self) -> bool {
        self.0.is_valid()
    }
}

/// Source state embedded in every data source next to its [`NodeBase`].
#[derive(Debug)]
pub struct SourceBase {
    handle: SourceHandle,
    status: Status,
    status_events: Notifier<Status>,
    interfaces: InterfaceRegistry,
}

impl SourceBase {
    pub fn new(node: &NodeBase) -> Self {
        Self {
            handle: SourceHandle(node.id()),
            status: Status::Unstarted,
            status_events: Notifier::new(),
            interfaces: InterfaceRegistry::new(),
        }
    }

    pub fn handle(&self) -> SourceHandle {
        self.handle
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Move to `status`, notifying observers. Setting the current status
    /// again does nothing. Returns whether the status changed.
    pub fn set_status(&mut self, status: Status) -> bool {
        if status == self.status {
            return false;
        }
        if self.status.is_terminal() {
            tracing::warn!(
                "Source {:?} leaving terminal status {} for {}",
                self.handle.0,
                self.status,
                status
            );
        }
        tracing::debug!("Source {:?}: {} -> {}", self.handle.0, self.status, status);
        self.status = status;
        self.status_events.emit(status);
        true
    }

    pub fn status_events(&self) -> &Notifier<Status> {
        &self.status_events
    }

    pub fn interfaces(&self) -> &InterfaceRegistry {
        &self.interfaces
    }

    /// Interfaces are registered while the source is being constructed.
    pub fn interfaces_mut(&mut self) -> &mut InterfaceRegistry {
        &mut self.interfaces
    }
}

/// A node that produces data.
pub trait DataSource: Node {
    fn source(&self) -> &SourceBase;
    fn source_mut(&mut self) -> &mut SourceBase;

    fn mechanism(&self) -> Mechanism {
        Mechanism::None
    }

    fn status(&self) -> Status {
        self.source().status()
    }

    /// Begin producing. No data may be delivered before this is called.
    fn start(&mut self);
}

impl dyn DataSource {
    pub fn interface<T: SourceInterface>(&self) -> Option<&T> {
        self.source().interfaces().interface::<T>()
    }

    pub fn has_interface<T: SourceInterface>(&self) -> bool {
        self.source().interfaces().has_interface::<T>()
    }

    pub fn interface_types(&self) -> HashSet<TypeId> {
        self.source().interfaces().interface_types()
    }
}

pub type SourceRef = Rc<RefCell<dyn DataSource>>;
pub type WeakSourceRef = Weak<RefCell<dyn DataSource>>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_loop::EventLoop;

    #[test]
    fn test_set_status_suppresses_repeats() {
        let ev = EventLoop::new();
        let node = NodeBase::new(&ev);
        let mut source = SourceBase::new(&node);
        let rx = source.status_events().subscribe();

        assert!(source.set_status(Status::Active));
        assert!(!source.set_status(Status::Active));
        assert!(source.set_status(Status::Stopped));

        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![Status::Active, Status::Stopped]);
        assert_eq!(source.status(), Status::Stopped);
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(Status::Stopped.is_terminal());
        assert!(Status::Invalid.is_terminal());
        assert!(!Status::Suspended.is_terminal());
        assert_eq!(Status::default(), Status::Unstarted);
    }

    #[test]
    fn test_handle_follows_node_id() {
        let ev = EventLoop::new();
        let node = NodeBase::new(&ev);
        let source = SourceBase::new(&node);
        assert_eq!(source.handle(), SourceHandle(node.id()));
        assert!(source.handle().is_valid());
    }
}
