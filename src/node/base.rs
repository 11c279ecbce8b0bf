//! State shared by every node.

use super::id::{NodeId, ProxyId};
use super::proxy::Progress;
use super::{NodeRef, WeakNodeRef};
use crate::event_loop::{EventLoop, Notifier};
use crossbeam_channel::Sender;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

/// Broad category of a node, used for descriptive type names and defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    #[default]
    Collection,
    DataSource,
    QuerySession,
}

impl NodeKind {
    pub fn type_name(self) -> &'static str {
        match self {
            NodeKind::Collection => "Collection",
            NodeKind::DataSource => "Data Source",
            NodeKind::QuerySession => "Query Session",
        }
    }
}

/// Change notifications emitted by a node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeEvent {
    DisplayNameChanged(String),
    VisibilityChanged(bool),
    ChildAdded(NodeId),
    /// The node's content changed.
    Modified,
}

pub(crate) struct ProxyLink {
    pub(crate) progress: Sender<Progress>,
    pub(crate) valid: Rc<Cell<bool>>,
}

/// Identity, tree links, flags and use count embedded in every node.
pub struct NodeBase {
    id: NodeId,
    kind: NodeKind,
    display_name: String,
    visible: bool,
    hidden: bool,
    pub(crate) use_count: i32,
    pub(crate) proxies: HashMap<ProxyId, ProxyLink>,
    pub(crate) children: Vec<NodeRef>,
    pub(crate) parent: Option<WeakNodeRef>,
    pub(crate) pending_children: Vec<WeakNodeRef>,
    events: Notifier<NodeEvent>,
    ev: EventLoop,
}

impl NodeBase {
    pub fn new(ev: &EventLoop) -> Self {
        Self {
            id: NodeId::next(),
            kind: NodeKind::Collection,
            display_name: "Unnamed Node".to_string(),
            visible: true,
            hidden: false,
            use_count: 0,
            proxies: HashMap::new(),
            children: Vec::new(),
            parent: None,
            pending_children: Vec::new(),
            events: Notifier::new(),
            ev: ev.clone(),
        }
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Mark the node hidden. Hidden nodes are not shown in tree views; the
    /// flag cannot change after construction.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn event_loop(&self) -> &EventLoop {
        &self.ev
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn set_display_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name != self.display_name {
            self.display_name = name.clone();
            self.events.emit(NodeEvent::DisplayNameChanged(name));
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn apply_visible(&mut self, visible: bool) {
        if visible != self.visible {
            self.visible = visible;
            self.events.emit(NodeEvent::VisibilityChanged(visible));
        }
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn use_count(&self) -> i32 {
        self.use_count
    }

    pub fn is_acquired(&self) -> bool {
        self.use_count > 0
    }

    pub fn proxy_count(&self) -> usize {
        self.proxies.len()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn events(&self) -> &Notifier<NodeEvent> {
        &self.events
    }

    /// Announce that the node's content changed.
    pub fn emit_modified(&self) {
        self.events.emit(NodeEvent::Modified);
    }

    /// Send an unsolicited progress notification to every connected proxy.
    pub fn notify_proxies(&self, progress: Progress) {
        for link in self.proxies.values() {
            let _ = link.progress.send(progress);
        }
    }
}

impl Drop for NodeBase {
    fn drop(&mut self) {
        for link in self.proxies.values() {
            link.valid.set(false);
        }
        if !self.proxies.is_empty() {
            tracing::debug!(
                "Node {} destroyed with {} live proxies",
                self.id,
                self.proxies.len()
            );
        }
    }
}
