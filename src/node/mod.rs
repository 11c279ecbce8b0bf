//! The data tree.
//!
//! Every producer, aggregator and query session is a [`Node`]. Nodes are
//! shared as [`NodeRef`] (`Rc<RefCell<dyn Node>>`); a parent owns its
//! children, while children (through `parent`) and proxies (through
//! [`NodeProxy`]) hold only weak references.
//!
//! Consumers never call a node directly for live data. They call
//! [`NodeRefExt::connect`] to obtain a [`NodeProxy`] and issue update
//! requests through it; progress comes back on the proxy's own channel.

pub mod base;
pub mod id;
pub mod proxy;
pub mod track_set;
mod tree;

pub use base::{NodeBase, NodeEvent, NodeKind};
pub use id::{NodeId, ProxyId, RequestId};
pub use proxy::{NodeProxy, Progress, ProgressReply, ProgressType, UpdateRequest};
pub use track_set::{TrackSetNode, TrackView};
pub use tree::NodeRefExt;

use crate::selector::SelectorType;
use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

pub type NodeRef = Rc<RefCell<dyn Node>>;
pub type WeakNodeRef = Weak<RefCell<dyn Node>>;

/// A node in the data tree.
///
/// Implementors embed a [`NodeBase`] and override the hooks they need.
pub trait Node: Any {
    fn base(&self) -> &NodeBase;
    fn base_mut(&mut self) -> &mut NodeBase;

    /// Descriptive type name.
    fn type_name(&self) -> &str {
        self.base().kind().type_name()
    }

    fn can_change_visibility(&self) -> bool {
        true
    }

    /// Whether consumers may connect. Plain data sources deliver through
    /// their interfaces instead and refuse connections.
    fn can_update(&self) -> bool {
        self.base().kind() != NodeKind::DataSource
    }

    fn can_delete(&self) -> bool {
        true
    }

    fn supported_selectors(&self) -> Vec<SelectorType> {
        Vec::new()
    }

    fn is_selector_supported(&self, ty: &SelectorType) -> bool {
        self.supported_selectors().contains(ty)
    }

    /// Called on the 0 -> 1 use count transition.
    fn acquire(&mut self) {}

    /// Called on the 1 -> 0 use count transition.
    fn release(&mut self) {}

    /// Called one loop turn after `child` was attached, if it is still a child.
    fn child_added(&mut self, _child: &NodeRef) {}

    /// Handle an update request from a proxy.
    ///
    /// Every request must eventually be answered through its reply handle.
    /// The default declines.
    fn update(&mut self, request: UpdateRequest) {
        request.reply(ProgressType::UpdateDiscarded);
    }

    /// Make `proxy`'s view authoritative for derived state.
    fn select(&mut self, _proxy: ProxyId) {}

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Plain grouping node with no production capability of its own.
pub struct CollectionNode {
    base: NodeBase,
}

impl CollectionNode {
    pub fn new(base: NodeBase) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self { base }))
    }
}

impl Node for CollectionNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
