//! Tree and lifecycle operations on shared node handles.

use super::base::{NodeEvent, ProxyLink};
use super::id::{NodeId, ProxyId};
use super::proxy::NodeProxy;
use super::{Node, NodeRef};
use crossbeam_channel::unbounded;
use std::cell::Cell;
use std::rc::Rc;

/// Operations that need the node's shared handle rather than `&mut self`.
pub trait NodeRefExt {
    /// Connect a new consumer. Returns `None` if the node does not accept
    /// updates.
    fn connect(&self) -> Option<NodeProxy>;

    /// Disconnect a proxy. Disconnecting twice is harmless.
    fn disconnect(&self, proxy: ProxyId);

    /// Use the node without a proxy.
    fn enter(&self);

    /// Undo one [`enter`](Self::enter).
    fn leave(&self);

    /// Attach `child`, detaching it from any previous parent first. The node
    /// learns about it on the next loop turn. Adding an existing child again
    /// does nothing.
    fn add_child(&self, child: NodeRef);

    /// Detach the child with id `child`, returning it.
    fn remove_child(&self, child: NodeId) -> Option<NodeRef>;

    fn children(&self) -> Vec<NodeRef>;

    fn parent(&self) -> Option<NodeRef>;

    /// Returns `false` if the node's visibility cannot be changed.
    fn set_visible(&self, visible: bool) -> bool;

    fn id(&self) -> NodeId;
}

pub(crate) fn enter_node(node: &mut dyn Node) {
    let count = node.base().use_count;
    node.base_mut().use_count = count + 1;
    if count <= 0 {
        tracing::debug!("Node {} acquired", node.base().id());
        node.acquire();
    }
}

pub(crate) fn leave_node(node: &mut dyn Node) {
    let count = node.base().use_count;
    if count <= 0 {
        tracing::warn!("Node {} left more often than entered", node.base().id());
        return;
    }
    node.base_mut().use_count = count - 1;
    if count == 1 {
        tracing::debug!("Node {} released", node.base().id());
        node.release();
    }
}

impl NodeRefExt for NodeRef {
    fn connect(&self) -> Option<NodeProxy> {
        let mut node = self.borrow_mut();
        if !node.can_update() {
            tracing::debug!("Node {} refused connection", node.base().id());
            return None;
        }

        let id = ProxyId::next();
        let (tx, rx) = unbounded();
        let valid = Rc::new(Cell::new(true));
        let ev = node.base().event_loop().clone();
        node.base_mut().proxies.insert(
            id,
            ProxyLink {
                progress: tx.clone(),
                valid: valid.clone(),
            },
        );
        enter_node(&mut *node);

        Some(NodeProxy::new(id, Rc::downgrade(self), (tx, rx), valid, ev))
    }

    fn disconnect(&self, proxy: ProxyId) {
        let mut node = self.borrow_mut();
        if let Some(link) = node.base_mut().proxies.remove(&proxy) {
            link.valid.set(false);
            leave_node(&mut *node);
        }
    }

    fn enter(&self) {
        enter_node(&mut *self.borrow_mut());
    }

    fn leave(&self) {
        leave_node(&mut *self.borrow_mut());
    }

    fn add_child(&self, child: NodeRef) {
        if let Some(old) = child.parent() {
            if Rc::ptr_eq(&old, self) {
                return;
            }
            old.remove_child(child.id());
        }
        child.borrow_mut().base_mut().parent = Some(Rc::downgrade(self));

        let weak_child = Rc::downgrade(&child);
        let (schedule, ev) = {
            let mut node = self.borrow_mut();
            let base = node.base_mut();
            base.children.push(child);
            let schedule = base.pending_children.is_empty();
            base.pending_children.push(weak_child);
            (schedule, base.event_loop().clone())
        };

        if schedule {
            let weak_self = Rc::downgrade(self);
            ev.post(move || {
                if let Some(node) = weak_self.upgrade() {
                    process_pending_children(&node);
                }
            });
        }
    }

    fn remove_child(&self, child: NodeId) -> Option<NodeRef> {
        let removed = {
            let mut node = self.borrow_mut();
            let children = &mut node.base_mut().children;
            let index = children.iter().position(|c| c.borrow().base().id() == child)?;
            children.remove(index)
        };
        removed.borrow_mut().base_mut().parent = None;
        Some(removed)
    }

    fn children(&self) -> Vec<NodeRef> {
        self.borrow().base().children.clone()
    }

    fn parent(&self) -> Option<NodeRef> {
        self.borrow().base().parent.as_ref().and_then(|p| p.upgrade())
    }

    fn set_visible(&self, visible: bool) -> bool {
        let mut node = self.borrow_mut();
        if !node.can_change_visibility() {
            return false;
        }
        node.base_mut().apply_visible(visible);
        true
    }

    fn id(&self) -> NodeId {
        self.borrow().base().id()
    }
}

fn process_pending_children(node: &NodeRef) {
    let pending = std::mem::take(&mut node.borrow_mut().base_mut().pending_children);
    let mut announced: Vec<NodeRef> = Vec::with_capacity(pending.len());
    for weak in pending {
        let Some(child) = weak.upgrade() else {
            continue;
        };
        if announced.iter().any(|c| Rc::ptr_eq(c, &child)) {
            continue;
        }
        let still_attached = node
            .borrow()
            .base()
            .children
            .iter()
            .any(|c| Rc::ptr_eq(c, &child));
        if !still_attached {
            continue;
        }

        let child_id = child.borrow().base().id();
        {
            let mut parent = node.borrow_mut();
            parent.child_added(&child);
            parent.base().events().emit(NodeEvent::ChildAdded(child_id));
        }
        announced.push(child);
    }
}
