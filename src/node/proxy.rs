//! Per-consumer connection to a node.

use super::id::{ProxyId, RequestId};
use super::{NodeRef, NodeRefExt, WeakNodeRef};
use crate::event_loop::EventLoop;
use crate::selector::SelectorSet;
use crate::types::UpdateFlags;
use crossbeam_channel::{Receiver, Sender};
use std::cell::Cell;
use std::rc::Rc;

/// Kind of progress reported for an update request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressType {
    /// Some (possibly partial) data for the request is ready.
    UpdateDataAvailable,
    /// The request has been fully satisfied.
    UpdateCompleted,
    /// The node declined the request.
    UpdateDiscarded,
    UpdateFailed,
}

/// A progress notification delivered to one proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub kind: ProgressType,
    /// Most recent valid request id satisfied by this reply, or invalid.
    pub request_id: RequestId,
}

/// Reply handle carried by an [`UpdateRequest`]. Nodes may keep it to
/// answer later.
#[derive(Debug, Clone)]
pub struct ProgressReply {
    tx: Sender<Progress>,
    request_id: RequestId,
}

impl ProgressReply {
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    /// Returns `false` if the proxy is gone.
    pub fn send(&self, kind: ProgressType) -> bool {
        self.tx
            .send(Progress {
                kind,
                request_id: self.request_id,
            })
            .is_ok()
    }
}

/// An update request as seen by the node.
#[derive(Debug, Clone)]
pub struct UpdateRequest {
    pub proxy: ProxyId,
    pub selectors: SelectorSet,
    pub mode: UpdateFlags,
    pub reply: ProgressReply,
}

impl UpdateRequest {
    pub fn request_id(&self) -> RequestId {
        self.reply.request_id
    }

    pub fn reply(&self, kind: ProgressType) -> bool {
        self.reply.send(kind)
    }
}

/// Handle owned by one consumer of a node.
///
/// Progress meant for this consumer arrives on the proxy's own channel.
/// Dropping the proxy disconnects it; destroying the node invalidates it.
pub struct NodeProxy {
    id: ProxyId,
    node: WeakNodeRef,
    tx: Sender<Progress>,
    rx: Receiver<Progress>,
    valid: Rc<Cell<bool>>,
    mode: Cell<UpdateFlags>,
    last_valid_request: Cell<RequestId>,
    ev: EventLoop,
}

impl std::fmt::Debug for NodeProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeProxy")
            .field("id", &self.id)
            .field("valid", &self.is_valid())
            .field("mode", &self.mode.get())
            .finish()
    }
}

impl NodeProxy {
    pub(crate) fn new(
        id: ProxyId,
        node: WeakNodeRef,
        channel: (Sender<Progress>, Receiver<Progress>),
        valid: Rc<Cell<bool>>,
        ev: EventLoop,
    ) -> Self {
        Self {
            id,
            node,
            tx: channel.0,
            rx: channel.1,
            valid,
            mode: Cell::new(UpdateFlags::NONE),
            last_valid_request: Cell::new(RequestId::INVALID),
            ev,
        }
    }

    pub fn id(&self) -> ProxyId {
        self.id
    }

    /// `false` once disconnected or once the node is destroyed.
    pub fn is_valid(&self) -> bool {
        self.valid.get() && self.node.strong_count() > 0
    }

    pub fn node(&self) -> Option<NodeRef> {
        if !self.valid.get() {
            return None;
        }
        self.node.upgrade()
    }

    pub fn update_mode(&self) -> UpdateFlags {
        self.mode.get()
    }

    pub fn set_update_mode(&self, mode: UpdateFlags) {
        self.mode.set(mode);
    }

    /// Ask the node for data matching `selectors`.
    ///
    /// Returns `false` if the proxy is no longer connected. Replies name the
    /// latest valid request id issued so far, so an invalid `request_id`
    /// is answered under the previous valid one.
    pub fn update(&self, selectors: &SelectorSet, request_id: RequestId) -> bool {
        let Some(node) = self.node() else {
            return false;
        };

        if request_id.is_valid() {
            let last = self.last_valid_request.get();
            if last.is_valid() && request_id < last {
                tracing::warn!(
                    "{:?} issued request {} after {}; replies may name the older id",
                    self.id,
                    request_id.0,
                    last.0
                );
            }
            self.last_valid_request.set(request_id);
        }

        let request = UpdateRequest {
            proxy: self.id,
            selectors: selectors.clone(),
            mode: self.mode.get(),
            reply: ProgressReply {
                tx: self.tx.clone(),
                request_id: self.last_valid_request.get(),
            },
        };

        let delivered = match node.try_borrow_mut() {
            Ok(mut node) => {
                node.update(request);
                true
            }
            Err(_) => {
                tracing::warn!("{:?}: node is busy, update not delivered", self.id);
                false
            }
        };
        delivered
    }

    /// Tell the node that this proxy's view is the one to read from.
    pub fn make_current(&self) {
        if let Some(node) = self.node() {
            node.borrow_mut().select(self.id);
        }
    }

    /// Receiver side of this proxy's progress channel, for use with
    /// [`EventLoop::watch`].
    pub fn progress(&self) -> Receiver<Progress> {
        self.rx.clone()
    }

    pub fn try_progress(&self) -> Option<Progress> {
        self.rx.try_recv().ok()
    }

    /// Take every progress notification received so far.
    pub fn drain(&self) -> Vec<Progress> {
        self.rx.try_iter().collect()
    }
}

impl Drop for NodeProxy {
    fn drop(&mut self) {
        if !self.valid.get() {
            return;
        }
        let Some(node) = self.node.upgrade() else {
            return;
        };
        let id = self.id;
        if node.try_borrow_mut().is_ok() {
            node.disconnect(id);
        } else {
            let weak = self.node.clone();
            self.ev.post(move || {
                if let Some(node) = weak.upgrade() {
                    node.disconnect(id);
                }
            });
        }
    }
}
