//! Aggregator node over one or more track sources.
//!
//! Consumers connect a proxy and request a [`TemporalSelector`]; the node
//! answers with the state of every known track at that time. Requests are
//! coalesced per proxy and resolved on the next loop turn, so only the latest
//! request of a burst is computed.
//!
//! Track events are folded into one [`TrackModel`] as they arrive, whether or
//! not anyone is connected, so memory follows the number of distinct track
//! states rather than the number of events seen.

use super::proxy::{ProgressReply, ProgressType, UpdateRequest};
use super::{Node, NodeBase, ProxyId};
use crate::event_loop::EventLoop;
use crate::selector::{SelectorType, TemporalSelector};
use crate::source::{SourceRef, TrackEvent, TrackId, TrackModel, TrackSourceInterface, TrackState};
use crate::types::{TimeStamp, UpdateFlags};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// Track states resolved for one request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackView {
    pub time: TimeStamp,
    /// One entry per track with a matching state, ordered by serial number.
    pub states: Vec<(TrackId, TrackState)>,
}

struct PendingRequest {
    selector: TemporalSelector,
    mode: UpdateFlags,
    reply: ProgressReply,
}

pub struct TrackSetNode {
    base: NodeBase,
    this: Weak<RefCell<TrackSetNode>>,
    model: TrackModel,
    serving: bool,
    pending: HashMap<ProxyId, PendingRequest>,
    views: HashMap<ProxyId, TrackView>,
    current: Option<ProxyId>,
}

impl TrackSetNode {
    pub fn new(ev: &EventLoop) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|this| {
            RefCell::new(Self {
                base: NodeBase::new(ev).with_display_name("Tracks"),
                this: this.clone(),
                model: TrackModel::new(),
                serving: false,
                pending: HashMap::new(),
                views: HashMap::new(),
                current: None,
            })
        })
    }

    /// Listen to `source`'s tracks. Must happen before the source starts.
    /// Returns `false` if the source has no track interface.
    pub fn attach_source(this: &Rc<RefCell<Self>>, source: &SourceRef) -> bool {
        let rx = {
            let source = source.borrow();
            match source.interface::<TrackSourceInterface>() {
                Some(tracks) => tracks.subscribe(),
                None => return false,
            }
        };

        let ev = this.borrow().base.event_loop().clone();
        let weak = Rc::downgrade(this);
        ev.watch(rx, move |event: TrackEvent| match weak.upgrade() {
            Some(node) => {
                node.borrow_mut().ingest(event);
                true
            }
            None => false,
        });
        true
    }

    pub fn track_count(&self) -> usize {
        self.model.len()
    }

    pub fn tracks(&self) -> &TrackModel {
        &self.model
    }

    /// Whether the node is in use and answering requests.
    pub fn is_model_built(&self) -> bool {
        self.serving
    }

    /// View of the proxy last made current.
    pub fn current_view(&self) -> Option<&TrackView> {
        self.current.and_then(|p| self.views.get(&p))
    }

    pub fn view(&self, proxy: ProxyId) -> Option<&TrackView> {
        self.views.get(&proxy)
    }

    fn ingest(&mut self, event: TrackEvent) {
        self.model.apply(event);
        self.base.emit_modified();
    }

    fn resolve(&self, selector: &TemporalSelector) -> TrackView {
        let mut states: Vec<(TrackId, TrackState)> = self
            .model
            .iter()
            .filter_map(|record| {
                selector
                    .pick(&record.states, |s| s.time)
                    .map(|state| (record.id, *state))
            })
            .collect();
        states.sort_by_key(|(id, _)| (id.source, id.serial));
        TrackView {
            time: selector.time,
            states,
        }
    }

    fn process_pending(&mut self) {
        let pending: Vec<_> = self.pending.drain().collect();
        for (proxy, request) in pending {
            if !self.base.proxies.contains_key(&proxy) {
                continue;
            }
            let view = self.resolve(&request.selector);
            self.views.insert(proxy, view);
            if request.mode.contains(UpdateFlags::INCREMENTAL) {
                request.reply.send(ProgressType::UpdateDataAvailable);
            }
            request.reply.send(ProgressType::UpdateCompleted);
        }
        let proxies = &self.base.proxies;
        self.views.retain(|p, _| proxies.contains_key(p));
    }
}

impl Node for TrackSetNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn supported_selectors(&self) -> Vec<SelectorType> {
        vec![SelectorType::of::<TemporalSelector>()]
    }

    fn acquire(&mut self) {
        tracing::debug!("Track set serving {} tracks", self.model.len());
        self.serving = true;
    }

    fn release(&mut self) {
        self.serving = false;
        self.pending.clear();
        self.views.clear();
        self.current = None;
    }

    fn update(&mut self, request: UpdateRequest) {
        let Some(selector) = request.selectors.get::<TemporalSelector>().copied() else {
            request.reply(ProgressType::UpdateDiscarded);
            return;
        };

        let schedule = self.pending.is_empty();
        self.pending.insert(
            request.proxy,
            PendingRequest {
                selector,
                mode: request.mode,
                reply: request.reply,
            },
        );

        if schedule {
            let this = self.this.clone();
            self.base.event_loop().post(move || {
                if let Some(node) = this.upgrade() {
                    node.borrow_mut().process_pending();
                }
            });
        }
    }

    fn select(&mut self, proxy: ProxyId) {
        self.current = Some(proxy);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
