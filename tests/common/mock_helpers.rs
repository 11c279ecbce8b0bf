//! Scripted stand-ins for query back-ends and data sources

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use visgui_data::config::QueryConfig;
use visgui_data::event_loop::{EventLoop, Marshaller};
use visgui_data::node::{Node, NodeBase, NodeKind};
use visgui_data::query::{
    BackendEvent, IqrClassification, QueryBackend, QueryPlan, QueryResult, QuerySessionNode,
    ResultId,
};
use visgui_data::source::{
    DataSource, EventRecord, EventSourceInterface, Mechanism, SourceBase, SourceHandle, Status,
    TrackSourceInterface, TrackState,
};
use visgui_data::StatusSource;

// ==================== Query Back-end ====================

/// A request received by a [`ScriptedBackend`]
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Query { working_set_size: usize },
    Feedback { count: usize },
    Refine(HashMap<ResultId, IqrClassification>),
}

/// Canned answers for a [`ScriptedBackend`]
#[derive(Debug, Clone, Default)]
pub struct BackendScript {
    /// Answer to the initial query
    pub results: Vec<QueryResult>,
    /// Candidates offered for feedback, truncated to the requested count
    pub feedback: Vec<QueryResult>,
    /// Answer to each refinement, in order; the last one repeats
    pub refinements: Vec<Vec<QueryResult>>,
    /// Fail the initial query with this message instead of answering
    pub query_error: Option<String>,
}

/// Query back-end that answers from a script on a worker thread
pub struct ScriptedBackend {
    events: Marshaller<BackendEvent>,
    script: BackendScript,
    calls: Rc<RefCell<Vec<BackendCall>>>,
    round: usize,
}

impl ScriptedBackend {
    pub fn new(
        events: Marshaller<BackendEvent>,
        script: BackendScript,
        calls: Rc<RefCell<Vec<BackendCall>>>,
    ) -> Self {
        Self {
            events,
            script,
            calls,
            round: 0,
        }
    }

    fn answer(&self, results: Vec<QueryResult>, feedback_requests: bool) {
        let events = self.events.clone();
        std::thread::spawn(move || {
            for result in results {
                events.send(BackendEvent::ResultAvailable {
                    result,
                    feedback_request: feedback_requests,
                });
            }
            events.send(BackendEvent::ResultSetComplete { feedback_requests });
        });
    }
}

impl QueryBackend for ScriptedBackend {
    fn process_query(&mut self, _plan: &QueryPlan, working_set_size: usize) -> bool {
        self.calls
            .borrow_mut()
            .push(BackendCall::Query { working_set_size });
        if let Some(message) = self.script.query_error.clone() {
            let events = self.events.clone();
            std::thread::spawn(move || {
                events.send(BackendEvent::Error {
                    source: StatusSource::new("scripted"),
                    message,
                });
            });
            return true;
        }
        self.answer(self.script.results.clone(), false);
        true
    }

    fn request_refinement(&mut self, desired_count: usize) -> bool {
        self.calls.borrow_mut().push(BackendCall::Feedback {
            count: desired_count,
        });
        let feedback = self
            .script
            .feedback
            .iter()
            .take(desired_count)
            .cloned()
            .collect();
        self.answer(feedback, true);
        true
    }

    fn refine_query(&mut self, feedback: &HashMap<ResultId, IqrClassification>) -> bool {
        self.calls
            .borrow_mut()
            .push(BackendCall::Refine(feedback.clone()));
        let index = self.round.min(self.script.refinements.len().saturating_sub(1));
        let results = self
            .script
            .refinements
            .get(index)
            .cloned()
            .unwrap_or_default();
        self.round += 1;
        self.answer(results, false);
        true
    }
}

/// Create a session over a [`ScriptedBackend`], returning the call log too
pub fn scripted_session(
    ev: &EventLoop,
    config: &QueryConfig,
    script: BackendScript,
) -> (Rc<RefCell<QuerySessionNode>>, Rc<RefCell<Vec<BackendCall>>>) {
    let calls = Rc::new(RefCell::new(Vec::new()));
    let log = calls.clone();
    let session = QuerySessionNode::with_backend(ev, config, move |events| {
        Ok(Box::new(ScriptedBackend::new(events, script, log)) as Box<dyn QueryBackend>)
    });
    (session, calls)
}

// ==================== Data Source ====================

/// Data source that replays in-memory tracks and events when started
pub struct MemorySource {
    node: NodeBase,
    source: SourceBase,
    this: Weak<RefCell<MemorySource>>,
    tracks: Vec<(i64, Vec<TrackState>)>,
    events: Vec<EventRecord>,
    fail: bool,
}

impl MemorySource {
    /// A source with a track interface
    pub fn tracks(ev: &EventLoop) -> Rc<RefCell<Self>> {
        Self::build(ev, true, false)
    }

    /// A source with an event interface
    pub fn events(ev: &EventLoop) -> Rc<RefCell<Self>> {
        Self::build(ev, false, true)
    }

    /// A source with no interfaces at all
    pub fn bare(ev: &EventLoop) -> Rc<RefCell<Self>> {
        Self::build(ev, false, false)
    }

    fn build(ev: &EventLoop, tracks: bool, events: bool) -> Rc<RefCell<Self>> {
        Rc::new_cyclic(|this| {
            let node = NodeBase::new(ev)
                .with_kind(NodeKind::DataSource)
                .with_display_name("memory");
            let mut source = SourceBase::new(&node);
            if tracks {
                source.interfaces_mut().add(TrackSourceInterface::new());
            }
            if events {
                source.interfaces_mut().add(EventSourceInterface::new());
            }
            RefCell::new(Self {
                node,
                source,
                this: this.clone(),
                tracks: Vec::new(),
                events: Vec::new(),
                fail: false,
            })
        })
    }

    pub fn handle(&self) -> SourceHandle {
        self.source.handle()
    }

    pub fn add_track(&mut self, serial: i64, states: Vec<TrackState>) {
        self.tracks.push((serial, states));
    }

    pub fn add_event(&mut self, event: EventRecord) {
        self.events.push(event);
    }

    /// End in `Invalid` after replaying
    pub fn fail(&mut self) {
        self.fail = true;
    }

    fn replay(&mut self) {
        self.source.set_status(Status::Active);
        let handle = self.source.handle();
        if let Some(iface) = self.source.interfaces().interface::<TrackSourceInterface>() {
            for (serial, states) in &self.tracks {
                let id = visgui_data::source::TrackId::new(handle, *serial);
                iface.update_batch(id, states.clone());
                iface.close(id);
            }
        }
        if let Some(iface) = self.source.interfaces().interface::<EventSourceInterface>() {
            for event in &self.events {
                iface.update(event.clone());
            }
        }
        let end = if self.fail {
            Status::Invalid
        } else {
            Status::Stopped
        };
        self.source.set_status(end);
    }
}

impl Node for MemorySource {
    fn base(&self) -> &NodeBase {
        &self.node
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.node
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl DataSource for MemorySource {
    fn source(&self) -> &SourceBase {
        &self.source
    }

    fn source_mut(&mut self) -> &mut SourceBase {
        &mut self.source
    }

    fn mechanism(&self) -> Mechanism {
        Mechanism::Process
    }

    fn start(&mut self) {
        self.source.set_status(Status::Pending);
        let this = self.this.clone();
        self.node.event_loop().post(move || {
            if let Some(source) = this.upgrade() {
                source.borrow_mut().replay();
            }
        });
    }
}
