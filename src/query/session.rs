//! Interactive query refinement session.
//!
//! State machine:
//!
//! ```text
//! Idle(can_execute) -> Busy(executing) -> Idle(can_get_feedback_requests)
//!   -> [Busy(fetching feedback)] -> Idle(can_refine) -> Busy(refining)
//!   -> Idle(can_get_feedback_requests) -> ...
//! ```
//!
//! Results arrive from the back-end in batches. Each batch ends with
//! `ResultSetComplete`, which either chains a feedback request (implicit
//! feedback) or reconciles results that a refinement round did not re-emit.

use super::backend::{BackendEvent, QueryBackend, QueryService};
use super::sort;
use super::types::{FeedbackChange, IqrClassification, QueryPlan, QueryResult, ResultId, SortOrder};
use crate::config::QueryConfig;
use crate::error::Result;
use crate::event_loop::{EventLoop, Marshaller, Notifier};
use crate::node::{Node, NodeBase, NodeKind};
use crate::types::StatusSource;
use crossbeam_channel::Receiver;
use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

/// Notifications specific to a query session. Content changes are reported
/// as [`NodeEvent::Modified`](crate::node::NodeEvent::Modified) on the node.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    BusyChanged(bool),
    CanRefineChanged(bool),
    ResultSetComplete { feedback_requests: bool },
    Error {
        source: StatusSource,
        message: String,
    },
    Status {
        source: StatusSource,
        message: String,
        progress: Option<(u64, u64)>,
    },
}

pub struct QuerySessionNode {
    base: NodeBase,
    backend: Option<Box<dyn QueryBackend>>,
    status_source: StatusSource,

    busy: bool,
    can_execute: bool,
    can_get_feedback_requests: bool,
    can_refine: bool,

    feedback_implicit: bool,
    desired_feedback_count: usize,
    working_set_size: usize,

    query_plan: QueryPlan,
    initial_query_plan: QueryPlan,

    results: HashMap<ResultId, QueryResult>,
    feedback_requests: HashSet<ResultId>,
    removed_results: HashSet<ResultId>,
    feedback_changes: HashMap<ResultId, FeedbackChange>,
    sorted: RefCell<HashMap<SortOrder, Vec<ResultId>>>,

    events: Notifier<SessionEvent>,
}

impl QuerySessionNode {
    /// Open a session on the service at `uri`.
    ///
    /// If no back-end can be created the session is still returned, but it
    /// can never execute.
    pub fn create(
        service: &QueryService,
        uri: &str,
        ev: &EventLoop,
        config: &QueryConfig,
    ) -> Rc<RefCell<Self>> {
        Self::with_backend(ev, config, |events| service.create_session(uri, events))
    }

    /// Open a session on a back-end built by `make_backend`, which receives
    /// the sender for its events.
    pub fn with_backend<F>(ev: &EventLoop, config: &QueryConfig, make_backend: F) -> Rc<RefCell<Self>>
    where
        F: FnOnce(Marshaller<BackendEvent>) -> Result<Box<dyn QueryBackend>>,
    {
        Rc::new_cyclic(|weak: &Weak<RefCell<Self>>| {
            let weak = weak.clone();
            let events = ev.marshaller(move |event: BackendEvent| {
                let Some(session) = weak.upgrade() else {
                    return false;
                };
                session.borrow_mut().handle_backend_event(event);
                true
            });

            let backend = match make_backend(events) {
                Ok(backend) => Some(backend),
                Err(e) => {
                    tracing::warn!("Query session has no back-end: {}", e);
                    None
                }
            };

            RefCell::new(Self {
                base: NodeBase::new(ev).with_kind(NodeKind::QuerySession),
                can_execute: backend.is_some(),
                backend,
                status_source: StatusSource::new("Query Session"),
                busy: false,
                can_get_feedback_requests: false,
                can_refine: false,
                feedback_implicit: config.feedback_implicit,
                desired_feedback_count: config.desired_feedback_count,
                working_set_size: config.working_set_size,
                query_plan: QueryPlan::default(),
                initial_query_plan: QueryPlan::default(),
                results: HashMap::new(),
                feedback_requests: HashSet::new(),
                removed_results: HashSet::new(),
                feedback_changes: HashMap::new(),
                sorted: RefCell::new(HashMap::new()),
                events: Notifier::new(),
            })
        })
    }

    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn status_source(&self) -> &StatusSource {
        &self.status_source
    }

    // ── State queries ──

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn can_execute(&self) -> bool {
        self.can_execute && !self.busy
    }

    pub fn can_get_feedback_requests(&self) -> bool {
        self.can_get_feedback_requests && !self.busy
    }

    pub fn can_refine(&self) -> bool {
        self.can_refine && !self.busy
    }

    pub fn is_feedback_implicit(&self) -> bool {
        self.feedback_implicit
    }

    pub fn set_feedback_implicit(&mut self, implicit: bool) {
        self.feedback_implicit = implicit;
    }

    pub fn desired_feedback_count(&self) -> usize {
        self.desired_feedback_count
    }

    pub fn set_desired_feedback_count(&mut self, count: usize) {
        self.desired_feedback_count = count;
    }

    /// Working set size used by [`execute_plan`](Self::execute_plan).
    pub fn working_set_size(&self) -> usize {
        self.working_set_size
    }

    pub fn set_working_set_size(&mut self, size: usize) {
        self.working_set_size = size;
    }

    pub fn query_plan(&self) -> &QueryPlan {
        &self.query_plan
    }

    pub fn initial_query_plan(&self) -> &QueryPlan {
        &self.initial_query_plan
    }

    // ── Results ──

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn result(&self, id: ResultId) -> Option<&QueryResult> {
        self.results.get(&id)
    }

    /// Up to `max_count` result ids in `order`, starting at `start`.
    /// `None` means no limit.
    pub fn results(&self, order: SortOrder, start: usize, max_count: Option<usize>) -> Vec<ResultId> {
        if start > self.results.len() {
            return Vec::new();
        }
        let mut cache = self.sorted.borrow_mut();
        let full = cache
            .entry(order)
            .or_insert_with(|| sort::sorted_ids(order, &self.results));
        let end = match max_count {
            Some(n) => start.saturating_add(n).min(full.len()),
            None => full.len(),
        };
        full[start..end].to_vec()
    }

    pub fn feedback_requests(&self) -> &HashSet<ResultId> {
        &self.feedback_requests
    }

    pub fn is_feedback_requested(&self, id: ResultId) -> bool {
        self.feedback_requests.contains(&id)
    }

    /// Feedback edits since the last refinement.
    pub fn feedback_changes(&self) -> &HashMap<ResultId, FeedbackChange> {
        &self.feedback_changes
    }

    // ── Protocol ──

    /// Start the query. Allowed once per session.
    pub fn execute(&mut self, plan: QueryPlan, working_set_size: usize) -> bool {
        if !plan.is_valid() || !self.can_execute() || self.backend.is_none() {
            return false;
        }

        self.can_execute = false;
        self.query_plan = plan.clone();
        self.initial_query_plan = plan;
        self.set_busy(true);

        tracing::debug!("Executing query (working set {})", working_set_size);
        let dispatched = match self.backend.as_mut() {
            Some(backend) => backend.process_query(&self.query_plan, working_set_size),
            None => false,
        };
        if !dispatched {
            tracing::warn!("Query back-end refused the query");
            self.set_busy(false);
        }
        dispatched
    }

    /// Start the query with the configured working set size.
    pub fn execute_plan(&mut self, plan: QueryPlan) -> bool {
        let size = self.working_set_size;
        self.execute(plan, size)
    }

    pub fn get_feedback_requests(&mut self) -> bool {
        if !self.can_get_feedback_requests() {
            return false;
        }
        self.request_feedback()
    }

    /// Send every labelled result back to the back-end for re-ranking.
    pub fn refine(&mut self) -> bool {
        if !self.can_refine() {
            return false;
        }

        let mut feedback = HashMap::new();
        let mut labelled = 0usize;

        for id in &self.feedback_requests {
            if let Some(result) = self.results.get(id) {
                feedback.insert(*id, result.user_score);
                if result.user_score != IqrClassification::Unclassified {
                    labelled += 1;
                }
            }
        }
        for (id, result) in &self.results {
            if result.user_score != IqrClassification::Unclassified {
                feedback.insert(*id, result.user_score);
                labelled += 1;
            }
        }

        if labelled == 0 {
            self.events.emit(SessionEvent::Error {
                source: self.status_source.clone(),
                message: "Unable to refine query: no feedback provided".to_string(),
            });
            return false;
        }

        if self.backend.is_none() {
            return false;
        }

        self.set_busy(true);

        tracing::debug!("Refining query with {} labelled results", feedback.len());
        let dispatched = self
            .backend
            .as_mut()
            .map(|backend| backend.refine_query(&feedback))
            .unwrap_or(false);
        if !dispatched {
            // Pending edits stay for a retry.
            tracing::warn!("Query back-end refused the refinement");
            self.set_busy(false);
            return false;
        }

        self.removed_results = self.results.keys().copied().collect();
        self.feedback_requests.clear();
        self.feedback_changes.clear();
        self.set_can_refine(false);
        true
    }

    /// Label a result. Returns `false` only if `id` is unknown.
    pub fn set_result_feedback(&mut self, id: ResultId, score: IqrClassification) -> bool {
        let Some(result) = self.results.get_mut(&id) else {
            return false;
        };
        if result.user_score == score {
            return true;
        }

        let before = self
            .feedback_changes
            .get(&id)
            .map_or(result.user_score, |change| change.before);
        if before == score {
            self.feedback_changes.remove(&id);
        } else {
            self.feedback_changes.insert(id, FeedbackChange { before, after: score });
        }
        result.user_score = score;

        if self.initial_query_plan.is_similarity_query() {
            let changed = !self.feedback_changes.is_empty();
            self.set_can_refine(changed);
        }
        self.base.emit_modified();
        true
    }

    // ── Back-end ingestion ──

    /// Record a result emitted by the back-end.
    pub fn add_result(&mut self, mut result: QueryResult, feedback_request: bool) {
        let id = result.instance_id;

        if feedback_request {
            self.feedback_requests.insert(id);
            match self.results.get_mut(&id) {
                Some(existing) => {
                    existing.preference_score = result.preference_score;
                    self.sorted.get_mut().remove(&SortOrder::ByFeedbackPreference);
                }
                None => self.insert_result(result),
            }
        } else {
            if let Some(existing) = self.results.get(&id) {
                result.user_data = existing.user_data.clone();
                result.user_score = existing.user_score;
            }
            self.insert_result(result);
        }

        self.removed_results.remove(&id);
        self.base.emit_modified();
    }

    /// End of a result batch.
    pub fn prepare_results(&mut self, feedback_requests: bool) {
        self.can_get_feedback_requests = !feedback_requests;

        if !feedback_requests && self.feedback_implicit {
            self.request_feedback();
        } else {
            if !self.removed_results.is_empty() {
                let removed = std::mem::take(&mut self.removed_results);
                tracing::debug!("Removing {} results not seen this round", removed.len());
                for id in removed {
                    self.results.remove(&id);
                }
                self.sorted.get_mut().clear();
                self.base.emit_modified();
            }
            self.set_busy(false);
        }

        self.events
            .emit(SessionEvent::ResultSetComplete { feedback_requests });
    }

    /// Report a back-end failure. The session stays usable.
    pub fn fail(&mut self, source: StatusSource, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("Query back-end error from {}: {}", source, message);
        self.set_busy(false);
        self.events.emit(SessionEvent::Error {
            source: self.status_source.clone(),
            message,
        });
    }

    fn handle_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::ResultAvailable {
                result,
                feedback_request,
            } => self.add_result(result, feedback_request),
            BackendEvent::ResultSetComplete { feedback_requests } => {
                self.prepare_results(feedback_requests)
            }
            BackendEvent::Error { source, message } => self.fail(source, message),
            BackendEvent::Status {
                source,
                message,
                progress,
            } => self.events.emit(SessionEvent::Status {
                source,
                message,
                progress,
            }),
        }
    }

    // ── Internals ──

    fn request_feedback(&mut self) -> bool {
        self.set_busy(true);
        let count = self.desired_feedback_count;
        let dispatched = self
            .backend
            .as_mut()
            .map(|b| b.request_refinement(count))
            .unwrap_or(false);
        if !dispatched {
            tracing::warn!("Query back-end refused the feedback request");
            self.set_busy(false);
        }
        dispatched
    }

    fn insert_result(&mut self, result: QueryResult) {
        self.results.insert(result.instance_id, result);
        self.sorted.get_mut().clear();
    }

    fn set_busy(&mut self, busy: bool) {
        if self.busy != busy {
            self.busy = busy;
            self.events.emit(SessionEvent::BusyChanged(busy));
        }
    }

    fn set_can_refine(&mut self, can_refine: bool) {
        if self.can_refine != can_refine {
            self.can_refine = can_refine;
            self.events.emit(SessionEvent::CanRefineChanged(can_refine));
        }
    }
}

impl Node for QuerySessionNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn release(&mut self) {
        self.sorted.get_mut().clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::backend::MockQueryBackend;
    use mockall::predicate::*;

    fn session_with(mock: MockQueryBackend, implicit: bool) -> Rc<RefCell<QuerySessionNode>> {
        let ev = EventLoop::new();
        let config = QueryConfig {
            feedback_implicit: implicit,
            ..QueryConfig::default()
        };
        QuerySessionNode::with_backend(&ev, &config, move |_events| {
            Ok(Box::new(mock) as Box<dyn QueryBackend>)
        })
    }

    fn result(id: i64, rank: u64) -> QueryResult {
        QueryResult::new(ResultId(id), rank, rank as f64 / 10.0)
    }

    #[test]
    fn test_execute_marks_busy_synchronously() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query()
            .withf(|plan, size| plan.is_similarity_query() && *size == 50)
            .times(1)
            .return_const(true);
        let session = session_with(mock, true);
        let mut s = session.borrow_mut();

        assert!(s.can_execute());
        assert!(s.execute(QueryPlan::similarity(serde_json::json!({"q": 1})), 50));
        assert!(s.is_busy());
        assert!(!s.can_execute());
        assert!(!s.execute(QueryPlan::similarity(serde_json::Value::Null), 50));
    }

    #[test]
    fn test_invalid_plan_rejected() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query().never();
        let session = session_with(mock, true);
        assert!(!session.borrow_mut().execute(QueryPlan::default(), 10));
        assert!(session.borrow().can_execute());
    }

    #[test]
    fn test_implicit_feedback_chains_request() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query().return_const(true);
        mock.expect_request_refinement()
            .with(eq(10))
            .times(1)
            .return_const(true);
        let session = session_with(mock, true);
        let mut s = session.borrow_mut();

        s.execute(QueryPlan::retrieval(serde_json::Value::Null), 100);
        s.add_result(result(1, 0), false);
        s.prepare_results(false);
        assert!(s.is_busy());

        s.prepare_results(true);
        assert!(!s.is_busy());
        assert!(!s.can_get_feedback_requests());
    }

    #[test]
    fn test_feedback_result_keeps_user_score() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query().return_const(true);
        let session = session_with(mock, false);
        let mut s = session.borrow_mut();
        s.execute(QueryPlan::similarity(serde_json::Value::Null), 10);

        s.add_result(result(7, 3), false);
        assert!(s.set_result_feedback(ResultId(7), IqrClassification::Positive));

        let mut update = result(7, 9);
        update.preference_score = 0.75;
        update.user_score = IqrClassification::Negative;
        s.add_result(update.clone(), true);
        let stored = s.result(ResultId(7)).unwrap();
        assert_eq!(stored.user_score, IqrClassification::Positive);
        assert_eq!(stored.rank, 3);
        assert_eq!(stored.preference_score, 0.75);

        update.user_data = serde_json::Value::Null;
        s.add_result(update, false);
        let stored = s.result(ResultId(7)).unwrap();
        assert_eq!(stored.user_score, IqrClassification::Positive);
        assert_eq!(stored.rank, 9);
        assert!(s.is_feedback_requested(ResultId(7)));
    }

    #[test]
    fn test_can_refine_requires_similarity_plan() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query().return_const(true);
        let session = session_with(mock, false);
        let mut s = session.borrow_mut();
        s.execute(QueryPlan::retrieval(serde_json::Value::Null), 10);
        s.add_result(result(7, 0), false);
        s.prepare_results(false);

        assert!(s.set_result_feedback(ResultId(7), IqrClassification::Positive));
        assert!(!s.can_refine());
    }

    #[test]
    fn test_feedback_undo_clears_can_refine() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query().return_const(true);
        let session = session_with(mock, false);
        let mut s = session.borrow_mut();
        s.execute(QueryPlan::similarity(serde_json::Value::Null), 10);
        s.add_result(result(1, 0), false);
        s.prepare_results(false);

        s.set_result_feedback(ResultId(1), IqrClassification::Negative);
        assert!(s.can_refine());
        s.set_result_feedback(ResultId(1), IqrClassification::Unclassified);
        assert!(!s.can_refine());
        assert!(s.feedback_changes().is_empty());
        assert!(!s.set_result_feedback(ResultId(99), IqrClassification::Positive));
    }

    #[test]
    fn test_refine_sends_labelled_and_requested_results() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query().return_const(true);
        mock.expect_refine_query()
            .withf(|fb| {
                fb.len() == 2
                    && fb.get(&ResultId(1)) == Some(&IqrClassification::Positive)
                    && fb.get(&ResultId(2)) == Some(&IqrClassification::Unclassified)
            })
            .times(1)
            .return_const(true);
        let session = session_with(mock, false);
        let mut s = session.borrow_mut();
        s.execute(QueryPlan::similarity(serde_json::Value::Null), 10);
        s.add_result(result(1, 0), false);
        s.add_result(result(2, 1), true);
        s.add_result(result(3, 2), false);
        s.prepare_results(false);

        s.set_result_feedback(ResultId(1), IqrClassification::Positive);
        assert!(s.refine());
        assert!(s.is_busy());
        assert!(!s.can_refine());
        assert!(s.feedback_requests().is_empty());
        assert!(!s.refine());
    }

    #[test]
    fn test_refused_refinement_keeps_pending_edits() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query().return_const(true);
        mock.expect_refine_query().times(1).return_const(false);
        let session = session_with(mock, false);
        let mut s = session.borrow_mut();
        s.execute(QueryPlan::similarity(serde_json::Value::Null), 10);
        s.add_result(result(1, 0), false);
        s.add_result(result(2, 1), true);
        s.prepare_results(false);

        s.set_result_feedback(ResultId(1), IqrClassification::Positive);
        assert!(!s.refine());
        assert!(!s.is_busy());
        assert!(s.can_refine());
        assert_eq!(s.feedback_changes().len(), 1);
        assert!(s.is_feedback_requested(ResultId(2)));
        assert_eq!(s.result_count(), 2);
    }

    #[test]
    fn test_execute_plan_uses_configured_working_set() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query()
            .withf(|_, size| *size == 250)
            .times(1)
            .return_const(true);
        let ev = EventLoop::new();
        let config = QueryConfig {
            working_set_size: 250,
            ..QueryConfig::default()
        };
        let session = QuerySessionNode::with_backend(&ev, &config, move |_events| {
            Ok(Box::new(mock) as Box<dyn QueryBackend>)
        });
        let mut s = session.borrow_mut();

        assert_eq!(s.working_set_size(), 250);
        assert!(s.execute_plan(QueryPlan::similarity(serde_json::Value::Null)));
        assert!(s.is_busy());
    }

    #[test]
    fn test_refine_without_feedback_reports_error() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query().return_const(true);
        mock.expect_refine_query().never();
        let session = session_with(mock, false);
        let mut s = session.borrow_mut();
        s.execute(QueryPlan::similarity(serde_json::Value::Null), 10);
        s.add_result(result(1, 0), false);
        s.prepare_results(false);

        s.can_refine = true;
        let rx = s.subscribe();
        assert!(!s.refine());
        assert!(rx
            .try_iter()
            .any(|e| matches!(e, SessionEvent::Error { .. })));
    }

    #[test]
    fn test_fail_clears_busy() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query().return_const(true);
        let session = session_with(mock, false);
        let mut s = session.borrow_mut();
        s.execute(QueryPlan::similarity(serde_json::Value::Null), 10);
        let rx = s.subscribe();
        s.fail(StatusSource::new("backend"), "connection lost");
        assert!(!s.is_busy());
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events[0], SessionEvent::BusyChanged(false));
        assert!(matches!(&events[1], SessionEvent::Error { message, .. } if message == "connection lost"));
    }

    #[test]
    fn test_results_paging_and_cache() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query().return_const(true);
        let session = session_with(mock, false);
        let mut s = session.borrow_mut();
        s.execute(QueryPlan::similarity(serde_json::Value::Null), 10);
        for (id, rank) in [(5, 2), (6, 0), (7, 1)] {
            s.add_result(result(id, rank), false);
        }
        assert_eq!(
            s.results(SortOrder::ByRank, 0, None),
            vec![ResultId(6), ResultId(7), ResultId(5)]
        );
        assert_eq!(s.results(SortOrder::ByRank, 1, Some(1)), vec![ResultId(7)]);
        assert!(s.results(SortOrder::ById, 4, None).is_empty());
        assert!(s.results(SortOrder::ById, 3, None).is_empty());

        s.add_result(result(4, 3), false);
        assert_eq!(s.results(SortOrder::ByRank, 3, None), vec![ResultId(4)]);
    }

    #[test]
    fn test_repeated_feedback_is_silent() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query().return_const(true);
        let session = session_with(mock, false);
        let mut s = session.borrow_mut();
        s.execute(QueryPlan::similarity(serde_json::Value::Null), 10);
        s.add_result(result(7, 0), false);

        let modified = s.base().events().subscribe();
        assert!(s.set_result_feedback(ResultId(7), IqrClassification::Positive));
        assert_eq!(modified.try_iter().count(), 1);
        assert!(s.set_result_feedback(ResultId(7), IqrClassification::Positive));
        assert_eq!(modified.try_iter().count(), 0);
    }

    #[test]
    fn test_explicit_refinement_prunes_on_primary_batch() {
        let mut mock = MockQueryBackend::new();
        mock.expect_process_query().return_const(true);
        mock.expect_refine_query().times(1).return_const(true);
        let session = session_with(mock, false);
        let mut s = session.borrow_mut();
        s.execute(QueryPlan::similarity(serde_json::Value::Null), 10);
        for id in 1..=3 {
            s.add_result(result(id, id as u64), false);
        }
        s.prepare_results(false);
        s.set_result_feedback(ResultId(2), IqrClassification::Positive);
        assert!(s.refine());

        s.add_result(result(2, 0), false);
        let modified = s.base().events().subscribe();
        s.prepare_results(false);
        assert_eq!(modified.try_iter().count(), 1);
        assert_eq!(s.results(SortOrder::ById, 0, None), vec![ResultId(2)]);
        assert_eq!(
            s.result(ResultId(2)).map(|r| r.user_score),
            Some(IqrClassification::Positive)
        );
        assert!(!s.is_busy());

        // Nothing left to prune: no notification.
        s.prepare_results(true);
        assert_eq!(modified.try_iter().count(), 0);
    }

    #[test]
    fn test_missing_backend_cannot_execute() {
        let ev = EventLoop::new();
        let session = QuerySessionNode::create(
            &QueryService::new(),
            "kip://nowhere",
            &ev,
            &QueryConfig::default(),
        );
        assert!(!session.borrow().can_execute());
        assert_eq!(session.borrow().type_name(), "Query Session");
    }
}
