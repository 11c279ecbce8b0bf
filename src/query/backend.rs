//! Query back-end seam and service registry.

use super::types::{IqrClassification, QueryPlan, QueryResult, ResultId};
use crate::error::{DataFrameworkError, Result, ResultExt};
use crate::event_loop::Marshaller;
use crate::types::StatusSource;
use std::collections::HashMap;
use url::Url;

/// Notifications from a query back-end to its session.
///
/// Back-ends send these through the [`Marshaller`] handed to them at
/// creation, from any thread.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendEvent {
    ResultAvailable {
        result: QueryResult,
        feedback_request: bool,
    },
    /// The current batch is complete.
    ResultSetComplete { feedback_requests: bool },
    Error {
        source: StatusSource,
        message: String,
    },
    Status {
        source: StatusSource,
        message: String,
        /// `(done, total)`, if known.
        progress: Option<(u64, u64)>,
    },
}

/// Client side of a query service session.
///
/// Each call dispatches asynchronous work; results come back as
/// [`BackendEvent`]s. A `false` return means the request was not dispatched.
#[cfg_attr(test, mockall::automock)]
pub trait QueryBackend {
    fn process_query(&mut self, plan: &QueryPlan, working_set_size: usize) -> bool;

    /// Ask for up to `desired_count` results the back-end wants labelled.
    fn request_refinement(&mut self, desired_count: usize) -> bool;

    fn refine_query(&mut self, feedback: &HashMap<ResultId, IqrClassification>) -> bool;
}

type BackendFactory =
    Box<dyn Fn(&Url, Marshaller<BackendEvent>) -> Result<Box<dyn QueryBackend>>>;

/// Registry of query back-ends, keyed by service URI scheme.
#[derive(Default)]
pub struct QueryService {
    factories: HashMap<String, BackendFactory>,
}

impl std::fmt::Debug for QueryService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryService")
            .field("schemes", &self.schemes())
            .finish()
    }
}

impl QueryService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` for URIs with `scheme`, replacing any previous one.
    pub fn register<F>(&mut self, scheme: impl Into<String>, factory: F)
    where
        F: Fn(&Url, Marshaller<BackendEvent>) -> Result<Box<dyn QueryBackend>> + 'static,
    {
        let scheme = scheme.into();
        tracing::debug!("Registered query service scheme '{}'", scheme);
        self.factories.insert(scheme, Box::new(factory));
    }

    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }

    /// Create a back-end session for the service at `uri`.
    pub fn create_session(
        &self,
        uri: &str,
        events: Marshaller<BackendEvent>,
    ) -> Result<Box<dyn QueryBackend>> {
        let url = Url::parse(uri).map_err(|e| DataFrameworkError::InvalidServiceUri {
            uri: uri.to_string(),
            message: e.to_string(),
        })?;
        let factory = self
            .factories
            .get(url.scheme())
            .ok_or_else(|| DataFrameworkError::UnknownService(url.scheme().to_string()))?;
        factory(&url, events).with_context(|| format!("Failed to create session for {}", uri))
    }
}
