//! Interactive query refinement (IQR).
//!
//! A [`QuerySessionNode`] drives one query against a back-end created by a
//! [`QueryService`]: execute, collect results, gather user feedback on a
//! subset of them, and refine until the user is satisfied.

pub mod backend;
pub mod session;
pub mod sort;
pub mod types;

pub use backend::{BackendEvent, QueryBackend, QueryService};
pub use session::{QuerySessionNode, SessionEvent};
pub use types::{
    FeedbackChange, IqrClassification, QueryKind, QueryPlan, QueryResult, ResultId, SortOrder,
};
