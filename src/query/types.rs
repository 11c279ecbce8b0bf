//! Query session value types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Back-end assigned key of a query result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ResultId(pub i64);

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User feedback label for a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IqrClassification {
    Positive = 0,
    Negative = 1,
    #[default]
    Unclassified = 2,
}

/// A single query result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryResult {
    pub instance_id: ResultId,
    pub rank: u64,
    pub relevancy_score: f64,
    pub preference_score: f64,
    /// Feedback entered by the user. The back-end is not authoritative for it.
    pub user_score: IqrClassification,
    /// Client-side annotations, carried across re-emissions.
    pub user_data: serde_json::Value,
    /// Provider-specific content.
    pub payload: serde_json::Value,
}

impl QueryResult {
    pub fn new(instance_id: ResultId, rank: u64, relevancy_score: f64) -> Self {
        Self {
            instance_id,
            rank,
            relevancy_score,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QueryKind {
    #[default]
    Invalid,
    /// Plain retrieval; results cannot be refined.
    Retrieval,
    /// Similarity search; supports iterative refinement.
    Similarity,
}

/// Opaque query plan handed to the back-end.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct QueryPlan {
    pub kind: QueryKind,
    pub payload: serde_json::Value,
}

impl QueryPlan {
    pub fn new(kind: QueryKind, payload: serde_json::Value) -> Self {
        Self { kind, payload }
    }

    pub fn retrieval(payload: serde_json::Value) -> Self {
        Self::new(QueryKind::Retrieval, payload)
    }

    pub fn similarity(payload: serde_json::Value) -> Self {
        Self::new(QueryKind::Similarity, payload)
    }

    pub fn is_valid(&self) -> bool {
        self.kind != QueryKind::Invalid
    }

    pub fn is_similarity_query(&self) -> bool {
        self.kind == QueryKind::Similarity
    }
}

/// Ordering for [`QuerySessionNode::results`](super::QuerySessionNode::results).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Result id ascending.
    #[default]
    ById,
    /// Relevancy, then rank, then id.
    ByRelevancy,
    /// Preference, then rank, then id.
    ByFeedbackPreference,
    /// Rank, then relevancy, then id.
    ByRank,
}

/// Feedback score of one result before and after the user's edits since the
/// last refinement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackChange {
    pub before: IqrClassification,
    pub after: IqrClassification,
}
