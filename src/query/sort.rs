//! Result orderings.

use super::types::{QueryResult, ResultId, SortOrder};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Exact score comparison. Equal scores fall through to the next key, so
/// every ordering below is total and consistent.
fn score_cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

pub fn compare(order: SortOrder, a: &QueryResult, b: &QueryResult) -> Ordering {
    let by_id = || a.instance_id.cmp(&b.instance_id);
    match order {
        SortOrder::ById => by_id(),
        SortOrder::ByRank => a
            .rank
            .cmp(&b.rank)
            .then_with(|| score_cmp(a.relevancy_score, b.relevancy_score))
            .then_with(by_id),
        SortOrder::ByRelevancy => score_cmp(a.relevancy_score, b.relevancy_score)
            .then_with(|| a.rank.cmp(&b.rank))
            .then_with(by_id),
        SortOrder::ByFeedbackPreference => score_cmp(a.preference_score, b.preference_score)
            .then_with(|| a.rank.cmp(&b.rank))
            .then_with(by_id),
    }
}

/// Ids of `results` in `order`.
pub fn sorted_ids(order: SortOrder, results: &HashMap<ResultId, QueryResult>) -> Vec<ResultId> {
    let mut sorted: Vec<&QueryResult> = results.values().collect();
    sorted.sort_by(|a, b| compare(order, a, b));
    sorted.into_iter().map(|r| r.instance_id).collect()
}
