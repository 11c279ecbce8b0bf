//! Test data builders

use visgui_data::query::{IqrClassification, QueryResult, ResultId};
use visgui_data::source::{SourceHandle, TrackId, TrackState};
use visgui_data::TimeStamp;

/// Builder for query results
pub struct ResultBuilder {
    result: QueryResult,
}

impl ResultBuilder {
    pub fn new(id: i64) -> Self {
        Self {
            result: QueryResult::new(ResultId(id), id.max(0) as u64, 0.5),
        }
    }

    pub fn rank(mut self, rank: u64) -> Self {
        self.result.rank = rank;
        self
    }

    pub fn relevancy(mut self, score: f64) -> Self {
        self.result.relevancy_score = score;
        self
    }

    pub fn preference(mut self, score: f64) -> Self {
        self.result.preference_score = score;
        self
    }

    pub fn user_score(mut self, score: IqrClassification) -> Self {
        self.result.user_score = score;
        self
    }

    pub fn build(self) -> QueryResult {
        self.result
    }
}

/// Builder for a single track's states
pub struct TrackBuilder {
    id: TrackId,
    states: Vec<TrackState>,
}

impl TrackBuilder {
    pub fn new(source: SourceHandle, serial: i64) -> Self {
        Self {
            id: TrackId::new(source, serial),
            states: Vec::new(),
        }
    }

    /// Add a state at microsecond time `t`
    pub fn at(mut self, t: i64, x: f64, y: f64) -> Self {
        self.states
            .push(TrackState::new(TimeStamp::from_time(t), [x, y]));
        self
    }

    pub fn build(self) -> (TrackId, Vec<TrackState>) {
        (self.id, self.states)
    }
}
