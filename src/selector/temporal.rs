//! Time-based selection.

use super::Selector;
use crate::types::TimeStamp;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How a [`TemporalSelector`] resolves a time that falls between samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TemporalMode {
    /// Closest sample on either side; earlier wins a tie.
    #[default]
    Nearest,
    /// Latest sample not after the requested time.
    AtOrBefore,
    /// Earliest sample not before the requested time.
    AtOrAfter,
}

/// Request the data at (or around) a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalSelector {
    pub time: TimeStamp,
    pub mode: TemporalMode,
}

impl Selector for TemporalSelector {}

impl TemporalSelector {
    pub fn new(time: TimeStamp, mode: TemporalMode) -> Self {
        Self { time, mode }
    }

    pub fn nearest(time: TimeStamp) -> Self {
        Self::new(time, TemporalMode::Nearest)
    }

    pub fn at_or_before(time: TimeStamp) -> Self {
        Self::new(time, TemporalMode::AtOrBefore)
    }

    pub fn at_or_after(time: TimeStamp) -> Self {
        Self::new(time, TemporalMode::AtOrAfter)
    }

    /// Pick the sample matching this selector from `samples`, which must be
    /// sorted by time stamp. Samples whose stamp cannot be compared with the
    /// requested time are skipped.
    pub fn pick<'a, T>(&self, samples: &'a [T], stamp: impl Fn(&T) -> TimeStamp) -> Option<&'a T> {
        match self.mode {
            TemporalMode::AtOrBefore => samples.iter().rev().find(|s| {
                matches!(
                    stamp(s).compare(&self.time),
                    Some(Ordering::Less | Ordering::Equal)
                )
            }),
            TemporalMode::AtOrAfter => samples.iter().find(|s| {
                matches!(
                    stamp(s).compare(&self.time),
                    Some(Ordering::Greater | Ordering::Equal)
                )
            }),
            TemporalMode::Nearest => {
                let mut best: Option<(u64, &T)> = None;
                for sample in samples {
                    let Some(d) = stamp(sample).distance(&self.time) else {
                        continue;
                    };
                    if best.map_or(true, |(bd, _)| d < bd) {
                        best = Some((d, sample));
                    }
                }
                best.map(|(_, s)| s)
            }
        }
    }
}
