//! Core value types shared across the framework
//!
//! # Main Types
//!
//! - [`TimeStamp`] - A point in time, by wall-clock microseconds and/or frame number
//! - [`StatusSource`] - Identifies the component that produced a status or error message
//! - [`UpdateFlags`] - Option flags attached to a consumer's update requests

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A point in time.
///
/// Either component may be absent. Ordering prefers the time component and
/// falls back to the frame number when either side lacks a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TimeStamp {
    /// Microseconds since the epoch.
    pub time: Option<i64>,
    /// Video frame number.
    pub frame: Option<u32>,
}

impl TimeStamp {
    pub fn from_time(time: i64) -> Self {
        Self {
            time: Some(time),
            frame: None,
        }
    }

    pub fn from_frame(frame: u32) -> Self {
        Self {
            time: None,
            frame: Some(frame),
        }
    }

    pub fn new(time: i64, frame: u32) -> Self {
        Self {
            time: Some(time),
            frame: Some(frame),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.time.is_some() || self.frame.is_some()
    }

    /// Compare two time stamps, or `None` if they share no component.
    pub fn compare(&self, other: &TimeStamp) -> Option<Ordering> {
        match (self.time, other.time) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => match (self.frame, other.frame) {
                (Some(a), Some(b)) => Some(a.cmp(&b)),
                _ => None,
            },
        }
    }

    /// Distance between two time stamps in the shared component's units.
    pub fn distance(&self, other: &TimeStamp) -> Option<u64> {
        match (self.time, other.time) {
            (Some(a), Some(b)) => Some(a.abs_diff(b)),
            _ => match (self.frame, other.frame) {
                (Some(a), Some(b)) => Some(u64::from(a.abs_diff(b))),
                _ => None,
            },
        }
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.time, self.frame) {
            (Some(t), Some(n)) => write!(f, "{}us (frame {})", t, n),
            (Some(t), None) => write!(f, "{}us", t),
            (None, Some(n)) => write!(f, "frame {}", n),
            (None, None) => write!(f, "(invalid)"),
        }
    }
}

/// Identifies the originator of a status or error notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct StatusSource(pub String);

impl StatusSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StatusSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Option flags for update requests made through a proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct UpdateFlags(u8);

impl UpdateFlags {
    pub const NONE: UpdateFlags = UpdateFlags(0);
    /// Deliver partial data as it becomes available.
    pub const INCREMENTAL: UpdateFlags = UpdateFlags(1 << 0);
    /// Prefer the fastest possible answer over the most complete one.
    pub const FASTEST: UpdateFlags = UpdateFlags(1 << 1);

    #[inline]
    pub fn contains(self, other: UpdateFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for UpdateFlags {
    type Output = UpdateFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        UpdateFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for UpdateFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}
