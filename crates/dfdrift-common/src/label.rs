//! Event labels and directly-follows pairs.
//!
//! An [`EventLabel`] is the classifier's output for one event and is opaque
//! to the frequency stores. A [`DirectlyFollowsPair`] is an ordered pair of
//! labels where `to` immediately follows `from` within one trace.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable label derived from an event's attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventLabel(pub String);

impl EventLabel {
    pub fn new(label: impl Into<String>) -> Self {
        EventLabel(label.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventLabel {
    fn from(s: &str) -> Self {
        EventLabel(s.to_string())
    }
}

impl From<String> for EventLabel {
    fn from(s: String) -> Self {
        EventLabel(s)
    }
}

impl AsRef<str> for EventLabel {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Ordered pair of labels: `to` directly follows `from`.
///
/// Ordering is lexicographic on `(from, to)`, which is the key order used
/// when two distributions are aligned for comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DirectlyFollowsPair {
    pub from: EventLabel,
    pub to: EventLabel,
}

impl DirectlyFollowsPair {
    pub fn new(from: impl Into<EventLabel>, to: impl Into<EventLabel>) -> Self {
        DirectlyFollowsPair {
            from: from.into(),
            to: to.into(),
        }
    }

    /// All adjacent pairs of a label sequence, in trace order.
    pub fn windows(labels: &[EventLabel]) -> impl Iterator<Item = DirectlyFollowsPair> + '_ {
        labels
            .windows(2)
            .map(|w| DirectlyFollowsPair::new(w[0].clone(), w[1].clone()))
    }
}

impl fmt::Display for DirectlyFollowsPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

impl<A: Into<EventLabel>, B: Into<EventLabel>> From<(A, B)> for DirectlyFollowsPair {
    fn from((from, to): (A, B)) -> Self {
        DirectlyFollowsPair::new(from, to)
    }
}
