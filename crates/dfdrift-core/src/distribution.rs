//! Distributions over process behavior.
//!
//! [`Distribution`] is the closed set of frequency stores the detector knows
//! how to maintain and compare. Every operation that takes two distributions
//! requires them to be the same variant and fails with
//! [`Error::TypeMismatch`] otherwise.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use crate::classify::{AttributeSource, EventClassifier};
use crate::frequency::FrequencyStore;
use crate::logging::{event_names, Stage};
use crate::metrics;
use dfdrift_common::{DirectlyFollowsPair, DistributionKind, Error, EventLabel, Result};

/// What happens to a trace that fails classification part-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    /// Observations recorded before the failing event stay in the store.
    /// Relative values are still refreshed before the error is returned.
    #[default]
    Incremental,
    /// The whole trace is classified first; a failure leaves the store
    /// untouched.
    Atomic,
}

impl std::str::FromStr for ApplyMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "incremental" => Ok(ApplyMode::Incremental),
            "atomic" => Ok(ApplyMode::Atomic),
            _ => Err(format!("unknown apply mode: {}", s)),
        }
    }
}

impl fmt::Display for ApplyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyMode::Incremental => write!(f, "incremental"),
            ApplyMode::Atomic => write!(f, "atomic"),
        }
    }
}

/// A frequency distribution of one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Distribution {
    DirectlyFollows(FrequencyStore<DirectlyFollowsPair>),
    Activity(FrequencyStore<EventLabel>),
}

/// Relative frequencies captured at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub enum RelativeSnapshot {
    DirectlyFollows(HashMap<DirectlyFollowsPair, f64>),
    Activity(HashMap<EventLabel, f64>),
}

impl RelativeSnapshot {
    pub fn kind(&self) -> DistributionKind {
        match self {
            RelativeSnapshot::DirectlyFollows(_) => DistributionKind::DirectlyFollows,
            RelativeSnapshot::Activity(_) => DistributionKind::Activity,
        }
    }

    /// Sum over the key union of the squared relative differences.
    pub fn squared_distance(&self, other: &RelativeSnapshot) -> Result<f64> {
        match (self, other) {
            (RelativeSnapshot::DirectlyFollows(a), RelativeSnapshot::DirectlyFollows(b)) => {
                Ok(metrics::squared_distance(a, b))
            }
            (RelativeSnapshot::Activity(a), RelativeSnapshot::Activity(b)) => {
                Ok(metrics::squared_distance(a, b))
            }
            _ => Err(Error::TypeMismatch {
                left: self.kind(),
                right: other.kind(),
            }),
        }
    }
}

impl Distribution {
    /// An empty distribution of `kind`.
    pub fn new(kind: DistributionKind) -> Self {
        match kind {
            DistributionKind::DirectlyFollows => Distribution::DirectlyFollows(FrequencyStore::new()),
            DistributionKind::Activity => Distribution::Activity(FrequencyStore::new()),
        }
    }

    pub fn kind(&self) -> DistributionKind {
        match self {
            Distribution::DirectlyFollows(_) => DistributionKind::DirectlyFollows,
            Distribution::Activity(_) => DistributionKind::Activity,
        }
    }

    /// A fresh, empty distribution of the same kind.
    pub fn empty_like(&self) -> Self {
        Self::new(self.kind())
    }

    pub fn total(&self) -> f64 {
        match self {
            Distribution::DirectlyFollows(store) => store.total(),
            Distribution::Activity(store) => store.total(),
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        match self {
            Distribution::DirectlyFollows(store) => store.len(),
            Distribution::Activity(store) => store.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn snapshot_relative(&self) -> RelativeSnapshot {
        match self {
            Distribution::DirectlyFollows(store) => {
                RelativeSnapshot::DirectlyFollows(store.snapshot_relative())
            }
            Distribution::Activity(store) => RelativeSnapshot::Activity(store.snapshot_relative()),
        }
    }

    /// Record an already-classified trace.
    pub fn update_labels(&mut self, labels: &[EventLabel]) {
        match self {
            Distribution::DirectlyFollows(store) => store.update(labels),
            Distribution::Activity(store) => store.update(labels),
        }
    }

    /// Classify and record one trace. Returns the number of observations
    /// (pairs or labels) recorded.
    ///
    /// A directly-follows distribution never classifies a trace of fewer
    /// than two events, since such a trace contributes no pair.
    pub fn add_trace<E: AttributeSource>(
        &mut self,
        trace: &[E],
        classifier: &EventClassifier,
        mode: ApplyMode,
    ) -> Result<usize> {
        if self.kind() == DistributionKind::DirectlyFollows && trace.len() < 2 {
            return Ok(0);
        }
        match mode {
            ApplyMode::Atomic => {
                let labels = classifier.classify_trace(trace)?;
                let before = self.total();
                self.update_labels(&labels);
                Ok((self.total() - before) as usize)
            }
            ApplyMode::Incremental => {
                let outcome = match self {
                    Distribution::DirectlyFollows(store) => {
                        record_pairs_incrementally(store, trace, classifier)
                    }
                    Distribution::Activity(store) => {
                        record_labels_incrementally(store, trace, classifier)
                    }
                };
                outcome.map_err(|(applied, e)| {
                    crate::log_event!(
                        WARN,
                        event_names::TRACE_PARTIALLY_APPLIED,
                        Stage::Update,
                        "trace partially applied before classification failure",
                        kind = self.kind().to_string(),
                        applied = applied,
                        error = e.to_string()
                    );
                    e
                })
            }
        }
    }

    /// Squared-difference distance between relative frequencies.
    pub fn total_distance(&self, other: &Distribution) -> Result<f64> {
        metrics::distance(self, other)
    }

    /// Chi-square homogeneity p-value against `other`.
    pub fn chi_square_statistic(&self, other: &Distribution) -> Result<f64> {
        metrics::significance(self, other)
    }
}

/// Error side carries the number of observations already recorded.
type Partial = std::result::Result<usize, (usize, Error)>;

fn record_pairs_incrementally<E: AttributeSource>(
    store: &mut FrequencyStore<DirectlyFollowsPair>,
    trace: &[E],
    classifier: &EventClassifier,
) -> Partial {
    let mut recorded = 0;
    let mut previous: Option<EventLabel> = None;
    for (i, event) in trace.iter().enumerate() {
        let label = match classifier.classify_at(event, i) {
            Ok(label) => label,
            Err(e) => {
                store.recompute_relative();
                return Err((recorded, e));
            }
        };
        if let Some(from) = previous.take() {
            store.record(DirectlyFollowsPair::new(from, label.clone()));
            recorded += 1;
        }
        previous = Some(label);
    }
    store.recompute_relative();
    Ok(recorded)
}

fn record_labels_incrementally<E: AttributeSource>(
    store: &mut FrequencyStore<EventLabel>,
    trace: &[E],
    classifier: &EventClassifier,
) -> Partial {
    for (i, event) in trace.iter().enumerate() {
        match classifier.classify_at(event, i) {
            Ok(label) => store.record(label),
            Err(e) => {
                store.recompute_relative();
                return Err((i, e));
            }
        }
    }
    store.recompute_relative();
    Ok(trace.len())
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::DirectlyFollows(store) => write!(f, "{}", store),
            Distribution::Activity(store) => write!(f, "{}", store),
        }
    }
}
