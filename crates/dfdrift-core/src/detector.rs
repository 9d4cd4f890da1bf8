//! Drift detection over a shared, concurrently updated distribution.
//!
//! # Atomicity
//!
//! [`SharedDistribution::check_drift_labels`] and
//! [`DriftDetector::check_drift`] hold the write lock across the whole
//! snapshot, update, snapshot, compare sequence. No other update can land
//! between the two snapshots, so the reported norm is exactly the shift
//! caused by the trace being checked. Plain updates and reads take the same
//! lock and never observe a half-applied trace.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::classify::{AttributeSource, EventClassifier};
use crate::config::DriftConfig;
use crate::distribution::{ApplyMode, Distribution};
use crate::logging::event_names;
use crate::metrics;
use dfdrift_common::{DistributionKind, Error, EventLabel, Result};

/// Outcome of one update-and-test step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftCheck {
    /// Whether the norm exceeded epsilon.
    pub drifted: bool,
    /// Euclidean norm of the change in relative frequencies.
    pub norm: f64,
    pub epsilon: f64,
    /// Store total before the trace was applied.
    pub total_before: f64,
    /// Store total after the trace was applied.
    pub total_after: f64,
}

/// A distribution shared between threads.
///
/// Clones share the same underlying store.
#[derive(Debug, Clone)]
pub struct SharedDistribution {
    kind: DistributionKind,
    inner: Arc<RwLock<Distribution>>,
}

impl SharedDistribution {
    /// An empty shared distribution of `kind`.
    pub fn new(kind: DistributionKind) -> Self {
        Self::from_distribution(Distribution::new(kind))
    }

    pub fn from_distribution(distribution: Distribution) -> Self {
        Self {
            kind: distribution.kind(),
            inner: Arc::new(RwLock::new(distribution)),
        }
    }

    pub fn kind(&self) -> DistributionKind {
        self.kind
    }

    /// A new, unshared, empty store of the same kind.
    pub fn empty_like(&self) -> Self {
        Self::new(self.kind)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Distribution>> {
        self.inner
            .read()
            .map_err(|e| Error::LockPoisoned(format!("lock poisoned: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Distribution>> {
        self.inner
            .write()
            .map_err(|e| Error::LockPoisoned(format!("lock poisoned: {}", e)))
    }

    /// Run `f` against a consistent view of the store.
    pub fn with_read<R>(&self, f: impl FnOnce(&Distribution) -> R) -> Result<R> {
        let guard = self.read()?;
        Ok(f(&guard))
    }

    /// Owned copy of the current distribution.
    pub fn snapshot(&self) -> Result<Distribution> {
        self.with_read(Distribution::clone)
    }

    pub fn total(&self) -> Result<f64> {
        self.with_read(Distribution::total)
    }

    pub fn len(&self) -> Result<usize> {
        self.with_read(Distribution::len)
    }

    pub fn is_empty(&self) -> Result<bool> {
        self.with_read(Distribution::is_empty)
    }

    /// Record an already-classified trace without testing for drift.
    pub fn update_labels(&self, labels: &[EventLabel]) -> Result<()> {
        self.write()?.update_labels(labels);
        Ok(())
    }

    /// Classify and record a trace without testing for drift.
    pub fn update_trace<E: AttributeSource>(
        &self,
        trace: &[E],
        classifier: &EventClassifier,
        mode: ApplyMode,
    ) -> Result<usize> {
        self.write()?.add_trace(trace, classifier, mode)
    }

    /// Distance between this store and `other`.
    pub fn distance(&self, other: &Distribution) -> Result<f64> {
        let guard = self.read()?;
        metrics::distance(&guard, other)
    }

    /// Chi-square p-value of this store against `other`.
    pub fn significance(&self, other: &Distribution) -> Result<f64> {
        let guard = self.read()?;
        metrics::significance(&guard, other)
    }

    /// Apply `labels` and report whether the relative frequencies moved by
    /// more than `epsilon`.
    pub fn check_drift_labels(&self, labels: &[EventLabel], epsilon: f64) -> Result<DriftCheck> {
        self.check_drift_with(epsilon, |dist| {
            dist.update_labels(labels);
            Ok(())
        })
    }

    /// Classify `trace`, apply it and test for drift.
    ///
    /// In atomic mode the trace is classified before the lock is taken, so
    /// a classification error never touches the store. In incremental mode
    /// classification happens under the lock and a failure leaves the
    /// recorded prefix in place.
    pub fn check_drift_trace<E: AttributeSource>(
        &self,
        trace: &[E],
        classifier: &EventClassifier,
        mode: ApplyMode,
        epsilon: f64,
    ) -> Result<DriftCheck> {
        match mode {
            ApplyMode::Atomic => {
                let skip = self.kind == DistributionKind::DirectlyFollows && trace.len() < 2;
                let labels = if skip {
                    Vec::new()
                } else {
                    classifier.classify_trace(trace)?
                };
                self.check_drift_labels(&labels, epsilon)
            }
            ApplyMode::Incremental => self.check_drift_with(epsilon, |dist| {
                dist.add_trace(trace, classifier, ApplyMode::Incremental)
                    .map(|_| ())
            }),
        }
    }

    /// Atomic snapshot, apply, snapshot, compare under one write lock.
    ///
    /// An error from `apply` is returned after the lock is released; whatever
    /// `apply` recorded before failing stays in the store.
    fn check_drift_with<F>(&self, epsilon: f64, apply: F) -> Result<DriftCheck>
    where
        F: FnOnce(&mut Distribution) -> Result<()>,
    {
        let mut dist = self.write()?;
        let before = dist.snapshot_relative();
        let total_before = dist.total();

        apply(&mut dist)?;

        let after = dist.snapshot_relative();
        let total_after = dist.total();
        drop(dist);

        let norm = before.squared_distance(&after)?.sqrt();
        let drifted = norm > epsilon;
        trace!(
            event = event_names::DRIFT_CHECKED,
            norm,
            epsilon,
            drifted,
            total_after,
            "drift predicate evaluated"
        );
        Ok(DriftCheck {
            drifted,
            norm,
            epsilon,
            total_before,
            total_after,
        })
    }
}

/// Classification settings for the drift predicate.
#[derive(Debug, Clone, Default)]
pub struct DriftDetector {
    classifier: EventClassifier,
    mode: ApplyMode,
}

impl DriftDetector {
    pub fn new(classifier: EventClassifier, mode: ApplyMode) -> Self {
        Self { classifier, mode }
    }

    pub fn from_config(config: &DriftConfig) -> Self {
        Self::new(EventClassifier::from_config(&config.classifier), config.apply_mode)
    }

    pub fn classifier(&self) -> &EventClassifier {
        &self.classifier
    }

    pub fn mode(&self) -> ApplyMode {
        self.mode
    }

    /// Record `trace` into `store` without testing.
    pub fn update<E: AttributeSource>(&self, store: &SharedDistribution, trace: &[E]) -> Result<usize> {
        store.update_trace(trace, &self.classifier, self.mode)
    }

    /// Classify `trace`, record it into `store` and test for drift, all
    /// under the store's write lock.
    pub fn check_drift<E: AttributeSource>(
        &self,
        store: &SharedDistribution,
        trace: &[E],
        epsilon: f64,
    ) -> Result<DriftCheck> {
        let check = store.check_drift_trace(trace, &self.classifier, self.mode, epsilon)?;
        debug!(
            event = event_names::TRACE_INGESTED,
            events = trace.len(),
            total = check.total_after,
            norm = check.norm,
            "trace applied"
        );
        Ok(check)
    }
}
