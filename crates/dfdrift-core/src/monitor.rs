//! Streaming drift monitor.
//!
//! Feeds traces one at a time through the drift predicate against an
//! accumulated history and, when a reference distribution is given, compares
//! the history against it after every trace.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::classify::AttributeSource;
use crate::config::DriftConfig;
use crate::detector::{DriftDetector, SharedDistribution};
use crate::distribution::Distribution;
use crate::ingest::Trace;
use crate::logging::event_names;
use crate::metrics;
use dfdrift_common::{Error, Result};

/// History versus reference after one observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceComparison {
    pub distance: f64,
    /// None while the aligned counts cannot support a chi-square test yet.
    pub p_value: Option<f64>,
    /// `p_value < alpha`.
    pub significant: bool,
}

/// Result of feeding one trace to the monitor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// 0-based position in the stream.
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub case_id: Option<String>,
    pub drifted: bool,
    pub norm: f64,
    /// History total after the trace.
    pub total: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceComparison>,
}

pub struct DriftMonitor {
    detector: DriftDetector,
    epsilon: f64,
    alpha: f64,
    history: SharedDistribution,
    reference: Option<Distribution>,
    observed: usize,
}

impl DriftMonitor {
    /// Empty history of the configured kind.
    ///
    /// Fails with [`Error::TypeMismatch`] when the reference is of another
    /// kind, before any trace is recorded.
    pub fn new(config: &DriftConfig, reference: Option<Distribution>) -> Result<Self> {
        if let Some(reference) = &reference {
            if reference.kind() != config.kind {
                return Err(Error::TypeMismatch {
                    left: config.kind,
                    right: reference.kind(),
                });
            }
        }
        Ok(Self {
            detector: DriftDetector::from_config(config),
            epsilon: config.epsilon,
            alpha: config.alpha,
            history: SharedDistribution::new(config.kind),
            reference,
            observed: 0,
        })
    }

    pub fn history(&self) -> &SharedDistribution {
        &self.history
    }

    pub fn reference(&self) -> Option<&Distribution> {
        self.reference.as_ref()
    }

    /// Number of traces observed so far, including failed ones.
    pub fn observed(&self) -> usize {
        self.observed
    }

    pub fn observe<E: AttributeSource>(&mut self, events: &[E]) -> Result<Observation> {
        let index = self.observed;
        self.observed += 1;

        let check = self.detector.check_drift(&self.history, events, self.epsilon)?;
        if check.drifted {
            info!(
                event = event_names::DRIFT_DETECTED,
                index,
                norm = check.norm,
                epsilon = self.epsilon,
                "drift detected"
            );
        }

        let reference = match &self.reference {
            Some(reference) => Some(self.compare(reference)?),
            None => None,
        };

        Ok(Observation {
            index,
            case_id: None,
            drifted: check.drifted,
            norm: check.norm,
            total: check.total_after,
            reference,
        })
    }

    /// Like [`observe`](Self::observe), tagging the result with the case id.
    pub fn observe_trace(&mut self, trace: &Trace) -> Result<Observation> {
        let mut observation = self.observe(&trace.events)?;
        observation.case_id = trace.case_id.clone();
        Ok(observation)
    }

    fn compare(&self, reference: &Distribution) -> Result<ReferenceComparison> {
        let alpha = self.alpha;
        self.history.with_read(|history| {
            let distance = metrics::distance(history, reference)?;
            let p_value = match metrics::significance(history, reference) {
                Ok(p) => Some(p),
                Err(Error::InsufficientData(_)) => None,
                Err(e) => return Err(e),
            };
            Ok(ReferenceComparison {
                distance,
                p_value,
                significant: p_value.is_some_and(|p| p < alpha),
            })
        })?
    }
}
