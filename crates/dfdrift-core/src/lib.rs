//! dfdrift core library
//!
//! Online directly-follows frequency distributions over process traces and
//! concept drift detection on top of them:
//! - Event classification into stable labels
//! - Incremental frequency stores with relative-frequency snapshots
//! - The atomic update-and-test drift predicate
//! - Distance and chi-square comparison against a reference distribution
//!
//! The binary entry point is in `main.rs`.
//!
//! ```
//! use dfdrift_core::{DistributionKind, SharedDistribution};
//! use dfdrift_common::EventLabel;
//!
//! let store = SharedDistribution::new(DistributionKind::DirectlyFollows);
//! let trace: Vec<EventLabel> = ["A", "B", "A", "C"].into_iter().map(EventLabel::from).collect();
//!
//! let check = store.check_drift_labels(&trace, 0.1).unwrap();
//! assert!(check.drifted);
//! assert_eq!(store.total().unwrap(), 3.0);
//! ```

pub mod classify;
pub mod config;
pub mod detector;
pub mod distribution;
pub mod exit_codes;
pub mod frequency;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod monitor;

pub use classify::{AttributeSource, Event, EventClassifier};
pub use config::{load_config, ConfigOptions, DriftConfig, ResolvedConfig};
pub use detector::{DriftCheck, DriftDetector, SharedDistribution};
pub use distribution::{ApplyMode, Distribution, RelativeSnapshot};
pub use dfdrift_common::{DirectlyFollowsPair, DistributionKind, Error, EventLabel, Result};
pub use frequency::FrequencyStore;
pub use ingest::{Trace, TraceReader};
pub use metrics::{distance, significance};
pub use monitor::{DriftMonitor, Observation, ReferenceComparison};
