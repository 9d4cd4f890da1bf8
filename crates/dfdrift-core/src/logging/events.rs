//! Structured event vocabulary.
//!
//! Every event carries an `event` field naming it (see [`event_names`]) and
//! runs inside a span that records the `run_id` and current [`Stage`].

use serde::{Deserialize, Serialize};

/// Log levels as they appear in JSONL output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Processing stages of a dfdrift run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Startup and configuration.
    Init,
    /// Reading trace input.
    Ingest,
    /// Mapping events to labels.
    Classify,
    /// Recording traces into a distribution.
    Update,
    /// Evaluating the drift predicate.
    Detect,
    /// Comparing two distributions.
    Compare,
    /// Writing results.
    Report,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Init => "init",
            Stage::Ingest => "ingest",
            Stage::Classify => "classify",
            Stage::Update => "update",
            Stage::Detect => "detect",
            Stage::Compare => "compare",
            Stage::Report => "report",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    // Run lifecycle
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_FINISHED: &str = "run.finished";

    // Config
    pub const CONFIG_LOADED: &str = "config.loaded";
    pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
    pub const CONFIG_ERROR: &str = "config.error";

    // Ingest and update
    pub const REFERENCE_LOADED: &str = "reference.loaded";
    pub const TRACE_INGESTED: &str = "trace.ingested";
    pub const TRACE_REJECTED: &str = "trace.rejected";
    pub const TRACE_PARTIALLY_APPLIED: &str = "trace.partially_applied";

    // Classify
    pub const EVENT_UNCLASSIFIED: &str = "event.unclassified";

    // Detect
    pub const DRIFT_CHECKED: &str = "drift.checked";
    pub const DRIFT_DETECTED: &str = "drift.detected";

    // Compare
    pub const COMPARE_FINISHED: &str = "compare.finished";

    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// Correlation data shared by every event of one run.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }

    /// Span tagging nested events with this run and `stage`.
    pub fn span(&self, stage: Stage) -> tracing::Span {
        tracing::info_span!("dfdrift", run_id = %self.run_id, stage = %stage)
    }
}
