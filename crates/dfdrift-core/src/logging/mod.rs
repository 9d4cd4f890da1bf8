//! Structured logging for dfdrift.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for pipelines
//!
//! # Usage
//!
//! ```ignore
//! use dfdrift_core::logging::{init_logging, LogConfig, LogContext, Stage, event_names};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//!
//! let ctx = LogContext::new(generate_run_id());
//! let _span = ctx.span(Stage::Init).entered();
//! tracing::info!(event = event_names::RUN_STARTED, "starting");
//! ```
//!
//! stdout is reserved for command payloads; all log output goes to stderr.

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, Level, LogContext, Stage};
pub use layer::JsonlLayer;

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directives for `level` across the library and the binary.
fn default_directives(level: LogLevel) -> String {
    format!("dfdrift_core={level},dfdrift={level}")
}

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs. Without an
/// explicit level, `RUST_LOG` takes full control of filtering when set.
pub fn init_logging(config: &LogConfig) {
    let filter = if config.level_explicit {
        EnvFilter::new(default_directives(config.level))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directives(config.level)))
    };

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .init();
            }
        }
        LogFormat::Jsonl => {
            tracing_subscriber::registry()
                .with(filter)
                .with(JsonlLayer::stderr())
                .init();
        }
    }
}

/// Generate a unique run ID for this invocation.
pub fn generate_run_id() -> String {
    let uuid = uuid::Uuid::new_v4();
    format!("run-{}", &uuid.simple().to_string()[..12])
}

/// Structured event with a stage, in one line.
///
/// ```ignore
/// log_event!(INFO, event_names::DRIFT_DETECTED, Stage::Detect, "drift detected", norm = 0.4);
/// ```
#[macro_export]
macro_rules! log_event {
    (INFO, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::info!(event = $event, stage = %$stage, $($key = $val,)* message = $msg)
    };
    (DEBUG, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::debug!(event = $event, stage = %$stage, $($key = $val,)* message = $msg)
    };
    (WARN, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::warn!(event = $event, stage = %$stage, $($key = $val,)* message = $msg)
    };
    (ERROR, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::error!(event = $event, stage = %$stage, $($key = $val,)* message = $msg)
    };
}
