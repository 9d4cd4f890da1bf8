//! dfdrift - concept drift detection over process event streams
//!
//! The entry point handles:
//! - Streaming traces through the drift predicate (`watch`)
//! - Comparing two trace files by distance and chi-square (`compare`)
//! - Inspecting and validating configuration (`config`)

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use dfdrift_common::{DistributionKind, Error, Result, StructuredError};
use dfdrift_core::classify::EventClassifier;
use dfdrift_core::config::{load_config, ConfigOptions, ConfigOverrides, ConfigSource, ResolvedConfig};
use dfdrift_core::distribution::{ApplyMode, Distribution};
use dfdrift_core::exit_codes::ExitCode;
use dfdrift_core::ingest::{load_distribution, TraceReader};
use dfdrift_core::logging::{
    event_names, generate_run_id, init_logging, LogConfig, LogContext, LogFormat, LogLevel, Stage,
};
use dfdrift_core::monitor::DriftMonitor;
use dfdrift_core::{log_event, metrics};
use dfdrift_math::chi_square_critical_value;

/// Concept drift detection on directly-follows frequencies
#[derive(Parser)]
#[command(name = "dfdrift")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Config file (default: $DFDRIFT_CONFIG, then ~/.config/dfdrift/dfdrift.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log format on stderr: human or jsonl (default: $DFDRIFT_LOG_FORMAT, then human)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream traces through the drift detector, one observation per line
    Watch(WatchArgs),
    /// Compare the distributions of two trace files
    Compare(CompareArgs),
    /// Configuration management
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct WatchArgs {
    /// Trace file (JSON Lines)
    traces: PathBuf,

    /// Reference trace file to compare the running history against
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Drift threshold on the relative-frequency shift norm
    #[arg(long)]
    epsilon: Option<f64>,

    /// Significance level for reference comparisons
    #[arg(long)]
    alpha: Option<f64>,

    /// Distribution kind (directly_follows, activity)
    #[arg(long)]
    kind: Option<DistributionKind>,

    /// Handling of traces that fail classification (incremental, atomic)
    #[arg(long)]
    apply_mode: Option<ApplyMode>,

    /// Drift within the first N traces is reported but does not set the exit code.
    ///
    /// The first trace is compared against an empty history and always
    /// drifts, so with the default of 0 any non-empty stream exits 1. Use
    /// `--warmup 1` or more to judge only later traces.
    #[arg(long, default_value_t = 0)]
    warmup: usize,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// First trace file
    left: PathBuf,

    /// Second trace file
    right: PathBuf,

    /// Distribution kind (directly_follows, activity)
    #[arg(long)]
    kind: Option<DistributionKind>,

    /// Significance level
    #[arg(long)]
    alpha: Option<f64>,

    /// Print the aligned counts instead of the summary
    #[arg(long)]
    table: bool,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show the resolved configuration
    Show,
    /// Validate a configuration file
    Validate {
        /// File to validate (default: the resolved config file)
        path: Option<PathBuf>,
    },
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Clean
            };
            let _ = e.print();
            std::process::exit(code.as_i32());
        }
    };

    let log_level = LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet);
    init_logging(&LogConfig::from_env(log_level, cli.global.log_format));

    let ctx = LogContext::new(generate_run_id());
    let exit_code = {
        let _span = ctx.span(Stage::Init).entered();
        log_event!(
            INFO,
            event_names::RUN_STARTED,
            Stage::Init,
            "dfdrift started",
            version = env!("CARGO_PKG_VERSION")
        );

        let result = match &cli.command {
            Commands::Watch(args) => run_watch(&cli.global, &ctx, args),
            Commands::Compare(args) => run_compare(&cli.global, &ctx, args),
            Commands::Config(args) => run_config(&cli.global, args),
        };

        match result {
            Ok(code) => code,
            Err(e) => output_error(&e),
        }
    };

    tracing::debug!(
        event = event_names::RUN_FINISHED,
        exit_code = exit_code.as_i32(),
        "dfdrift finished"
    );
    std::process::exit(exit_code.as_i32());
}

/// Print the error as JSON on stdout and pick the exit code.
fn output_error(err: &Error) -> ExitCode {
    let code = ExitCode::for_error(err);
    tracing::error!(
        event = event_names::INTERNAL_ERROR,
        error = %err,
        code = err.code(),
        exit_code = code.as_i32(),
        "command failed"
    );
    let body = serde_json::json!({ "error": StructuredError::from(err) });
    println!("{}", body);
    code
}

fn resolve(global: &GlobalOpts, overrides: ConfigOverrides) -> Result<ResolvedConfig> {
    let options = ConfigOptions {
        config_path: global.config.clone(),
    };
    let mut resolved = load_config(&options).map_err(|e| {
        tracing::warn!(event = event_names::CONFIG_ERROR, error = %e, "config load failed");
        Error::from(e)
    })?;
    resolved.config = resolved.config.with_overrides(overrides)?;

    match resolved.source {
        ConfigSource::Default => tracing::debug!(
            event = event_names::CONFIG_DEFAULT_USED,
            "no config file found, using defaults"
        ),
        source => tracing::debug!(
            event = event_names::CONFIG_LOADED,
            source = ?source,
            path = ?resolved.path,
            hash = ?resolved.hash,
            "config loaded"
        ),
    }
    Ok(resolved)
}

fn load_side(
    path: &Path,
    resolved: &ResolvedConfig,
    classifier: &EventClassifier,
) -> Result<Distribution> {
    load_distribution(path, resolved.config.kind, classifier, resolved.config.apply_mode)
}

fn run_watch(global: &GlobalOpts, ctx: &LogContext, args: &WatchArgs) -> Result<ExitCode> {
    let resolved = resolve(
        global,
        ConfigOverrides {
            kind: args.kind,
            epsilon: args.epsilon,
            alpha: args.alpha,
            apply_mode: args.apply_mode,
        },
    )?;
    let config = &resolved.config;
    let classifier = EventClassifier::from_config(&config.classifier);

    let reference = match &args.reference {
        Some(path) => {
            let _span = ctx.span(Stage::Ingest).entered();
            Some(load_side(path, &resolved, &classifier)?)
        }
        None => None,
    };

    let mut monitor = DriftMonitor::new(config, reference)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut drift_count = 0usize;
    let mut counted = 0usize;

    let _span = ctx.span(Stage::Detect).entered();
    for trace in TraceReader::open(&args.traces)? {
        let trace = trace?;
        let observation = monitor.observe_trace(&trace).map_err(|e| {
            tracing::warn!(
                event = event_names::TRACE_REJECTED,
                index = monitor.observed() - 1,
                error = %e,
                "trace rejected"
            );
            e
        })?;
        if observation.drifted {
            drift_count += 1;
            if observation.index >= args.warmup {
                counted += 1;
            }
        }
        writeln!(out, "{}", serde_json::to_string(&observation)?)?;
    }
    out.flush()?;

    let total = monitor.history().total()?;
    log_event!(
        INFO,
        event_names::RUN_FINISHED,
        Stage::Report,
        "watch finished",
        traces = monitor.observed(),
        drifts = drift_count,
        total = total
    );

    Ok(if counted > 0 {
        ExitCode::DriftDetected
    } else {
        ExitCode::Clean
    })
}

fn run_compare(global: &GlobalOpts, ctx: &LogContext, args: &CompareArgs) -> Result<ExitCode> {
    let resolved = resolve(
        global,
        ConfigOverrides {
            kind: args.kind,
            alpha: args.alpha,
            ..Default::default()
        },
    )?;
    let classifier = EventClassifier::from_config(&resolved.config.classifier);
    let alpha = resolved.config.alpha;

    let (left, right) = {
        let _span = ctx.span(Stage::Ingest).entered();
        (
            load_side(&args.left, &resolved, &classifier)?,
            load_side(&args.right, &resolved, &classifier)?,
        )
    };

    let _span = ctx.span(Stage::Compare).entered();

    if args.table {
        let rows = metrics::comparison_rows(&left, &right)?;
        let stdout = io::stdout();
        let mut out = stdout.lock();
        writeln!(out, "key\tleft\tright")?;
        for row in &rows {
            writeln!(out, "{}\t{}\t{}", row.key, row.left, row.right)?;
        }
        out.flush()?;
        // Rows are printed even when the table cannot be tested.
        let significant = metrics::chi_square_test(&left, &right)?.rejects_at(alpha);
        return Ok(if significant {
            ExitCode::DriftDetected
        } else {
            ExitCode::Clean
        });
    }

    let distance = metrics::distance(&left, &right)?;
    let test = metrics::chi_square_test(&left, &right)?;
    let critical_value = chi_square_critical_value(alpha, test.degrees_of_freedom as f64);
    let significant = test.rejects_at(alpha);

    log_event!(
        INFO,
        event_names::COMPARE_FINISHED,
        Stage::Compare,
        "comparison finished",
        distance = distance,
        p_value = test.p_value,
        significant = significant
    );

    let report = serde_json::json!({
        "kind": resolved.config.kind,
        "left": { "path": args.left.display().to_string(), "total": left.total(), "keys": left.len() },
        "right": { "path": args.right.display().to_string(), "total": right.total(), "keys": right.len() },
        "distance": distance,
        "chi_square": {
            "statistic": test.statistic,
            "df": test.degrees_of_freedom,
            "p_value": test.p_value,
        },
        "alpha": alpha,
        "critical_value": critical_value,
        "significant": significant,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(if significant {
        ExitCode::DriftDetected
    } else {
        ExitCode::Clean
    })
}

fn run_config(global: &GlobalOpts, args: &ConfigArgs) -> Result<ExitCode> {
    match &args.command {
        ConfigCommands::Show => {
            let resolved = resolve(global, ConfigOverrides::default())?;
            let body = serde_json::json!({
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "source": resolved.source,
                "path": resolved.path.as_ref().map(|p| p.display().to_string()),
                "hash": resolved.hash,
                "config": resolved.config,
            });
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::Clean)
        }
        ConfigCommands::Validate { path } => {
            let options = ConfigOptions {
                config_path: path.clone().or_else(|| global.config.clone()),
            };
            let resolved = load_config(&options)?;
            let body = serde_json::json!({
                "valid": true,
                "source": resolved.source,
                "path": resolved.path.as_ref().map(|p| p.display().to_string()),
                "hash": resolved.hash,
            });
            println!("{}", body);
            Ok(ExitCode::Clean)
        }
    }
}
