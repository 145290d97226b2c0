use std::fs;
use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::config::Config;

pub const TIMING_TARGET: &str = "studio.timing";

const QUIET_TARGETS: [&str; 4] = ["hyper", "hyper_util", "reqwest", "rustls"];

pub struct LoggingGuards {
    _guards: Vec<WorkerGuard>,
}

fn parse_log_level(value: &str) -> LevelFilter {
    match value.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" | "warning" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::INFO,
    }
}

fn studio_targets(level: LevelFilter) -> Targets {
    QUIET_TARGETS
        .iter()
        .fold(Targets::new().with_default(level), |targets, target| {
            targets.with_target(*target, LevelFilter::WARN)
        })
        .with_target(TIMING_TARGET, LevelFilter::OFF)
}

fn timing_targets() -> Targets {
    Targets::new()
        .with_default(LevelFilter::OFF)
        .with_target(TIMING_TARGET, Level::INFO)
}

fn daily_writer(dir: &Path, file_name: &str, guards: &mut Vec<WorkerGuard>) -> NonBlocking {
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, file_name));
    guards.push(guard);
    writer
}

/// Console output goes to stderr. Each file pair (plain and JSON) rolls daily
/// under `config.log_dir`; provider and command timings get their own pair.
pub fn init_logging(config: &Config) -> LoggingGuards {
    let dir = config.log_dir.as_path();
    if let Err(err) = fs::create_dir_all(dir) {
        eprintln!("Failed to create log directory {}: {err}", dir.display());
    }

    let studio_filter = studio_targets(parse_log_level(&config.log_level));
    let mut guards = Vec::with_capacity(4);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(studio_filter.clone());
    let studio_file_layer = tracing_subscriber::fmt::layer()
        .with_writer(daily_writer(dir, "studio.log", &mut guards))
        .with_ansi(false)
        .with_filter(studio_filter.clone());
    let studio_json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(daily_writer(dir, "studio.jsonl", &mut guards))
        .with_filter(studio_filter);
    let timing_file_layer = tracing_subscriber::fmt::layer()
        .with_writer(daily_writer(dir, "timing.log", &mut guards))
        .with_ansi(false)
        .with_filter(timing_targets());
    let timing_json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(daily_writer(dir, "timing.jsonl", &mut guards))
        .with_filter(timing_targets());

    tracing_subscriber::registry()
        .with(console_layer)
        .with(studio_file_layer)
        .with(studio_json_layer)
        .with(timing_file_layer)
        .with(timing_json_layer)
        .init();

    LoggingGuards { _guards: guards }
}
