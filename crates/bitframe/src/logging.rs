use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;

/// Crates whose events follow `--log-level`; anything else is capped at warn.
const FRAMING_TARGETS: [&str; 3] = ["bitframe", "bitframe_format", "bitframe_bits"];

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn framing_targets(level: LogLevel) -> Targets {
    let others = level.as_filter().min(LevelFilter::WARN);
    FRAMING_TARGETS
        .iter()
        .fold(Targets::new().with_default(others), |targets, name| {
            targets.with_target(*name, level.as_filter())
        })
}

/// Install the stderr subscriber. Library events from the header state
/// machine (sync found, header rejected) show up at debug level.
pub fn init_logging(format: LogFormat, level: LogLevel) {
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false);
    let targets = framing_targets(level);

    match format {
        LogFormat::Text => {
            let _ = builder.finish().with(targets).try_init();
        }
        LogFormat::Json => {
            let _ = builder.json().finish().with(targets).try_init();
        }
    }
}
