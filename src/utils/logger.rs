use crate::domain::ports::ImportLog;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::str::FromStr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}' (expected compact or json)", other)),
        }
    }
}

fn env_filter(verbose: bool) -> EnvFilter {
    let default = if verbose {
        "conference_import=debug,info"
    } else {
        "conference_import=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

pub fn init_cli_logger(verbose: bool, format: LogFormat) {
    let registry = tracing_subscriber::registry().with(env_filter(verbose));

    match format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .compact(),
            )
            .init(),
        // JSON lines for log shippers
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json(),
            )
            .init(),
    }
}

/// `ImportLog` that forwards to `tracing`, carrying the tag as a field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl ImportLog for TracingLog {
    fn info(&self, tag: &str, message: &str) {
        tracing::info!(tag, "{}", message);
    }

    fn warn(&self, tag: &str, message: &str) {
        tracing::warn!(tag, "{}", message);
    }

    fn error(&self, tag: &str, message: &str) {
        tracing::error!(tag, "{}", message);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub level: LogLevel,
    pub tag: String,
    pub message: String,
}

/// `ImportLog` that keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: RefCell<Vec<LogLine>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.borrow().clone()
    }

    pub fn errors(&self) -> Vec<LogLine> {
        self.lines
            .borrow()
            .iter()
            .filter(|line| line.level == LogLevel::Error)
            .cloned()
            .collect()
    }

    fn push(&self, level: LogLevel, tag: &str, message: &str) {
        self.lines.borrow_mut().push(LogLine {
            level,
            tag: tag.to_string(),
            message: message.to_string(),
        });
    }
}

impl ImportLog for MemoryLog {
    fn info(&self, tag: &str, message: &str) {
        self.push(LogLevel::Info, tag, message);
    }

    fn warn(&self, tag: &str, message: &str) {
        self.push(LogLevel::Warn, tag, message);
    }

    fn error(&self, tag: &str, message: &str) {
        self.push(LogLevel::Error, tag, message);
    }
}
