use std::path::PathBuf;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_log::LogTracer;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level for the application (default: INFO).
    pub level: Level,
    /// Emit logs as JSON (default: false).
    pub json_format: bool,
    /// Directory for log files; stdout-only when unset.
    pub log_dir: Option<String>,
    /// Colorize terminal output (default: true).
    pub colorize: bool,
    /// File name stem used under `log_dir`.
    pub log_file_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json_format: false,
            log_dir: None,
            colorize: true,
            log_file_name: "fundflow-router".to_string(),
        }
    }
}

/// Keeps the file appender worker thread alive; hold for the program's
/// lifetime.
pub struct LogGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize the logging system. Errors during initialization are handled
/// gracefully so repeated initialization (e.g. in tests) is harmless.
pub fn init_logging(config: LoggingConfig) -> LogGuard {
    let _ = LogTracer::init();

    let level_filter = config.level.as_str().to_lowercase();
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fundflow_router={}", level_filter)));

    let time_format = "%Y-%m-%d %H:%M:%S".to_string();
    let mut layers = Vec::new();

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_ansi(config.colorize)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::new(time_format.clone()));
    let stdout_layer = if config.json_format {
        stdout_layer.json().flatten_event(true).boxed()
    } else {
        stdout_layer.boxed()
    };
    layers.push(stdout_layer);

    let mut file_guard = None;
    if let Some(log_dir) = &config.log_dir {
        let log_dir = PathBuf::from(log_dir);
        if !log_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(&log_dir) {
                eprintln!("Failed to create log directory: {}", e);
                return LogGuard { _file_guard: None };
            }
        }

        let file_appender =
            RollingFileAppender::new(Rotation::DAILY, log_dir, config.log_file_name.clone());
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        file_guard = Some(guard);

        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
            .with_timer(ChronoUtc::new(time_format))
            .with_writer(non_blocking);
        let file_layer = if config.json_format {
            file_layer.json().flatten_event(true).boxed()
        } else {
            file_layer.boxed()
        };
        layers.push(file_layer);
    }

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(layers)
        .try_init();

    LogGuard {
        _file_guard: file_guard,
    }
}
