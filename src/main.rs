use clap::Parser;
use tracing::Level;

use fundflow_router::config::ServiceConfig;
use fundflow_router::logging::{self, LoggingConfig};
use fundflow_router::server;

#[derive(Parser, Debug)]
#[command(name = "fundflow-router")]
#[command(about = "Streaming parser and phase-sync service for the housing-fund assistant")]
struct CliArgs {
    /// Host address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind
    #[arg(long, default_value_t = 8090)]
    port: u16,

    /// Streaming endpoint of the upstream bot service
    #[arg(long, default_value = "http://127.0.0.1:9000/v1/bot/stream")]
    upstream_url: String,

    /// Per-request timeout toward the upstream, in seconds
    #[arg(long, default_value_t = 120)]
    upstream_timeout_secs: u64,

    /// Minimum interval between throttled display updates, in milliseconds
    #[arg(long, default_value_t = 50)]
    emit_interval_ms: u64,

    /// Retention window for conversation correlations, in seconds
    #[arg(long, default_value_t = 300)]
    correlation_ttl_secs: u64,

    /// Interval between correlation sweeps, in seconds
    #[arg(long, default_value_t = 60)]
    sweep_interval_secs: u64,

    /// Directory for rolling log files (stdout only when omitted)
    #[arg(long)]
    log_dir: Option<String>,

    /// Log level (trace/debug/info/warn/error)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

impl CliArgs {
    fn to_service_config(&self) -> ServiceConfig {
        ServiceConfig {
            host: self.host.clone(),
            port: self.port,
            upstream_url: self.upstream_url.clone(),
            upstream_timeout_secs: self.upstream_timeout_secs,
            emit_interval_ms: self.emit_interval_ms,
            correlation_ttl_secs: self.correlation_ttl_secs,
            sweep_interval_secs: self.sweep_interval_secs,
            log_dir: self.log_dir.clone(),
            log_level: self.log_level.clone(),
            json_logs: self.json_logs,
            ..Default::default()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let config = args.to_service_config();
    config.validate()?;

    let level = config
        .log_level
        .as_deref()
        .and_then(|name| name.parse::<Level>().ok())
        .unwrap_or(Level::INFO);
    let _log_guard = logging::init_logging(LoggingConfig {
        level,
        json_format: config.json_logs,
        log_dir: config.log_dir.clone(),
        ..Default::default()
    });

    server::startup(config).await
}
