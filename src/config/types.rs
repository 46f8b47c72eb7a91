use serde::{Deserialize, Serialize};

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Base URL of the upstream bot service's streaming endpoint.
    pub upstream_url: String,
    /// Per-request timeout toward the upstream, in seconds.
    pub upstream_timeout_secs: u64,
    /// Minimum interval between throttled display-state emissions, in
    /// milliseconds. First and final emissions bypass it.
    pub emit_interval_ms: u64,
    /// Retention window for correlation entries, in seconds.
    pub correlation_ttl_secs: u64,
    /// Interval between correlation sweeps, in seconds.
    pub sweep_interval_secs: u64,
    /// Maximum bytes buffered per turn by the splitter.
    pub max_buffer_size: usize,
    /// Marker opening a thinking span.
    pub think_start_marker: String,
    /// Marker closing a thinking span.
    pub think_end_marker: String,
    /// Directory for rolling log files; stdout-only when unset.
    pub log_dir: Option<String>,
    /// Log level name (trace/debug/info/warn/error).
    pub log_level: Option<String>,
    /// Emit logs as JSON.
    pub json_logs: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
            upstream_url: "http://127.0.0.1:9000/v1/bot/stream".to_string(),
            upstream_timeout_secs: 120,
            emit_interval_ms: 50,
            correlation_ttl_secs: 300,
            sweep_interval_secs: 60,
            max_buffer_size: 65536,
            think_start_marker: "<think>".to_string(),
            think_end_marker: "</think>".to_string(),
            log_dir: None,
            log_level: None,
            json_logs: false,
        }
    }
}
