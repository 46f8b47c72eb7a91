use crate::config::{ConfigError, ConfigResult, ServiceConfig};

impl ServiceConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "host".to_string(),
            });
        }

        if self.upstream_url.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "upstream_url".to_string(),
            });
        }
        if !self.upstream_url.starts_with("http://") && !self.upstream_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "upstream_url".to_string(),
                value: self.upstream_url.clone(),
                reason: "must be an http(s) URL".to_string(),
            });
        }

        if self.think_start_marker.is_empty() || self.think_end_marker.is_empty() {
            return Err(ConfigError::MissingRequired {
                field: "think markers".to_string(),
            });
        }
        if self.think_start_marker == self.think_end_marker {
            return Err(ConfigError::InvalidValue {
                field: "think_end_marker".to_string(),
                value: self.think_end_marker.clone(),
                reason: "start and end markers must differ".to_string(),
            });
        }

        let longest_marker = self
            .think_start_marker
            .len()
            .max(self.think_end_marker.len());
        if self.max_buffer_size < longest_marker * 4 {
            return Err(ConfigError::InvalidValue {
                field: "max_buffer_size".to_string(),
                value: self.max_buffer_size.to_string(),
                reason: "too small to hold marker boundaries".to_string(),
            });
        }

        if self.correlation_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "correlation_ttl_secs".to_string(),
                value: "0".to_string(),
                reason: "retention window must be positive".to_string(),
            });
        }
        if self.sweep_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sweep_interval_secs".to_string(),
                value: "0".to_string(),
                reason: "sweep interval must be positive".to_string(),
            });
        }

        Ok(())
    }
}
