use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;

use crate::application::RetryPolicy;

/// Server settings. Each flag can also come from a `PAYBOOK_*` environment variable.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// IP address to bind to
    #[arg(long, env = "PAYBOOK_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "PAYBOOK_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Attempts made by a compensating rollback before it gives up
    #[arg(long, env = "PAYBOOK_ROLLBACK_ATTEMPTS", default_value_t = RetryPolicy::DEFAULT_MAX_ATTEMPTS)]
    pub rollback_attempts: u32,

    /// Pause between rollback attempts, in milliseconds
    #[arg(long, env = "PAYBOOK_ROLLBACK_DELAY_MS", default_value_t = 2000)]
    pub rollback_delay_ms: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.rollback_attempts,
            Duration::from_millis(self.rollback_delay_ms),
        )
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            rollback_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            rollback_delay_ms: 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_default_policy() {
        let config = ServerConfig::default();
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
    }

    #[test]
    fn test_invalid_host_is_rejected() {
        let config = ServerConfig {
            host: "not a host".into(),
            ..ServerConfig::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
