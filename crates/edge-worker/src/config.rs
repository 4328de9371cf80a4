//! Host configuration

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading configuration or bindings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid listen address {0}")]
    InvalidAddress(String),

    #[error("Failed to read vars file {path:?}: {source}")]
    VarsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Host configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Address to bind the worker listener to
    pub host: String,

    /// Port for worker traffic
    pub port: u16,

    /// Per-invocation time limit in seconds
    pub handler_timeout_secs: u64,

    /// Maximum inbound request body size in bytes
    pub max_body_bytes: usize,

    /// Optional KEY=VALUE file loaded as secret bindings
    pub vars_file: PathBuf,

    /// Process environment variables exposed to the worker as secrets
    pub secret_names: Vec<String>,

    /// Interval between scheduled events; disabled when `None`
    pub schedule_interval_secs: Option<u64>,

    /// Cron label passed along with every scheduled event
    pub schedule_cron: String,
}

impl HostConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: lookup("EDGE_WORKER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),

            port: lookup("EDGE_WORKER_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(8787),

            handler_timeout_secs: lookup("EDGE_WORKER_HANDLER_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),

            max_body_bytes: lookup("EDGE_WORKER_MAX_BODY_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024),

            vars_file: lookup("EDGE_WORKER_VARS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".dev.vars")),

            secret_names: lookup("EDGE_WORKER_SECRETS")
                .map(|s| parse_name_list(&s))
                .unwrap_or_else(|| vec!["MY_SECRET".to_string()]),

            schedule_interval_secs: lookup("EDGE_WORKER_SCHEDULE_INTERVAL_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|secs| *secs > 0),

            schedule_cron: lookup("EDGE_WORKER_SCHEDULE_CRON")
                .unwrap_or_else(|| "* * * * *".to_string()),
        }
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().map_err(|_| ConfigError::InvalidAddress(addr))
    }

    pub fn handler_timeout(&self) -> Duration {
        Duration::from_secs(self.handler_timeout_secs)
    }

    pub fn schedule_interval(&self) -> Option<Duration> {
        self.schedule_interval_secs.map(Duration::from_secs)
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn parse_name_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}
