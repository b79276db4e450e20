//! Client settings.
//!
//! Values are layered: built-in defaults, then an optional JSON file named by
//! `CITY_CLIENT_CONFIG_PATH`, then the `CITY_CLIENT_HOST` / `CITY_CLIENT_PORT`
//! environment variables. The binary applies its command-line flags last.

use std::{
    env, fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use city_proto::{DEFAULT_HOST, DEFAULT_PORT};

use crate::transport::RetryPolicy;

pub const CONFIG_PATH_ENV: &str = "CITY_CLIENT_CONFIG_PATH";
pub const HOST_ENV: &str = "CITY_CLIENT_HOST";
pub const PORT_ENV: &str = "CITY_CLIENT_PORT";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection and pacing parameters for talking to the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    /// Applied to connect, read and write of every attempt.
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
    /// Size of the single receive buffer; longer replies are truncated.
    pub recv_buffer_bytes: usize,
    /// Multiplier on scenario pauses. Zero runs scenarios back to back.
    pub demo_pace: f32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            max_attempts: 3,
            retry_backoff: Duration::from_millis(200),
            recv_buffer_bytes: 4096,
            demo_pace: 1.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClientConfigFile {
    host: Option<String>,
    port: Option<u16>,
    timeout_ms: Option<u64>,
    max_attempts: Option<u32>,
    retry_backoff_ms: Option<u64>,
    recv_buffer_bytes: Option<usize>,
    demo_pace: Option<f32>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse client config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read client config from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ClientConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, self.retry_backoff)
    }

    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        let file: ClientConfigFile = serde_json::from_str(data)?;
        let mut config = Self::default();
        config.apply_file(file);
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Applies host/port overrides from `lookup`, normally the process
    /// environment. An unparsable port is logged and ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV).filter(|value| !value.trim().is_empty()) {
            self.host = host.trim().to_string();
        }
        if let Some(port) = lookup(PORT_ENV) {
            match port.trim().parse::<u16>() {
                Ok(port) => self.port = port,
                Err(err) => warn!(
                    target: "city_client::config",
                    value = %port,
                    error = %err,
                    "config.invalid_port"
                ),
            }
        }
    }

    pub fn with_demo_pace(mut self, pace: f32) -> Self {
        self.demo_pace = sanitize_pace(pace);
        self
    }

    fn apply_file(&mut self, file: ClientConfigFile) {
        if let Some(host) = file.host {
            self.host = host;
        }
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(ms) = file.timeout_ms {
            self.timeout = Duration::from_millis(ms);
        }
        if let Some(attempts) = file.max_attempts {
            self.max_attempts = attempts;
        }
        if let Some(ms) = file.retry_backoff_ms {
            self.retry_backoff = Duration::from_millis(ms);
        }
        if let Some(bytes) = file.recv_buffer_bytes {
            self.recv_buffer_bytes = bytes.max(1);
        }
        if let Some(pace) = file.demo_pace {
            self.demo_pace = sanitize_pace(pace);
        }
    }
}

fn sanitize_pace(pace: f32) -> f32 {
    if pace.is_finite() && pace > 0.0 {
        pace
    } else {
        0.0
    }
}

/// Builds the effective configuration from the process environment.
///
/// A missing or malformed config file never aborts startup: the failure is
/// logged and defaults are used.
pub fn load_client_config_from_env() -> ClientConfig {
    let mut config = match env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from) {
        Some(path) => match ClientConfig::from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                warn!(
                    target: "city_client::config",
                    path = %path.display(),
                    error = %err,
                    "config.load_failed"
                );
                ClientConfig::default()
            }
        },
        None => ClientConfig::default(),
    };
    config.apply_env_overrides(|key| env::var(key).ok());
    config
}
