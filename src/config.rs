use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::http::client::DEFAULT_BUFFER_SIZE;
use crate::net::DEFAULT_BACKLOG;

/// Names a YAML configuration file to start from.
pub const CONFIG_ENV: &str = "SOCKLINE_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Maximum tracing level: `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
    pub server: ServerConfig,
    pub client: ClientConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port number or service name to listen on.
    pub service: String,
    pub backlog: i32,
    pub buffer_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub url: String,
    pub include_headers: bool,
    pub buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            server: ServerConfig::default(),
            client: ClientConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            service: "8080".to_string(),
            backlog: DEFAULT_BACKLOG,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: "http://www.google.com.ar/".to_string(),
            include_headers: true,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl Config {
    /// Builds the configuration from the file named by `SOCKLINE_CONFIG`, if
    /// any, then applies the `LISTEN` and `TARGET_URL` overrides.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };

        if let Ok(service) = std::env::var("LISTEN") {
            cfg.server.service = service;
        }
        if let Ok(url) = std::env::var("TARGET_URL") {
            cfg.client.url = url;
        }

        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(text).context("Failed to parse YAML config")?;

        if cfg.server.backlog < 1 {
            anyhow::bail!("server.backlog must be positive, got {}", cfg.server.backlog);
        }
        if cfg.server.buffer_size == 0 || cfg.client.buffer_size == 0 {
            anyhow::bail!("buffer_size must be positive");
        }
        cfg.max_level()?;

        Ok(cfg)
    }

    pub fn max_level(&self) -> anyhow::Result<tracing::Level> {
        self.log_level
            .parse()
            .map_err(|_| anyhow::anyhow!("Unknown log level `{}`", self.log_level))
    }
}
