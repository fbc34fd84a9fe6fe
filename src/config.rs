//! Server configuration.
//!
//! Values come from three layers, later ones winning:
//! built-in defaults, an optional YAML file named by `LANTERN_CONFIG`,
//! and the `LANTERN_HOST` / `LANTERN_PORT` / `LANTERN_STATIC_ROOT`
//! environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const CONFIG_ENV: &str = "LANTERN_CONFIG";
pub const HOST_ENV: &str = "LANTERN_HOST";
pub const PORT_ENV: &str = "LANTERN_PORT";
pub const STATIC_ROOT_ENV: &str = "LANTERN_STATIC_ROOT";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    pub port: u16,
    /// Listen backlog handed to the OS.
    pub backlog: u32,
    /// Upper bound on every blocking read and the final write.
    pub idle_timeout_seconds: u64,
    pub max_header_bytes: usize,
    pub read_buffer_size: usize,
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    pub root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            backlog: 5,
            idle_timeout_seconds: 30,
            max_header_bytes: 10 * 1024 * 1024,
            read_buffer_size: 4096,
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for StaticConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("static"),
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }
}

impl Config {
    /// Loads the configuration from the process environment.
    pub fn load() -> Result<Self> {
        let mut cfg = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        cfg.apply_overrides(|key| std::env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_yaml_str(&raw).with_context(|| format!("Invalid config file {}", path))
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a mapping.
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg = serde_yaml::from_str(raw).context("Failed to parse YAML config")?;
        Ok(cfg)
    }

    /// Applies environment-style overrides using `lookup` to fetch values.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(HOST_ENV) {
            self.server.host = host;
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid port: {:?}", PORT_ENV, port))?;
        }
        if let Some(root) = lookup(STATIC_ROOT_ENV) {
            self.static_files.root = PathBuf::from(root);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.server;
        if s.host.trim().is_empty() {
            anyhow::bail!("server.host must not be empty");
        }
        if s.backlog == 0 {
            anyhow::bail!("server.backlog must be greater than zero");
        }
        if s.idle_timeout_seconds == 0 {
            anyhow::bail!("server.idle_timeout_seconds must be greater than zero");
        }
        if s.max_header_bytes == 0 {
            anyhow::bail!("server.max_header_bytes must be greater than zero");
        }
        if s.read_buffer_size == 0 {
            anyhow::bail!("server.read_buffer_size must be greater than zero");
        }
        Ok(())
    }
}
