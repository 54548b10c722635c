use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub database: Database,
    pub http: HttpConfig,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.to_string_lossy()))?;
        toml::from_str(&contents).with_context(|| "Failed to parse config TOML")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Database {
    pub in_memory: bool,
    pub path: Option<PathBuf>,
    /// how long a writer waits on a locked database file
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

#[cfg(test)]
impl Database {
    pub fn in_memory() -> Self {
        Self {
            in_memory: true,
            path: None,
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }

    pub fn on_disk<P: AsRef<Path>>(p: P) -> Self {
        Self {
            in_memory: false,
            path: Some(p.as_ref().to_path_buf()),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}
