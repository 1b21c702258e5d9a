use pwseal_crypto::stream::EncryptOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{PwsealError, PwsealResult};

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PwsealConfig {
    pub crypto: CryptoConfig,
    pub log: LogConfig,
}

impl PwsealConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: &Path) -> PwsealResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| PwsealError::Config(format!("parsing {}: {e}", path.display())))
    }
}

/// Container encryption parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CryptoConfig {
    /// PBKDF2-HMAC-SHA256 iteration count (default: 200000)
    pub iterations: u32,
    /// Plaintext bytes per chunk (default: 1048576 = 1 MiB)
    pub chunk_size: usize,
    /// Random salt length in bytes (default: 16)
    pub salt_len: usize,
}

impl Default for CryptoConfig {
    fn default() -> Self {
        let defaults = EncryptOptions::default();
        Self {
            iterations: defaults.iterations,
            chunk_size: defaults.chunk_size,
            salt_len: defaults.salt_len,
        }
    }
}

impl CryptoConfig {
    pub fn to_options(&self) -> EncryptOptions {
        EncryptOptions {
            iterations: self.iterations,
            chunk_size: self.chunk_size,
            salt_len: self.salt_len,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level filter (default: info)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format '{other}' (expected json or text)")),
        }
    }
}
