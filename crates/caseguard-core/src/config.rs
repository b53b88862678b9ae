//! Core Configuration
//!
//! Only operational knobs live here. Password policy, evidence limits and
//! system-role protection are fixed in code and cannot be configured.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming a JSON config file
pub const CONFIG_ENV: &str = "CASEGUARD_CONFIG";

/// Core configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Logging settings
    pub logging: LoggingConfig,
    /// Audit ledger settings
    pub audit: AuditConfig,
    /// Identity settings
    pub identity: IdentityConfig,
}

impl CoreConfig {
    /// Load from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Save to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }

    /// Load from `CASEGUARD_CONFIG` if set, defaults otherwise
    pub fn from_env() -> Result<Self, std::io::Error> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::load(path.trim()),
            _ => Ok(Self::default()),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

/// Audit ledger configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// `prev_hash` of the first record of every aggregate
    pub genesis_hash: String,
    /// Reject appends older than the aggregate's last event
    pub enforce_monotonic_time: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            genesis_hash: "genesis".into(),
            enforce_monotonic_time: true,
        }
    }
}

/// Identity configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Personal-email domains on top of the built-in list
    pub extra_personal_domains: Vec<String>,
}
