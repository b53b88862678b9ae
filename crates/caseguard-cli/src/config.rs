//! CLI Configuration

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::output::OutputFormat;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub default_format: Option<String>,
    /// Role snapshot used when `--roles` is not given
    pub role_snapshot: Option<String>,
    /// Core configuration (JSON) used when `--config` is not given
    pub core_config: Option<String>,
}

impl Config {
    pub const KEYS: [&'static str; 3] = ["default_format", "role_snapshot", "core_config"];

    pub fn load(profile: Option<&str>) -> Result<Self, String> {
        let path = Self::config_path(profile)?;
        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| e.to_string())?;
            Self::parse(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, profile: Option<&str>) -> Result<PathBuf, String> {
        let path = Self::config_path(profile)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(&path, content).map_err(|e| e.to_string())?;
        Ok(path)
    }

    fn parse(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    pub fn config_path(profile: Option<&str>) -> Result<PathBuf, String> {
        let home = dirs::home_dir().ok_or("Cannot find home directory")?;
        let filename = match profile {
            Some(p) => format!("config.{}.toml", p),
            None => "config.toml".to_string(),
        };
        Ok(home.join(".caseguard").join(filename))
    }

    /// Configured output format; unknown values fall back to table
    pub fn format(&self) -> OutputFormat {
        self.default_format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f, true).ok())
            .unwrap_or(OutputFormat::Table)
    }

    pub fn get(&self, key: &str) -> Result<Option<&str>, String> {
        match key {
            "default_format" => Ok(self.default_format.as_deref()),
            "role_snapshot" => Ok(self.role_snapshot.as_deref()),
            "core_config" => Ok(self.core_config.as_deref()),
            _ => Err(format!("Unknown config key: {}", key)),
        }
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), String> {
        match key {
            "default_format" => {
                OutputFormat::from_str(&value, true)?;
                self.default_format = Some(value);
            }
            "role_snapshot" => self.role_snapshot = Some(value),
            "core_config" => self.core_config = Some(value),
            _ => return Err(format!("Unknown config key: {}", key)),
        }
        Ok(())
    }
}
