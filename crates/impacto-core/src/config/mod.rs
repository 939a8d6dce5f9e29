//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Impacto configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote: RemoteConfig,
    pub secondary: SecondaryConfig,
}

/// How to launch the documentation tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub command: String,
    pub args: Vec<String>,
    pub tool_path: Option<String>,
    pub request_timeout_ms: u64,
}

/// Where the secondary component catalog lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecondaryConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            command: "node".to_string(),
            args: Vec::new(),
            tool_path: None,
            request_timeout_ms: 30_000,
        }
    }
}

impl Default for SecondaryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8122".to_string(),
            request_timeout_ms: 10_000,
        }
    }
}

const KEYS: [&str; 6] = [
    "remote.command",
    "remote.args",
    "remote.tool_path",
    "remote.request_timeout_ms",
    "secondary.base_url",
    "secondary.request_timeout_ms",
];

fn parse_timeout(key: &str, value: &str) -> anyhow::Result<u64> {
    let millis: u64 = value
        .trim()
        .parse()
        .with_context(|| format!("Invalid {} value: {}", key, value))?;
    if millis == 0 {
        return Err(anyhow!("{} must be greater than zero", key));
    }
    Ok(millis)
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("IMPACTO_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("impacto")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.remote.command.trim().is_empty() {
            return Err(anyhow!("remote.command must not be empty"));
        }
        if self.remote.request_timeout_ms == 0 {
            return Err(anyhow!("remote.request_timeout_ms must be greater than zero"));
        }
        if self.secondary.request_timeout_ms == 0 {
            return Err(anyhow!(
                "secondary.request_timeout_ms must be greater than zero"
            ));
        }
        let url = self.secondary.base_url.as_str();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow!(
                "secondary.base_url must start with http:// or https://, got {}",
                url
            ));
        }
        Ok(())
    }

    /// Apply `IMPACTO_*` environment overrides
    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|name| env::var(name).ok())
    }

    /// Apply overrides from any variable lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(command) = lookup("IMPACTO_REMOTE_COMMAND") {
            self.remote.command = command;
        }
        if let Some(path) = lookup("IMPACTO_REMOTE_TOOL_PATH") {
            self.remote.tool_path = Some(path);
        }
        if let Some(url) = lookup("IMPACTO_SECONDARY_URL") {
            self.secondary.base_url = url;
        }
        if let Some(millis) = lookup("IMPACTO_REQUEST_TIMEOUT_MS") {
            self.remote.request_timeout_ms =
                parse_timeout("IMPACTO_REQUEST_TIMEOUT_MS", &millis)?;
        }
        self.validate()
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            // Remote documentation tool
            "remote.command" => Ok(self.remote.command.clone()),
            "remote.args" => Ok(self.remote.args.join(", ")),
            "remote.tool_path" => Ok(self
                .remote
                .tool_path
                .clone()
                .unwrap_or_else(|| "(not set)".to_string())),
            "remote.request_timeout_ms" => Ok(self.remote.request_timeout_ms.to_string()),

            // Secondary catalog
            "secondary.base_url" => Ok(self.secondary.base_url.clone()),
            "secondary.request_timeout_ms" => Ok(self.secondary.request_timeout_ms.to_string()),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `impacto config show` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "remote.command" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("remote.command must not be empty"));
                }
                self.remote.command = value.to_string();
            }
            "remote.args" => {
                self.remote.args = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            "remote.tool_path" => {
                self.remote.tool_path = match value.trim() {
                    "" => None,
                    path => Some(path.to_string()),
                };
            }
            "remote.request_timeout_ms" => {
                self.remote.request_timeout_ms = parse_timeout(key, value)?;
            }
            "secondary.base_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(anyhow!(
                        "Invalid base URL: {}. It must start with http:// or https://",
                        value
                    ));
                }
                self.secondary.base_url = value.trim_end_matches('/').to_string();
            }
            "secondary.request_timeout_ms" => {
                self.secondary.request_timeout_ms = parse_timeout(key, value)?;
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `impacto config show` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }
}
