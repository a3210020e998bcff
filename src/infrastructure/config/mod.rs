//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::application::services::audit_service::DEFAULT_AUDIT_CHANNEL;
use crate::application::services::CommandSettings;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub sheet: SheetConfig,
    pub audit: AuditConfig,
    pub confirm: ConfirmConfig,
    pub backup: BackupConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
    pub token: Option<String>,
    pub running_locally: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SheetConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AuditConfig {
    pub channel: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ConfirmConfig {
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BackupConfig {
    pub directory: PathBuf,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "hilda".to_string(),
            prefix: "!".to_string(),
            token: None,
            running_locally: false,
        }
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("sheet.md"),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            channel: DEFAULT_AUDIT_CHANNEL.to_string(),
        }
    }
}

impl Default for ConfirmConfig {
    fn default() -> Self {
        Self { timeout_seconds: 10 }
    }
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Defaults overlaid with the environment
    pub fn load_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay values from environment variables (and `.env`, once loaded)
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay values from any variable source
    pub fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(token) = lookup("BOT_TOKEN").filter(|t| !t.trim().is_empty()) {
            self.bot.token = Some(token.trim().to_string());
        }

        if let Some(flag) = lookup("RUNNING_LOCALLY") {
            self.bot.running_locally = parse_flag("RUNNING_LOCALLY", &flag)?;
        }

        if let Some(prefix) = lookup("BOT_PREFIX") {
            self.bot.prefix = prefix;
        }

        if let Some(path) = lookup("HILDA_SHEET") {
            self.sheet.path = PathBuf::from(path);
        }

        Ok(())
    }

    /// The gateway token, which is required to connect
    pub fn token(&self) -> Result<&str, ConfigError> {
        self.bot
            .token
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField("BOT_TOKEN".to_string()))
    }

    pub fn command_settings(&self) -> CommandSettings {
        CommandSettings {
            prefix: self.bot.prefix.clone(),
            running_locally: self.bot.running_locally,
            confirm_timeout: Duration::from_secs(self.confirm.timeout_seconds),
            backup_dir: self.backup.directory.clone(),
        }
    }
}

/// Parse a boolean-like flag such as `RUNNING_LOCALLY=1`
pub fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue(format!("{}={}", name, other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.bot.prefix, "!");
        assert_eq!(config.audit.channel, "audit");
        assert_eq!(config.confirm.timeout_seconds, 10);
        assert!(!config.bot.running_locally);
        assert!(config.token().is_err());
    }

    #[test]
    fn test_env_overlay() {
        let mut config = Config::default();
        config
            .apply_vars(vars(&[("BOT_TOKEN", " abc "), ("RUNNING_LOCALLY", "1"), ("BOT_PREFIX", "?")]))
            .unwrap();

        assert_eq!(config.token().unwrap(), "abc");
        assert!(config.bot.running_locally);
        assert_eq!(config.bot.prefix, "?");
    }

    #[test]
    fn test_running_locally_zero_is_false() {
        let mut config = Config::default();
        config.bot.running_locally = true;
        config.apply_vars(vars(&[("RUNNING_LOCALLY", "0")])).unwrap();
        assert!(!config.bot.running_locally);
    }

    #[test]
    fn test_invalid_flag() {
        let mut config = Config::default();
        let err = config.apply_vars(vars(&[("RUNNING_LOCALLY", "maybe")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("bot:\n  prefix: \"$\"\nconfirm:\n  timeout-seconds: 30\n").unwrap();
        assert_eq!(config.bot.prefix, "$");
        assert_eq!(config.bot.name, "hilda");
        assert_eq!(config.command_settings().confirm_timeout, Duration::from_secs(30));
        assert_eq!(config.sheet.path, PathBuf::from("sheet.md"));
    }

    #[test]
    fn test_yaml_roundtrip_of_defaults() {
        let yaml = Config::default().to_yaml().unwrap();
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.audit.channel, "audit");
    }
}
