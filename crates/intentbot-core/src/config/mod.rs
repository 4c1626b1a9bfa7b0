pub mod credentials;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-1106";
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful assistant on an Android Phone, and can control it using Android Intents.";

/// Root configuration for intentbot.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub agent: AgentConfig,
    pub provider: ProviderSettings,
    pub device: DeviceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentConfig {
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f64,
    /// Completion requests allowed per user message. 1 means tool results are
    /// appended but the model is not asked again.
    pub max_tool_rounds: u32,
    pub request_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            max_tool_rounds: 1,
            request_timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSettings {
    pub api_base: Option<String>,
}

/// How intents reach the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DispatcherKind {
    #[default]
    Adb,
    DryRun,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceConfig {
    pub dispatcher: DispatcherKind,
    pub adb_path: Option<String>,
    pub serial: Option<String>,
    /// Seconds to wait for `adb shell am start` before killing it.
    pub adb_timeout_secs: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            dispatcher: DispatcherKind::default(),
            adb_path: None,
            serial: None,
            adb_timeout_secs: crate::platform::adb::DEFAULT_ADB_TIMEOUT_SECS,
        }
    }
}

// ====== Config loading/saving ======

/// Load configuration from environment variables.
///
/// Priority:
/// 1. `INTENTBOT_CONFIG` env var: full JSON config
/// 2. Individual env vars merged on top of the config file (or defaults)
pub fn load_config_from_env() -> Config {
    if let Ok(json) = std::env::var("INTENTBOT_CONFIG") {
        match serde_json::from_str::<Config>(&json) {
            Ok(config) => return config,
            Err(e) => {
                tracing::warn!("Failed to parse INTENTBOT_CONFIG: {}", e);
            }
        }
    }

    let mut cfg = load_config(None);
    apply_env_overrides(&mut cfg);
    cfg
}

fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("INTENTBOT_MODEL") {
        if !v.is_empty() {
            cfg.agent.model = v;
        }
    }
    if let Ok(v) = std::env::var("INTENTBOT_API_BASE") {
        if !v.is_empty() {
            cfg.provider.api_base = Some(v);
        }
    }
    if let Ok(v) = std::env::var("INTENTBOT_DEVICE_SERIAL") {
        if !v.is_empty() {
            cfg.device.serial = Some(v);
        }
    }
}

/// Get the default configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.json")
}

/// Get the intentbot data directory.
pub fn get_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".intentbot")
}

/// Load configuration from file or fall back to defaults.
pub fn load_config(config_path: Option<&Path>) -> Config {
    let path = config_path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(get_config_path);

    if path.exists() {
        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Config>(&content) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!("Failed to parse config from {}: {}", path.display(), e);
                    tracing::warn!("Using default configuration.");
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read config from {}: {}", path.display(), e);
                tracing::warn!("Using default configuration.");
            }
        }
    }

    Config::default()
}

/// Save configuration to file.
pub fn save_config(config: &Config, config_path: Option<&Path>) -> Result<(), ConfigError> {
    let path = config_path
        .map(|p| p.to_path_buf())
        .unwrap_or_else(get_config_path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    }

    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.agent.model, "gpt-3.5-turbo-1106");
        assert_eq!(cfg.agent.max_tool_rounds, 1);
        assert_eq!(cfg.agent.request_timeout_secs, 60);
        assert!(cfg.agent.system_prompt.contains("Android Intents"));
        assert!(cfg.provider.api_base.is_none());
        assert_eq!(cfg.device.dispatcher, DispatcherKind::Adb);
        assert_eq!(cfg.device.adb_timeout_secs, 15);
    }

    #[test]
    fn test_config_camelcase_compat() {
        let json = r#"{
            "agent": {
                "model": "gpt-4o-mini",
                "maxToolRounds": 3,
                "requestTimeoutSecs": 10
            },
            "provider": { "apiBase": "http://localhost:11434/v1" },
            "device": { "dispatcher": "dry-run", "serial": "emulator-5554", "adbTimeoutSecs": 5 }
        }"#;
        let cfg: Config = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.agent.model, "gpt-4o-mini");
        assert_eq!(cfg.agent.max_tool_rounds, 3);
        assert_eq!(cfg.agent.request_timeout_secs, 10);
        assert_eq!(cfg.agent.max_tokens, 1024);
        assert_eq!(cfg.provider.api_base.as_deref(), Some("http://localhost:11434/v1"));
        assert_eq!(cfg.device.dispatcher, DispatcherKind::DryRun);
        assert_eq!(cfg.device.serial.as_deref(), Some("emulator-5554"));
        assert_eq!(cfg.device.adb_timeout_secs, 5);
    }

    #[test]
    fn test_save_and_load_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nested").join("config.json");

        let mut cfg = Config::default();
        cfg.agent.model = "test-model".to_string();
        cfg.device.dispatcher = DispatcherKind::DryRun;
        save_config(&cfg, Some(&path)).unwrap();

        assert!(path.exists());
        let loaded = load_config(Some(&path));
        assert_eq!(loaded.agent.model, "test-model");
        assert_eq!(loaded.device.dispatcher, DispatcherKind::DryRun);
    }

    #[test]
    fn test_load_config_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let cfg = load_config(Some(&tmp.path().join("missing.json")));
        assert_eq!(cfg.agent.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_load_config_invalid_json_uses_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let cfg = load_config(Some(&path));
        assert_eq!(cfg.agent.max_tool_rounds, 1);
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("INTENTBOT_MODEL", "gpt-4o");
        std::env::set_var("INTENTBOT_API_BASE", "http://proxy.local/v1");
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.agent.model, "gpt-4o");
        assert_eq!(cfg.provider.api_base.as_deref(), Some("http://proxy.local/v1"));
        std::env::remove_var("INTENTBOT_MODEL");
        std::env::remove_var("INTENTBOT_API_BASE");
    }

    #[test]
    fn test_full_json_config_from_env() {
        std::env::set_var(
            "INTENTBOT_CONFIG",
            r#"{"agent": {"model": "from-env", "maxToolRounds": 2}, "device": {"dispatcher": "dry-run"}}"#,
        );
        let cfg = load_config_from_env();
        std::env::remove_var("INTENTBOT_CONFIG");

        assert_eq!(cfg.agent.model, "from-env");
        assert_eq!(cfg.agent.max_tool_rounds, 2);
        assert_eq!(cfg.agent.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(cfg.device.dispatcher, DispatcherKind::DryRun);
    }
}
