use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Key under which the completion API key is stored.
pub const API_KEY: &str = "api_key";

/// Environment variable that takes precedence over the stored key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// String-valued secret storage keyed by name.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError>;

    /// Remove a key. Returns whether it was present.
    fn remove(&self, key: &str) -> Result<bool, ConfigError>;
}

/// Credentials kept as a flat JSON object in a single file.
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `~/.intentbot/credentials.json`.
    pub fn default_location() -> Self {
        Self::new(super::get_data_dir().join("credentials.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>, ConfigError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| ConfigError::Invalid(format!("{}: {e}", self.path.display())))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, json).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        match self.read() {
            Ok(mut entries) => entries.remove(key),
            Err(e) => {
                tracing::warn!("Failed to read credentials: {}", e);
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut entries = self.read()?;
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries)
    }

    fn remove(&self, key: &str) -> Result<bool, ConfigError> {
        let mut entries = self.read()?;
        let existed = entries.remove(key).is_some();
        if existed {
            self.write(&entries)?;
        }
        Ok(existed)
    }
}

/// API key from `OPENAI_API_KEY`, else from the store. Empty values count as unset.
pub fn resolve_api_key(store: &dyn CredentialStore) -> Result<String, ConfigError> {
    if let Ok(key) = std::env::var(API_KEY_ENV) {
        if !key.is_empty() {
            return Ok(key);
        }
    }
    store
        .get(API_KEY)
        .filter(|k| !k.is_empty())
        .ok_or(ConfigError::NoApiKey)
}

/// Mask a secret for display, keeping a short prefix and suffix.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
