pub mod adb;
pub mod dry_run;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::{DeviceConfig, DispatcherKind};
use crate::error::DispatchError;

/// Platform action descriptor: an intent action plus string extras.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub action: String,
    /// Named extras in the order they were supplied.
    pub extras: Vec<(String, String)>,
}

impl Intent {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            extras: Vec::new(),
        }
    }

    pub fn put_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extras.push((key.into(), value.into()));
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.action)?;
        for (key, value) in &self.extras {
            write!(f, " {key}={value}")?;
        }
        Ok(())
    }
}

/// Host platform seam that executes intents.
#[async_trait]
pub trait IntentDispatcher: Send + Sync {
    /// Ask the platform to start an activity for the intent.
    async fn start_activity(&self, intent: &Intent) -> Result<(), DispatchError>;

    /// Short name used in logs and status output.
    fn name(&self) -> &str;
}

/// Build the dispatcher selected by the device configuration.
pub fn create_dispatcher(config: &DeviceConfig) -> Result<Arc<dyn IntentDispatcher>, DispatchError> {
    match config.dispatcher {
        DispatcherKind::Adb => {
            let adb = adb::AdbDispatcher::new(config.adb_path.as_deref(), config.serial.clone())?
                .with_timeout(config.adb_timeout_secs);
            Ok(Arc::new(adb))
        }
        DispatcherKind::DryRun => Ok(Arc::new(dry_run::DryRunDispatcher::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_extras_keep_order() {
        let mut intent = Intent::new("android.intent.action.SENDTO");
        intent.put_extra("sms_body", "on my way");
        intent.put_extra("address", "5551234");
        assert_eq!(
            intent.extras,
            vec![
                ("sms_body".to_string(), "on my way".to_string()),
                ("address".to_string(), "5551234".to_string()),
            ]
        );
        assert_eq!(intent.extra("address"), Some("5551234"));
        assert_eq!(intent.extra("missing"), None);
    }

    #[test]
    fn test_intent_display() {
        let mut intent = Intent::new("android.intent.action.DIAL");
        intent.put_extra("tel", "5551234");
        assert_eq!(intent.to_string(), "android.intent.action.DIAL tel=5551234");
    }

    #[test]
    fn test_create_dry_run_dispatcher() {
        let config = DeviceConfig {
            dispatcher: DispatcherKind::DryRun,
            ..DeviceConfig::default()
        };
        let dispatcher = create_dispatcher(&config).unwrap();
        assert_eq!(dispatcher.name(), "dry-run");
    }
}
