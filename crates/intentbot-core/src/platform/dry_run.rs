use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

use crate::error::DispatchError;

use super::{Intent, IntentDispatcher};

/// Dispatcher that logs intents instead of executing them.
pub struct DryRunDispatcher {
    dispatched: Mutex<Vec<Intent>>,
}

impl DryRunDispatcher {
    pub fn new() -> Self {
        Self {
            dispatched: Mutex::new(Vec::new()),
        }
    }

    /// Intents seen so far, oldest first.
    pub fn dispatched(&self) -> Vec<Intent> {
        self.dispatched
            .lock()
            .map(|d| d.clone())
            .unwrap_or_default()
    }
}

impl Default for DryRunDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntentDispatcher for DryRunDispatcher {
    async fn start_activity(&self, intent: &Intent) -> Result<(), DispatchError> {
        info!("[dry-run] start activity: {}", intent);
        if let Ok(mut dispatched) = self.dispatched.lock() {
            dispatched.push(intent.clone());
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}
