use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ToolError;
use crate::platform::{Intent, IntentDispatcher};

use super::Tool;

pub const TOOL_NAME: &str = "androidIntent";
pub const ACTION_NOT_PROVIDED: &str = "Action not provided.";
pub const INTENT_EXECUTED: &str = "Intent executed successfully.";

/// Tool that builds an Android intent from the model's arguments and hands it
/// to the host platform.
pub struct AndroidIntentTool {
    dispatcher: Arc<dyn IntentDispatcher>,
}

impl AndroidIntentTool {
    pub fn new(dispatcher: Arc<dyn IntentDispatcher>) -> Self {
        Self { dispatcher }
    }
}

#[async_trait]
impl Tool for AndroidIntentTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Execute an Android Intent"
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "description": "The action to execute, for example \"android.intent.action.DIAL\""
                },
                "extras": {
                    "type": "array",
                    "description": "The extras to execute, for example \"tel:1234-5678\"",
                    "items": { "type": "string" }
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, params: HashMap<String, serde_json::Value>) -> String {
        let action = match params.get("action").and_then(|v| v.as_str()) {
            Some(a) => a,
            None => return ACTION_NOT_PROVIDED.to_string(),
        };

        let mut intent = Intent::new(action);
        if let Some(extras) = params.get("extras") {
            match parse_extras(extras) {
                Ok(pairs) => intent.extras = pairs,
                Err(e) => {
                    warn!("Rejected intent {}: {}", action, e);
                    return format!("Failed to execute intent: {e}");
                }
            }
        }

        info!("Dispatching intent via {}: {}", self.dispatcher.name(), intent);
        match self.dispatcher.start_activity(&intent).await {
            Ok(()) => INTENT_EXECUTED.to_string(),
            Err(e) => format!("Failed to execute intent: {e}"),
        }
    }
}

/// Parse the `extras` argument: an array of `"key:value"` strings, each split
/// on its first colon. Every malformed entry is named in the error.
pub fn parse_extras(value: &serde_json::Value) -> Result<Vec<(String, String)>, ToolError> {
    let entries = match value {
        serde_json::Value::Null => return Ok(Vec::new()),
        serde_json::Value::Array(a) => a,
        other => {
            return Err(ToolError::InvalidParams(format!(
                "extras must be an array of \"key:value\" strings, got {other}"
            )))
        }
    };

    let mut pairs = Vec::with_capacity(entries.len());
    let mut problems = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        match entry.as_str().map(parse_extra) {
            Some(Ok(pair)) => pairs.push(pair),
            Some(Err(e)) => problems.push(format!("extras[{i}]: {e}")),
            None => problems.push(format!("extras[{i}]: expected a string, got {entry}")),
        }
    }

    if problems.is_empty() {
        Ok(pairs)
    } else {
        Err(ToolError::InvalidParams(problems.join("; ")))
    }
}

fn parse_extra(entry: &str) -> Result<(String, String), String> {
    match entry.split_once(':') {
        Some((key, _)) if key.trim().is_empty() => Err(format!("\"{entry}\" has an empty key")),
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("\"{entry}\" is not in \"key:value\" form")),
    }
}
