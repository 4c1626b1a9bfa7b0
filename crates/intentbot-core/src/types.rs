use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Turn role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// Reason the model stopped generating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    ToolCalls,
    Length,
}

/// A tool call request from the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: HashMap<String, serde_json::Value>,
}

/// Whether the model may pick a tool on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    #[default]
    Auto,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: Some(content.into()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }
    }

    /// Assistant turn as returned by the endpoint. An empty call list is
    /// stored as `None` so plain replies serialize without `tool_calls`.
    pub fn assistant_with_tool_calls(content: Option<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            name: None,
            tool_calls: if tool_calls.is_empty() {
                None
            } else {
                Some(tool_calls)
            },
            tool_call_id: None,
        }
    }

    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            name: Some(name.into()),
            tool_calls: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }

    /// Text content, or an empty string when the turn carried none.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or("")
    }

    /// Tool calls requested by this turn.
    pub fn requested_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or(&[])
    }
}

/// Request to a completion endpoint.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<Turn>,
    pub tools: Vec<serde_json::Value>,
    pub tool_choice: ToolChoice,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Response from a completion endpoint.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
    pub finish_reason: FinishReason,
    pub usage: TokenUsage,
}

impl CompletionResponse {
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// Convert into the assistant turn that gets appended to the conversation.
    pub fn into_turn(self) -> Turn {
        Turn::assistant_with_tool_calls(self.content, self.tool_calls)
    }
}

/// Token usage information.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(Role::System.to_string(), "system");
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
        assert_eq!(Role::Tool.to_string(), "tool");
    }

    #[test]
    fn test_role_serde() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        let role: Role = serde_json::from_str("\"tool\"").unwrap();
        assert_eq!(role, Role::Tool);
    }

    #[test]
    fn test_tool_choice_serde() {
        assert_eq!(serde_json::to_string(&ToolChoice::Auto).unwrap(), "\"auto\"");
        assert_eq!(ToolChoice::default(), ToolChoice::Auto);
    }

    #[test]
    fn test_turn_constructors() {
        let sys = Turn::system("You are helpful");
        assert_eq!(sys.role, Role::System);
        assert_eq!(sys.text(), "You are helpful");

        let user = Turn::user("");
        assert_eq!(user.role, Role::User);
        assert_eq!(user.text(), "");

        let tool = Turn::tool_result("call_1", "androidIntent", "Intent executed successfully.");
        assert_eq!(tool.role, Role::Tool);
        assert_eq!(tool.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(tool.name.as_deref(), Some("androidIntent"));
        assert!(tool.requested_calls().is_empty());
    }

    #[test]
    fn test_assistant_turn_from_response() {
        let resp = CompletionResponse {
            content: None,
            tool_calls: vec![ToolCall {
                id: "call_1".into(),
                name: "androidIntent".into(),
                arguments: HashMap::new(),
            }],
            finish_reason: FinishReason::ToolCalls,
            usage: TokenUsage::default(),
        };
        assert!(resp.has_tool_calls());

        let turn = resp.into_turn();
        assert_eq!(turn.role, Role::Assistant);
        assert_eq!(turn.text(), "");
        assert_eq!(turn.requested_calls().len(), 1);
    }

    #[test]
    fn test_plain_reply_has_no_tool_calls() {
        let turn = Turn::assistant_with_tool_calls(Some("hi".into()), vec![]);
        assert!(turn.tool_calls.is_none());
        let json = serde_json::to_value(&turn).unwrap();
        assert!(json.get("tool_calls").is_none());
    }
}
