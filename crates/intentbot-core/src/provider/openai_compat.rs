use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

use crate::error::ProviderError;
use crate::types::{CompletionRequest, CompletionResponse, FinishReason, TokenUsage, ToolCall, Turn};
use crate::util::http;

use super::LlmProvider;

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat-completion provider.
pub struct OpenAiCompatProvider {
    api_base: String,
    default_model: String,
}

impl OpenAiCompatProvider {
    pub fn new(api_base: Option<String>, default_model: String) -> Self {
        let base = api_base
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Self {
            api_base: base.trim_end_matches('/').to_string(),
            default_model,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    async fn chat(
        &self,
        request: &CompletionRequest,
        api_key: &str,
    ) -> Result<CompletionResponse, ProviderError> {
        if api_key.is_empty() {
            return Err(ProviderError::NoApiKey);
        }

        let url = format!("{}/chat/completions", self.api_base);
        let body = build_request_body(request);

        debug!(
            "Chat completion request to {} with model {} ({} turns)",
            url,
            request.model,
            request.messages.len()
        );

        let response = http::client()
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = extract_error_message(&text);
            return Err(match status.as_u16() {
                401 | 403 => ProviderError::Unauthorized {
                    status: status.as_u16(),
                    message,
                },
                code => ProviderError::Api {
                    status: code,
                    message,
                },
            });
        }

        let data: serde_json::Value = response.json().await?;
        parse_openai_response(&data)
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }
}

/// Serialize a request into the OpenAI chat-completions body.
pub fn build_request_body(request: &CompletionRequest) -> serde_json::Value {
    let msgs: Vec<serde_json::Value> = request.messages.iter().map(turn_to_wire).collect();

    let mut body = json!({
        "model": request.model,
        "messages": msgs,
        "max_tokens": request.max_tokens,
        "temperature": request.temperature,
    });

    if !request.tools.is_empty() {
        body["tools"] = json!(request.tools);
        body["tool_choice"] = json!(request.tool_choice);
    }

    body
}

fn turn_to_wire(turn: &Turn) -> serde_json::Value {
    let mut msg = json!({
        "role": turn.role,
        "content": turn.content,
    });
    if let Some(ref calls) = turn.tool_calls {
        let calls: Vec<serde_json::Value> = calls
            .iter()
            .map(|tc| {
                json!({
                    "id": tc.id,
                    "type": "function",
                    "function": {
                        "name": tc.name,
                        "arguments": serde_json::to_string(&tc.arguments).unwrap_or_else(|_| "{}".to_string()),
                    }
                })
            })
            .collect();
        msg["tool_calls"] = json!(calls);
    }
    if let Some(ref id) = turn.tool_call_id {
        msg["tool_call_id"] = json!(id);
    }
    if let Some(ref name) = turn.name {
        msg["name"] = json!(name);
    }
    msg
}

/// Pull `error.message` out of an OpenAI error body, falling back to the raw text.
fn extract_error_message(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(|s| s.to_string())
        })
        .unwrap_or_else(|| text.to_string())
}

/// Parse an OpenAI-format response into our CompletionResponse. Only the first
/// choice is used.
pub fn parse_openai_response(data: &serde_json::Value) -> Result<CompletionResponse, ProviderError> {
    let choice = data
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| ProviderError::Parse("No choices in response".to_string()))?;

    let message = choice
        .get("message")
        .ok_or_else(|| ProviderError::Parse("No message in choice".to_string()))?;

    let content = message.get("content").and_then(|v| v.as_str()).map(|s| s.to_string());

    let finish_reason = match choice.get("finish_reason").and_then(|v| v.as_str()) {
        Some("stop") => FinishReason::Stop,
        Some("tool_calls") => FinishReason::ToolCalls,
        Some("length") => FinishReason::Length,
        _ => FinishReason::Stop,
    };

    let mut tool_calls = Vec::new();
    if let Some(tcs) = message.get("tool_calls").and_then(|v| v.as_array()) {
        for tc in tcs {
            if tc.get("type").and_then(|v| v.as_str()).is_some_and(|t| t != "function") {
                return Err(ProviderError::Parse(format!(
                    "Tool call is not a function: {tc}"
                )));
            }
            let id = tc
                .get("id")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let function = tc.get("function").unwrap_or(tc);
            let name = function
                .get("name")
                .and_then(|v| v.as_str())
                .unwrap_or("")
                .to_string();
            let arguments = match function.get("arguments") {
                Some(serde_json::Value::String(s)) => parse_arguments(s),
                Some(serde_json::Value::Object(o)) => o.clone().into_iter().collect(),
                _ => HashMap::new(),
            };

            tool_calls.push(ToolCall {
                id,
                name,
                arguments,
            });
        }
    }

    let usage = if let Some(u) = data.get("usage") {
        TokenUsage {
            prompt_tokens: u.get("prompt_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
            completion_tokens: u
                .get("completion_tokens")
                .and_then(|v| v.as_u64())
                .unwrap_or(0) as u32,
            total_tokens: u.get("total_tokens").and_then(|v| v.as_u64()).unwrap_or(0) as u32,
        }
    } else {
        TokenUsage::default()
    };

    Ok(CompletionResponse {
        content,
        tool_calls,
        finish_reason,
        usage,
    })
}

fn parse_arguments(args_str: &str) -> HashMap<String, serde_json::Value> {
    if args_str.trim().is_empty() {
        return HashMap::new();
    }
    serde_json::from_str(args_str).unwrap_or_else(|_| {
        let mut m = HashMap::new();
        m.insert("raw".to_string(), serde_json::Value::String(args_str.to_string()));
        m
    })
}
