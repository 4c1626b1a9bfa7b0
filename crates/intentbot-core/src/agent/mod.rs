pub mod conversation;
pub mod handle;

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::error::{ProviderError, Result};
use crate::provider::LlmProvider;
use crate::tool::ToolRegistry;
use crate::types::{CompletionRequest, CompletionResponse, ToolChoice, Turn};
use crate::util::format_tool_args;

pub use self::conversation::Conversation;
pub use self::handle::ConversationHandle;

/// Drives one user message through the completion endpoint and the tool
/// registry.
pub struct ConversationLoop {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    model: String,
    max_tokens: u32,
    temperature: f64,
    max_tool_rounds: u32,
    request_timeout: Duration,
}

impl ConversationLoop {
    pub fn new(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        let defaults = AgentConfig::default();
        let mut agent = Self::from_config(provider, tools, &defaults);
        agent.model = agent.provider.default_model().to_string();
        agent
    }

    pub fn from_config(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            max_tool_rounds: config.max_tool_rounds.max(1),
            request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
        }
    }

    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds.max(1);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Append `user_text`, query the endpoint, run any requested tools, and
    /// return the assistant's text (empty when it only called tools).
    ///
    /// With the default of one round the endpoint is not asked again after
    /// tool results are appended. A transport failure on the first request
    /// removes the user turn again. An unknown tool name fails before any tool
    /// runs, leaving the user and assistant turns in place.
    pub async fn send_user_message(
        &self,
        conversation: &mut Conversation,
        user_text: &str,
        api_key: &str,
    ) -> Result<String> {
        if api_key.is_empty() {
            return Err(ProviderError::NoApiKey.into());
        }

        info!("Sending user message ({} chars)", user_text.chars().count());
        let checkpoint = conversation.len();
        conversation.push(Turn::user(user_text));

        let mut final_text = String::new();
        for round in 0..self.max_tool_rounds {
            debug!("Completion round {}/{}", round + 1, self.max_tool_rounds);

            let response = match self.complete(conversation, api_key).await {
                Ok(r) => r,
                Err(e) => {
                    warn!("Completion request failed: {}", e);
                    if round == 0 {
                        conversation.truncate(checkpoint);
                    }
                    return Err(e.into());
                }
            };

            let turn = response.into_turn();
            let calls = turn.requested_calls().to_vec();
            final_text = turn.text().to_string();
            conversation.push(turn);

            if calls.is_empty() {
                break;
            }

            let resolved = calls
                .iter()
                .map(|call| self.tools.resolve(&call.name).map(|tool| (call, tool)))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| {
                    warn!("Rejecting tool calls: {}", e);
                    e
                })?;

            for (call, tool) in resolved {
                info!("Executing: {}({})", call.name, format_tool_args(&call.arguments));
                let start = Instant::now();
                let result = tool.execute(call.arguments.clone()).await;
                info!(
                    "{} completed in {:.2}s: {}",
                    call.name,
                    start.elapsed().as_secs_f64(),
                    result
                );
                conversation.push(Turn::tool_result(&call.id, &call.name, result));
            }
        }

        Ok(final_text)
    }

    async fn complete(
        &self,
        conversation: &Conversation,
        api_key: &str,
    ) -> std::result::Result<CompletionResponse, ProviderError> {
        let request = CompletionRequest {
            messages: conversation.turns().to_vec(),
            tools: self.tools.definitions(),
            tool_choice: ToolChoice::Auto,
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        let response = tokio::time::timeout(self.request_timeout, self.provider.chat(&request, api_key))
            .await
            .map_err(|_| ProviderError::Timeout(self.request_timeout.as_secs()))??;

        debug!(
            "Completion finished ({:?}, {} tool calls, {} tokens)",
            response.finish_reason,
            response.tool_calls.len(),
            response.usage.total_tokens
        );
        Ok(response)
    }
}
