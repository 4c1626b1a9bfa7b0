pub mod openai_compat;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::{CompletionRequest, CompletionResponse};

/// Trait for chat-completion endpoints.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a chat completion request authorized by `api_key`.
    async fn chat(
        &self,
        request: &CompletionRequest,
        api_key: &str,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Get the default model for this provider.
    fn default_model(&self) -> &str;
}

/// Create the provider for the configured endpoint.
pub fn create_provider(api_base: Option<&str>, default_model: &str) -> Box<dyn LlmProvider> {
    Box::new(openai_compat::OpenAiCompatProvider::new(
        api_base.map(|s| s.to_string()),
        default_model.to_string(),
    ))
}
