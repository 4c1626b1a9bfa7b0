/// Core error types for intentbot.
#[derive(Debug, thiserror::Error)]
pub enum IntentbotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("{0}")]
    Other(String),
}

impl IntentbotError {
    /// True when the remote model asked for a tool that is not registered.
    pub fn is_unknown_tool(&self) -> bool {
        matches!(self, IntentbotError::Tool(ToolError::NotFound(_)))
    }

    /// True for failures talking to the completion endpoint.
    pub fn is_transport(&self) -> bool {
        matches!(self, IntentbotError::Provider(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No API key configured")]
    NoApiKey,
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unauthorized ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("No API key provided")]
    NoApiKey,

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("{0}")]
    Other(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

/// Failure reported by the host platform when it rejects an intent.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("{0}")]
    Rejected(String),

    #[error("dispatcher unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, IntentbotError>;
