use crate::error::ConfigurationError;

pub const DEFAULT_MODEL: &str = "openai/gpt-4.1-mini";

/// Upper bound on how much report text is embedded in a chat prompt. The
/// backend rejects oversized inputs, so the report is truncated rather than
/// sent whole.
pub const DEFAULT_CHAT_CONTEXT_CHARS: usize = 10_000;

/// Settings for the text-generation backend, resolved once at startup.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub model: String,
    pub chat_context_chars: usize,
}

impl GenerationConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            chat_context_chars: DEFAULT_CHAT_CONTEXT_CHARS,
        }
    }

    /// Read configuration from the environment. A missing API key is a fatal
    /// startup error, surfaced before any document is accepted.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let api_key =
            std::env::var("OPENROUTER_API_KEY").map_err(|_| ConfigurationError::MissingApiKey)?;

        let model =
            std::env::var("GENERATION_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let chat_context_chars = match std::env::var("CHAT_CONTEXT_CHARS") {
            Ok(raw) => raw.parse().map_err(|_| ConfigurationError::InvalidValue {
                name: "CHAT_CONTEXT_CHARS",
                value: raw,
            })?,
            Err(_) => DEFAULT_CHAT_CONTEXT_CHARS,
        };

        Ok(Self {
            api_key,
            model,
            chat_context_chars,
        })
    }
}
