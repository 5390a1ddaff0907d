//! Default model configs loaded from environment variables.
//!
//! Two roles are exposed, both served by **Gemini**:
//!
//! - **Generation** → answers user questions from retrieved context
//! - **Embedding**  → turns FAQ entries and queries into vectors
//!
//! # Environment variables
//!
//! - `GEMINI_API_KEY`   = API key (mandatory)
//! - `GEMINI_URL`       = API base (default `https://generativelanguage.googleapis.com`)
//! - `GEMINI_MODEL`     = generation model (default `gemini-2.5-flash`)
//! - `EMBED_MODEL`      = embedding model (default `text-embedding-004`)
//! - `LLM_MAX_TOKENS`   = optional max output tokens (u32)
//! - `LLM_TEMPERATURE`  = optional sampling temperature (0.0..=2.0)
//! - `LLM_TIMEOUT_SECS` = request timeout (default 60)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, env_opt_f32, env_opt_u32, env_opt_u64, env_or, must_env,
        validate_http_endpoint, validate_range_f32,
    },
};

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Resolves the Gemini endpoint and validates its scheme.
fn gemini_endpoint() -> Result<String, AiLlmError> {
    let url = env_or("GEMINI_URL", DEFAULT_GEMINI_URL);
    validate_http_endpoint("GEMINI_URL", &url)?;
    Ok(url)
}

/// Constructs the config for the **generation** model.
///
/// # Env
/// - `GEMINI_API_KEY` (required)
/// - `GEMINI_MODEL`, `LLM_MAX_TOKENS`, `LLM_TEMPERATURE`, `LLM_TIMEOUT_SECS` (optional)
///
/// # Errors
/// - [`crate::error_handler::ConfigError::MissingVar`] without an API key
/// - [`crate::error_handler::ConfigError::InvalidNumber`] for malformed numbers
pub fn config_gemini_generation() -> Result<LlmModelConfig, AiLlmError> {
    let api_key = must_env("GEMINI_API_KEY")?;
    let endpoint = gemini_endpoint()?;
    let model = env_or("GEMINI_MODEL", DEFAULT_GENERATION_MODEL);
    let max_tokens = env_opt_u32("LLM_MAX_TOKENS")?;
    let temperature = env_opt_f32("LLM_TEMPERATURE")?;
    if let Some(t) = temperature {
        validate_range_f32("temperature", t, 0.0, 2.0)?;
    }
    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

    Ok(LlmModelConfig {
        provider: LlmProvider::Gemini,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens,
        temperature,
        top_p: None,
        timeout_secs: Some(timeout_secs),
    })
}

/// Constructs the config for the **embedding** model.
///
/// # Env
/// - `GEMINI_API_KEY` (required)
/// - `EMBED_MODEL`, `LLM_TIMEOUT_SECS` (optional)
pub fn config_gemini_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let api_key = must_env("GEMINI_API_KEY")?;
    let endpoint = gemini_endpoint()?;
    let model = env_or("EMBED_MODEL", DEFAULT_EMBEDDING_MODEL);
    let timeout_secs = env_opt_u64("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

    Ok(LlmModelConfig {
        provider: LlmProvider::Gemini,
        model,
        endpoint,
        api_key: Some(api_key),
        max_tokens: None,
        temperature: None,
        top_p: None,
        timeout_secs: Some(timeout_secs),
    })
}
