//! Gemini access layer for the FAQ assistant: configuration from env,
//! a thin REST client for `generateContent` / `embedContent`, and shared
//! logging setup.

pub mod config;
pub mod error_handler;
pub mod models;
pub mod service_profiles;
pub mod services;
pub mod telemetry;

pub use config::llm_model_config::LlmModelConfig;
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, ConfigError, ProviderError, ProviderErrorKind};
pub use models::{Candidate, Content, GenerateContentResponse, Part};
pub use service_profiles::LlmServiceProfiles;
pub use services::gemini_service::{GeminiService, MAX_BATCH_EMBED};
