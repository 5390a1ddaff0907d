//! Shared LLM service with two active profiles: `generation` and `embedding`.
//!
//! - Lives in the same Tokio runtime as the application.
//! - Construct once, wrap in `Arc`, and pass clones to dependents.
//! - Each profile owns its own HTTP client (timeouts may differ).
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use ai_llm_service::service_profiles::LlmServiceProfiles;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let svc = Arc::new(LlmServiceProfiles::from_env()?);
//!
//! let resp = svc.generate("Answer briefly.", "Bonjour").await?;
//! println!("candidates = {}", resp.candidates.len());
//!
//! let emb = svc.embed("frais d'inscription").await?;
//! println!("embedding dim = {}", emb.len());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use tracing::info;

use crate::{
    config::{
        default_config::{config_gemini_embedding, config_gemini_generation},
        llm_model_config::LlmModelConfig,
    },
    error_handler::AiLlmError,
    models::GenerateContentResponse,
    services::gemini_service::GeminiService,
};

/// Shared service that manages the **generation** and **embedding** profiles.
#[derive(Debug, Clone)]
pub struct LlmServiceProfiles {
    generation: Arc<GeminiService>,
    embedding: Arc<GeminiService>,
}

impl LlmServiceProfiles {
    /// Creates a new service from explicit configs.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if either client cannot be built.
    pub fn new(generation: LlmModelConfig, embedding: LlmModelConfig) -> Result<Self, AiLlmError> {
        Ok(Self {
            generation: Arc::new(GeminiService::new(generation)?),
            embedding: Arc::new(GeminiService::new(embedding)?),
        })
    }

    /// Creates both profiles from environment variables.
    ///
    /// # Errors
    /// Fails with a config error when `GEMINI_API_KEY` is missing or a numeric
    /// variable is malformed.
    pub fn from_env() -> Result<Self, AiLlmError> {
        let generation = config_gemini_generation()?;
        let embedding = config_gemini_embedding()?;
        info!(
            generation_model = %generation.model,
            embedding_model = %embedding.model,
            "LLM profiles loaded from env"
        );
        Self::new(generation, embedding)
    }

    /// Runs `generateContent` on the **generation** profile.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] if the call fails.
    pub async fn generate(
        &self,
        system: &str,
        user: &str,
    ) -> Result<GenerateContentResponse, AiLlmError> {
        self.generation.generate_content(system, user).await
    }

    /// Computes one embedding using the **embedding** profile.
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        self.embedding.embed(input).await
    }

    /// Computes embeddings for a batch of inputs, preserving order.
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        self.embedding.embed_batch(inputs).await
    }
}
