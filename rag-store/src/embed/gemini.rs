//! Gemini embedding provider backed by the shared `ai-llm-service` profiles.

use std::sync::Arc;

use ai_llm_service::{AiLlmError, LlmServiceProfiles};
use tracing::{debug, error};

use crate::embed::{EmbedFuture, EmbeddingsProvider};
use crate::errors::RagError;

/// Embeds through `:embedContent`, and `:batchEmbedContents` for batches.
#[derive(Clone, Debug)]
pub struct GeminiEmbedder {
    svc: Arc<LlmServiceProfiles>,
    /// Expected dimension; `None` accepts whatever the model returns.
    dim: Option<usize>,
}

impl GeminiEmbedder {
    pub fn new(svc: Arc<LlmServiceProfiles>, dim: Option<usize>) -> Self {
        Self { svc, dim }
    }

    fn check_dim(&self, v: &[f32]) -> Result<(), RagError> {
        match self.dim {
            Some(want) if want != v.len() => Err(RagError::VectorSizeMismatch {
                got: v.len(),
                want,
            }),
            _ => Ok(()),
        }
    }
}

fn embedding_error(e: AiLlmError) -> RagError {
    error!("embedding call failed: {e}");
    RagError::Embedding(e.to_string())
}

impl EmbeddingsProvider for GeminiEmbedder {
    fn embed<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async move {
            let v = self.svc.embed(text).await.map_err(embedding_error)?;
            self.check_dim(&v)?;
            Ok(v)
        })
    }

    fn embed_many<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            let out = self.svc.embed_batch(texts).await.map_err(embedding_error)?;
            for v in &out {
                self.check_dim(v)?;
            }
            debug!("GeminiEmbedder::embed_many n={}", out.len());
            Ok(out)
        })
    }
}
