//! RAG + LLM gateway for the FAQ assistant.
//!
//! Public API: [`Pipeline`]. It embeds the question, retrieves the top-K
//! records from `rag-store`, builds a bilingual grounded prompt, calls Gemini,
//! and returns the answer together with the best matching tag.

pub mod cfg;
mod error;
pub mod llm;
pub mod prompt;

mod api_types;

pub use api_types::{Answer, PipelineStats, RetrievalOptions};

pub use error::ContextorError;

pub use cfg::PipelineConfig;
pub use llm::{ContentGenerator, ExtractionStrategy, FALLBACK_REPLY, GenerationClient};
pub use prompt::{PromptPair, build_prompt};

use std::sync::Arc;

use rag_store::{GeminiEmbedder, RagStore, Retriever};
use tracing::{debug, info, instrument};

/// Reply for a blank question.
pub const EMPTY_QUERY_REPLY: &str = "Entrez un message / أدخل رسالة.";

/// Loaded knowledge base plus model clients. Immutable; share it as `Arc<Pipeline>`.
pub struct Pipeline {
    retriever: Retriever,
    generator: GenerationClient,
    opts: RetrievalOptions,
}

impl Pipeline {
    /// Loads the persisted store and wires the Gemini clients.
    ///
    /// # Errors
    /// - `StoreMissing` if the index or metadata file does not exist
    /// - `Config` for invalid knobs
    /// - `Rag` when the files cannot be decoded or are misaligned
    ///
    /// # Example
    /// ```no_run
    /// # use contextor::{Pipeline, PipelineConfig};
    /// # #[tokio::main] async fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let pipeline = Pipeline::initialize(PipelineConfig::from_env()?)?;
    /// let answer = pipeline.answer("Quels sont les frais d'inscription ?").await?;
    /// println!("{} [{}]", answer.reply, answer.tag);
    /// # Ok(()) }
    /// ```
    pub fn initialize(cfg: PipelineConfig) -> Result<Self, ContextorError> {
        cfg.validate()?;

        let embedder = Arc::new(GeminiEmbedder::new(
            cfg.svc.clone(),
            cfg.store.embedding_dim,
        ));
        let store = RagStore::new(cfg.store.clone(), embedder)?;
        if !store.exists() {
            let missing = [&cfg.store.index_path, &cfg.store.meta_path]
                .into_iter()
                .find(|p| !p.is_file())
                .unwrap_or(&cfg.store.index_path);
            return Err(ContextorError::StoreMissing(missing.clone()));
        }
        let retriever = store.open()?;
        let generator = GenerationClient::new(cfg.svc.clone(), cfg.request_timeout);

        let opts = RetrievalOptions {
            top_k: cfg.top_k,
            score_min: cfg.score_min,
            request_timeout: cfg.request_timeout,
        };
        let pipeline = Self::from_parts(retriever, generator, opts);
        let stats = pipeline.stats();
        info!(
            entries = stats.entries,
            dim = stats.dim,
            "knowledge base loaded"
        );
        Ok(pipeline)
    }

    /// Wires explicit parts (custom providers, test doubles).
    pub fn from_parts(
        retriever: Retriever,
        generator: GenerationClient,
        opts: RetrievalOptions,
    ) -> Self {
        Self {
            retriever,
            generator,
            opts,
        }
    }

    pub fn options(&self) -> RetrievalOptions {
        self.opts
    }

    pub fn stats(&self) -> PipelineStats {
        let store = self.retriever.store();
        PipelineStats {
            entries: store.len(),
            dim: store.dim(),
        }
    }

    /// Answers one question.
    ///
    /// A blank question gets [`EMPTY_QUERY_REPLY`] without any remote call.
    /// Generation problems are absorbed into [`FALLBACK_REPLY`].
    ///
    /// # Errors
    /// Embedding/search failures (`Rag`) and a retrieval `Timeout`.
    #[instrument(skip_all, fields(query_chars = query.chars().count()))]
    pub async fn answer(&self, query: &str) -> Result<Answer, ContextorError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Answer {
                reply: EMPTY_QUERY_REPLY.to_string(),
                tag: String::new(),
            });
        }

        let retrieved = tokio::time::timeout(
            self.opts.request_timeout,
            self.retriever
                .retrieve(query, self.opts.top_k, self.opts.score_min),
        )
        .await
        .map_err(|_| ContextorError::Timeout {
            stage: "retrieval",
            after: self.opts.request_timeout,
        })??;

        let tag = retrieved
            .first()
            .map(|r| r.meta.tag.clone())
            .unwrap_or_default();
        debug!(hits = retrieved.len(), tag = %tag, "context retrieved");

        let prompt = build_prompt(query, &retrieved);
        let reply = self.generator.generate(&prompt.system, &prompt.user).await;

        Ok(Answer { reply, tag })
    }
}
