//! Typed error for the contextor crate.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Missing or invalid configuration (fatal at startup).
    #[error("config error: {0}")]
    Config(String),

    /// Persisted store files are absent.
    #[error("store file {0} not found; run the ingestion job (`ingest`) first")]
    StoreMissing(std::path::PathBuf),

    /// Errors from the underlying rag-store crate.
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// Errors from the Gemini client.
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),

    /// A remote step did not finish in time.
    #[error("{stage} timed out after {after:?}")]
    Timeout {
        stage: &'static str,
        after: Duration,
    },
}
