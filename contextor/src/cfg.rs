//! Runtime configuration loaded from environment variables.

use std::sync::Arc;
use std::time::Duration;

use ai_llm_service::LlmServiceProfiles;
use rag_store::{StoreConfig, env_parse};
use tracing::info;

use crate::error::ContextorError;

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_SCORE_MIN: f32 = 0.2;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Highest accepted `score_min`; anything above 1.0 disables retrieval.
pub const MAX_SCORE_MIN: f32 = 1.1;

/// Config bag for the pipeline. All knobs have defaults via `from_env`.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub svc: Arc<LlmServiceProfiles>,
    pub store: StoreConfig,

    // Retrieval knobs
    pub top_k: usize,
    pub score_min: f32,

    /// Upper bound for each remote step of a request.
    pub request_timeout: Duration,
}

impl PipelineConfig {
    /// Config with default knobs around explicit services and store paths.
    pub fn new(svc: Arc<LlmServiceProfiles>, store: StoreConfig) -> Self {
        Self {
            svc,
            store,
            top_k: DEFAULT_TOP_K,
            score_min: DEFAULT_SCORE_MIN,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    /// Build from environment variables.
    ///
    /// # Errors
    /// `ContextorError::Config` when `GEMINI_API_KEY` is missing or a knob
    /// does not parse or is out of range.
    pub fn from_env() -> Result<Self, ContextorError> {
        let svc = LlmServiceProfiles::from_env()
            .map_err(|e| ContextorError::Config(e.to_string()))?;
        let store = StoreConfig::from_env().map_err(|e| ContextorError::Config(e.to_string()))?;

        let cfg = Self {
            top_k: parse("RAG_TOP_K")?.unwrap_or(DEFAULT_TOP_K),
            score_min: parse("RAG_SCORE_MIN")?.unwrap_or(DEFAULT_SCORE_MIN),
            request_timeout: Duration::from_secs(
                parse("LLM_TIMEOUT_SECS")?.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            ..Self::new(Arc::new(svc), store)
        };
        cfg.validate()?;
        info!(
            top_k = cfg.top_k,
            score_min = cfg.score_min,
            index = ?cfg.store.index_path,
            "pipeline config loaded"
        );
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ContextorError> {
        if self.top_k == 0 {
            return Err(ContextorError::Config("RAG_TOP_K must be > 0".into()));
        }
        if !(0.0..=MAX_SCORE_MIN).contains(&self.score_min) {
            return Err(ContextorError::Config(format!(
                "RAG_SCORE_MIN must be within [0, {MAX_SCORE_MIN}], got {}",
                self.score_min
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(ContextorError::Config("request timeout must be > 0".into()));
        }
        self.store
            .validate()
            .map_err(|e| ContextorError::Config(e.to_string()))
    }
}

fn parse<T>(name: &str) -> Result<Option<T>, ContextorError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_parse(name).map_err(|e| ContextorError::Config(e.to_string()))
}
