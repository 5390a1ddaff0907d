//! Gemini service for text generation and embeddings.
//!
//! Minimal, non-streaming client around the Generative Language REST API.
//! Endpoints are derived from `LlmModelConfig::endpoint`:
//! - POST {endpoint}/v1beta/models/{model}:generateContent (generation)
//! - POST {endpoint}/v1beta/models/{model}:embedContent (single embedding)
//! - POST {endpoint}/v1beta/models/{model}:batchEmbedContents (batched embeddings)
//!
//! Constructor validation:
//! - `cfg.provider` must be `LlmProvider::Gemini`
//! - `cfg.model` must not be blank
//! - `cfg.api_key` must be present
//! - `cfg.endpoint` must start with http:// or https://
//!
//! The API key travels in the `x-goog-api-key` header so URLs stay safe to log.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, error, info, instrument};

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
    models::{
        BatchEmbedContentsRequest, BatchEmbedContentsResponse, Content, EmbedContentRequest,
        EmbedContentResponse, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    },
};

const API_VERSION: &str = "v1beta";

/// Largest number of requests Gemini accepts in one `batchEmbedContents` call.
pub const MAX_BATCH_EMBED: usize = 100;

/// Thin client for the Gemini API.
///
/// Constructed from a complete [`LlmModelConfig`]. Internally keeps a
/// preconfigured `reqwest::Client` (timeout + default headers).
#[derive(Debug)]
pub struct GeminiService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    timeout: Duration,
    model_path: String,
    url_generate: String,
    url_embed: String,
    url_batch_embed: String,
}

impl GeminiService {
    /// Creates a new [`GeminiService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not Gemini
    /// - `EmptyModel` if `cfg.model` is blank
    /// - `MissingApiKey` if `cfg.api_key` is `None` or blank
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Gemini {
            return Err(
                ProviderError::new(Provider::Gemini, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        if cfg.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel.into());
        }

        let api_key = cfg
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::new(Provider::Gemini, ProviderErrorKind::MissingApiKey))?;

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let mut headers = header::HeaderMap::new();
        let mut key_value = header::HeaderValue::from_str(api_key.trim()).map_err(|e| {
            ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
            )
        })?;
        key_value.set_sensitive(true);
        headers.insert("x-goog-api-key", key_value);
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let model_path = cfg.model_path();
        let url_generate = format!("{base}/{API_VERSION}/{model_path}:generateContent");
        let url_embed = format!("{base}/{API_VERSION}/{model_path}:embedContent");
        let url_batch_embed = format!("{base}/{API_VERSION}/{model_path}:batchEmbedContents");

        info!(
            provider = ?cfg.provider,
            model = %cfg.model,
            endpoint = %cfg.endpoint,
            timeout_secs = timeout.as_secs(),
            "GeminiService initialized"
        );

        Ok(Self {
            client,
            cfg,
            timeout,
            model_path,
            url_generate,
            url_embed,
            url_batch_embed,
        })
    }

    /// Performs a **non-streaming** `generateContent` call.
    ///
    /// `system` is bound as `systemInstruction`; `user` is the sole user turn.
    /// The raw response is returned so callers decide how to extract text.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client/network failures (incl. timeout)
    /// - `Decode` if the JSON cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate_content(
        &self,
        system: &str,
        user: &str,
    ) -> Result<GenerateContentResponse, AiLlmError> {
        let generation_config = GenerationConfig {
            temperature: self.cfg.temperature,
            top_p: self.cfg.top_p,
            max_output_tokens: self.cfg.max_tokens,
        };
        let body = GenerateContentRequest {
            system_instruction: (!system.is_empty()).then(|| Content::from_text(None, system)),
            contents: vec![Content::from_text(Some("user"), user)],
            generation_config: (!generation_config.is_empty()).then_some(generation_config),
        };

        debug!(
            system_len = system.len(),
            user_len = user.len(),
            "POST {}", self.url_generate
        );

        let out: GenerateContentResponse = self
            .post_json(&self.url_generate, &body, "candidates[].content.parts[].text")
            .await?;

        debug!(candidates = out.candidates.len(), "generateContent completed");
        Ok(out)
    }

    /// Retrieves a single embedding vector via `embedContent`.
    ///
    /// # Errors
    /// - `HttpStatus`, `Decode` as for [`Self::generate_content`]
    /// - `EmptyEmbedding` if the response carries no values
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let body = EmbedContentRequest {
            model: self.model_path.clone(),
            content: Content::from_text(None, input),
        };

        debug!(input_len = input.len(), "POST {}", self.url_embed);

        let out: EmbedContentResponse = self
            .post_json(&self.url_embed, &body, "embedding.values")
            .await?;

        match out.embedding {
            Some(e) if !e.values.is_empty() => Ok(e.values),
            _ => Err(ProviderError::new(Provider::Gemini, ProviderErrorKind::EmptyEmbedding).into()),
        }
    }

    /// Retrieves embeddings for many inputs via `batchEmbedContents`.
    ///
    /// Inputs are sent in requests of at most [`MAX_BATCH_EMBED`] items.
    /// Output order matches input order.
    ///
    /// # Errors
    /// - `Decode` if a request returns a different number of vectors than it sent
    /// - `EmptyEmbedding` if any returned vector is empty
    #[instrument(skip_all, fields(model = %self.cfg.model, batch = inputs.len()))]
    pub async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        let mut out = Vec::with_capacity(inputs.len());
        for chunk in inputs.chunks(MAX_BATCH_EMBED) {
            out.extend(self.embed_batch_request(chunk).await?);
        }
        Ok(out)
    }

    async fn embed_batch_request(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, AiLlmError> {
        let body = BatchEmbedContentsRequest {
            requests: inputs
                .iter()
                .map(|t| EmbedContentRequest {
                    model: self.model_path.clone(),
                    content: Content::from_text(None, t),
                })
                .collect(),
        };

        debug!(items = inputs.len(), "POST {}", self.url_batch_embed);

        let out: BatchEmbedContentsResponse = self
            .post_json(&self.url_batch_embed, &body, "embeddings[].values")
            .await?;

        if out.embeddings.len() != inputs.len() {
            return Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::Decode(format!(
                    "batch returned {} embeddings for {} inputs",
                    out.embeddings.len(),
                    inputs.len()
                )),
            )
            .into());
        }
        if out.embeddings.iter().any(|e| e.values.is_empty()) {
            return Err(ProviderError::new(Provider::Gemini, ProviderErrorKind::EmptyEmbedding).into());
        }

        Ok(out.embeddings.into_iter().map(|e| e.values).collect())
    }

    /* --------------------- Internals --------------------- */

    async fn post_json<B, R>(&self, url: &str, body: &B, expected: &str) -> Result<R, AiLlmError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let started = Instant::now();
        let resp = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(
                %status,
                %url,
                %snippet,
                model = %self.cfg.model,
                latency_ms = started.elapsed().as_millis(),
                "Gemini returned non-success status"
            );

            return Err(ProviderError::new(
                Provider::Gemini,
                ProviderErrorKind::HttpStatus(HttpError {
                    status,
                    url: url.to_string(),
                    snippet,
                }),
            )
            .into());
        }

        let bytes = resp.bytes().await.map_err(|e| self.transport_error(e))?;
        match serde_json::from_slice::<R>(&bytes) {
            Ok(v) => {
                debug!(latency_ms = started.elapsed().as_millis(), %url, "request completed");
                Ok(v)
            }
            Err(e) => {
                error!(
                    error = %e,
                    %url,
                    latency_ms = started.elapsed().as_millis(),
                    "failed to decode Gemini response"
                );
                Err(ProviderError::new(
                    Provider::Gemini,
                    ProviderErrorKind::Decode(format!("serde error: {e}; expected `{expected}`")),
                )
                .into())
            }
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> AiLlmError {
        if e.is_timeout() {
            error!(model = %self.cfg.model, "Gemini request timed out");
            AiLlmError::Timeout(self.timeout)
        } else {
            AiLlmError::HttpTransport(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Gemini,
            model: "gemini-2.5-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com/".into(),
            api_key: Some("k".into()),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn builds_versioned_urls() {
        let svc = GeminiService::new(cfg()).unwrap();
        assert_eq!(
            svc.url_generate,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert!(svc.url_batch_embed.ends_with(":batchEmbedContents"));
    }

    #[test]
    fn rejects_blank_model() {
        let mut c = cfg();
        c.model = " ".into();
        assert!(matches!(
            GeminiService::new(c),
            Err(AiLlmError::Config(ConfigError::EmptyModel))
        ));
    }

    #[test]
    fn rejects_missing_key_and_bad_endpoint() {
        let mut c = cfg();
        c.api_key = Some("  ".into());
        assert!(matches!(
            GeminiService::new(c),
            Err(AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::MissingApiKey,
                ..
            }))
        ));

        let mut c = cfg();
        c.endpoint = "localhost:1234".into();
        assert!(matches!(
            GeminiService::new(c),
            Err(AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::InvalidEndpoint(_),
                ..
            }))
        ));
    }
}
