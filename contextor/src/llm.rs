//! Generation client: calls the model, extracts text, never fails.

use std::sync::Arc;
use std::time::Duration;
use std::{future::Future, pin::Pin};

use ai_llm_service::{AiLlmError, GenerateContentResponse, LlmServiceProfiles};
use tracing::{debug, warn};

/// Answer used whenever no text can be obtained from the model.
pub const FALLBACK_REPLY: &str = "Je n’ai pas cette information pour le moment.";

pub type GenerateFuture<'a> =
    Pin<Box<dyn Future<Output = Result<GenerateContentResponse, AiLlmError>> + Send + 'a>>;

/// Anything that runs `generateContent(system, user)`.
pub trait ContentGenerator: Send + Sync {
    fn generate<'a>(&'a self, system: &'a str, user: &'a str) -> GenerateFuture<'a>;
}

impl ContentGenerator for LlmServiceProfiles {
    fn generate<'a>(&'a self, system: &'a str, user: &'a str) -> GenerateFuture<'a> {
        Box::pin(LlmServiceProfiles::generate(self, system, user))
    }
}

/// Ways of pulling the answer text out of a response, tried in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtractionStrategy {
    /// Single candidate; all its text parts joined, whatever its finish reason.
    PrimaryText,
    /// First non-empty text part of the first candidate, whatever its finish reason.
    FirstCandidateParts,
}

pub const DEFAULT_STRATEGIES: &[ExtractionStrategy] = &[
    ExtractionStrategy::PrimaryText,
    ExtractionStrategy::FirstCandidateParts,
];

impl ExtractionStrategy {
    /// Trimmed, non-empty text or `None`.
    pub fn extract(self, resp: &GenerateContentResponse) -> Option<String> {
        let raw = match self {
            Self::PrimaryText => match resp.candidates.as_slice() {
                [only] => Some(only.texts().collect::<String>()),
                _ => None,
            },
            Self::FirstCandidateParts => resp.candidates.first().and_then(|c| {
                c.texts()
                    .map(str::trim)
                    .find(|t| !t.is_empty())
                    .map(str::to_string)
            }),
        }?;
        let text = raw.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Applies `strategies` in order; first hit wins.
pub fn extract_text(
    resp: &GenerateContentResponse,
    strategies: &[ExtractionStrategy],
) -> Option<String> {
    strategies.iter().find_map(|s| s.extract(resp))
}

/// Wraps a [`ContentGenerator`] with a timeout and the extraction policy.
#[derive(Clone)]
pub struct GenerationClient {
    generator: Arc<dyn ContentGenerator>,
    strategies: Vec<ExtractionStrategy>,
    timeout: Duration,
}

impl GenerationClient {
    pub fn new(generator: Arc<dyn ContentGenerator>, timeout: Duration) -> Self {
        Self {
            generator,
            strategies: DEFAULT_STRATEGIES.to_vec(),
            timeout,
        }
    }

    pub fn with_strategies(mut self, strategies: &[ExtractionStrategy]) -> Self {
        self.strategies = strategies.to_vec();
        self
    }

    /// Returns the model's answer, or [`FALLBACK_REPLY`] on error, timeout or empty output.
    pub async fn generate(&self, system: &str, user: &str) -> String {
        let resp = match tokio::time::timeout(self.timeout, self.generator.generate(system, user))
            .await
        {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => {
                warn!("generation failed, using fallback: {e}");
                return FALLBACK_REPLY.to_string();
            }
            Err(_) => {
                warn!("generation timed out after {:?}, using fallback", self.timeout);
                return FALLBACK_REPLY.to_string();
            }
        };

        match extract_text(&resp, &self.strategies) {
            Some(text) => {
                if let Some(c) = resp.candidates.first().filter(|c| !c.finished_normally()) {
                    warn!(finish_reason = ?c.finish_reason, "answer may be incomplete");
                }
                debug!("generation ok chars={}", text.chars().count());
                text
            }
            None => {
                warn!(
                    candidates = resp.candidates.len(),
                    "no text in generation response, using fallback"
                );
                FALLBACK_REPLY.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ai_llm_service::{
        Candidate, Content, Part, ProviderError, ProviderErrorKind, error_handler::Provider,
    };

    fn candidate(parts: &[&str], finish_reason: Option<&str>) -> Candidate {
        Candidate {
            content: Some(Content {
                role: Some("model".into()),
                parts: parts.iter().map(|p| Part::text(*p)).collect(),
            }),
            finish_reason: finish_reason.map(str::to_string),
        }
    }

    fn resp(candidates: Vec<Candidate>) -> GenerateContentResponse {
        GenerateContentResponse { candidates }
    }

    struct Fixed(Result<GenerateContentResponse, ()>);

    impl ContentGenerator for Fixed {
        fn generate<'a>(&'a self, _s: &'a str, _u: &'a str) -> GenerateFuture<'a> {
            let out = match &self.0 {
                Ok(r) => Ok(r.clone()),
                Err(()) => Err(AiLlmError::Provider(ProviderError::new(
                    Provider::Gemini,
                    ProviderErrorKind::EmptyEmbedding,
                ))),
            };
            Box::pin(async move { out })
        }
    }

    struct Hangs;

    impl ContentGenerator for Hangs {
        fn generate<'a>(&'a self, _s: &'a str, _u: &'a str) -> GenerateFuture<'a> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(GenerateContentResponse::default())
            })
        }
    }

    #[test]
    fn primary_text_joins_parts_and_trims() {
        let r = resp(vec![candidate(&["  Bonjour", ", ça va ? "], Some("STOP"))]);
        assert_eq!(
            ExtractionStrategy::PrimaryText.extract(&r).as_deref(),
            Some("Bonjour, ça va ?")
        );
    }

    #[test]
    fn primary_text_keeps_truncated_single_candidate() {
        let cut = resp(vec![candidate(&["Hello ", "world"], Some("MAX_TOKENS"))]);
        assert_eq!(
            ExtractionStrategy::PrimaryText.extract(&cut).as_deref(),
            Some("Hello world")
        );
        assert_eq!(extract_text(&cut, DEFAULT_STRATEGIES).as_deref(), Some("Hello world"));
    }

    #[test]
    fn primary_text_needs_a_single_candidate() {
        let two = resp(vec![
            candidate(&["a"], None),
            candidate(&["b"], None),
        ]);
        assert_eq!(ExtractionStrategy::PrimaryText.extract(&two), None);
    }

    #[test]
    fn first_candidate_parts_handles_several_candidates() {
        let r = resp(vec![
            candidate(&["", "  نعم  "], Some("MAX_TOKENS")),
            candidate(&["autre"], Some("STOP")),
        ]);
        assert_eq!(extract_text(&r, DEFAULT_STRATEGIES).as_deref(), Some("نعم"));
    }

    #[test]
    fn nothing_extractable_from_empty_response() {
        assert_eq!(extract_text(&resp(vec![]), DEFAULT_STRATEGIES), None);
        let blank = resp(vec![candidate(&["   "], Some("STOP"))]);
        assert_eq!(extract_text(&blank, DEFAULT_STRATEGIES), None);
    }

    #[tokio::test]
    async fn client_returns_model_text() {
        let gen_ok = Fixed(Ok(resp(vec![candidate(&["Réponse"], Some("STOP"))])));
        let c = GenerationClient::new(Arc::new(gen_ok), Duration::from_secs(5));
        assert_eq!(c.generate("s", "u").await, "Réponse");
    }

    #[tokio::test]
    async fn client_falls_back_on_error_and_empty_output() {
        let c = GenerationClient::new(Arc::new(Fixed(Err(()))), Duration::from_secs(5));
        assert_eq!(c.generate("s", "u").await, FALLBACK_REPLY);

        let c = GenerationClient::new(Arc::new(Fixed(Ok(resp(vec![])))), Duration::from_secs(5));
        assert_eq!(c.generate("s", "u").await, FALLBACK_REPLY);
    }

    #[tokio::test(start_paused = true)]
    async fn client_falls_back_on_timeout() {
        let c = GenerationClient::new(Arc::new(Hangs), Duration::from_secs(2));
        assert_eq!(c.generate("s", "u").await, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn strategies_can_be_restricted() {
        let r = resp(vec![candidate(&["a"], None), candidate(&["b"], None)]);
        let c = GenerationClient::new(Arc::new(Fixed(Ok(r.clone()))), Duration::from_secs(5));
        assert_eq!(c.generate("s", "u").await, "a");

        let c = GenerationClient::new(Arc::new(Fixed(Ok(r))), Duration::from_secs(5))
            .with_strategies(&[ExtractionStrategy::PrimaryText]);
        assert_eq!(c.generate("s", "u").await, FALLBACK_REPLY);
    }
}
