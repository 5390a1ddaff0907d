/// Represents the provider (backend) used for model inference.
///
/// The assistant talks to Google's Generative Language API for both
/// embeddings and text generation.
///
/// # Examples
///
/// ```
/// use ai_llm_service::config::llm_provider::LlmProvider;
///
/// fn describe(provider: LlmProvider) -> &'static str {
///     match provider {
///         LlmProvider::Gemini => "Google Gemini API",
///     }
/// }
/// assert_eq!(describe(LlmProvider::Gemini), "Google Gemini API");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Google Generative Language API (`generateContent`, `embedContent`).
    Gemini,
}
