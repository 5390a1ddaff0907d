//! Prompt builder: fixed bilingual system directive + question/context user turn.

use rag_store::SearchResult;

/// System directive bound as the model's system instruction.
pub const SYSTEM_PROMPT: &str = "أنت مستشار جامعة UIC / You are UIC assistant. \
Answer strictly from the provided context only. \
Reply in the SAME language as the user message (Arabic if Arabic, French if French). \
If the info is missing in context, reply politely:\n\
FR: \"Je n’ai pas cette information pour le moment.\" |\n\
AR: \"لا أتوفر على هذه المعلومة حاليًا.\"";

/// Context block used when retrieval returned nothing.
pub const NO_CONTEXT: &str = "Aucun contexte pertinent trouvé.";

/// `(system, user)` pair sent to the generation model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Builds the prompt pair for `query` grounded on `retrieved`, in rank order.
///
/// # Example
/// ```
/// # use contextor::prompt::{build_prompt, NO_CONTEXT};
/// let p = build_prompt("Bonjour", &[]);
/// assert!(p.user.ends_with(NO_CONTEXT));
/// ```
pub fn build_prompt(query: &str, retrieved: &[SearchResult]) -> PromptPair {
    PromptPair {
        system: SYSTEM_PROMPT.to_string(),
        user: format!(
            "Question:\n{}\n\nContexte:\n{}",
            query,
            context_block(retrieved)
        ),
    }
}

fn context_block(retrieved: &[SearchResult]) -> String {
    if retrieved.is_empty() {
        return NO_CONTEXT.to_string();
    }
    retrieved
        .iter()
        .map(|r| {
            format!(
                "- TAG: {}\n  Exemple/Question: {}\n  Réponse: {}",
                r.meta.tag, r.meta.pattern, r.meta.response
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
