//! Core data models used by the library.

use serde::{Deserialize, Serialize};

/// Separator between the example question and its answer in the embedded text.
pub const INDEXED_TEXT_SEPARATOR: &str = " || Réponse: ";

/// One knowledge-base entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Example question / utterance.
    pub pattern: String,
    /// Category label.
    pub tag: String,
    /// Answer text.
    pub response: String,
}

impl Record {
    pub fn new(
        pattern: impl Into<String>,
        tag: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            tag: tag.into(),
            response: response.into(),
        }
    }

    /// Text that gets embedded for this record: question and answer together,
    /// which helps matching across French and Arabic phrasings.
    pub fn indexed_text(&self) -> String {
        format!("{}{}{}", self.pattern, INDEXED_TEXT_SEPARATOR, self.response)
    }
}

/// A single retrieval hit joined with its metadata.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchResult {
    /// Inner product with the query (cosine similarity for unit vectors).
    pub score: f32,
    /// Indexed text of the matched record.
    pub text: String,
    /// The matched record.
    pub meta: Record,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexed_text_joins_pattern_and_response() {
        let r = Record::new("frais ?", "FEES", "Contactez la comptabilité.");
        assert_eq!(r.indexed_text(), "frais ? || Réponse: Contactez la comptabilité.");
    }

    #[test]
    fn indexed_text_with_empty_fields() {
        let r = Record::new("", "TAG", "");
        assert_eq!(r.indexed_text(), " || Réponse: ");
    }
}
