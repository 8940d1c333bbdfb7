//! Data models shared across services

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum number of characters of card content
pub const MIN_CONTENT_CHARS: usize = 50;

/// Minimum number of characters of the visual concept
pub const MIN_VISUAL_CONCEPT_CHARS: usize = 20;

/// Fields extracted from one language-model response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardContent {
    /// The word as given on input
    pub word: String,
    /// Card body text (plain text, newlines preserved)
    pub content: String,
    /// Illustration description used as the image prompt
    pub visual_concept: String,
}

/// Why a parsed response was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationIssue {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("content too short: {0} chars (minimum {})", MIN_CONTENT_CHARS)]
    ContentTooShort(usize),

    #[error("visual concept too short: {0} chars (minimum {})", MIN_VISUAL_CONCEPT_CHARS)]
    VisualConceptTooShort(usize),
}

impl FlashcardContent {
    /// Check that every field is present and long enough to be a real card
    ///
    /// Lengths are counted in characters, not bytes.
    pub fn validate(&self) -> Result<(), ValidationIssue> {
        if self.word.trim().is_empty() {
            return Err(ValidationIssue::MissingField("word"));
        }
        if self.content.is_empty() {
            return Err(ValidationIssue::MissingField("content"));
        }
        if self.visual_concept.is_empty() {
            return Err(ValidationIssue::MissingField("visual_concept"));
        }

        let content_chars = self.content.chars().count();
        if content_chars < MIN_CONTENT_CHARS {
            return Err(ValidationIssue::ContentTooShort(content_chars));
        }

        let concept_chars = self.visual_concept.chars().count();
        if concept_chars < MIN_VISUAL_CONCEPT_CHARS {
            return Err(ValidationIssue::VisualConceptTooShort(concept_chars));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(body: &str, concept: &str) -> FlashcardContent {
        FlashcardContent {
            word: "nimble".to_string(),
            content: body.to_string(),
            visual_concept: concept.to_string(),
        }
    }

    #[test]
    fn test_valid_content() {
        let card = content(&"a".repeat(50), &"b".repeat(20));
        assert_eq!(card.validate(), Ok(()));
    }

    #[test]
    fn test_missing_visual_concept() {
        let card = content(&"a".repeat(80), "");
        assert_eq!(
            card.validate(),
            Err(ValidationIssue::MissingField("visual_concept"))
        );
    }

    #[test]
    fn test_short_content_rejected() {
        let card = content(&"a".repeat(49), &"b".repeat(40));
        assert_eq!(card.validate(), Err(ValidationIssue::ContentTooShort(49)));
    }

    #[test]
    fn test_short_visual_concept_rejected() {
        let card = content(&"a".repeat(60), "a fox");
        assert_eq!(
            card.validate(),
            Err(ValidationIssue::VisualConceptTooShort(5))
        );
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        // 25 two-byte characters: 50 bytes but only 25 chars
        let card = content(&"é".repeat(25), &"b".repeat(20));
        assert_eq!(card.validate(), Err(ValidationIssue::ContentTooShort(25)));
    }
}
