//! Language-model response parsing
//!
//! The prompt template asks for a plain-text card ending in a
//! `CONCEITO VISUAL:` section. Parsing splits that section off as the image
//! prompt and strips the decorations the model tends to add around the body:
//! a `Flashcard: <word>` header, code fences, the word repeated on the first
//! line, and a familiarity rating on the last line.

use crate::models::FlashcardContent;
use once_cell::sync::Lazy;
use regex::Regex;

/// Section header introducing the illustration description
pub const VISUAL_CONCEPT_MARKER: &str = "CONCEITO VISUAL";

/// Familiarity ratings the model appends as the last line
const FAMILIARITY_KEYWORDS: [&str; 4] = ["muito comum", "comum", "pouco comum", "raro"];

static VISUAL_CONCEPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?is){}[:\s]*\n(.+)", VISUAL_CONCEPT_MARKER)).expect("valid regex")
});

// Everything from the blank lines before the marker to the end of the text
static VISUAL_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?is)\n*{}[:\s]*\n.*", VISUAL_CONCEPT_MARKER)).expect("valid regex")
});

static FLASHCARD_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^Flashcard:.*\n?").expect("valid regex"));

/// Text following the visual concept marker, trimmed
///
/// Returns an empty string when the marker is absent.
pub fn extract_visual_concept(response: &str) -> String {
    VISUAL_CONCEPT
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Split a raw response into card content and visual concept
pub fn parse_response(response: &str, word: &str) -> FlashcardContent {
    let visual_concept = extract_visual_concept(response);

    let content = VISUAL_SECTION.replace(response, "");
    let content = content.trim();

    let content = FLASHCARD_HEADER.replace_all(content, "");
    let content = content.trim();

    let content = content.replace("```", "");
    let content = content.trim();

    let mut lines: Vec<&str> = content.split('\n').collect();

    // Drop the word repeated as a title, including multi-word entries like "to deem"
    let word_normalized = word.trim().to_lowercase();
    if lines
        .first()
        .is_some_and(|first| first.trim().to_lowercase() == word_normalized)
    {
        lines.remove(0);
    }

    if lines.last().is_some_and(|last| is_familiarity_line(last)) {
        lines.pop();
    }

    FlashcardContent {
        word: word.to_string(),
        content: lines.join("\n").trim().to_string(),
        visual_concept,
    }
}

fn is_familiarity_line(line: &str) -> bool {
    let lowered = line.trim().to_lowercase();
    FAMILIARITY_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}
