//! Error types for ankiforge-gen
//!
//! Each remote service has its own error enum next to its client. This type
//! wraps them for the per-word pipeline.

use crate::models::ValidationIssue;
use crate::services::anki_client::AnkiError;
use crate::services::image_client::ImageError;
use crate::services::llm_client::LlmError;
use thiserror::Error;

/// Pipeline error type
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Language-model request or prompt failure
    #[error("Content generation failed: {0}")]
    Llm(#[from] LlmError),

    /// LLM answered, but the parsed content is unusable
    #[error("Invalid LLM response: {0}")]
    InvalidContent(#[from] ValidationIssue),

    /// Image generation failure
    #[error("Image generation failed: {0}")]
    Image(#[from] ImageError),

    /// AnkiConnect failure
    #[error("AnkiConnect error: {0}")]
    Anki(#[from] AnkiError),

    /// Fewer than two cards were created
    #[error("Only {created} of 2 cards were created")]
    IncompleteCards { created: usize },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// ankiforge-common error (cache, queue file, configuration)
    #[error(transparent)]
    Common(#[from] ankiforge_common::Error),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, ForgeError>;
