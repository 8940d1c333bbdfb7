//! Services for flashcard generation
//!
//! Remote clients (language model, image generation, AnkiConnect) sit behind
//! the traits below so the pipeline can run against test doubles.

pub mod anki_client;
pub mod card_formatter;
pub mod image_client;
pub mod llm_client;
pub mod processed_cache;
pub mod response_parser;
pub mod word_queue;

pub use anki_client::{AnkiClient, AnkiError};
pub use image_client::{ImageError, PollinationsClient};
pub use llm_client::{ClaudeClient, LlmError, PromptTemplate};
pub use processed_cache::{CacheEntry, ProcessedCache};

use crate::models::FlashcardContent;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Produces card text and a visual concept for a word
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_content(&self, word: &str) -> Result<FlashcardContent, LlmError>;
}

/// Produces an illustration on disk for a word
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Returns the path of the saved image
    async fn generate_image(&self, word: &str, visual_concept: &str)
        -> Result<PathBuf, ImageError>;
}

/// Destination for media files and notes
#[async_trait]
pub trait CardStore: Send + Sync {
    /// Upload a local file into the collection's media folder
    async fn store_media_file(&self, path: &Path, filename: &str) -> Result<(), AnkiError>;

    /// Create the image→word and word→image cards
    ///
    /// Returns the ids of the notes that were created. A card that fails is
    /// logged and left out, so the result may hold fewer than two ids.
    async fn create_flashcards(
        &self,
        word: &str,
        content: &str,
        image_filename: &str,
        deck_name: &str,
        tags: &[String],
    ) -> Vec<i64>;
}
