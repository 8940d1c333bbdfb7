//! Pipeline orchestrator
//!
//! Drives words through content generation, illustration, media upload and
//! note creation. Per-word error isolation: a failed word is logged and
//! counted, never aborts the run, and is not cached so the next run retries it.

use super::{RunSummary, WordOutcome, WordSource};
use crate::error::{ForgeError, Result};
use crate::services::card_formatter::CardDirection;
use crate::services::word_queue;
use crate::services::{CardStore, ContentGenerator, ImageGenerator, ProcessedCache};
use tracing::{error, info, warn};

/// Flashcard pipeline over a content generator, an image generator and a card store
pub struct Pipeline<G, I, S> {
    content: G,
    images: I,
    cards: S,
    deck_name: String,
    tags: Vec<String>,
    cache: ProcessedCache,
}

impl<G, I, S> Pipeline<G, I, S>
where
    G: ContentGenerator,
    I: ImageGenerator,
    S: CardStore,
{
    pub fn new(
        content: G,
        images: I,
        cards: S,
        deck_name: impl Into<String>,
        tags: Vec<String>,
        cache: ProcessedCache,
    ) -> Self {
        Self {
            content,
            images,
            cards,
            deck_name: deck_name.into(),
            tags,
            cache,
        }
    }

    pub fn cache(&self) -> &ProcessedCache {
        &self.cache
    }

    /// Run every step for one word
    pub async fn process_word(&mut self, word: &str) -> WordOutcome {
        match self.try_process_word(word).await {
            Ok(card_ids) => WordOutcome::Succeeded { card_ids },
            Err(e) => WordOutcome::Failed(e),
        }
    }

    async fn try_process_word(&mut self, word: &str) -> Result<Vec<i64>> {
        info!(word = %word, "Generating content");
        let content = self.content.generate_content(word).await?;
        content.validate()?;

        info!(word = %word, "Generating image");
        let image_path = self
            .images
            .generate_image(word, &content.visual_concept)
            .await?;

        let image_filename = image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                ForgeError::Io(std::io::Error::other(format!(
                    "Image path has no file name: {}",
                    image_path.display()
                )))
            })?;

        self.cards
            .store_media_file(&image_path, &image_filename)
            .await?;

        info!(word = %word, "Creating cards");
        let card_ids = self
            .cards
            .create_flashcards(
                word,
                &content.content,
                &image_filename,
                &self.deck_name,
                &self.tags,
            )
            .await;

        if card_ids.len() < CardDirection::ALL.len() {
            return Err(ForgeError::IncompleteCards {
                created: card_ids.len(),
            });
        }

        self.cache.record(word, card_ids.clone());
        if let Err(e) = self.cache.save() {
            // Not persisted, so not done: the next run must retry it
            self.cache.remove(word);
            return Err(e.into());
        }

        Ok(card_ids)
    }

    /// Process `words` in order, skipping cached ones
    ///
    /// When the words came from the queue file, each succeeded word is
    /// removed from it. A failed removal is only a warning.
    pub async fn run(&mut self, words: &[String], source: &WordSource) -> RunSummary {
        let total = words.len();
        let mut summary = RunSummary::new(total);

        for (index, word) in words.iter().enumerate() {
            let position = index + 1;

            let outcome = if self.cache.contains(word) {
                info!("[{}/{}] '{}' already processed, skipping", position, total, word);
                WordOutcome::Skipped
            } else {
                info!("[{}/{}] Processing '{}'", position, total, word);
                self.process_word(word).await
            };

            match &outcome {
                WordOutcome::Succeeded { card_ids } => {
                    info!(word = %word, card_ids = ?card_ids, "Word completed");

                    if let WordSource::QueueFile(path) = source {
                        if let Err(e) = word_queue::remove_word(path, word) {
                            warn!(
                                word = %word,
                                path = %path.display(),
                                error = %e,
                                "Could not remove word from queue"
                            );
                        }
                    }
                }
                WordOutcome::Skipped => {}
                WordOutcome::Failed(e) => {
                    error!(word = %word, error = %e, "Word failed");
                }
            }

            summary.record(word, &outcome);
        }

        summary
    }
}
