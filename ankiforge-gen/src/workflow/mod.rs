//! Per-word card generation workflow
//!
//! Each word goes through the same sequence:
//! 1. Generate card text and a visual concept with the language model
//! 2. Generate (or reuse) an illustration
//! 3. Upload the illustration into Anki's media folder
//! 4. Create the image → word and word → image notes
//! 5. Record the word in the processed cache
//!
//! A failure at any step fails that word only; the run moves on to the next.

pub mod pipeline;
pub mod statistics;

use crate::error::ForgeError;
use std::path::PathBuf;

pub use pipeline::Pipeline;
pub use statistics::RunSummary;

/// Where the words of a run came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WordSource {
    /// The work queue file; completed words are pruned from it
    QueueFile(PathBuf),
    /// A single word given on the command line
    SingleWord,
}

/// Result of handling one word
#[derive(Debug)]
pub enum WordOutcome {
    Succeeded { card_ids: Vec<i64> },
    /// Already in the processed cache
    Skipped,
    Failed(ForgeError),
}

impl WordOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WordOutcome::Succeeded { .. })
    }
}
