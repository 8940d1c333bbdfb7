//! ankiforge-gen library interface
//!
//! Turns a list of vocabulary words into illustrated Anki flashcards:
//! language-model content, a generated illustration, and two notes pushed
//! through AnkiConnect. Exposed as a library for integration testing.

pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

pub use crate::error::{ForgeError, Result};
pub use crate::workflow::{Pipeline, RunSummary, WordOutcome, WordSource};
