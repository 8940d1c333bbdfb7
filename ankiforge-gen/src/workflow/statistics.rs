//! Run statistics

use super::WordOutcome;
use serde::Serialize;

/// Totals for one run
///
/// Display: "N words: S succeeded, K skipped, F failed"
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total: usize,
    /// (word, error message) for every failed word, in processing order
    pub failures: Vec<(String, String)>,
}

impl RunSummary {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    pub fn record(&mut self, word: &str, outcome: &WordOutcome) {
        match outcome {
            WordOutcome::Succeeded { .. } => self.succeeded += 1,
            WordOutcome::Skipped => self.skipped += 1,
            WordOutcome::Failed(e) => {
                self.failed += 1;
                self.failures.push((word.to_string(), e.to_string()));
            }
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }

    pub fn display_string(&self) -> String {
        let mut out = format!(
            "{} words: {} succeeded, {} skipped, {} failed",
            self.total, self.succeeded, self.skipped, self.failed
        );
        for (word, error) in &self.failures {
            out.push_str(&format!("\n  - {}: {}", word, error));
        }
        out
    }
}
