use serde::{Deserialize, Serialize};

/// Running totals for length normalization.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorpusStats {
    doc_count: u32,
    total_length: u64,
}

impl CorpusStats {
    pub fn new() -> Self { Self::default() }

    pub fn record_length(&mut self, length: u32) {
        self.doc_count += 1;
        self.total_length += length as u64;
    }

    pub fn doc_count(&self) -> u32 { self.doc_count }

    pub fn total_length(&self) -> u64 { self.total_length }

    /// Average document length over the whole pass, `None` for an empty corpus.
    pub fn finalize(&self) -> Option<f64> {
        if self.doc_count == 0 {
            return None;
        }
        Some(self.total_length as f64 / self.doc_count as f64)
    }
}
