// ============================================================
// Layer 3 — Article Domain Type
// ============================================================
// One record of the summarization corpus: a source document
// and the reference summary written for it.
//
// Corpora in the wild name these fields differently. The
// CNN/DailyMail dump calls them `article` and `highlights`,
// so both spellings are accepted when deserialising.
//
// Reference: Rust Book §5 (Structs and Methods)
//            serde attribute docs (alias)

use serde::{Deserialize, Serialize};

/// A document paired with its reference summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// The full source text the model reads (encoder input)
    #[serde(alias = "article")]
    pub document: String,

    /// The human-written summary the model learns to produce
    /// (decoder target)
    #[serde(alias = "highlights")]
    pub summary: String,
}

impl Article {
    /// Create a new Article.
    /// Accepts &str or String for either field.
    pub fn new(document: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            summary:  summary.into(),
        }
    }

    /// True when either side has no visible text.
    /// Such records carry no training signal and are skipped.
    pub fn is_blank(&self) -> bool {
        self.document.trim().is_empty() || self.summary.trim().is_empty()
    }
}
