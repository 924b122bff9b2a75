// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer asks for corpus splits through this
// trait and never sees file formats. JsonlArticleSource is
// the implementation shipped today; a Hugging Face dataset
// reader or a database-backed source would slot in the same
// way.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use anyhow::Result;
use crate::domain::article::Article;

// ─── CorpusSplits ─────────────────────────────────────────────────────────────
/// The three disjoint partitions of a corpus.
#[derive(Debug, Clone, Default)]
pub struct CorpusSplits {
    pub train:      Vec<Article>,
    pub validation: Vec<Article>,
    pub test:       Vec<Article>,
}

impl CorpusSplits {
    pub fn total(&self) -> usize {
        self.train.len() + self.validation.len() + self.test.len()
    }
}

// ─── ArticleSource ────────────────────────────────────────────────────────────
/// Any component that can load a train/validation/test corpus.
pub trait ArticleSource {
    /// Load all three splits.
    /// Returns an error if the training split cannot be produced.
    fn load_splits(&self) -> Result<CorpusSplits>;
}
