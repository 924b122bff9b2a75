// ============================================================
// Layer 2 — BuildTokenizerUseCase
// ============================================================
// Fits a word-level vocabulary on the training split only
// (documents and summaries) and saves it as tokenizer.json.
// Validation and test text never shape the vocabulary.

use anyhow::{ensure, Result};
use std::path::PathBuf;

use crate::data::loader::JsonlArticleSource;
use crate::domain::traits::ArticleSource;
use crate::infra::tokenizer_store::TokenizerStore;

pub struct BuildTokenizerUseCase {
    data_dir:      String,
    tokenizer_dir: String,
    vocab_size:    usize,
    seed:          u64,
}

impl BuildTokenizerUseCase {
    pub fn new(data_dir: String, tokenizer_dir: String, vocab_size: usize, seed: u64) -> Self {
        Self { data_dir, tokenizer_dir, vocab_size, seed }
    }

    /// Returns the path of the written tokenizer file.
    pub fn execute(&self) -> Result<PathBuf> {
        ensure!(self.vocab_size > 4, "vocab_size must leave room beyond the 4 special tokens");

        let splits = JsonlArticleSource::new(&self.data_dir, self.seed).load_splits()?;
        ensure!(!splits.train.is_empty(), "The train split is empty");

        let texts: Vec<&str> = splits
            .train
            .iter()
            .flat_map(|a| [a.document.as_str(), a.summary.as_str()])
            .collect();
        tracing::info!("Building tokenizer from {} training articles", splits.train.len());

        let store = TokenizerStore::new(&self.tokenizer_dir);
        store.build(&texts, self.vocab_size)?;
        Ok(store.path())
    }
}
