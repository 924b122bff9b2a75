// ============================================================
// Layer 2 — SummarizeUseCase
// ============================================================
// Loads a finished run (tokenizer, config, final weights) and
// generates a summary for one document.

use anyhow::Result;
use tokenizers::Tokenizer;

use crate::data::preprocessor::Preprocessor;
use crate::infra::{
    checkpoint::CheckpointManager,
    tokenizer_store::{SpecialTokens, TokenizerStore},
};
use crate::ml::inferencer::Summarizer;

type InferBackend = burn::backend::Wgpu;

pub struct SummarizeUseCase {
    tokenizer:  Tokenizer,
    special:    SpecialTokens,
    summarizer: Summarizer<InferBackend>,
}

impl SummarizeUseCase {
    pub fn new(output_dir: &str, tokenizer_dir: &str) -> Result<Self> {
        let tokenizer  = TokenizerStore::new(tokenizer_dir).load()?;
        let special    = SpecialTokens::resolve(&tokenizer)?;
        let ckpt       = CheckpointManager::new(output_dir)?;
        let device     = burn::backend::wgpu::WgpuDevice::default();
        let summarizer = Summarizer::from_checkpoint(&ckpt, special.pad, &device)?;
        Ok(Self { tokenizer, special, summarizer })
    }

    pub fn summarize(&self, text: &str, max_len: usize) -> Result<String> {
        let clean = Preprocessor::new().clean(text);
        self.summarizer.summarize(&clean, &self.tokenizer, &self.special, max_len)
    }
}
