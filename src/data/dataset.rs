use anyhow::{anyhow, Result};
use burn::data::dataset::Dataset;
use serde::{Deserialize, Serialize};
use tokenizers::Tokenizer;

use crate::domain::article::Article;
use crate::infra::tokenizer_store::SpecialTokens;

/// One tokenised, unpadded training example.
///
/// input_ids: document tokens followed by `</s>`
/// labels:    `<s>` summary tokens `</s>`
///
/// Padding happens per batch in SummaryBatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummarySample {
    pub input_ids: Vec<u32>,
    pub labels:    Vec<u32>,
}

impl SummarySample {
    /// Tokenise one article. Both sides are truncated to their
    /// length budget while keeping the closing `</s>`.
    pub fn encode(
        article:        &Article,
        tokenizer:      &Tokenizer,
        special:        &SpecialTokens,
        max_source_len: usize,
        max_target_len: usize,
    ) -> Result<Self> {
        let doc = tokenizer
            .encode(article.document.as_str(), false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;
        let sum = tokenizer
            .encode(article.summary.as_str(), false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;

        let mut input_ids: Vec<u32> = doc.get_ids().to_vec();
        input_ids.truncate(max_source_len.saturating_sub(1));
        input_ids.push(special.eos);

        let mut labels = vec![special.bos];
        labels.extend(
            sum.get_ids()
                .iter()
                .take(max_target_len.saturating_sub(2))
                .copied(),
        );
        labels.push(special.eos);

        Ok(Self { input_ids, labels })
    }
}

pub struct SummaryDataset {
    samples: Vec<SummarySample>,
}

impl SummaryDataset {
    pub fn new(samples: Vec<SummarySample>) -> Self { Self { samples } }

    /// Tokenise a whole split
    pub fn from_articles(
        articles:       &[Article],
        tokenizer:      &Tokenizer,
        special:        &SpecialTokens,
        max_source_len: usize,
        max_target_len: usize,
    ) -> Result<Self> {
        let samples = articles
            .iter()
            .map(|a| SummarySample::encode(a, tokenizer, special, max_source_len, max_target_len))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(samples))
    }

    pub fn sample_count(&self) -> usize { self.samples.len() }
}

impl Dataset<SummarySample> for SummaryDataset {
    fn get(&self, index: usize) -> Option<SummarySample> {
        self.samples.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.samples.len()
    }
}
