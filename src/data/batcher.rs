// ============================================================
// Layer 4 — Summary Batcher
// ============================================================
// Implements Burn's Batcher trait to turn a Vec<SummarySample>
// into tensors.
//
// Samples arrive unpadded, so the batcher pads dynamically:
//   input_ids → longest document in the batch
//   labels    → longest summary in the batch
// Padding uses the tokenizer's <pad> id, which is also the id
// the loss function ignores.
//
//   Input:  N samples, documents of length S_i, summaries T_i
//   Output: input_ids [N, max S_i], labels [N, max T_i],
//           attention_mask [N, max S_i] (true = padding)
//
// Reference: Burn Book §4 (Batcher)

use burn::{
    data::dataloader::batcher::Batcher,
    prelude::*,
    tensor::TensorData,
};

use crate::data::dataset::SummarySample;

// ─── SummaryBatch ─────────────────────────────────────────────────────────────
/// A batch of summarization samples ready for the forward pass.
#[derive(Debug, Clone)]
pub struct SummaryBatch<B: Backend> {
    /// Encoder token ids — shape: [batch_size, src_len]
    pub input_ids: Tensor<B, 2, Int>,

    /// Decoder targets — shape: [batch_size, tgt_len]
    /// Every row starts with <s>; loss targets are labels[:, 1..]
    pub labels: Tensor<B, 2, Int>,

    /// Encoder padding mask — shape: [batch_size, src_len]
    /// true = padding position, false = real token
    pub attention_mask: Tensor<B, 2, Bool>,
}

// ─── SummaryBatcher ───────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct SummaryBatcher<B: Backend> {
    pub device: B::Device,
    pub pad_id: u32,
}

impl<B: Backend> SummaryBatcher<B> {
    pub fn new(device: B::Device, pad_id: u32) -> Self {
        Self { device, pad_id }
    }

    /// Right-pad every row to the longest one and flatten.
    /// Returns (flat ids, padding flags, row length).
    fn pad_rows<'a>(
        &self,
        rows: impl Iterator<Item = &'a Vec<u32>> + Clone,
    ) -> (Vec<i32>, Vec<bool>, usize) {
        let width = rows.clone().map(Vec::len).max().unwrap_or(0);
        let mut ids  = Vec::new();
        let mut mask = Vec::new();

        for row in rows {
            ids.extend(row.iter().map(|&x| x as i32));
            ids.extend(std::iter::repeat(self.pad_id as i32).take(width - row.len()));
            mask.extend(std::iter::repeat(false).take(row.len()));
            mask.extend(std::iter::repeat(true).take(width - row.len()));
        }
        (ids, mask, width)
    }
}

impl<B: Backend> Batcher<SummarySample, SummaryBatch<B>> for SummaryBatcher<B> {
    fn batch(&self, items: Vec<SummarySample>) -> SummaryBatch<B> {
        let batch_size = items.len();

        let (src_flat, src_mask, src_len) = self.pad_rows(items.iter().map(|s| &s.input_ids));
        let (tgt_flat, _, tgt_len)        = self.pad_rows(items.iter().map(|s| &s.labels));

        let input_ids = Tensor::<B, 1, Int>::from_ints(
            src_flat.as_slice(), &self.device
        ).reshape([batch_size, src_len]);

        let labels = Tensor::<B, 1, Int>::from_ints(
            tgt_flat.as_slice(), &self.device
        ).reshape([batch_size, tgt_len]);

        let attention_mask = Tensor::<B, 2, Bool>::from_data(
            TensorData::new(src_mask, [batch_size, src_len]),
            &self.device,
        );

        SummaryBatch { input_ids, labels, attention_mask }
    }
}
