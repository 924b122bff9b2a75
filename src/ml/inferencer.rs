// ============================================================
// Layer 5 — Inferencer
// ============================================================
// Rebuilds the model from train_config.json, loads the final
// weights and greedy-decodes summaries for raw text.
use anyhow::{anyhow, Result};
use burn::prelude::*;
use tokenizers::Tokenizer;

use crate::infra::{checkpoint::CheckpointManager, tokenizer_store::SpecialTokens};
use crate::ml::model::Seq2SeqModel;

pub struct Summarizer<B: Backend> {
    model:          Seq2SeqModel<B>,
    max_source_len: usize,
    device:         B::Device,
}

impl<B: Backend> Summarizer<B> {
    pub fn from_checkpoint(ckpt_manager: &CheckpointManager, pad_id: u32, device: &B::Device) -> Result<Self> {
        let cfg = ckpt_manager.load_config()?;
        let model_cfg = cfg.model_config(pad_id);
        let model: Seq2SeqModel<B> = model_cfg.init(device);
        let model = ckpt_manager.load_model(model, device)?;
        tracing::info!("Model loaded from '{}'", ckpt_manager.dir().display());
        Ok(Self { model, max_source_len: cfg.max_source_len, device: device.clone() })
    }

    /// Summarize one document. Output stops at `</s>` or after `max_len` tokens.
    pub fn summarize(
        &self,
        text:      &str,
        tokenizer: &Tokenizer,
        special:   &SpecialTokens,
        max_len:   usize,
    ) -> Result<String> {
        let enc = tokenizer
            .encode(text, false)
            .map_err(|e| anyhow!("Tokenisation error: {e}"))?;

        let mut input_ids: Vec<u32> = enc.get_ids().to_vec();
        input_ids.truncate(self.max_source_len.saturating_sub(1));
        input_ids.push(special.eos);
        let seq_len = input_ids.len();

        let flat: Vec<i32> = input_ids.iter().map(|&x| x as i32).collect();
        let src = Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device)
            .reshape([1, seq_len]);
        let mask = Tensor::<B, 2, Int>::zeros([1, seq_len], &self.device).equal_elem(1);

        let generated: Vec<u32> = self
            .model
            .greedy_decode(src, mask, special.bos, special.eos, max_len)
            .into_data()
            .iter::<i64>()
            .skip(1)
            .map(|id| id as u32)
            .take_while(|&id| id != special.eos)
            .collect();

        let summary = tokenizer
            .decode(&generated, true)
            .map_err(|e| anyhow!("Decode error: {e}"))?;
        tracing::debug!("Generated {} tokens", generated.len());
        Ok(summary.trim().to_string())
    }
}
