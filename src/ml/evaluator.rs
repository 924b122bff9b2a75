// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Gradient-free passes over a held-out split. Both run on the
// inner (non-autodiff) backend with dropout disabled, through
// the model returned by `model.valid()`.
//
//   validate — loss from a ground-truth forward pass, plus
//              greedy autoregressive summaries decoded to text
//              so the caller can score them against references
//
//   test     — one forward pass per batch: loss and argmax
//              predictions, scored with ROUGE-L on the spot
//
// Loss over a split is the plain mean of per-batch losses.

use anyhow::Result;
use burn::{data::dataloader::DataLoader, prelude::*};
use tokenizers::Tokenizer;

use crate::data::batcher::SummaryBatch;
use crate::infra::tokenizer_store::SpecialTokens;
use crate::ml::{
    model::{sequence_cross_entropy, Seq2SeqModel},
    rouge::{compute_rouge_l, decode_all, RougeScorer},
};

#[derive(Debug, Clone)]
pub struct ValidationOutcome {
    pub loss:        f64,
    pub references:  Vec<String>,
    pub predictions: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct TestOutcome {
    pub loss:  f64,
    pub rouge: f64,
}

pub fn validate<B: Backend>(
    model:       &Seq2SeqModel<B>,
    loader:      &dyn DataLoader<SummaryBatch<B>>,
    tokenizer:   &Tokenizer,
    special:     &SpecialTokens,
    max_gen_len: usize,
) -> Result<ValidationOutcome> {
    let mut loss_sum    = 0.0f64;
    let mut batches     = 0usize;
    let mut references  = Vec::new();
    let mut predictions = Vec::new();

    for batch in loader.iter() {
        let logits = model.forward(
            batch.input_ids.clone(),
            batch.labels.clone(),
            batch.attention_mask.clone(),
            None,
        );
        let loss: f64 = sequence_cross_entropy(logits, batch.labels.clone(), special.pad as usize)
            .into_scalar()
            .elem();
        loss_sum += loss;
        batches  += 1;

        let generated = model.greedy_decode(
            batch.input_ids,
            batch.attention_mask,
            special.bos,
            special.eos,
            max_gen_len,
        );

        let refs: Vec<Vec<u32>> = int_rows(batch.labels)
            .into_iter()
            .map(|row| content_tokens(&row, special))
            .collect();
        let hyps: Vec<Vec<u32>> = int_rows(generated)
            .into_iter()
            .map(|row| content_tokens(&row, special))
            .collect();

        references.extend(decode_all(&refs, tokenizer)?);
        predictions.extend(decode_all(&hyps, tokenizer)?);
    }

    let loss = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
    Ok(ValidationOutcome { loss, references, predictions })
}

pub fn test<B: Backend>(
    model:     &Seq2SeqModel<B>,
    loader:    &dyn DataLoader<SummaryBatch<B>>,
    tokenizer: &Tokenizer,
    special:   &SpecialTokens,
    scorer:    &RougeScorer,
) -> Result<TestOutcome> {
    let mut loss_sum = 0.0f64;
    let mut batches  = 0usize;
    let mut refs     = Vec::new();
    let mut hyps     = Vec::new();

    for batch in loader.iter() {
        let logits = model.forward(
            batch.input_ids,
            batch.labels.clone(),
            batch.attention_mask,
            None,
        );
        let preds = logits.clone().argmax(2).squeeze::<2>(2);

        let loss: f64 = sequence_cross_entropy(logits, batch.labels.clone(), special.pad as usize)
            .into_scalar()
            .elem();
        loss_sum += loss;
        batches  += 1;

        let (r, h) = aligned_token_rows(preds, shifted_labels(batch.labels), special.pad);
        refs.extend(r);
        hyps.extend(h);
    }

    let loss  = if batches > 0 { loss_sum / batches as f64 } else { f64::NAN };
    let rouge = compute_rouge_l(&refs, &hyps, tokenizer, scorer)?;
    Ok(TestOutcome { loss, rouge })
}

/// `labels[:, 1..]`, the targets the logits line up with
pub fn shifted_labels<B: Backend>(labels: Tensor<B, 2, Int>) -> Tensor<B, 2, Int> {
    let [batch_size, tgt_len] = labels.dims();
    labels.slice([0..batch_size, 1..tgt_len])
}

/// Host-side (reference, prediction) id rows for one batch.
/// Each prediction row is cut to the non-pad length of its target row.
pub fn aligned_token_rows<B: Backend>(
    predictions: Tensor<B, 2, Int>,
    targets:     Tensor<B, 2, Int>,
    pad_id:      u32,
) -> (Vec<Vec<u32>>, Vec<Vec<u32>>) {
    int_rows(targets)
        .into_iter()
        .zip(int_rows(predictions))
        .map(|(target, mut pred)| {
            let reference: Vec<u32> = target.into_iter().filter(|&id| id != pad_id).collect();
            pred.truncate(reference.len());
            (reference, pred)
        })
        .unzip()
}

/// Tokens between the leading `<s>` and the first `</s>`
fn content_tokens(row: &[u32], special: &SpecialTokens) -> Vec<u32> {
    row.iter()
        .skip_while(|&&id| id == special.bos)
        .take_while(|&&id| id != special.eos)
        .filter(|&&id| id != special.pad)
        .copied()
        .collect()
}

fn int_rows<B: Backend>(t: Tensor<B, 2, Int>) -> Vec<Vec<u32>> {
    let [_, width] = t.dims();
    if width == 0 {
        return vec![Vec::new(); t.dims()[0]];
    }
    let flat: Vec<u32> = t.into_data().iter::<i64>().map(|v| v as u32).collect();
    flat.chunks(width).map(<[u32]>::to_vec).collect()
}
