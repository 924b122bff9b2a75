// ============================================================
// Layer 5 — Training Loop
// ============================================================
// Epoch loop with scheduled teacher forcing, validation, and
// a single test pass at the end, using Burn's DataLoader and
// AdamW.
//
// Per epoch:
//   1. teacher-forcing ratio for the epoch (linear decay)
//   2. every training batch: token dropout → forward with the
//      ratio → cross-entropy → backward → clipped AdamW step;
//      argmax predictions are kept for ROUGE-L
//   3. validation: loss + greedy generation (no gradients)
//   4. plateau scheduler reads val_loss and sets the next lr
//   5. one history row
//
// Key Burn insight:
//   - Training uses B (Autodiff<...>) for gradients
//   - model.valid() returns the model on B::InnerBackend
//   - Validation/test batchers must also use B::InnerBackend
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW
//            Bengio et al. (2015) Scheduled Sampling

use anyhow::{ensure, Result};
use burn::{
    data::dataloader::DataLoaderBuilder,
    grad_clipping::GradientClippingConfig,
    module::AutodiffModule,
    optim::{AdamWConfig, GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};
use rand::{rngs::StdRng, SeedableRng};
use tokenizers::Tokenizer;

use crate::application::train_use_case::TrainConfig;
use crate::data::{
    augment::random_token_dropout,
    batcher::SummaryBatcher,
    dataset::SummaryDataset,
};
use crate::domain::history::{EpochMetrics, TrainingHistory};
use crate::infra::tokenizer_store::SpecialTokens;
use crate::ml::{
    evaluator::{self, aligned_token_rows, shifted_labels},
    model::{sequence_cross_entropy, Seq2SeqModel},
    rouge::{compute_rouge_l, mean_rouge_l, RougeScorer},
    scheduler::{PlateauScheduler, TeacherForcingScheduler},
};

const PLATEAU_MIN_DELTA: f64 = 1e-4;
const MIN_LR:            f64 = 1e-6;

/// The tokenised train / validation / test splits.
pub struct SplitDatasets {
    pub train:      SummaryDataset,
    pub validation: SummaryDataset,
    pub test:       SummaryDataset,
}

/// What a finished run hands back to the application layer.
pub struct RunOutcome<B: AutodiffBackend> {
    pub history: TrainingHistory,
    pub model:   Seq2SeqModel<B>,
}

pub fn run_training<B: AutodiffBackend>(
    cfg:       &TrainConfig,
    datasets:  SplitDatasets,
    tokenizer: &Tokenizer,
    special:   &SpecialTokens,
    device:    &B::Device,
) -> Result<RunOutcome<B>> {
    B::seed(cfg.seed);
    let pad = special.pad as usize;

    // ── Build model ───────────────────────────────────────────────────────────
    let mut model: Seq2SeqModel<B> = cfg.model_config(special.pad).init(device);
    tracing::info!(
        "Model ready: {}+{} layers, d_model={}, vocab={}",
        cfg.num_encoder_layers, cfg.num_decoder_layers, cfg.d_model, cfg.vocab_size
    );

    // ── AdamW with global-norm clipping ───────────────────────────────────────
    let mut optim = AdamWConfig::new()
        .with_weight_decay(cfg.weight_decay as f32)
        .with_grad_clipping(Some(GradientClippingConfig::Norm(cfg.grad_clip_norm as f32)))
        .init();

    // ── Training data loader (AutodiffBackend) ────────────────────────────────
    let mut train_builder = DataLoaderBuilder::new(SummaryBatcher::<B>::new(device.clone(), special.pad))
        .batch_size(cfg.batch_size)
        .shuffle(cfg.seed);
    if cfg.train_workers > 0 {
        train_builder = train_builder.num_workers(cfg.train_workers);
    }
    let train_loader = train_builder.build(datasets.train);

    // ── Validation / test loaders (InnerBackend, no autodiff overhead) ────────
    let val_loader = DataLoaderBuilder::new(
        SummaryBatcher::<B::InnerBackend>::new(device.clone(), special.pad),
    )
    .batch_size(cfg.batch_size)
    .build(datasets.validation);
    let test_loader = DataLoaderBuilder::new(
        SummaryBatcher::<B::InnerBackend>::new(device.clone(), special.pad),
    )
    .batch_size(cfg.batch_size)
    .build(datasets.test);

    let mut tf_scheduler = TeacherForcingScheduler::new(
        cfg.tf_start, cfg.tf_end, cfg.epochs.saturating_sub(1).max(1),
    );
    let mut lr_scheduler = PlateauScheduler::new(
        cfg.lr, cfg.plateau_factor, cfg.plateau_patience, PLATEAU_MIN_DELTA, MIN_LR,
    );
    let mut rng     = StdRng::seed_from_u64(cfg.seed);
    let scorer      = RougeScorer::new();
    let mut history = TrainingHistory::new();

    // ── Epoch loop ────────────────────────────────────────────────────────────
    for epoch in 1..=cfg.epochs {
        let tf_ratio = tf_scheduler.step();
        let lr       = lr_scheduler.lr();

        // ── Training phase ────────────────────────────────────────────────────
        let mut train_loss_sum = 0.0f64;
        let mut train_batches  = 0usize;
        let mut train_refs     = Vec::new();
        let mut train_hyps     = Vec::new();

        for batch in train_loader.iter() {
            let input_ids = random_token_dropout(batch.input_ids, cfg.token_dropout, special.pad, &mut rng)?;
            let logits    = model.forward(input_ids, batch.labels.clone(), batch.attention_mask, Some(tf_ratio));
            let preds     = logits.clone().detach().argmax(2).squeeze::<2>(2);

            let loss = sequence_cross_entropy(logits, batch.labels.clone(), pad);
            let loss_val: f64 = loss.clone().into_scalar().elem::<f64>();
            ensure_finite_loss(loss_val, epoch, train_batches + 1)?;
            train_loss_sum += loss_val;
            train_batches  += 1;

            // Backward pass + AdamW update
            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(lr, model, grads);

            let (refs, hyps) = aligned_token_rows(preds, shifted_labels(batch.labels), special.pad);
            train_refs.extend(refs);
            train_hyps.extend(hyps);
        }

        let train_loss = if train_batches > 0 {
            train_loss_sum / train_batches as f64
        } else { f64::NAN };
        let train_rouge = compute_rouge_l(&train_refs, &train_hyps, tokenizer, &scorer)?;

        // ── Validation phase ──────────────────────────────────────────────────
        // model.valid() → Seq2SeqModel<B::InnerBackend>, dropout disabled
        let model_valid = model.valid();
        let val = evaluator::validate(
            &model_valid, val_loader.as_ref(), tokenizer, special, cfg.max_gen_len,
        )?;
        let val_rouge = mean_rouge_l(&val.references, &val.predictions, &scorer)?;

        let next_lr = lr_scheduler.step(val.loss);

        let metrics = EpochMetrics {
            epoch,
            train_loss,
            val_loss: val.loss,
            train_rouge,
            val_rouge,
            learning_rate: next_lr,
            teacher_forcing_ratio: tf_ratio,
        };
        if metrics.is_improvement(history.best_val_loss().unwrap_or(f64::INFINITY)) {
            tracing::debug!("New best val_loss {:.4} at epoch {}", val.loss, epoch);
        }
        history.record_epoch(&metrics)?;

        println!(
            "Epoch {:>3}/{} | train_loss={:.4} | val_loss={:.4} | train_rouge={:.4} | val_rouge={:.4} | lr={:.2e} | tf={:.3}",
            epoch, cfg.epochs, train_loss, val.loss, train_rouge, val_rouge, next_lr, tf_ratio,
        );
    }

    // ── Final test pass ───────────────────────────────────────────────────────
    if cfg.epochs > 0 {
        let outcome = evaluator::test(&model.valid(), test_loader.as_ref(), tokenizer, special, &scorer)?;
        history.set_test_results(outcome.loss, outcome.rouge)?;
        println!("Test | loss={:.4} | rouge_l={:.4}", outcome.loss, outcome.rouge);
    } else {
        tracing::warn!("No epochs requested; skipping the test pass");
    }

    tracing::info!("Training complete!");
    Ok(RunOutcome { history, model })
}

/// Abort the run once the training loss stops being a number.
fn ensure_finite_loss(loss: f64, epoch: usize, batch: usize) -> Result<()> {
    ensure!(
        loss.is_finite(),
        "Training loss became {} at epoch {}, batch {}",
        loss, epoch, batch
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::dataset::SummarySample;
    use crate::infra::tokenizer_store::tests::tiny_tokenizer;
    use crate::ml::model::tests::TestAutodiffBackend;

    fn tiny_train_config(epochs: usize, vocab_size: usize) -> TrainConfig {
        TrainConfig {
            epochs,
            batch_size:         8,
            d_model:            16,
            num_heads:          2,
            num_encoder_layers: 1,
            num_decoder_layers: 1,
            d_ff:               32,
            dropout:            0.0,
            vocab_size,
            max_source_len:     32,
            max_target_len:     16,
            max_gen_len:        4,
            train_workers:      0,
            ..TrainConfig::default()
        }
    }

    fn datasets(tokenizer: &Tokenizer, special: &SpecialTokens) -> SplitDatasets {
        let sample = |doc: &str, sum: &str| {
            let ids = |text: &str| -> Vec<u32> {
                tokenizer.encode(text, false).unwrap().get_ids().to_vec()
            };
            let mut input_ids = ids(doc);
            input_ids.push(special.eos);
            let mut labels = vec![special.bos];
            labels.extend(ids(sum));
            labels.push(special.eos);
            SummarySample { input_ids, labels }
        };
        SplitDatasets {
            train: SummaryDataset::new(vec![
                sample("the cat sat on the mat", "cat sat"),
                sample("a dog ran in the park", "dog ran"),
            ]),
            validation: SummaryDataset::new(vec![sample("cats and dogs are pets", "pets")]),
            test:       SummaryDataset::new(vec![sample("the dog sat on the mat", "dog sat")]),
        }
    }

    #[test]
    fn test_one_epoch_fills_every_series_and_test_scalars() {
        let (tokenizer, special, _dir) = tiny_tokenizer();
        let cfg = tiny_train_config(1, tokenizer.get_vocab_size(true));

        let out = run_training::<TestAutodiffBackend>(
            &cfg, datasets(&tokenizer, &special), &tokenizer, &special, &Default::default(),
        )
        .unwrap();

        let h = out.history;
        assert_eq!(h.epochs_completed(), 1);
        for series in [
            &h.train_loss, &h.val_loss, &h.train_rouge,
            &h.val_rouge, &h.learning_rate, &h.teacher_forcing_ratio,
        ] {
            assert_eq!(series.len(), 1);
        }
        assert!(h.train_loss[0].is_finite());
        assert_eq!(h.teacher_forcing_ratio[0], cfg.tf_start);
        assert!(h.test_loss.is_some());
        assert!(h.test_rouge.is_some());
    }

    #[test]
    fn test_non_finite_loss_stops_training() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = ensure_finite_loss(bad, 2, 7).unwrap_err().to_string();
            assert!(err.contains("epoch 2, batch 7"), "{err}");
        }
        assert!(ensure_finite_loss(3.25, 0, 1).is_ok());
    }

    #[test]
    fn test_teacher_forcing_decays_over_epochs() {
        let (tokenizer, special, _dir) = tiny_tokenizer();
        let cfg = tiny_train_config(2, tokenizer.get_vocab_size(true));

        let out = run_training::<TestAutodiffBackend>(
            &cfg, datasets(&tokenizer, &special), &tokenizer, &special, &Default::default(),
        )
        .unwrap();

        let tf = &out.history.teacher_forcing_ratio;
        assert_eq!(tf.len(), 2);
        assert!((tf[0] - cfg.tf_start).abs() < 1e-12);
        assert!((tf[1] - cfg.tf_end).abs() < 1e-12);
        assert!(out.history.learning_rate.iter().all(|&lr| lr <= cfg.lr));
    }

    #[test]
    fn test_zero_epochs_leaves_terminal_scalars_empty() {
        let (tokenizer, special, _dir) = tiny_tokenizer();
        let cfg = tiny_train_config(0, tokenizer.get_vocab_size(true));

        let out = run_training::<TestAutodiffBackend>(
            &cfg, datasets(&tokenizer, &special), &tokenizer, &special, &Default::default(),
        )
        .unwrap();

        assert_eq!(out.history.epochs_completed(), 0);
        assert!(out.history.learning_rate.is_empty());
        assert!(out.history.test_loss.is_none());
        assert!(out.history.test_rouge.is_none());
    }
}
