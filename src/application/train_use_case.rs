// ============================================================
// Layer 2 — TrainUseCase
// ============================================================
// Orchestrates the full training pipeline in order:
//
//   Step 1: Load tokenizer + special ids   (Layer 6 - infra)
//   Step 2: Load corpus splits             (Layer 4 - data)
//   Step 3: Tokenise into datasets         (Layer 4 - data)
//   Step 4: Run the epoch loop + test      (Layer 5 - ml)
//   Step 5: Render plots, then save history, weights, config
//                                          (Layer 6 - infra)
//
// Nothing is written until training and the test pass have
// both succeeded. The history goes out only after both plots
// have rendered.
//
// Reference: Rust Book §13 (Iterators and Closures)
//            Burn Book §5 (Training)

use anyhow::{ensure, Result};
use burn::tensor::backend::AutodiffBackend;
use serde::{Deserialize, Serialize};

use crate::data::{dataset::SummaryDataset, loader::JsonlArticleSource};
use crate::domain::{article::Article, history::TrainingHistory, traits::ArticleSource};
use crate::infra::{
    checkpoint::CheckpointManager,
    history_store::save_history,
    plots::{plot_loss_curves, plot_rouge_curves},
    tokenizer_store::{SpecialTokens, TokenizerStore},
};
use crate::ml::{
    model::Seq2SeqConfig,
    trainer::{run_training, SplitDatasets},
};

type MyBackend = burn::backend::Autodiff<burn::backend::Wgpu>;

// ─── Training Configuration ──────────────────────────────────────────────────
// All hyperparameters for a training run.
// Saved next to the weights so `summarize` can rebuild the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub data_dir:           String,
    pub output_dir:         String,
    pub tokenizer_dir:      String,
    pub max_source_len:     usize,
    pub max_target_len:     usize,
    pub batch_size:         usize,
    pub epochs:             usize,
    pub lr:                 f64,
    pub weight_decay:       f64,
    pub d_model:            usize,
    pub num_heads:          usize,
    pub num_encoder_layers: usize,
    pub num_decoder_layers: usize,
    pub d_ff:               usize,
    pub dropout:            f64,
    pub vocab_size:         usize,
    pub seed:               u64,
    /// Probability of blanking each encoder token during training
    pub token_dropout:      f64,
    pub grad_clip_norm:     f64,
    /// Generation budget for validation summaries
    pub max_gen_len:        usize,
    pub tf_start:           f64,
    pub tf_end:             f64,
    pub plateau_factor:     f64,
    pub plateau_patience:   usize,
    /// Loader threads for the training split (0 = synchronous)
    pub train_workers:      usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            data_dir:           "data".to_string(),
            output_dir:         "artifacts".to_string(),
            tokenizer_dir:      "artifacts".to_string(),
            max_source_len:     256,
            max_target_len:     64,
            batch_size:         16,
            epochs:             5,
            lr:                 5e-4,
            weight_decay:       0.01,
            d_model:            256,
            num_heads:          8,
            num_encoder_layers: 3,
            num_decoder_layers: 3,
            d_ff:               1024,
            dropout:            0.1,
            vocab_size:         30000,
            seed:               42,
            token_dropout:      0.1,
            grad_clip_norm:     2.0,
            max_gen_len:        40,
            tf_start:           1.0,
            tf_end:             0.5,
            plateau_factor:     0.5,
            plateau_patience:   2,
            train_workers:      2,
        }
    }
}

impl TrainConfig {
    /// Reject settings the training loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_size > 0, "batch_size must be positive");
        ensure!(self.max_source_len >= 1, "max_source_len must be at least 1");
        ensure!(self.max_target_len >= 2, "max_target_len must leave room for <s> and </s>");
        ensure!(self.num_heads > 0, "num_heads must be positive");
        ensure!(
            self.d_model % self.num_heads == 0,
            "d_model ({}) must be divisible by num_heads ({})",
            self.d_model,
            self.num_heads
        );
        ensure!(
            (0.0..=1.0).contains(&self.token_dropout),
            "token_dropout must be in [0, 1], got {}",
            self.token_dropout
        );
        ensure!(self.lr > 0.0, "lr must be positive");
        ensure!(self.max_gen_len > 0, "max_gen_len must be positive");
        Ok(())
    }

    /// Position table size covering inputs, labels and generation
    pub fn max_positions(&self) -> usize {
        self.max_source_len
            .max(self.max_target_len)
            .max(self.max_gen_len + 1)
    }

    pub fn model_config(&self, pad_id: u32) -> Seq2SeqConfig {
        Seq2SeqConfig::new(
            self.vocab_size,
            self.d_model,
            self.num_heads,
            self.num_encoder_layers,
            self.num_decoder_layers,
            self.d_ff,
            self.dropout,
            pad_id as usize,
        )
        .with_max_positions(self.max_positions())
    }
}

// ─── TrainUseCase ─────────────────────────────────────────────────────────────
pub struct TrainUseCase {
    config: TrainConfig,
}

impl TrainUseCase {
    pub fn new(config: TrainConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline on the default WGPU device
    pub fn execute(&self) -> Result<TrainingHistory> {
        let device = burn::backend::wgpu::WgpuDevice::default();
        tracing::info!("Using WGPU device: {:?}", device);
        self.execute_on::<MyBackend>(&device)
    }

    pub fn execute_on<B: AutodiffBackend>(&self, device: &B::Device) -> Result<TrainingHistory> {
        let cfg = &self.config;
        cfg.validate()?;

        // ── Step 1: Tokenizer ─────────────────────────────────────────────────
        let tokenizer = TokenizerStore::new(&cfg.tokenizer_dir).load()?;
        let special   = SpecialTokens::resolve(&tokenizer)?;
        let tok_vocab = tokenizer.get_vocab_size(true);
        ensure!(
            tok_vocab <= cfg.vocab_size,
            "Tokenizer has {} tokens but the model vocabulary is {}; raise --vocab-size",
            tok_vocab,
            cfg.vocab_size
        );

        // ── Step 2: Corpus splits ─────────────────────────────────────────────
        tracing::info!("Loading corpus from '{}'", cfg.data_dir);
        let splits = JsonlArticleSource::new(&cfg.data_dir, cfg.seed).load_splits()?;
        for (name, split) in [
            ("train", &splits.train),
            ("validation", &splits.validation),
            ("test", &splits.test),
        ] {
            ensure!(!split.is_empty(), "The {name} split is empty");
        }
        tracing::info!(
            "Loaded {} articles: {} train, {} validation, {} test",
            splits.total(),
            splits.train.len(),
            splits.validation.len(),
            splits.test.len()
        );

        // ── Step 3: Datasets ──────────────────────────────────────────────────
        let build = |articles: &[Article]| {
            SummaryDataset::from_articles(
                articles, &tokenizer, &special, cfg.max_source_len, cfg.max_target_len,
            )
        };
        let datasets = SplitDatasets {
            train:      build(&splits.train)?,
            validation: build(&splits.validation)?,
            test:       build(&splits.test)?,
        };
        tracing::info!("Tokenised {} training samples", datasets.train.sample_count());

        // ── Step 4: Training loop (Layer 5) ───────────────────────────────────
        let outcome = run_training::<B>(cfg, datasets, &tokenizer, &special, device)?;

        // ── Step 5: Persist ───────────────────────────────────────────────────
        let ckpt_manager = CheckpointManager::new(&cfg.output_dir)?;
        if outcome.history.epochs_completed() > 0 {
            plot_loss_curves(ckpt_manager.dir(), &outcome.history)?;
            plot_rouge_curves(ckpt_manager.dir(), &outcome.history)?;
        }
        save_history(ckpt_manager.dir(), &outcome.history)?;
        ckpt_manager.save_model(&outcome.model)?;
        ckpt_manager.save_config(cfg)?;

        Ok(outcome.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{history_store::HISTORY_FILE, plots::{LOSS_PLOT_FILE, ROUGE_PLOT_FILE}};
    use crate::ml::model::tests::TestAutodiffBackend;
    use std::fs;

    const CORPUS: &str = r#"{"document": "the cat sat on the mat", "summary": "cat sat"}
{"document": "a dog ran in the park", "summary": "dog ran"}
{"document": "cats and dogs are pets", "summary": "pets"}
"#;

    fn small_config(root: &std::path::Path, epochs: usize) -> TrainConfig {
        TrainConfig {
            data_dir:           root.join("data").display().to_string(),
            output_dir:         root.join("out").display().to_string(),
            tokenizer_dir:      root.join("tok").display().to_string(),
            epochs,
            batch_size:         4,
            d_model:            16,
            num_heads:          2,
            num_encoder_layers: 1,
            num_decoder_layers: 1,
            d_ff:               32,
            dropout:            0.0,
            vocab_size:         64,
            max_source_len:     16,
            max_target_len:     8,
            max_gen_len:        4,
            train_workers:      0,
            ..TrainConfig::default()
        }
    }

    fn write_corpus(root: &std::path::Path, cfg: &TrainConfig) {
        let data = root.join("data");
        fs::create_dir_all(&data).unwrap();
        for file in ["train.jsonl", "validation.jsonl", "test.jsonl"] {
            fs::write(data.join(file), CORPUS).unwrap();
        }
        let texts: Vec<&str> = vec!["the cat sat on the mat", "a dog ran in the park", "cats and dogs are pets"];
        TokenizerStore::new(&cfg.tokenizer_dir).build(&texts, cfg.vocab_size).unwrap();
    }

    #[test]
    fn test_execute_writes_history_plots_and_weights() {
        let root = tempfile::tempdir().unwrap();
        let cfg  = small_config(root.path(), 1);
        write_corpus(root.path(), &cfg);

        let history = TrainUseCase::new(cfg.clone())
            .execute_on::<TestAutodiffBackend>(&Default::default())
            .unwrap();
        assert_eq!(history.epochs_completed(), 1);

        let out  = root.path().join("out");
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(HISTORY_FILE)).unwrap()).unwrap();
        assert_eq!(json["val_loss"].as_array().map(Vec::len), Some(1));
        assert!(json["test_loss"].is_number());
        assert!(json["test_rouge"].is_number());
        assert!(out.join(LOSS_PLOT_FILE).exists());
        assert!(out.join(ROUGE_PLOT_FILE).exists());
        assert!(out.join("model.mpk.gz").exists());
        assert!(out.join("train_config.json").exists());
    }

    #[test]
    fn test_failed_plot_leaves_no_history() {
        let root = tempfile::tempdir().unwrap();
        let cfg  = small_config(root.path(), 1);
        write_corpus(root.path(), &cfg);

        // A directory where the PNG should go makes the render fail
        let out = root.path().join("out");
        fs::create_dir_all(out.join(LOSS_PLOT_FILE)).unwrap();

        let result = TrainUseCase::new(cfg).execute_on::<TestAutodiffBackend>(&Default::default());
        assert!(result.is_err());
        assert!(!out.join(HISTORY_FILE).exists());
        assert!(!out.join("model.mpk.gz").exists());
    }

    #[test]
    fn test_zero_epochs_writes_null_terminal_scalars() {
        let root = tempfile::tempdir().unwrap();
        let cfg  = small_config(root.path(), 0);
        write_corpus(root.path(), &cfg);

        TrainUseCase::new(cfg)
            .execute_on::<TestAutodiffBackend>(&Default::default())
            .unwrap();

        let out  = root.path().join("out");
        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(HISTORY_FILE)).unwrap()).unwrap();
        assert_eq!(json["train_loss"].as_array().map(Vec::len), Some(0));
        assert!(json["test_loss"].is_null());
        assert!(!out.join(LOSS_PLOT_FILE).exists());
    }

    #[test]
    fn test_missing_tokenizer_is_a_setup_error() {
        let root = tempfile::tempdir().unwrap();
        let cfg  = small_config(root.path(), 1);
        let err  = TrainUseCase::new(cfg)
            .execute_on::<TestAutodiffBackend>(&Default::default())
            .unwrap_err();
        assert!(err.to_string().contains("build-tokenizer"));
    }

    #[test]
    fn test_validate_rejects_bad_heads() {
        let cfg = TrainConfig { d_model: 10, num_heads: 4, ..TrainConfig::default() };
        assert!(cfg.validate().is_err());
        assert!(TrainConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_heads() {
        let cfg = TrainConfig { num_heads: 0, ..TrainConfig::default() };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("num_heads"));
    }
}
