// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands and their flags:
//   train            — fit, validate, test and save a model
//   build-tokenizer  — fit tokenizer.json on the training split
//   summarize        — generate a summary with a saved model
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the summarizer and report validation/test metrics
    Train(TrainArgs),

    /// Build a word-level tokenizer from the training corpus
    BuildTokenizer(BuildTokenizerArgs),

    /// Summarize a document with a trained model
    Summarize(SummarizeArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// Directory containing train.jsonl (validation.jsonl and test.jsonl optional)
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    /// Directory for the history, plots, weights and config
    #[arg(long, default_value = "artifacts")]
    pub output_dir: String,

    /// Directory holding tokenizer.json
    #[arg(long, default_value = "artifacts")]
    pub tokenizer_dir: String,

    /// Number of full passes through the training data
    #[arg(long, default_value_t = 5)]
    pub epochs: usize,

    #[arg(long, default_value_t = 16)]
    pub batch_size: usize,

    /// Initial learning rate (lowered on validation plateaus)
    #[arg(long, default_value_t = 5e-4)]
    pub lr: f64,

    #[arg(long, default_value_t = 0.01)]
    pub weight_decay: f64,

    /// Document tokens kept per example, including </s>
    #[arg(long, default_value_t = 256)]
    pub max_source_len: usize,

    /// Summary tokens kept per example, including <s> and </s>
    #[arg(long, default_value_t = 64)]
    pub max_target_len: usize,

    /// Hidden dimension; must be divisible by num_heads
    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    #[arg(long, default_value_t = 8)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 3)]
    pub num_encoder_layers: usize,

    #[arg(long, default_value_t = 3)]
    pub num_decoder_layers: usize,

    /// Inner dimension of the feed-forward network
    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,

    /// Model vocabulary; must cover the tokenizer
    #[arg(long, default_value_t = 30000)]
    pub vocab_size: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Probability of replacing each encoder token with <pad>
    #[arg(long, default_value_t = 0.1)]
    pub token_dropout: f64,

    /// Tokens generated per validation example
    #[arg(long, default_value_t = 40)]
    pub max_gen_len: usize,

    /// Teacher-forcing ratio of the first epoch
    #[arg(long, default_value_t = 1.0)]
    pub tf_start: f64,

    /// Teacher-forcing ratio of the last epoch
    #[arg(long, default_value_t = 0.5)]
    pub tf_end: f64,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// Settings without a flag keep their defaults.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_dir:           a.data_dir,
            output_dir:         a.output_dir,
            tokenizer_dir:      a.tokenizer_dir,
            epochs:             a.epochs,
            batch_size:         a.batch_size,
            lr:                 a.lr,
            weight_decay:       a.weight_decay,
            max_source_len:     a.max_source_len,
            max_target_len:     a.max_target_len,
            d_model:            a.d_model,
            num_heads:          a.num_heads,
            num_encoder_layers: a.num_encoder_layers,
            num_decoder_layers: a.num_decoder_layers,
            d_ff:               a.d_ff,
            dropout:            a.dropout,
            vocab_size:         a.vocab_size,
            seed:               a.seed,
            token_dropout:      a.token_dropout,
            max_gen_len:        a.max_gen_len,
            tf_start:           a.tf_start,
            tf_end:             a.tf_end,
            ..TrainConfig::default()
        }
    }
}

#[derive(Args, Debug)]
pub struct BuildTokenizerArgs {
    #[arg(long, default_value = "data")]
    pub data_dir: String,

    #[arg(long, default_value = "artifacts")]
    pub tokenizer_dir: String,

    /// Upper bound on vocabulary size, special tokens included
    #[arg(long, default_value_t = 30000)]
    pub vocab_size: usize,

    /// Seed for carving missing validation/test splits
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// The document to summarize
    #[arg(long)]
    pub text: String,

    /// Directory where `train` saved its weights and config
    #[arg(long, default_value = "artifacts")]
    pub output_dir: String,

    #[arg(long, default_value = "artifacts")]
    pub tokenizer_dir: String,

    /// Maximum number of generated tokens
    #[arg(long, default_value_t = 40)]
    pub max_len: usize,
}
