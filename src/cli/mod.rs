// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and hands every command to a Layer 2 use case.
//
//   1. `build-tokenizer` — fit the vocabulary on train.jsonl
//   2. `train`           — train, validate, test, save
//   3. `summarize`       — summarize text with a saved run
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{BuildTokenizerArgs, Commands, SummarizeArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "seq2seq-summarizer",
    version = "0.1.0",
    about = "Train an encoder-decoder summarizer with scheduled teacher forcing, then summarize text."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the use case for the chosen subcommand.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)          => run_train(args),
            Commands::BuildTokenizer(args) => run_build_tokenizer(args),
            Commands::Summarize(args)      => run_summarize(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    tracing::info!("Starting training on corpus in: {}", args.data_dir);
    let output_dir = args.output_dir.clone();
    let history    = TrainUseCase::new(args.into()).execute()?;

    match (history.test_loss, history.test_rouge) {
        (Some(loss), Some(rouge)) => {
            println!("Training complete. test_loss={loss:.4} test_rouge_l={rouge:.4}")
        }
        _ => println!("Training complete. No epochs were run."),
    }
    println!("Artifacts saved to '{output_dir}'.");
    Ok(())
}

fn run_build_tokenizer(args: BuildTokenizerArgs) -> Result<()> {
    use crate::application::tokenizer_use_case::BuildTokenizerUseCase;

    let path = BuildTokenizerUseCase::new(
        args.data_dir, args.tokenizer_dir, args.vocab_size, args.seed,
    )
    .execute()?;
    println!("Tokenizer saved to '{}'.", path.display());
    Ok(())
}

fn run_summarize(args: SummarizeArgs) -> Result<()> {
    use crate::application::summarize_use_case::SummarizeUseCase;

    let use_case = SummarizeUseCase::new(&args.output_dir, &args.tokenizer_dir)?;
    let summary  = use_case.summarize(&args.text, args.max_len)?;
    println!("\nSummary: {}", summary);
    Ok(())
}
