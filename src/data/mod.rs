// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything between JSON Lines files on disk and tensor
// batches in the training loop.
//
//   train/validation/test .jsonl
//       │
//       ▼
//   JsonlArticleSource → reads records, carves missing splits
//       │                (Preprocessor cleans each field)
//       ▼
//   SummaryDataset     → tokenised samples (Burn Dataset)
//       │
//       ▼
//   SummaryBatcher     → pads into tensor batches
//       │
//       ▼
//   DataLoader         → feeds batches to the training loop
//       │
//       ▼
//   random_token_dropout → training-time encoder augmentation
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads JSON Lines corpora into train/validation/test splits
pub mod loader;

/// Cleans and normalises raw corpus text
pub mod preprocessor;

/// Seeded shuffle-and-split helper
pub mod splitter;

/// Implements Burn's Dataset trait for summarization samples
pub mod dataset;

/// Implements Burn's Batcher trait with dynamic padding
pub mod batcher;

/// Random token dropout on encoder input
pub mod augment;
