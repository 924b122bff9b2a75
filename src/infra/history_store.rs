// ============================================================
// Layer 6 — History Store
// ============================================================
// Writes the finished TrainingHistory as indented UTF-8 JSON.
//
// Example output:
//   {
//     "train_loss": [6.91, 5.72],
//     "val_loss": [6.40, 5.95],
//     ...
//     "test_loss": 5.88,
//     "test_rouge": 0.142
//   }
//
// Called exactly once per run, after the test pass.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::domain::history::TrainingHistory;

pub const HISTORY_FILE: &str = "training_history.json";

/// Serialise `history` into `dir/training_history.json`.
pub fn save_history(dir: &Path, history: &TrainingHistory) -> Result<PathBuf> {
    let path = dir.join(HISTORY_FILE);
    let json = serde_json::to_string_pretty(history)?;
    fs::write(&path, json)
        .with_context(|| format!("Cannot write history to '{}'", path.display()))?;
    tracing::info!("Training history saved to '{}'", path.display());
    Ok(path)
}
