// ============================================================
// Layer 4 — Corpus Loader
// ============================================================
// Loads summarization corpora stored as JSON Lines.
//
// Expected directory layout:
//   data/
//     train.jsonl        ← required
//     validation.jsonl   ← optional
//     test.jsonl         ← optional
//
// Each non-blank line is one JSON object with a document and
// a summary (`document`/`summary` or `article`/`highlights`).
//
// When the validation or test file is missing, the missing
// split is carved out of the training records with a seeded
// shuffle so runs stay reproducible.
//
// Reference: serde_json documentation
//            Rust Book §9 (Error Handling)

use anyhow::{bail, Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::preprocessor::Preprocessor;
use crate::data::splitter::split_three_way;
use crate::domain::article::Article;
use crate::domain::traits::{ArticleSource, CorpusSplits};

pub const TRAIN_FILE:      &str = "train.jsonl";
pub const VALIDATION_FILE: &str = "validation.jsonl";
pub const TEST_FILE:       &str = "test.jsonl";

/// Loads train/validation/test splits from a directory of .jsonl files.
pub struct JsonlArticleSource {
    dir:          PathBuf,
    seed:         u64,
    preprocessor: Preprocessor,
}

impl JsonlArticleSource {
    pub fn new(dir: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            dir: dir.into(),
            seed,
            preprocessor: Preprocessor::new(),
        }
    }

    /// Read one split file, or None if it does not exist
    fn read_optional(&self, name: &str) -> Result<Option<Vec<Article>>> {
        let path = self.dir.join(name);
        if !path.exists() {
            return Ok(None);
        }
        read_jsonl(&path, &self.preprocessor).map(Some)
    }
}

impl ArticleSource for JsonlArticleSource {
    fn load_splits(&self) -> Result<CorpusSplits> {
        let train_path = self.dir.join(TRAIN_FILE);
        if !train_path.exists() {
            bail!(
                "Training corpus '{}' not found. Expected JSON Lines with \
                 'document' and 'summary' fields.",
                train_path.display()
            );
        }
        let mut train = read_jsonl(&train_path, &self.preprocessor)?;

        let validation = self.read_optional(VALIDATION_FILE)?;
        let test       = self.read_optional(TEST_FILE)?;

        let splits = match (validation, test) {
            (Some(validation), Some(test)) => CorpusSplits { train, validation, test },
            (validation, test) => {
                tracing::warn!(
                    "Missing {} split file(s) in '{}' — carving them out of the training data",
                    match (&validation, &test) {
                        (None, None) => "validation and test",
                        (None, _)    => "validation",
                        _            => "test",
                    },
                    self.dir.display()
                );
                // Only carve what is missing; an existing file wins.
                let val_fraction  = if validation.is_none() { 0.1 } else { 0.0 };
                let test_fraction = if test.is_none()       { 0.1 } else { 0.0 };
                let (rest, carved_val, carved_test) = split_three_way(
                    std::mem::take(&mut train),
                    val_fraction,
                    test_fraction,
                    self.seed,
                );
                CorpusSplits {
                    train:      rest,
                    validation: validation.unwrap_or(carved_val),
                    test:       test.unwrap_or(carved_test),
                }
            }
        };

        tracing::info!(
            "Corpus loaded: {} train, {} validation, {} test",
            splits.train.len(),
            splits.validation.len(),
            splits.test.len()
        );
        Ok(splits)
    }
}

/// Parse a JSON Lines file into cleaned articles.
/// Blank lines and records with an empty side are skipped;
/// malformed JSON is an error that names the line.
pub fn read_jsonl(path: &Path, preprocessor: &Preprocessor) -> Result<Vec<Article>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Cannot read '{}'", path.display()))?;

    let mut articles = Vec::new();
    let mut skipped  = 0usize;

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let raw: Article = serde_json::from_str(line).with_context(|| {
            format!("Malformed record at {}:{}", path.display(), idx + 1)
        })?;
        let article = Article::new(
            preprocessor.clean(&raw.document),
            preprocessor.clean(&raw.summary),
        );
        if article.is_blank() {
            skipped += 1;
            continue;
        }
        articles.push(article);
    }

    if skipped > 0 {
        tracing::debug!("Skipped {} blank records in '{}'", skipped, path.display());
    }
    Ok(articles)
}
