// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads the tokenizer artifact a run depends on, and can build
// one from a corpus when none exists yet.
//
// Building writes a word-level vocabulary straight into the
// HuggingFace tokenizer JSON format and loads it back through
// Tokenizer::from_file. That sidesteps the trainer API, whose
// generic model types do not line up with ModelWrapper.
//
// Special token layout (fixed ids):
//   <s>   0   start of every label sequence
//   <pad> 1   padding, ignored by the loss
//   </s>  2   end of sequence
//   <unk> 3   out-of-vocabulary words
//
// Reference: HuggingFace tokenizers JSON format

use anyhow::{anyhow, Context, Result};
use std::{collections::HashMap, path::PathBuf};
use tokenizers::Tokenizer;

pub const TOKENIZER_FILE: &str = "tokenizer.json";

pub const BOS_TOKEN: &str = "<s>";
pub const PAD_TOKEN: &str = "<pad>";
pub const EOS_TOKEN: &str = "</s>";
pub const UNK_TOKEN: &str = "<unk>";

const SPECIAL_TOKENS: [&str; 4] = [BOS_TOKEN, PAD_TOKEN, EOS_TOKEN, UNK_TOKEN];

/// Ids of the special tokens the training loop relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialTokens {
    pub bos: u32,
    pub pad: u32,
    pub eos: u32,
}

impl SpecialTokens {
    /// Look up the ids in a loaded tokenizer.
    /// Fails if any of them is undefined.
    pub fn resolve(tokenizer: &Tokenizer) -> Result<Self> {
        let id = |token: &str| {
            tokenizer
                .token_to_id(token)
                .ok_or_else(|| anyhow!("Tokenizer does not define special token '{token}'"))
        };
        Ok(Self {
            bos: id(BOS_TOKEN)?,
            pad: id(PAD_TOKEN)?,
            eos: id(EOS_TOKEN)?,
        })
    }
}

pub struct TokenizerStore {
    dir: PathBuf,
}

impl TokenizerStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKENIZER_FILE)
    }

    /// Load a previously saved tokenizer. Missing or corrupt files are errors.
    pub fn load(&self) -> Result<Tokenizer> {
        let path = self.path();
        Tokenizer::from_file(&path).map_err(|e| {
            anyhow!(
                "Cannot load tokenizer from '{}': {}. Run 'build-tokenizer' first.",
                path.display(),
                e
            )
        })
    }

    /// Build a word-level vocabulary from `texts`, write it as
    /// tokenizer JSON and load it back.
    pub fn build(&self, texts: &[&str], vocab_size: usize) -> Result<Tokenizer> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Cannot create '{}'", self.dir.display()))?;

        // ── Step 1: Word frequencies ─────────────────────────────────────────
        // Split the way the Whitespace pre-tokenizer does (\w+ | [^\w\s]+)
        // so every counted word is a token the tokenizer will produce.
        let mut freq: HashMap<String, usize> = HashMap::new();
        for text in texts {
            for word in pre_tokenize(&text.to_lowercase()) {
                *freq.entry(word).or_insert(0) += 1;
            }
        }

        // Most frequent first; ties broken alphabetically so the
        // same corpus always yields the same ids
        let mut words: Vec<(String, usize)> = freq.into_iter().collect();
        words.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        words.truncate(vocab_size.saturating_sub(SPECIAL_TOKENS.len()));

        // ── Step 2: Vocab JSON ───────────────────────────────────────────────
        let mut vocab = serde_json::Map::new();
        for (id, token) in SPECIAL_TOKENS.iter().enumerate() {
            vocab.insert(token.to_string(), serde_json::json!(id));
        }
        for (word, _) in &words {
            let next_id = vocab.len();
            vocab.entry(word.clone()).or_insert(serde_json::json!(next_id));
        }
        let total = vocab.len();

        let added_tokens: Vec<serde_json::Value> = SPECIAL_TOKENS
            .iter()
            .enumerate()
            .map(|(id, token)| serde_json::json!({
                "id": id, "content": token, "single_word": false,
                "lstrip": false, "rstrip": false, "normalized": false, "special": true
            }))
            .collect();

        // ── Step 3: Tokenizer JSON ───────────────────────────────────────────
        let tokenizer_json = serde_json::json!({
            "version": "1.0",
            "truncation": null,
            "padding": null,
            "added_tokens": added_tokens,
            "normalizer": { "type": "Lowercase" },
            "pre_tokenizer": { "type": "Whitespace" },
            "post_processor": null,
            "decoder": null,
            "model": {
                "type": "WordLevel",
                "vocab": vocab,
                "unk_token": UNK_TOKEN
            }
        });

        let tok_path = self.path();
        std::fs::write(&tok_path, serde_json::to_string_pretty(&tokenizer_json)?)
            .with_context(|| format!("Cannot write '{}'", tok_path.display()))?;

        tracing::info!(
            "Tokenizer built with {} tokens, saved to '{}'",
            total,
            tok_path.display()
        );

        self.load()
    }
}

/// Split text into word and punctuation runs
fn pre_tokenize(text: &str) -> Vec<String> {
    let mut out     = Vec::new();
    let mut current = String::new();
    let mut in_word = false;

    for c in text.chars() {
        let is_word = c.is_alphanumeric() || c == '_';
        if c.is_whitespace() || (!current.is_empty() && is_word != in_word) {
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
        }
        if !c.is_whitespace() {
            current.push(c);
            in_word = is_word;
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A small word-level tokenizer in a temp dir.
    /// The TempDir must outlive any use of the tokenizer file.
    pub(crate) fn tiny_tokenizer() -> (Tokenizer, SpecialTokens, tempfile::TempDir) {
        let dir   = tempfile::tempdir().unwrap();
        let store = TokenizerStore::new(dir.path());
        let tokenizer = store
            .build(
                &[
                    "the cat sat on the mat",
                    "a dog ran in the park",
                    "cats and dogs are pets",
                ],
                64,
            )
            .unwrap();
        let special = SpecialTokens::resolve(&tokenizer).unwrap();
        (tokenizer, special, dir)
    }

    #[test]
    fn test_special_token_ids_are_fixed() {
        let (_, special, _dir) = tiny_tokenizer();
        assert_eq!(special, SpecialTokens { bos: 0, pad: 1, eos: 2 });
    }

    #[test]
    fn test_encode_decode_roundtrip_skips_specials() {
        let (tokenizer, special, _dir) = tiny_tokenizer();
        let enc = tokenizer.encode("The cat sat", false).unwrap();
        let mut ids = vec![special.bos];
        ids.extend_from_slice(enc.get_ids());
        ids.push(special.eos);
        ids.push(special.pad);

        assert_eq!(tokenizer.decode(&ids, true).unwrap(), "the cat sat");
    }

    #[test]
    fn test_unknown_words_map_to_unk() {
        let (tokenizer, _, _dir) = tiny_tokenizer();
        let enc = tokenizer.encode("zebra", false).unwrap();
        assert_eq!(enc.get_ids(), &[3]);
    }

    #[test]
    fn test_vocab_size_cap() {
        let dir = tempfile::tempdir().unwrap();
        let tokenizer = TokenizerStore::new(dir.path())
            .build(&["one two three four five six"], 6)
            .unwrap();
        assert_eq!(tokenizer.get_vocab_size(true), 6);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TokenizerStore::new(dir.path()).load().is_err());
    }

    #[test]
    fn test_pre_tokenize_splits_punctuation() {
        assert_eq!(pre_tokenize("hi, there!"), vec!["hi", ",", "there", "!"]);
    }
}
