// ============================================================
// Layer 5 — ROUGE-L Scorer
// ============================================================
// Longest-common-subsequence overlap between a reference and a
// generated summary, computed over word tokens:
//
//   precision = LCS / |prediction|
//   recall    = LCS / |reference|
//   f-measure = 2PR / (P + R)
//
// Tokens are lowercased, anything non-alphanumeric separates
// words, and words longer than three characters go through the
// English Snowball stemmer so "cats" and "cat" match.
//
// Snowball English is Porter2, not the original Porter stemmer
// used by the reference ROUGE scripts. A few words stem
// differently, so scores can differ slightly from Porter-based
// tooling.
//
// Reference: Lin (2004) ROUGE: A Package for Automatic
//            Evaluation of Summaries

use anyhow::{anyhow, ensure, Result};
use rust_stemmers::{Algorithm, Stemmer};
use tokenizers::Tokenizer;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RougeScore {
    pub precision: f64,
    pub recall:    f64,
    pub fmeasure:  f64,
}

pub struct RougeScorer {
    stemmer: Stemmer,
}

impl Default for RougeScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl RougeScorer {
    pub fn new() -> Self {
        Self { stemmer: Stemmer::create(Algorithm::English) }
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| {
                if w.len() > 3 {
                    self.stemmer.stem(w).into_owned()
                } else {
                    w.to_string()
                }
            })
            .collect()
    }

    /// ROUGE-L of one prediction against one reference.
    /// Either side without tokens scores zero.
    pub fn score(&self, reference: &str, prediction: &str) -> RougeScore {
        let reference  = self.tokenize(reference);
        let prediction = self.tokenize(prediction);
        if reference.is_empty() || prediction.is_empty() {
            return RougeScore::default();
        }

        let lcs = lcs_length(&reference, &prediction) as f64;
        if lcs == 0.0 {
            return RougeScore::default();
        }
        let precision = lcs / prediction.len() as f64;
        let recall    = lcs / reference.len() as f64;
        RougeScore {
            precision,
            recall,
            fmeasure: 2.0 * precision * recall / (precision + recall),
        }
    }
}

/// Length of the longest common subsequence (O(n·m) DP, two rows).
pub fn lcs_length<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            curr[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// Mean ROUGE-L F-measure over aligned text pairs.
pub fn mean_rouge_l(
    references:  &[String],
    predictions: &[String],
    scorer:      &RougeScorer,
) -> Result<f64> {
    ensure!(
        references.len() == predictions.len(),
        "ROUGE-L needs one prediction per reference (got {} references, {} predictions)",
        references.len(),
        predictions.len()
    );
    if references.is_empty() {
        return Ok(0.0);
    }

    let total: f64 = references
        .iter()
        .zip(predictions)
        .map(|(r, p)| scorer.score(r, p).fmeasure)
        .sum();
    Ok(total / references.len() as f64)
}

/// Decode token id sequences (special tokens skipped) and return
/// their mean ROUGE-L F-measure.
pub fn compute_rouge_l(
    references:  &[Vec<u32>],
    predictions: &[Vec<u32>],
    tokenizer:   &Tokenizer,
    scorer:      &RougeScorer,
) -> Result<f64> {
    ensure!(
        references.len() == predictions.len(),
        "ROUGE-L needs one prediction per reference (got {} references, {} predictions)",
        references.len(),
        predictions.len()
    );

    let refs  = decode_all(references, tokenizer)?;
    let preds = decode_all(predictions, tokenizer)?;
    mean_rouge_l(&refs, &preds, scorer)
}

pub fn decode_all(rows: &[Vec<u32>], tokenizer: &Tokenizer) -> Result<Vec<String>> {
    rows.iter()
        .map(|ids| tokenizer.decode(ids, true).map_err(|e| anyhow!("Decode error: {e}")))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::tokenizer_store::tests::tiny_tokenizer;

    #[test]
    fn test_stemming_matches_plural() {
        let s = RougeScorer::new().score("the cat sat", "the cats sat");
        assert!((s.fmeasure - 1.0).abs() < 1e-12, "{s:?}");
    }

    #[test]
    fn test_disjoint_texts_score_zero() {
        let s = RougeScorer::new().score("alpha beta", "gamma delta");
        assert_eq!(s, RougeScore::default());
    }

    #[test]
    fn test_partial_overlap() {
        // LCS("a b c d", "a c") = 2 → P = 1, R = 0.5, F = 2/3
        let s = RougeScorer::new().score("a b c d", "a c");
        assert!((s.precision - 1.0).abs() < 1e-12);
        assert!((s.recall - 0.5).abs() < 1e-12);
        assert!((s.fmeasure - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_punctuation_and_case_ignored() {
        let s = RougeScorer::new().score("Hello, World!", "hello world");
        assert!((s.fmeasure - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_side_scores_zero() {
        let scorer = RougeScorer::new();
        assert_eq!(scorer.score("", "cat").fmeasure, 0.0);
        assert_eq!(scorer.score("cat", "  ").fmeasure, 0.0);
    }

    #[test]
    fn test_lcs_length() {
        assert_eq!(lcs_length(&[1, 2, 3, 4, 5], &[2, 4, 5, 9]), 3);
        assert_eq!(lcs_length::<u32>(&[], &[1]), 0);
    }

    #[test]
    fn test_mean_rejects_count_mismatch() {
        let refs  = vec!["a".to_string(), "b".to_string()];
        let preds = vec!["a".to_string()];
        assert!(mean_rouge_l(&refs, &preds, &RougeScorer::new()).is_err());
    }

    #[test]
    fn test_mean_of_empty_is_zero() {
        assert_eq!(mean_rouge_l(&[], &[], &RougeScorer::new()).unwrap(), 0.0);
    }

    #[test]
    fn test_compute_rouge_l_skips_special_tokens() {
        let (tokenizer, special, _dir) = tiny_tokenizer();
        let cat = tokenizer.token_to_id("cat").unwrap();
        let sat = tokenizer.token_to_id("sat").unwrap();

        let refs  = vec![vec![special.bos, cat, sat, special.eos]];
        let preds = vec![vec![cat, sat, special.pad, special.pad]];
        let score = compute_rouge_l(&refs, &preds, &tokenizer, &RougeScorer::new()).unwrap();
        assert!((score - 1.0).abs() < 1e-12);

        assert!(compute_rouge_l(&refs, &[], &tokenizer, &RougeScorer::new()).is_err());
    }
}
