// ============================================================
// Layer 3 — Training History
// ============================================================
// The record of a whole training run.
//
// Six series grow by one value per completed epoch:
//   train_loss, val_loss, train_rouge, val_rouge,
//   learning_rate, teacher_forcing_ratio
//
// Two terminal scalars are filled exactly once, after the
// final test pass:
//   test_loss, test_rouge
//
// The history is an owned value: the trainer creates it,
// moves it through the epoch loop and hands it back.
// It is serialised once at the very end of a run.
//
// Reference: Rust Book §5 (Structs), §9 (Error Handling)

use anyhow::{ensure, Result};
use serde::{Deserialize, Serialize};

/// The six values recorded for one epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// The epoch number (starts at 1)
    pub epoch: usize,

    /// Average cross-entropy over training batches (unweighted by batch size)
    pub train_loss: f64,

    /// Average cross-entropy over validation batches
    pub val_loss: f64,

    /// Mean ROUGE-L F-measure of argmax predictions on the training set
    pub train_rouge: f64,

    /// Mean ROUGE-L F-measure of greedy generations on the validation set
    pub val_rouge: f64,

    /// Learning rate after the plateau scheduler saw this epoch's val_loss
    pub learning_rate: f64,

    /// Teacher-forcing ratio used for this epoch's training batches
    pub teacher_forcing_ratio: f64,
}

impl EpochMetrics {
    /// Returns true if this epoch improved over the previous best val_loss
    pub fn is_improvement(&self, best_val_loss: f64) -> bool {
        self.val_loss < best_val_loss
    }
}

/// Append-only per-epoch series plus the terminal test scalars.
///
/// Field names are the JSON keys of `training_history.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub train_loss:            Vec<f64>,
    pub val_loss:              Vec<f64>,
    pub train_rouge:           Vec<f64>,
    pub val_rouge:             Vec<f64>,
    pub learning_rate:         Vec<f64>,
    pub teacher_forcing_ratio: Vec<f64>,
    pub test_loss:             Option<f64>,
    pub test_rouge:            Option<f64>,
}

impl TrainingHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one epoch. Epochs must arrive in order.
    pub fn record_epoch(&mut self, m: &EpochMetrics) -> Result<()> {
        ensure!(
            m.epoch == self.epochs_completed() + 1,
            "epoch {} recorded out of order (history holds {} epochs)",
            m.epoch,
            self.epochs_completed()
        );
        self.train_loss.push(m.train_loss);
        self.val_loss.push(m.val_loss);
        self.train_rouge.push(m.train_rouge);
        self.val_rouge.push(m.val_rouge);
        self.learning_rate.push(m.learning_rate);
        self.teacher_forcing_ratio.push(m.teacher_forcing_ratio);
        Ok(())
    }

    /// Store the final test results. May only be called once.
    pub fn set_test_results(&mut self, loss: f64, rouge: f64) -> Result<()> {
        ensure!(
            self.test_loss.is_none() && self.test_rouge.is_none(),
            "test results have already been recorded"
        );
        self.test_loss  = Some(loss);
        self.test_rouge = Some(rouge);
        Ok(())
    }

    pub fn epochs_completed(&self) -> usize {
        self.train_loss.len()
    }

    /// Lowest validation loss seen so far, if any epoch ran
    pub fn best_val_loss(&self) -> Option<f64> {
        self.val_loss.iter().copied().reduce(f64::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(epoch: usize, val_loss: f64) -> EpochMetrics {
        EpochMetrics {
            epoch,
            train_loss: 3.0,
            val_loss,
            train_rouge: 0.1,
            val_rouge: 0.2,
            learning_rate: 1e-4,
            teacher_forcing_ratio: 1.0,
        }
    }

    #[test]
    fn test_is_improvement() {
        let m = metrics(2, 2.3);
        assert!(m.is_improvement(3.0));
        assert!(!m.is_improvement(2.0));
    }

    #[test]
    fn test_series_grow_together() {
        let mut h = TrainingHistory::new();
        h.record_epoch(&metrics(1, 2.5)).unwrap();
        h.record_epoch(&metrics(2, 2.1)).unwrap();

        assert_eq!(h.epochs_completed(), 2);
        for len in [
            h.val_loss.len(),
            h.train_rouge.len(),
            h.val_rouge.len(),
            h.learning_rate.len(),
            h.teacher_forcing_ratio.len(),
        ] {
            assert_eq!(len, 2);
        }
        assert_eq!(h.best_val_loss(), Some(2.1));
    }

    #[test]
    fn test_out_of_order_epoch_rejected() {
        let mut h = TrainingHistory::new();
        assert!(h.record_epoch(&metrics(2, 2.5)).is_err());
    }

    #[test]
    fn test_terminal_scalars_set_once() {
        let mut h = TrainingHistory::new();
        assert!(h.test_loss.is_none());
        h.set_test_results(1.5, 0.3).unwrap();
        assert_eq!(h.test_loss, Some(1.5));
        assert!(h.set_test_results(1.0, 0.4).is_err());
        assert_eq!(h.test_rouge, Some(0.3));
    }

    #[test]
    fn test_unset_terminal_scalars_serialise_as_null() {
        let json = serde_json::to_value(TrainingHistory::new()).unwrap();
        assert!(json["test_loss"].is_null());
        assert!(json["test_rouge"].is_null());
        assert_eq!(json["train_loss"], serde_json::json!([]));
    }
}
