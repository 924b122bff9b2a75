// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Everything that runs tensors lives here.
//
//   model.rs      — encoder-decoder transformer with scheduled
//                   sampling and greedy decoding
//
//   scheduler.rs  — per-epoch teacher-forcing decay and the
//                   reduce-on-plateau learning rate
//
//   rouge.rs      — LCS-based ROUGE-L with stemming
//
//   evaluator.rs  — validation (loss + generation) and the
//                   final test pass
//
//   trainer.rs    — the epoch loop: augmentation, forward,
//                   clipped AdamW step, metric aggregation
//
//   inferencer.rs — loads a finished run and summarizes text
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)
//            Vaswani et al. (2017) Attention Is All You Need

/// Encoder-decoder transformer
pub mod model;

/// Teacher-forcing and learning-rate schedules
pub mod scheduler;

/// ROUGE-L scoring
pub mod rouge;

/// Validation and test passes
pub mod evaluator;

/// Full training loop
pub mod trainer;

/// Inference engine — loads checkpoint and generates summaries
pub mod inferencer;
