// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem on behalf of the
// other layers:
//
//   tokenizer_store.rs — loads tokenizer.json, resolves the
//                        special token ids, builds a word-level
//                        vocabulary from a corpus on request
//
//   checkpoint.rs      — model weights (CompactRecorder) and
//                        the run config as JSON
//
//   history_store.rs   — the training history as indented JSON
//
//   plots.rs           — loss and ROUGE-L learning curves (PNG)
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling with anyhow)

/// Model checkpoint saving and loading
pub mod checkpoint;

/// Tokenizer loading, building, and special token ids
pub mod tokenizer_store;

/// Training history JSON
pub mod history_store;

/// Learning curve images
pub mod plots;
