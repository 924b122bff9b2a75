// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates all the other layers to accomplish
// one goal per command.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No UI or printing here (that's Layer 1)
//   - No direct file parsing (that's Layer 4 and 6)
//   - Only workflow coordination
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Training, validation, test and persistence of a run
pub mod train_use_case;

// Vocabulary fitting on the training split
pub mod tokenizer_use_case;

// Summary generation from a saved run
pub mod summarize_use_case;
