// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs and traits describing what the system
// works with: corpus records and the training history.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// A document and its reference summary
pub mod article;

// Per-epoch metric series and terminal test scores
pub mod history;

// Core abstractions (traits) that other layers implement
pub mod traits;
