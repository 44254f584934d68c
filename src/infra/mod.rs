// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// File-backed concerns the data pipeline leans on:
//
//   tokenizer_store.rs — Tokenizer loading
//                        Loads a HuggingFace tokenizer.json and
//                        resolves the BOS / EOS / PAD ids the
//                        transformer and collator need.
//
//   mapping_store.rs   — Sample index persistence
//                        Caches the oversampling index as JSON
//                        so repeated runs reuse the same order.
//
// Reference: Rust Book §7 (Modules)
//            Rust Book §9 (Error Handling)

/// Tokenizer loading and special-id resolution
pub mod tokenizer_store;

/// Sample index caching
pub mod mapping_store;
