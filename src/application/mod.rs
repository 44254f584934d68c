// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers to accomplish one goal.
//
// Rules for this layer:
//   - No padding or sampling logic here (that's Layer 4)
//   - No printing here (that's Layer 1)
//   - Only workflow coordination and anyhow context
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// Collate and inspect the first batches of a file
pub mod preview_use_case;

// Build and cache the oversampling index
pub mod index_use_case;
