// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a JSONL triplet file to device tensors.
//
// The pipeline flows in this order:
//
//   triplets.jsonl
//       │
//       ▼
//   JsonlRecordSource   → memory-mapped, one record per line
//       │
//       ▼
//   SampleIndex         → optional oversampling of ordinals
//       │
//       ▼
//   ExampleTransformer  → prefixes, tokenises, shapes ids
//       │                  (NegativeSampler picks K negatives)
//       ▼
//   EmbeddingDataset    → implements Burn's Dataset trait
//       │
//       ▼
//   BatchCollator       → pads rows, builds masks and positions
//       │
//       ▼
//   EmbeddingBatcher    → implements Burn's Batcher trait
//
// Each module is responsible for exactly one step.
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Memory-mapped JSONL records
pub mod record_source;

/// Ordinal resolution and oversampling index
pub mod sample_index;

/// Hard negative selection
pub mod negatives;

/// Record → ShapedExample
pub mod transformer;

/// ShapedExamples → padded matrices
pub mod collator;

/// Implements Burn's Dataset trait over a triplet file
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

#[cfg(test)]
pub(crate) mod test_support;
