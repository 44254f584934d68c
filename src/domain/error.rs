// ============================================================
// Layer 3 — Dataset Error Taxonomy
// ============================================================
// Every fallible operation below the application layer returns
// DatasetError. The application and CLI layers wrap it into
// anyhow::Error with extra context.
//
// Groups:
//   - configuration errors   → raised while building the dataset
//   - per-item errors        → raised while fetching one example
//   - collation errors       → raised while building one batch
//   - I/O and parse errors   → bubbled up from std / serde_json
//
// Reference: Rust Book §9 (Recoverable Errors with Result)
//            thiserror crate documentation

use std::io;
use thiserror::Error;

/// Primary error type for the data pipeline.
#[derive(Debug, Error)]
pub enum DatasetError {
    // ========== Configuration Errors ==========
    /// An option has an unknown value or violates a numeric bound
    #[error("Invalid configuration: {0}")]
    Config(String),

    // ========== Per-Item Errors ==========
    /// A record lacks a field the current data type requires
    #[error("Record {index} is missing required field '{field}'")]
    MissingField { index: usize, field: String },

    /// A record field has the wrong JSON type
    #[error("Record {index} field '{field}' must be {expected}")]
    InvalidField { index: usize, field: String, expected: &'static str },

    /// A requested ordinal falls outside the dataset
    #[error("Index {ordinal} is out of range for dataset of length {len}")]
    IndexOutOfRange { ordinal: i64, len: usize },

    /// A line of the record file is not a JSON object
    #[error("Malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// Hard negatives were requested but the record has none to draw from
    #[error("Record {index} has no hard negatives but {required} are required")]
    EmptyNegativePool { index: usize, required: usize },

    /// The negative sampler produced the wrong number of documents
    #[error("Sampled {actual} hard negatives, expected exactly {expected}")]
    SamplingInvariant { expected: usize, actual: usize },

    /// The tokenizer failed to encode a piece of text
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    // ========== Collation Errors ==========
    /// Collation was asked to build a batch from zero examples
    #[error("Cannot collate an empty batch")]
    EmptyBatch,

    /// A row is longer than the padded length the batch allows
    #[error("Sequence of length {length} exceeds padded length {max}")]
    SequenceTooLong { length: usize, max: usize },

    // ========== I/O Errors ==========
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Shorthand used throughout the data and infra layers
pub type Result<T> = std::result::Result<T, DatasetError>;
