// ============================================================
// Layer 4 — Batch Collator
// ============================================================
// Stacks variable-length ShapedExamples into one uniform batch.
//
// Step 1 — flatten examples into rows
//   train:  [q0, p0, n0_0 .. n0_K, q1, p1, n1_0 .. n1_K, ...]
//   query:  [q0, q1, ...]
//   doc:    [p0, p1, ...]
//
// Step 2 — choose the padded length L
//   L = min(max_seq_length, ceil(longest_row / 16) * 16)
//
// Step 3 — pad every row to L, on the configured side
//   right:  t t t [pad] [pad]      mask: 1 1 1 0 0
//   left:   [pad] [pad] t t t      mask: 0 0 1 1 1
//
// Step 4 — position ids are 0..L for every row, type ids are 0.
//
// The pad id is the tokenizer's pad token, or EOS when the
// vocabulary has none. Metadata stays one entry per example,
// not per row.
//
// Reference: Rust Book §8 (Vectors), §13 (Iterators)

use serde::{Deserialize, Serialize};

use crate::domain::config::{DataType, EmbeddingDatasetConfig, TruncationSide};
use crate::domain::error::{DatasetError, Result};
use crate::domain::record::{Metadata, ShapedExample};
use crate::domain::traits::TextTokenizer;

/// Padded lengths are rounded up to a multiple of this
pub const PAD_TILE: usize = 16;

fn ceil_to_multiple(n: usize, m: usize) -> usize {
    n.div_ceil(m) * m
}

// ─── CollatedBatch ────────────────────────────────────────────────────────────
/// One training batch as plain row-major matrices.
///
/// All 2D fields have shape [rows, seq_len].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollatedBatch {
    pub input_ids: Vec<Vec<i64>>,
    /// Always zero
    pub token_type_ids: Vec<Vec<i64>>,
    /// 1 = real token, 0 = padding
    pub attention_mask: Vec<Vec<i64>>,
    pub position_ids: Vec<Vec<i64>>,
    /// Raw row length minus one (the appended EOS)
    pub lengths: Vec<i64>,
    /// One entry per example, in input order
    pub metadata: Vec<Metadata>,
}

impl CollatedBatch {
    pub fn rows(&self) -> usize {
        self.input_ids.len()
    }

    /// The shared padded length L
    pub fn seq_len(&self) -> usize {
        self.input_ids.first().map_or(0, Vec::len)
    }
}

// ─── BatchCollator ────────────────────────────────────────────────────────────
#[derive(Debug, Clone)]
pub struct BatchCollator {
    data_type:          DataType,
    num_hard_negatives: usize,
    max_seq_length:     usize,
    side:               TruncationSide,
    pad_id:             u32,
}

impl BatchCollator {
    pub fn new(cfg: &EmbeddingDatasetConfig, tokenizer: &dyn TextTokenizer) -> Self {
        Self {
            data_type:          cfg.data_type,
            num_hard_negatives: cfg.num_hard_negatives,
            max_seq_length:     cfg.max_seq_length,
            side:               cfg.truncation_method,
            pad_id:             tokenizer.pad_id().unwrap_or_else(|| tokenizer.eos_id()),
        }
    }

    pub fn pad_id(&self) -> u32 {
        self.pad_id
    }

    /// Build one batch from `examples`.
    pub fn collate(&self, examples: Vec<ShapedExample>) -> Result<CollatedBatch> {
        if examples.is_empty() {
            return Err(DatasetError::EmptyBatch);
        }

        // ── Flatten ───────────────────────────────────────────────────────────
        let capacity = examples.len() * self.data_type.rows_per_example(self.num_hard_negatives);
        let mut rows: Vec<Vec<u32>> = Vec::with_capacity(capacity);
        let mut metadata = Vec::with_capacity(examples.len());
        for ex in examples {
            match self.data_type {
                DataType::Train => {
                    rows.push(ex.query);
                    rows.push(ex.pos_doc);
                    rows.extend(ex.neg_doc);
                }
                DataType::Query => rows.push(ex.query),
                DataType::Doc => rows.push(ex.pos_doc),
            }
            metadata.push(ex.metadata);
        }

        // ── Padded length ─────────────────────────────────────────────────────
        let raw_max = rows.iter().map(Vec::len).max().unwrap_or(0);
        let seq_len = self.max_seq_length.min(ceil_to_multiple(raw_max, PAD_TILE));
        if raw_max > seq_len {
            return Err(DatasetError::SequenceTooLong { length: raw_max, max: seq_len });
        }

        // ── Pad, mask, positions ──────────────────────────────────────────────
        let positions: Vec<i64> = (0..seq_len as i64).collect();
        let mut input_ids      = Vec::with_capacity(rows.len());
        let mut attention_mask = Vec::with_capacity(rows.len());
        let mut lengths        = Vec::with_capacity(rows.len());

        for row in &rows {
            input_ids.push(self.pad_row(row, seq_len));
            attention_mask.push(self.mask_row(row.len(), seq_len));
            lengths.push(row.len() as i64 - 1);
        }

        Ok(CollatedBatch {
            token_type_ids: vec![vec![0; seq_len]; rows.len()],
            position_ids: vec![positions; rows.len()],
            input_ids,
            attention_mask,
            lengths,
            metadata,
        })
    }

    fn pad_row(&self, row: &[u32], seq_len: usize) -> Vec<i64> {
        let pad     = std::iter::repeat(self.pad_id as i64).take(seq_len - row.len());
        let tokens  = row.iter().map(|&t| t as i64);
        match self.side {
            TruncationSide::Left => pad.chain(tokens).collect(),
            TruncationSide::Right => tokens.chain(pad).collect(),
        }
    }

    fn mask_row(&self, len: usize, seq_len: usize) -> Vec<i64> {
        let mut mask = vec![0i64; seq_len];
        match self.side {
            TruncationSide::Left => mask[seq_len - len..].fill(1),
            TruncationSide::Right => mask[..len].fill(1),
        }
        mask
    }
}
