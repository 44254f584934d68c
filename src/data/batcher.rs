// ============================================================
// Layer 4 — Embedding Batcher
// ============================================================
// Implements Burn's Batcher trait so a DataLoader can turn a
// Vec<ShapedExample> straight into device tensors.
//
// The padding logic lives in BatchCollator; this module only
// moves the collated matrices onto the device:
//
//   CollatedBatch.input_ids  Vec<Vec<i64>> [rows][L]
//        │ flatten row-major
//        ▼
//   [r0_t0, r0_t1, ..., r0_tL, r1_t0, ...]
//        │ Tensor::from_ints + reshape
//        ▼
//   Tensor<B, 2, Int> [rows, L]
//
// Reference: Burn Book §4 (Batcher)

use burn::{data::dataloader::batcher::Batcher, prelude::*};

use crate::data::collator::{BatchCollator, CollatedBatch};
use crate::domain::error::Result;
use crate::domain::record::{Metadata, ShapedExample};

// ─── EmbeddingBatch ───────────────────────────────────────────────────────────
/// A contrastive training batch on device B.
///
/// Train mode row order per example: query, positive, K negatives.
#[derive(Debug, Clone)]
pub struct EmbeddingBatch<B: Backend> {
    /// [rows, L]
    pub input_ids: Tensor<B, 2, Int>,
    /// [rows, L], all zero
    pub token_type_ids: Tensor<B, 2, Int>,
    /// [rows, L], 1 = real token
    pub attention_mask: Tensor<B, 2, Int>,
    /// [rows, L], 0..L on every row
    pub position_ids: Tensor<B, 2, Int>,
    /// [rows], content length without the EOS
    pub lengths: Tensor<B, 1, Int>,
    /// One entry per example
    pub metadata: Vec<Metadata>,
}

// ─── EmbeddingBatcher ─────────────────────────────────────────────────────────
#[derive(Clone, Debug)]
pub struct EmbeddingBatcher<B: Backend> {
    collator: BatchCollator,
    device:   B::Device,
}

impl<B: Backend> EmbeddingBatcher<B> {
    pub fn new(collator: BatchCollator, device: B::Device) -> Self {
        Self { collator, device }
    }

    /// Collate and upload; the fallible form of `batch`.
    pub fn try_batch(&self, items: Vec<ShapedExample>) -> Result<EmbeddingBatch<B>> {
        let collated = self.collator.collate(items)?;
        Ok(self.to_device(collated))
    }

    /// Move an already collated batch onto the device.
    pub fn to_device(&self, batch: CollatedBatch) -> EmbeddingBatch<B> {
        let rows    = batch.rows();
        let seq_len = batch.seq_len();

        let lengths: Vec<i32> = batch.lengths.iter().map(|&x| x as i32).collect();

        EmbeddingBatch {
            input_ids:      self.matrix(&batch.input_ids, rows, seq_len),
            token_type_ids: self.matrix(&batch.token_type_ids, rows, seq_len),
            attention_mask: self.matrix(&batch.attention_mask, rows, seq_len),
            position_ids:   self.matrix(&batch.position_ids, rows, seq_len),
            lengths:        Tensor::<B, 1, Int>::from_ints(lengths.as_slice(), &self.device),
            metadata:       batch.metadata,
        }
    }

    fn matrix(&self, rows_data: &[Vec<i64>], rows: usize, seq_len: usize) -> Tensor<B, 2, Int> {
        let flat: Vec<i32> = rows_data
            .iter()
            .flat_map(|row| row.iter().map(|&x| x as i32))
            .collect();

        Tensor::<B, 1, Int>::from_ints(flat.as_slice(), &self.device).reshape([rows, seq_len])
    }
}

// ─── Burn Batcher Trait Implementation ────────────────────────────────────────
// The DataLoader calls .batch(items) with each mini-batch. The
// trait cannot return an error, so a batch that violates the
// collation invariants aborts the loader thread.
impl<B: Backend> Batcher<ShapedExample, EmbeddingBatch<B>> for EmbeddingBatcher<B> {
    fn batch(&self, items: Vec<ShapedExample>) -> EmbeddingBatch<B> {
        match self.try_batch(items) {
            Ok(batch) => batch,
            Err(err) => panic!("failed to collate embedding batch: {err}"),
        }
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::WordTokenizer;
    use crate::domain::config::{DataType, EmbeddingDatasetConfig, TruncationSide};

    type TestBackend = burn::backend::NdArray;

    fn example(q: usize, p: usize, n: usize) -> ShapedExample {
        ShapedExample {
            query: vec![5; q],
            pos_doc: vec![6; p],
            neg_doc: vec![vec![7; n]],
            metadata: Metadata::new(),
            autogenerated: false,
        }
    }

    fn batcher(side: TruncationSide) -> EmbeddingBatcher<TestBackend> {
        let cfg = EmbeddingDatasetConfig {
            data_type: DataType::Train,
            max_seq_length: 32,
            truncation_method: side,
            num_hard_negatives: 1,
            ..Default::default()
        };
        let collator = BatchCollator::new(&cfg, &WordTokenizer::new());
        EmbeddingBatcher::new(collator, Default::default())
    }

    #[test]
    fn test_tensor_shapes() {
        let batch = batcher(TruncationSide::Right).batch(vec![example(3, 4, 5), example(2, 9, 1)]);

        assert_eq!(batch.input_ids.dims(), [6, 16]);
        assert_eq!(batch.token_type_ids.dims(), [6, 16]);
        assert_eq!(batch.attention_mask.dims(), [6, 16]);
        assert_eq!(batch.position_ids.dims(), [6, 16]);
        assert_eq!(batch.lengths.dims(), [6]);
        assert_eq!(batch.metadata.len(), 2);
    }

    #[test]
    fn test_tensor_values() {
        let batch = batcher(TruncationSide::Left).batch(vec![example(3, 4, 5)]);

        let mask: Vec<i64> = batch.attention_mask.to_data().to_vec().unwrap();
        assert_eq!(mask.iter().sum::<i64>(), 3 + 4 + 5);
        // left padding: query row ends in three ones
        assert_eq!(&mask[13..16], &[1, 1, 1]);
        assert_eq!(mask[12], 0);

        let types: Vec<i64> = batch.token_type_ids.to_data().to_vec().unwrap();
        assert!(types.iter().all(|&t| t == 0));

        let positions: Vec<i64> = batch.position_ids.to_data().to_vec().unwrap();
        assert_eq!(&positions[..16], &(0..16).collect::<Vec<i64>>()[..]);
        assert_eq!(&positions[16..32], &positions[..16]);

        let lengths: Vec<i64> = batch.lengths.to_data().to_vec().unwrap();
        assert_eq!(lengths, vec![2, 3, 4]);
    }

    #[test]
    fn test_try_batch_empty() {
        assert!(batcher(TruncationSide::Right).try_batch(Vec::new()).is_err());
    }
}
