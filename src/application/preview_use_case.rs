// ============================================================
// Layer 2 — PreviewUseCase
// ============================================================
// Runs the batching pipeline over a file and reports what the
// training loop would receive:
//
//   Step 1: Load tokenizer            (Layer 6 - infra)
//   Step 2: Build the dataset         (Layer 4 - data)
//   Step 3: Collate N batches         (Layer 4 - data)
//   Step 4: Upload each to a device   (Layer 4 - data, Burn)
//   Step 5: Optionally dump as JSON   (here)
//
// Batches are fetched in ordinal order. The last batch is
// topped up with wrapped ordinals (-1, -2, ...) when the dataset
// does not divide evenly, mirroring how a training harness pads
// its final global batch.
//
// Reference: Rust Book §13 (Iterators and Closures)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, sync::Arc};

use crate::data::{
    batcher::EmbeddingBatcher,
    collator::CollatedBatch,
    dataset::{create_sft_dataset, EmbeddingDataset},
};
use crate::domain::config::EmbeddingDatasetConfig;
use crate::infra::tokenizer_store::{SpecialTokenNames, TokenizerStore};

type PreviewBackend = burn::backend::NdArray;

// ─── Preview Configuration ───────────────────────────────────────────────────
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    pub data_path:      String,
    pub tokenizer_path: String,
    pub bos_token:      Option<String>,
    pub eos_token:      Option<String>,
    pub pad_token:      Option<String>,
    pub batch_size:     usize,
    pub batches:        usize,
    /// Write collated batches here as a JSON array
    pub output:         Option<String>,
    /// Use the fine-tuning defaults in place of `dataset`
    pub sft:            bool,
    pub dataset:        EmbeddingDatasetConfig,
}

/// Shape summary of one collated batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub rows:          usize,
    pub seq_len:       usize,
    pub real_tokens:   i64,
    pub padded_tokens: i64,
    pub autogenerated: usize,
}

impl BatchSummary {
    fn of(batch: &CollatedBatch, autogenerated: usize) -> Self {
        let real_tokens: i64 = batch.attention_mask.iter().flatten().sum();
        let total            = (batch.rows() * batch.seq_len()) as i64;
        Self {
            rows: batch.rows(),
            seq_len: batch.seq_len(),
            real_tokens,
            padded_tokens: total - real_tokens,
            autogenerated,
        }
    }
}

/// Ordinals for batch `b`; wraps with negative ordinals past the end.
pub fn batch_ordinals(b: usize, batch_size: usize, len: usize) -> Vec<i64> {
    let start = b * batch_size;
    (start..start + batch_size)
        .map(|i| {
            if i < len {
                i as i64
            } else {
                // -1, -2, ... counted from the end
                -(((i - len) % len.max(1)) as i64) - 1
            }
        })
        .collect()
}

// ─── PreviewUseCase ───────────────────────────────────────────────────────────
pub struct PreviewUseCase {
    config: PreviewConfig,
}

impl PreviewUseCase {
    pub fn new(config: PreviewConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<Vec<BatchSummary>> {
        let cfg = &self.config;
        anyhow::ensure!(cfg.batch_size > 0, "batch_size must be positive");

        // ── Step 1: Tokenizer ─────────────────────────────────────────────────
        let names = SpecialTokenNames {
            bos: cfg.bos_token.clone(),
            eos: cfg.eos_token.clone(),
            pad: cfg.pad_token.clone(),
        };
        let tokenizer = TokenizerStore::new(&cfg.tokenizer_path)
            .load(&names)
            .context("Cannot load tokenizer")?;

        // ── Step 2: Dataset ───────────────────────────────────────────────────
        let tokenizer = Arc::new(tokenizer);
        let dataset = if cfg.sft {
            create_sft_dataset(&cfg.data_path, tokenizer)
        } else {
            EmbeddingDataset::new(&cfg.data_path, tokenizer, cfg.dataset.clone())
        }
        .with_context(|| format!("Cannot build dataset from '{}'", cfg.data_path))?;
        anyhow::ensure!(!dataset.is_empty(), "Dataset '{}' has no records", cfg.data_path);

        let batcher = EmbeddingBatcher::<PreviewBackend>::new(
            dataset.collator().clone(),
            Default::default(),
        );

        // ── Steps 3–4: Collate and upload ─────────────────────────────────────
        let available = dataset.len().div_ceil(cfg.batch_size);
        let count     = cfg.batches.min(available);
        let mut summaries = Vec::with_capacity(count);
        let mut collated  = Vec::new();

        for b in 0..count {
            let ordinals = batch_ordinals(b, cfg.batch_size, dataset.len());
            let wrapped  = ordinals.iter().filter(|&&o| o < 0).count();

            let batch = dataset
                .fetch_batch(&ordinals)
                .with_context(|| format!("Failed to build batch {b}"))?;
            let summary = BatchSummary::of(&batch, wrapped);

            let tensors = batcher.to_device(batch.clone());
            tracing::info!(
                "Batch {}: input_ids {:?}, token_type_ids {:?}, attention_mask {:?}, \
                 position_ids {:?}, lengths {:?}, {} examples, {} real / {} pad tokens",
                b,
                tensors.input_ids.dims(),
                tensors.token_type_ids.dims(),
                tensors.attention_mask.dims(),
                tensors.position_ids.dims(),
                tensors.lengths.dims(),
                tensors.metadata.len(),
                summary.real_tokens,
                summary.padded_tokens
            );

            summaries.push(summary);
            if cfg.output.is_some() {
                collated.push(batch);
            }
        }

        // ── Step 5: Dump ──────────────────────────────────────────────────────
        if let Some(path) = &cfg.output {
            fs::write(path, serde_json::to_string_pretty(&collated)?)
                .with_context(|| format!("Cannot write batches to '{}'", path))?;
            tracing::info!("Wrote {} batches to '{}'", collated.len(), path);
        }

        Ok(summaries)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::write_jsonl;
    use crate::infra::tokenizer_store::tests::write_word_level;
    use serde_json::json;

    #[test]
    fn test_batch_ordinals_wrap_past_end() {
        assert_eq!(batch_ordinals(0, 3, 5), vec![0, 1, 2]);
        assert_eq!(batch_ordinals(1, 3, 5), vec![3, 4, -1]);
        assert_eq!(batch_ordinals(1, 4, 5), vec![4, -1, -2, -3]);
    }

    #[test]
    fn test_preview_end_to_end() {
        let record = json!({
            "query": "cats",
            "pos_doc": "cats are mammals",
            "neg_doc": ["dogs bark", "fish swim"],
        });
        let (dir, data) = write_jsonl(&[record.clone(), record.clone(), record]);
        let tok_path    = write_word_level(dir.path(), true);
        let output      = dir.path().join("batches.json");

        let cfg = PreviewConfig {
            data_path:      data.display().to_string(),
            tokenizer_path: tok_path.display().to_string(),
            bos_token:      None,
            eos_token:      None,
            pad_token:      None,
            batch_size:     2,
            batches:        5,
            output:         Some(output.display().to_string()),
            sft:            false,
            dataset: EmbeddingDatasetConfig {
                max_seq_length: 32,
                add_bos: false,
                num_hard_negatives: 1,
                ..Default::default()
            },
        };

        let summaries = PreviewUseCase::new(cfg).execute().unwrap();
        // 3 records at batch size 2 → 2 batches, the second padded by one wrap
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].rows, 6);
        assert_eq!(summaries[0].seq_len, 16);
        assert_eq!(summaries[1].autogenerated, 1);

        let written: Vec<CollatedBatch> =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written.len(), 2);
        // "query : cats" + eos, padded with <pad> = 3
        assert_eq!(written[0].input_ids[0][..5], [10i64, 12, 20, 2, 3]);
    }

    #[test]
    fn test_preview_with_sft_defaults() {
        let record = json!({
            "query": "dogs",
            "pos_doc": "dogs bark",
            "neg_doc": ["fish swim", "cats are mammals"],
        });
        let (dir, data) = write_jsonl(&[record]);
        let tok_path    = write_word_level(dir.path(), true);

        let cfg = PreviewConfig {
            data_path:      data.display().to_string(),
            tokenizer_path: tok_path.display().to_string(),
            bos_token:      None,
            eos_token:      None,
            pad_token:      None,
            batch_size:     1,
            batches:        1,
            output:         None,
            sft:            true,
            dataset:        EmbeddingDatasetConfig::default(),
        };

        let summaries = PreviewUseCase::new(cfg).execute().unwrap();
        // query, positive and the single SFT negative
        assert_eq!(summaries[0].rows, 3);
        assert_eq!(summaries[0].seq_len, 16);
    }
}
