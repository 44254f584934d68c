// ============================================================
// Layer 4 — Embedding Dataset
// ============================================================
// Ties the pipeline together for one JSONL file:
//
//   ordinal ──resolve──► position ──sample index──► record offset
//                                                        │
//                          RecordSource::record(offset) ◄┘
//                                      │
//                          ExampleTransformer::transform
//                                      │
//                                ShapedExample ──► BatchCollator
//
// Ordinals may be negative: upstream batch padding asks for -1,
// -2, ... to repeat tail items. Those wrap once from the end and
// the example is flagged `autogenerated`.
//
// Each fetch builds its own StdRng from (seed, position), so an
// item's hard negatives are the same whichever worker fetches it
// and in whatever order.
//
// Failures are logged with the ordinal and file, then returned.
// Nothing is skipped or retried, including through Burn's loader.
//
// Reference: Burn Book §4 (Datasets)
//            Rust Book §16 (Shared-State Concurrency: Arc)

use burn::data::dataset::Dataset;
use rand::{rngs::StdRng, SeedableRng};
use std::{path::Path, sync::Arc};

use crate::data::{
    collator::{BatchCollator, CollatedBatch},
    record_source::JsonlRecordSource,
    sample_index::{resolve_ordinal, SampleIndex},
    transformer::ExampleTransformer,
};
use crate::domain::config::EmbeddingDatasetConfig;
use crate::domain::error::Result;
use crate::domain::record::ShapedExample;
use crate::domain::traits::{RecordSource, TextTokenizer};
use crate::infra::mapping_store::{MappingKey, MappingStore};

/// Golden-ratio increment used to spread per-item seeds apart
const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Generator for one item, independent of fetch order.
pub fn item_rng(seed: u64, position: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (position as u64).wrapping_add(1).wrapping_mul(SEED_MIX))
}

// ─── EmbeddingDataset ─────────────────────────────────────────────────────────
pub struct EmbeddingDataset {
    name:         String,
    source:       Arc<dyn RecordSource>,
    sample_index: Option<SampleIndex>,
    transformer:  ExampleTransformer,
    collator:     BatchCollator,
    config:       EmbeddingDatasetConfig,
}

impl EmbeddingDataset {
    /// Open `path` as a memory-mapped JSONL record source.
    pub fn new(
        path:      impl AsRef<Path>,
        tokenizer: Arc<dyn TextTokenizer>,
        config:    EmbeddingDatasetConfig,
    ) -> Result<Self> {
        let path = path.as_ref();
        config.validate()?;
        let source = JsonlRecordSource::open(path)?;
        Self::from_source(Arc::new(source), tokenizer, config)
    }

    /// Build over any record source.
    pub fn from_source(
        source:    Arc<dyn RecordSource>,
        tokenizer: Arc<dyn TextTokenizer>,
        config:    EmbeddingDatasetConfig,
    ) -> Result<Self> {
        let transformer = ExampleTransformer::new(&config, tokenizer.clone())?;
        let collator    = BatchCollator::new(&config, tokenizer.as_ref());
        let name        = source.describe();

        let sample_index = match config.max_num_samples {
            None => None,
            Some(max_num_samples) => {
                let data_name = Path::new(&name)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("dataset")
                    .to_string();
                Some(match &config.index_mapping_dir {
                    Some(dir) => MappingStore::new(dir).load_or_build(MappingKey {
                        data_name:      &data_name,
                        num_records:    source.len(),
                        max_num_samples,
                        max_seq_length: config.max_seq_length,
                        seed:           config.seed,
                    })?,
                    None => SampleIndex::build(source.len(), max_num_samples, config.seed),
                })
            }
        };

        tracing::info!(
            "Creating EmbeddingDataset from '{}' with seed={}, add_bos={}, add_eos={}, \
             max_seq_length={}, min_seq_length={}, pad_token_id={}, \
             negative_sample_strategy={}, num_hard_negatives={}, data_type={}",
            name,
            config.seed,
            config.add_bos,
            config.add_eos,
            config.max_seq_length,
            config.min_seq_length,
            collator.pad_id(),
            config.negative_sample_strategy,
            config.num_hard_negatives,
            config.data_type,
        );

        Ok(Self { name, source, sample_index, transformer, collator, config })
    }

    /// Number of addressable examples (max_num_samples when set).
    pub fn len(&self) -> usize {
        match &self.sample_index {
            Some(index) => index.len(),
            None => self.source.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.sample_index {
            Some(index) => index.is_empty(),
            None => self.source.is_empty(),
        }
    }

    /// Fetch and shape the example at `ordinal`.
    pub fn try_get(&self, ordinal: i64) -> Result<ShapedExample> {
        self.fetch(ordinal).map_err(|err| {
            tracing::error!(
                "Error while loading example {} from dataset {}: {}",
                ordinal,
                self.name,
                err
            );
            err
        })
    }

    fn fetch(&self, ordinal: i64) -> Result<ShapedExample> {
        let resolution = resolve_ordinal(ordinal, self.len())?;
        let position   = resolution.position();

        let offset = match &self.sample_index {
            Some(index) => index
                .get(position)
                .map(|entry| entry.record_offset)
                .unwrap_or(position),
            None => position,
        };

        let record  = self.source.record(offset)?;
        let mut rng = item_rng(self.config.seed, position);
        let mut example = self.transformer.transform(record, offset, &mut rng)?;
        example.autogenerated = resolution.is_wrapped();
        Ok(example)
    }

    /// Collate already-fetched examples.
    pub fn collate(&self, examples: Vec<ShapedExample>) -> Result<CollatedBatch> {
        self.collator.collate(examples)
    }

    /// Fetch every ordinal and collate. One failure fails the batch.
    pub fn fetch_batch(&self, ordinals: &[i64]) -> Result<CollatedBatch> {
        let examples = ordinals
            .iter()
            .map(|&ordinal| self.try_get(ordinal))
            .collect::<Result<Vec<_>>>()?;
        self.collate(examples)
    }

    pub fn collator(&self) -> &BatchCollator {
        &self.collator
    }
}

/// Dataset with the defaults used for supervised fine-tuning runs.
pub fn create_sft_dataset(
    path:      impl AsRef<Path>,
    tokenizer: Arc<dyn TextTokenizer>,
) -> Result<EmbeddingDataset> {
    EmbeddingDataset::new(path, tokenizer, EmbeddingDatasetConfig::sft_defaults())
}

// ─── Burn Dataset Trait Implementation ────────────────────────────────────────
// Burn's DataLoader reads get(0), get(1), ... until the first None,
// so None is reserved for index >= len(). The trait has no error
// channel: an in-range item that fails to load is logged by
// try_get and aborts the loader, like EmbeddingBatcher::batch.
impl Dataset<ShapedExample> for EmbeddingDataset {
    fn get(&self, index: usize) -> Option<ShapedExample> {
        if index >= EmbeddingDataset::len(self) {
            return None;
        }
        let ordinal = i64::try_from(index).ok()?;
        match self.try_get(ordinal) {
            Ok(example) => Some(example),
            Err(err) => panic!("failed to load embedding example {index}: {err}"),
        }
    }

    fn len(&self) -> usize {
        EmbeddingDataset::len(self)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::{write_jsonl, WordTokenizer};
    use crate::domain::config::{DataType, NegativeStrategy};
    use crate::domain::error::DatasetError;
    use serde_json::json;

    fn triplets(n: usize) -> Vec<serde_json::Value> {
        (0..n)
            .map(|i| {
                json!({
                    "query": format!("question {i}"),
                    "pos_doc": format!("answer {i}"),
                    "neg_doc": [format!("wrong a{i}"), format!("wrong b{i}"), format!("wrong c{i}")],
                    "query_id": i,
                    "doc_id": format!("d{i}"),
                })
            })
            .collect()
    }

    fn tokenizer() -> Arc<dyn TextTokenizer> {
        Arc::new(WordTokenizer::new())
    }

    fn train_cfg() -> EmbeddingDatasetConfig {
        EmbeddingDatasetConfig {
            max_seq_length: 32,
            add_bos: false,
            num_hard_negatives: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_len_and_get() {
        let (_dir, path) = write_jsonl(&triplets(5));
        let ds = EmbeddingDataset::new(&path, tokenizer(), train_cfg()).unwrap();
        assert_eq!(ds.len(), 5);
        let ex = ds.try_get(3).unwrap();
        assert_eq!(ex.metadata["query_id"], 3);
        assert!(!ex.autogenerated);
        assert_eq!(ex.neg_doc.len(), 1);
    }

    #[test]
    fn test_empty_file_is_empty() {
        let (_dir, path) = write_jsonl(&[]);
        let ds = EmbeddingDataset::new(&path, tokenizer(), train_cfg()).unwrap();
        assert!(ds.is_empty());
        assert!(Dataset::get(&ds, 0).is_none());
    }

    #[test]
    fn test_negative_ordinal_wraps_and_is_flagged() {
        let (_dir, path) = write_jsonl(&triplets(5));
        let ds = EmbeddingDataset::new(&path, tokenizer(), train_cfg()).unwrap();
        let ex = ds.try_get(-1).unwrap();
        assert!(ex.autogenerated);
        assert_eq!(ex.metadata["query_id"], 4);

        assert!(matches!(ds.try_get(-6), Err(DatasetError::IndexOutOfRange { .. })));
        assert!(matches!(ds.try_get(5), Err(DatasetError::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_train_batch_scenario() {
        let (_dir, path) = write_jsonl(&triplets(4));
        let ds = EmbeddingDataset::new(&path, tokenizer(), train_cfg()).unwrap();
        let batch = ds.fetch_batch(&[0, 1]).unwrap();

        assert_eq!(batch.rows(), 6);
        assert!(batch.token_type_ids.iter().flatten().all(|&v| v == 0));
        let first = &batch.position_ids[0];
        assert!(batch.position_ids.iter().all(|r| r == first));
        assert_eq!(*first, (0..batch.seq_len() as i64).collect::<Vec<_>>());
        assert_eq!(batch.metadata.len(), 2);
    }

    #[test]
    fn test_random_negatives_reproducible_per_ordinal() {
        let (_dir, path) = write_jsonl(&triplets(6));
        let cfg = EmbeddingDatasetConfig {
            negative_sample_strategy: NegativeStrategy::Random,
            num_hard_negatives: 2,
            ..train_cfg()
        };
        let ds = EmbeddingDataset::new(&path, tokenizer(), cfg).unwrap();

        // Fetch order must not matter
        let forward: Vec<_> = (0..6).map(|i| ds.try_get(i).unwrap().neg_doc).collect();
        let backward: Vec<_> = (0..6).rev().map(|i| ds.try_get(i).unwrap().neg_doc).collect();
        let backward: Vec<_> = backward.into_iter().rev().collect();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_oversampled_length() {
        let (_dir, path) = write_jsonl(&triplets(3));
        let cfg = EmbeddingDatasetConfig { max_num_samples: Some(10), ..train_cfg() };
        let ds = EmbeddingDataset::new(&path, tokenizer(), cfg).unwrap();
        assert_eq!(ds.len(), 10);
        for i in 0..10 {
            assert!(ds.try_get(i).is_ok());
        }
    }

    #[test]
    fn test_oversampled_index_is_cached() {
        let (dir, path) = write_jsonl(&triplets(3));
        let cache = dir.path().join("cache");
        let cfg = EmbeddingDatasetConfig {
            max_num_samples: Some(7),
            index_mapping_dir: Some(cache.display().to_string()),
            ..train_cfg()
        };
        let a = EmbeddingDataset::new(&path, tokenizer(), cfg.clone()).unwrap();
        assert_eq!(std::fs::read_dir(&cache).unwrap().count(), 1);
        let b = EmbeddingDataset::new(&path, tokenizer(), cfg).unwrap();
        for i in 0..7 {
            assert_eq!(a.try_get(i).unwrap().metadata, b.try_get(i).unwrap().metadata);
        }
    }

    #[test]
    fn test_query_mode_missing_doc_id_fails_batch() {
        let lines = vec![
            json!({"query": "a", "query_id": 1, "doc_id": 1}),
            json!({"query": "b", "query_id": 2}),
        ];
        let (_dir, path) = write_jsonl(&lines);
        let cfg = EmbeddingDatasetConfig { data_type: DataType::Query, ..train_cfg() };
        let ds = EmbeddingDataset::new(&path, tokenizer(), cfg).unwrap();

        assert!(ds.try_get(0).is_ok());
        assert!(matches!(
            ds.fetch_batch(&[0, 1]),
            Err(DatasetError::MissingField { index: 1, .. })
        ));
    }

    #[test]
    fn test_burn_dataset_trait() {
        let (_dir, path) = write_jsonl(&triplets(2));
        let ds = EmbeddingDataset::new(&path, tokenizer(), train_cfg()).unwrap();
        assert_eq!(Dataset::len(&ds), 2);
        assert!(Dataset::get(&ds, 1).is_some());
        assert!(Dataset::get(&ds, 2).is_none());
    }

    #[test]
    #[should_panic(expected = "failed to load embedding example 2")]
    fn test_burn_dataset_panics_on_bad_record() {
        let (_dir, path) = write_jsonl(&triplets(2));
        let mut body = std::fs::read_to_string(&path).unwrap();
        body.push_str("not json\n");
        std::fs::write(&path, body).unwrap();

        let ds = EmbeddingDataset::new(&path, tokenizer(), train_cfg()).unwrap();
        assert_eq!(Dataset::len(&ds), 3);
        let _ = Dataset::get(&ds, 2);
    }

    #[test]
    #[should_panic(expected = "failed to load embedding example 2")]
    fn test_data_loader_does_not_stop_early_on_bad_record() {
        use crate::data::batcher::EmbeddingBatcher;
        use burn::data::dataloader::DataLoaderBuilder;

        let mut lines = triplets(6);
        lines[2] = json!("placeholder");
        let (_dir, path) = write_jsonl(&lines);
        // Third line becomes plain text rather than a JSON object
        let body = std::fs::read_to_string(&path).unwrap().replace("\"placeholder\"", "not json");
        std::fs::write(&path, body).unwrap();

        let ds = EmbeddingDataset::new(&path, tokenizer(), train_cfg()).unwrap();
        assert_eq!(ds.len(), 6);

        let batcher = EmbeddingBatcher::<burn::backend::NdArray>::new(
            ds.collator().clone(),
            Default::default(),
        );
        let loader = DataLoaderBuilder::new(batcher).batch_size(2).build(ds);

        let mut examples = 0;
        for batch in loader.iter() {
            examples += batch.metadata.len();
        }
        // Only reached if the loader swallowed the bad record
        assert_eq!(examples, 6);
    }

    #[test]
    fn test_sft_dataset_defaults_reach_transformer() {
        let (_dir, path) = write_jsonl(&triplets(2));
        let ds = create_sft_dataset(&path, tokenizer()).unwrap();
        assert_eq!(ds.len(), 2);

        let ex = ds.try_get(0).unwrap();
        // No BOS, trailing EOS, exactly one negative taken in order
        assert_ne!(ex.query[0], WordTokenizer::BOS);
        assert_eq!(ex.query.last(), Some(&WordTokenizer::EOS));
        assert_eq!(ex.neg_doc.len(), 1);

        let mut expected = WordTokenizer::new().ids("passage: wrong a0");
        expected.push(WordTokenizer::EOS);
        assert_eq!(ex.neg_doc[0], expected);
    }

    #[test]
    fn test_invalid_config_fails_fast() {
        let (_dir, path) = write_jsonl(&triplets(1));
        let cfg = EmbeddingDatasetConfig { max_seq_length: 0, ..train_cfg() };
        assert!(matches!(
            EmbeddingDataset::new(&path, tokenizer(), cfg),
            Err(DatasetError::Config(_))
        ));
    }

    #[test]
    fn test_item_rng_depends_on_position() {
        use rand::Rng;
        let a: u64 = item_rng(1234, 0).gen();
        let b: u64 = item_rng(1234, 1).gen();
        let c: u64 = item_rng(1234, 0).gen();
        assert_ne!(a, b);
        assert_eq!(a, c);
    }
}
