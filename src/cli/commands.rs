// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands: `preview` and `index`
// and all their configurable flags.
//
// Dataset options are resolved in three layers:
//   1. built-in defaults          (EmbeddingDatasetConfig::default)
//   2. an optional --config JSON  (any subset of the fields)
//   3. individual flags           (win over both)
//
// Enum-valued flags are kept as strings here and parsed by the
// domain types, so an unknown value fails with the same
// configuration error whichever way it was supplied.
//
// Reference: Rust Book §12 (Building a CLI Program)

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::fs;

use crate::application::{index_use_case::IndexConfig, preview_use_case::PreviewConfig};
use crate::domain::config::{DataType, EmbeddingDatasetConfig, NegativeStrategy, TruncationSide};

/// The two top-level subcommands available to the user
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Collate the first batches of a triplet file and report their shapes
    Preview(PreviewArgs),

    /// Build and cache the oversampling index for a triplet file
    Index(IndexArgs),
}

/// Options shared by every command that shapes examples.
#[derive(Args, Debug, Default)]
pub struct DatasetArgs {
    /// JSON file with dataset options (any subset of fields)
    #[arg(long)]
    pub config: Option<String>,

    /// train, query or doc
    #[arg(long)]
    pub data_type: Option<String>,

    /// Maximum tokens per sequence, EOS included
    #[arg(long)]
    pub max_seq_length: Option<usize>,

    /// Prepend a BOS token to every sequence
    #[arg(long)]
    pub add_bos: Option<bool>,

    /// Append an EOS token to every sequence
    #[arg(long)]
    pub add_eos: Option<bool>,

    /// EOS placeholders reserved for learned prompt embeddings
    #[arg(long)]
    pub virtual_tokens: Option<usize>,

    /// Side to pad on: left or right
    #[arg(long)]
    pub truncation_method: Option<String>,

    /// Hard negatives per training example (K)
    #[arg(long)]
    pub num_hard_negatives: Option<usize>,

    /// random or first
    #[arg(long)]
    pub negative_sample_strategy: Option<String>,

    /// Resize the dataset to exactly this many examples
    #[arg(long)]
    pub max_num_samples: Option<usize>,

    /// Seed for oversampling and random negatives
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory where the oversampling index is cached
    #[arg(long)]
    pub index_mapping_dir: Option<String>,
}

impl DatasetArgs {
    /// Defaults, then the --config file, then individual flags.
    pub fn resolve(&self) -> Result<EmbeddingDatasetConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("Cannot read config '{}'", path))?;
                serde_json::from_str(&json)
                    .with_context(|| format!("Invalid dataset config in '{}'", path))?
            }
            None => EmbeddingDatasetConfig::default(),
        };

        if let Some(v) = &self.data_type {
            cfg.data_type = v.parse::<DataType>()?;
        }
        if let Some(v) = &self.truncation_method {
            cfg.truncation_method = v.parse::<TruncationSide>()?;
        }
        if let Some(v) = &self.negative_sample_strategy {
            cfg.negative_sample_strategy = v.parse::<NegativeStrategy>()?;
        }
        if let Some(v) = self.max_seq_length {
            cfg.max_seq_length = v;
        }
        if let Some(v) = self.add_bos {
            cfg.add_bos = v;
        }
        if let Some(v) = self.add_eos {
            cfg.add_eos = v;
        }
        if let Some(v) = self.virtual_tokens {
            cfg.virtual_tokens = v;
        }
        if let Some(v) = self.num_hard_negatives {
            cfg.num_hard_negatives = v;
        }
        if let Some(v) = self.max_num_samples {
            cfg.max_num_samples = Some(v);
        }
        if let Some(v) = self.seed {
            cfg.seed = v;
        }
        if let Some(v) = &self.index_mapping_dir {
            cfg.index_mapping_dir = Some(v.clone());
        }

        cfg.validate()?;
        Ok(cfg)
    }
}

/// All arguments for the `preview` command
#[derive(Args, Debug)]
pub struct PreviewArgs {
    /// JSONL file of (query, pos_doc, neg_doc) records
    #[arg(long)]
    pub data: String,

    /// tokenizer.json, or the directory containing it
    #[arg(long)]
    pub tokenizer: String,

    /// Override the BOS token string
    #[arg(long)]
    pub bos_token: Option<String>,

    /// Override the EOS token string
    #[arg(long)]
    pub eos_token: Option<String>,

    /// Override the padding token string
    #[arg(long)]
    pub pad_token: Option<String>,

    /// Examples per batch
    #[arg(long, default_value_t = 4)]
    pub batch_size: usize,

    /// Number of batches to build
    #[arg(long, default_value_t = 1)]
    pub batches: usize,

    /// Write the collated batches to this JSON file
    #[arg(long)]
    pub output: Option<String>,

    /// Use the supervised fine-tuning defaults; dataset flags are ignored
    #[arg(long)]
    pub sft: bool,

    #[command(flatten)]
    pub dataset: DatasetArgs,
}

impl PreviewArgs {
    pub fn into_config(self) -> Result<PreviewConfig> {
        let dataset = self.dataset.resolve()?;
        Ok(PreviewConfig {
            data_path:      self.data,
            tokenizer_path: self.tokenizer,
            bos_token:      self.bos_token,
            eos_token:      self.eos_token,
            pad_token:      self.pad_token,
            batch_size:     self.batch_size,
            batches:        self.batches,
            output:         self.output,
            sft:            self.sft,
            dataset,
        })
    }
}

/// All arguments for the `index` command
#[derive(Args, Debug)]
pub struct IndexArgs {
    /// JSONL file of records
    #[arg(long)]
    pub data: String,

    /// Directory to write the index into
    #[arg(long)]
    pub index_mapping_dir: String,

    /// Number of samples in the index
    #[arg(long)]
    pub max_num_samples: usize,

    /// Used only to name the cached file
    #[arg(long, default_value_t = 1024)]
    pub max_seq_length: usize,

    #[arg(long, default_value_t = 1234)]
    pub seed: u64,
}

/// Convert CLI IndexArgs into the application-layer IndexConfig.
impl From<IndexArgs> for IndexConfig {
    fn from(a: IndexArgs) -> Self {
        IndexConfig {
            data_path:         a.data,
            index_mapping_dir: a.index_mapping_dir,
            max_num_samples:   a.max_num_samples,
            max_seq_length:    a.max_seq_length,
            seed:              a.seed,
        }
    }
}
