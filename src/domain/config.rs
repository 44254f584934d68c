// ============================================================
// Layer 3 — Dataset Configuration
// ============================================================
// All knobs that shape how raw triplets become training rows.
//
// The three string-valued options are modelled as enums so an
// unknown value is rejected when the config is parsed, long
// before the first example is fetched:
//
//   DataType          train | query | doc
//   TruncationSide    left  | right
//   NegativeStrategy  random | first
//
// Serialisable so a run can be described by a JSON file and
// overridden from the command line.
//
// Reference: Rust Book §6 (Enums), §9 (Error Handling)
//            serde documentation (enum representations)

use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::domain::error::{DatasetError, Result};

// ─── DataType ─────────────────────────────────────────────────────────────────
/// Which sequences an example produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// query + positive + K hard negatives
    Train,
    /// query only (evaluation side of retrieval)
    Query,
    /// positive document only (corpus side of retrieval)
    Doc,
}

impl DataType {
    /// Number of rows one example contributes to a collated batch
    pub fn rows_per_example(self, num_hard_negatives: usize) -> usize {
        match self {
            DataType::Train => 2 + num_hard_negatives,
            DataType::Query | DataType::Doc => 1,
        }
    }
}

impl FromStr for DataType {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(DataType::Train),
            "query" => Ok(DataType::Query),
            "doc" => Ok(DataType::Doc),
            other => Err(DatasetError::Config(format!(
                "data_type must be one of 'train', 'query' or 'doc', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Train => "train",
            DataType::Query => "query",
            DataType::Doc => "doc",
        };
        f.write_str(s)
    }
}

// ─── TruncationSide ───────────────────────────────────────────────────────────
/// Side on which the collator pads rows (and builds the mask).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruncationSide {
    Left,
    Right,
}

impl FromStr for TruncationSide {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "left" => Ok(TruncationSide::Left),
            "right" => Ok(TruncationSide::Right),
            other => Err(DatasetError::Config(format!(
                "truncation_method must be either 'left' or 'right', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for TruncationSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TruncationSide::Left => "left",
            TruncationSide::Right => "right",
        })
    }
}

// ─── NegativeStrategy ─────────────────────────────────────────────────────────
/// How K hard negatives are picked when a record has at least K.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NegativeStrategy {
    /// Uniform draw without replacement
    Random,
    /// The first K in file order
    First,
}

impl FromStr for NegativeStrategy {
    type Err = DatasetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "random" => Ok(NegativeStrategy::Random),
            "first" => Ok(NegativeStrategy::First),
            other => Err(DatasetError::Config(format!(
                "negative_sample_strategy must be either 'random' or 'first', got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for NegativeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NegativeStrategy::Random => "random",
            NegativeStrategy::First => "first",
        })
    }
}

// ─── Special tokens ───────────────────────────────────────────────────────────
/// Prompt-template markers. Carried for prompt templating; the
/// embedding transform itself does not read them.
pub fn default_special_tokens() -> BTreeMap<String, String> {
    [
        ("system_turn_start", "<extra_id_0>"),
        ("turn_start", "<extra_id_1>"),
        ("label_start", "<extra_id_2>"),
        ("end_of_turn", "\n"),
        ("end_of_name", "\n"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

// ─── EmbeddingDatasetConfig ───────────────────────────────────────────────────
/// Construction-time options for an EmbeddingDataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingDatasetConfig {
    /// Hard cap on every produced sequence, EOS included
    pub max_seq_length: usize,
    /// Accepted for compatibility; examples are never dropped by length
    pub min_seq_length: usize,
    pub add_bos: bool,
    pub add_eos: bool,
    /// Oversample (or undersample) to exactly this many examples
    pub max_num_samples: Option<usize>,
    pub seed: u64,
    /// Where the sample index is cached; None keeps it in memory
    pub index_mapping_dir: Option<String>,
    /// EOS placeholders reserved at the front of every sequence
    pub virtual_tokens: usize,
    pub truncation_method: TruncationSide,
    pub special_tokens: BTreeMap<String, String>,
    pub data_type: DataType,
    pub num_hard_negatives: usize,
    pub negative_sample_strategy: NegativeStrategy,
}

impl Default for EmbeddingDatasetConfig {
    fn default() -> Self {
        Self {
            max_seq_length: 1024,
            min_seq_length: 1,
            add_bos: true,
            add_eos: true,
            max_num_samples: None,
            seed: 1234,
            index_mapping_dir: None,
            virtual_tokens: 0,
            truncation_method: TruncationSide::Right,
            special_tokens: default_special_tokens(),
            data_type: DataType::Train,
            num_hard_negatives: 4,
            negative_sample_strategy: NegativeStrategy::First,
        }
    }
}

impl EmbeddingDatasetConfig {
    /// Defaults used when building a dataset for supervised fine-tuning.
    pub fn sft_defaults() -> Self {
        Self {
            max_seq_length: 2048,
            add_bos: false,
            add_eos: true,
            num_hard_negatives: 1,
            ..Self::default()
        }
    }

    /// Check every bound that can be checked without touching data.
    pub fn validate(&self) -> Result<()> {
        if self.max_seq_length == 0 {
            return Err(DatasetError::Config(
                "max_seq_length must be at least 1".to_string(),
            ));
        }
        if self.min_seq_length > self.max_seq_length {
            return Err(DatasetError::Config(format!(
                "min_seq_length ({}) must not exceed max_seq_length ({})",
                self.min_seq_length, self.max_seq_length
            )));
        }
        if self.max_num_samples == Some(0) {
            return Err(DatasetError::Config(
                "max_num_samples must be positive when set".to_string(),
            ));
        }
        Ok(())
    }
}
