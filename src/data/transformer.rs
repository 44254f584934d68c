// ============================================================
// Layer 4 — Example Transformer
// ============================================================
// Turns one RawRecord into a ShapedExample.
//
// Steps (applied in order to every produced sequence):
//
//   1. Prefix     "query: " + query      "passage: " + document
//                 (raw text is trimmed first)
//   2. Tokenise   text → ids
//   3. Virtual    [eos] * virtual_tokens prepended
//   4. BOS        [bos] prepended        (if add_bos)
//   5. Truncate   keep the first max_seq_length - 1 ids
//   6. EOS        [eos] appended         (if add_eos)
//
// Example with virtual_tokens = 2, add_bos, add_eos:
//   [eos, eos, bos, t1, t2, ..., tn, eos]
//
// Step 5 always cuts the tail, whatever the truncation side;
// the side only decides where the collator pads. It leaves one
// slot free so the EOS still fits within max_seq_length.
//
// Which sequences exist depends on the data type:
//   train → query, pos_doc, K negatives (see negatives.rs)
//   query → query only   (record must have query_id and doc_id)
//   doc   → pos_doc only (record must have doc_id)
//
// Reference: Rust Book §8 (Vectors), §13 (Iterators)

use rand::Rng;
use std::sync::Arc;

use crate::data::negatives::sample_negatives;
use crate::domain::config::{DataType, EmbeddingDatasetConfig, NegativeStrategy};
use crate::domain::error::Result;
use crate::domain::record::{RawRecord, ShapedExample};
use crate::domain::traits::TextTokenizer;

const QUERY_PREFIX: &str = "query: ";
const PASSAGE_PREFIX: &str = "passage: ";

/// Token-shaping settings plus the tokenizer that feeds them.
#[derive(Clone)]
pub struct ExampleTransformer {
    tokenizer:          Arc<dyn TextTokenizer>,
    data_type:          DataType,
    max_seq_length:     usize,
    add_bos:            bool,
    add_eos:            bool,
    virtual_tokens:     usize,
    num_hard_negatives: usize,
    strategy:           NegativeStrategy,
}

impl ExampleTransformer {
    /// Validates the config, so transform() never sees a bad setting.
    pub fn new(cfg: &EmbeddingDatasetConfig, tokenizer: Arc<dyn TextTokenizer>) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            tokenizer,
            data_type:          cfg.data_type,
            max_seq_length:     cfg.max_seq_length,
            add_bos:            cfg.add_bos,
            add_eos:            cfg.add_eos,
            virtual_tokens:     cfg.virtual_tokens,
            num_hard_negatives: cfg.num_hard_negatives,
            strategy:           cfg.negative_sample_strategy,
        })
    }

    /// Shape `record`. `index` is the record offset, used in errors.
    /// `rng` is only consumed by negative sampling.
    pub fn transform<R: Rng + ?Sized>(
        &self,
        record: RawRecord,
        index:  usize,
        rng:    &mut R,
    ) -> Result<ShapedExample> {
        let (query, pos_doc, neg_doc) = match self.data_type {
            DataType::Train => {
                let q    = self.encode(QUERY_PREFIX, record.text("query", index)?)?;
                let d    = self.encode(PASSAGE_PREFIX, record.text("pos_doc", index)?)?;
                let pool = record.neg_docs(index)?;
                let picked =
                    sample_negatives(&pool, self.num_hard_negatives, self.strategy, rng, index)?;
                let nd = picked
                    .into_iter()
                    .map(|text| self.encode(PASSAGE_PREFIX, text))
                    .collect::<Result<Vec<_>>>()?;
                (q, d, nd)
            }
            DataType::Query => {
                record.require("query_id", index)?;
                record.require("doc_id", index)?;
                let q = self.encode(QUERY_PREFIX, record.text("query", index)?)?;
                (q, Vec::new(), Vec::new())
            }
            DataType::Doc => {
                record.require("doc_id", index)?;
                let d = self.encode(PASSAGE_PREFIX, record.text("pos_doc", index)?)?;
                (Vec::new(), d, Vec::new())
            }
        };

        Ok(ShapedExample {
            query,
            pos_doc,
            neg_doc,
            metadata: record.into_fields(),
            autogenerated: false,
        })
    }

    /// Prefix, tokenise and shape one piece of text.
    fn encode(&self, prefix: &str, text: &str) -> Result<Vec<u32>> {
        let ids = self.tokenizer.text_to_ids(&format!("{prefix}{}", text.trim()))?;
        Ok(self.shape(ids))
    }

    /// Apply virtual tokens, BOS, truncation and EOS to raw ids.
    fn shape(&self, ids: Vec<u32>) -> Vec<u32> {
        let eos = self.tokenizer.eos_id();

        let mut out = Vec::with_capacity(self.virtual_tokens + ids.len() + 2);
        out.extend(std::iter::repeat(eos).take(self.virtual_tokens));
        if self.add_bos {
            out.push(self.tokenizer.bos_id());
        }
        out.extend(ids);

        out.truncate(self.max_seq_length - 1);

        if self.add_eos {
            out.push(eos);
        }
        out
    }
}
