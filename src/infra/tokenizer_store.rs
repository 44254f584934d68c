// ============================================================
// Layer 6 — Tokenizer Store
// ============================================================
// Loads a HuggingFace tokenizer.json and adapts it to the
// TextTokenizer trait the data layer consumes.
//
// Special ids are looked up by token string. Vocabularies name
// them differently, so each role has a list of candidates and
// the first one present in the vocabulary wins:
//
//   bos   <s>    [CLS]  <bos>  <|begin_of_text|>
//   eos   </s>   [SEP]  <eos>  <|end_of_text|>
//   pad   <pad>  [PAD]
//
// BOS and EOS are required. A missing pad token is fine: the
// collator falls back to EOS for padding.
//
// Text is encoded without the tokenizer's own post-processor
// special tokens; the transformer inserts BOS/EOS itself.
//
// Reference: tokenizers crate documentation

use std::path::{Path, PathBuf};
use tokenizers::Tokenizer;

use crate::domain::error::{DatasetError, Result};
use crate::domain::traits::TextTokenizer;

const BOS_CANDIDATES: &[&str] = &["<s>", "[CLS]", "<bos>", "<|begin_of_text|>"];
const EOS_CANDIDATES: &[&str] = &["</s>", "[SEP]", "<eos>", "<|end_of_text|>"];
const PAD_CANDIDATES: &[&str] = &["<pad>", "[PAD]"];

/// Explicit special-token strings, overriding the candidate lists.
#[derive(Debug, Clone, Default)]
pub struct SpecialTokenNames {
    pub bos: Option<String>,
    pub eos: Option<String>,
    pub pad: Option<String>,
}

// ─── HfTokenizer ──────────────────────────────────────────────────────────────
/// A `tokenizers::Tokenizer` with resolved special ids.
pub struct HfTokenizer {
    inner:  Tokenizer,
    bos_id: u32,
    eos_id: u32,
    pad_id: Option<u32>,
}

impl HfTokenizer {
    pub fn new(inner: Tokenizer, names: &SpecialTokenNames) -> Result<Self> {
        let bos_id = resolve(&inner, names.bos.as_deref(), BOS_CANDIDATES).ok_or_else(|| {
            DatasetError::Config("tokenizer has no recognisable BOS token".to_string())
        })?;
        let eos_id = resolve(&inner, names.eos.as_deref(), EOS_CANDIDATES).ok_or_else(|| {
            DatasetError::Config("tokenizer has no recognisable EOS token".to_string())
        })?;
        let pad_id = resolve(&inner, names.pad.as_deref(), PAD_CANDIDATES);

        Ok(Self { inner, bos_id, eos_id, pad_id })
    }
}

/// An explicit name must exist; otherwise try the candidates in order.
fn resolve(tok: &Tokenizer, explicit: Option<&str>, candidates: &[&str]) -> Option<u32> {
    match explicit {
        Some(name) => tok.token_to_id(name),
        None => candidates.iter().find_map(|c| tok.token_to_id(c)),
    }
}

impl TextTokenizer for HfTokenizer {
    fn text_to_ids(&self, text: &str) -> Result<Vec<u32>> {
        let enc = self
            .inner
            .encode(text, false)
            .map_err(|e| DatasetError::Tokenizer(e.to_string()))?;
        Ok(enc.get_ids().to_vec())
    }

    fn bos_id(&self) -> u32 {
        self.bos_id
    }

    fn eos_id(&self) -> u32 {
        self.eos_id
    }

    fn pad_id(&self) -> Option<u32> {
        self.pad_id
    }
}

// ─── TokenizerStore ───────────────────────────────────────────────────────────
/// Finds and loads tokenizer.json from a file or directory path.
pub struct TokenizerStore {
    path: PathBuf,
}

impl TokenizerStore {
    /// `path` may be the tokenizer.json itself or its directory.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let path = if path.is_dir() { path.join("tokenizer.json") } else { path.to_path_buf() };
        Self { path }
    }

    pub fn load(&self, names: &SpecialTokenNames) -> Result<HfTokenizer> {
        let inner = Tokenizer::from_file(&self.path).map_err(|e| {
            DatasetError::Tokenizer(format!(
                "Cannot load tokenizer from '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        let tok = HfTokenizer::new(inner, names)?;
        tracing::info!(
            "Loaded tokenizer from '{}' (bos={}, eos={}, pad={:?})",
            self.path.display(),
            tok.bos_id,
            tok.eos_id,
            tok.pad_id
        );
        Ok(tok)
    }
}
