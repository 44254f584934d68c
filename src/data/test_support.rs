// Test-only helpers shared by the data layer's unit tests.

use std::{io::Write, path::PathBuf};

use crate::domain::error::Result;
use crate::domain::traits::TextTokenizer;

/// Whitespace tokenizer with stable hashed ids (≥ 10).
pub struct WordTokenizer {
    pad: Option<u32>,
}

impl WordTokenizer {
    pub const BOS: u32 = 1;
    pub const EOS: u32 = 2;

    pub fn new() -> Self {
        Self { pad: None }
    }

    pub fn with_pad(pad: u32) -> Self {
        Self { pad: Some(pad) }
    }

    pub fn ids(&self, text: &str) -> Vec<u32> {
        text.split_whitespace().map(word_id).collect()
    }
}

fn word_id(word: &str) -> u32 {
    // FNV-1a
    let hash = word
        .bytes()
        .fold(0x811c_9dc5u32, |h, b| (h ^ b as u32).wrapping_mul(0x0100_0193));
    10 + hash % 50_000
}

impl TextTokenizer for WordTokenizer {
    fn text_to_ids(&self, text: &str) -> Result<Vec<u32>> {
        Ok(self.ids(text))
    }

    fn bos_id(&self) -> u32 {
        Self::BOS
    }

    fn eos_id(&self) -> u32 {
        Self::EOS
    }

    fn pad_id(&self) -> Option<u32> {
        self.pad
    }
}

/// Write `lines` as a JSONL file inside a fresh temp directory.
pub fn write_jsonl(lines: &[serde_json::Value]) -> (tempfile::TempDir, PathBuf) {
    let dir  = tempfile::tempdir().unwrap();
    let path = dir.path().join("triplets.jsonl");
    let mut f = std::fs::File::create(&path).unwrap();
    for line in lines {
        writeln!(f, "{line}").unwrap();
    }
    (dir, path)
}
