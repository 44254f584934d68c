// ============================================================
// Layer 2 — IndexUseCase
// ============================================================
// Builds the oversampling index for a file ahead of training so
// every worker later loads the same cached order instead of
// racing to build it.
//
//   Step 1: Open the record file      (Layer 4 - data)
//   Step 2: Load or build the index   (Layer 6 - infra)
//   Step 3: Report coverage           (here)

use anyhow::{Context, Result};
use std::path::Path;

use crate::data::record_source::JsonlRecordSource;
use crate::domain::traits::RecordSource;
use crate::infra::mapping_store::{MappingKey, MappingStore};

#[derive(Debug, Clone)]
pub struct IndexConfig {
    pub data_path:         String,
    pub index_mapping_dir: String,
    pub max_num_samples:   usize,
    pub max_seq_length:    usize,
    pub seed:              u64,
}

/// What the built index covers.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexReport {
    pub records:          usize,
    pub samples:          usize,
    /// Records referenced at least once
    pub distinct_records: usize,
}

pub struct IndexUseCase {
    config: IndexConfig,
}

impl IndexUseCase {
    pub fn new(config: IndexConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<IndexReport> {
        let cfg = &self.config;
        anyhow::ensure!(cfg.max_num_samples > 0, "max_num_samples must be positive");

        // ── Step 1: Record file ───────────────────────────────────────────────
        let source = JsonlRecordSource::open(&cfg.data_path)
            .with_context(|| format!("Cannot open '{}'", cfg.data_path))?;

        // ── Step 2: Index ─────────────────────────────────────────────────────
        let data_name = Path::new(&cfg.data_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("dataset");
        let index = MappingStore::new(&cfg.index_mapping_dir)
            .load_or_build(MappingKey {
                data_name,
                num_records:     source.len(),
                max_num_samples: cfg.max_num_samples,
                max_seq_length:  cfg.max_seq_length,
                seed:            cfg.seed,
            })
            .context("Cannot build sample index")?;

        // ── Step 3: Coverage ──────────────────────────────────────────────────
        let mut seen = vec![false; source.len()];
        for entry in index.entries() {
            seen[entry.record_offset] = true;
        }

        Ok(IndexReport {
            records:          source.len(),
            samples:          index.len(),
            distinct_records: seen.iter().filter(|&&s| s).count(),
        })
    }
}
