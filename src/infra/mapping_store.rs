// ============================================================
// Layer 6 — Sample Index Store
// ============================================================
// Persists the oversampling index so repeated runs over the same
// file with the same settings skip the shuffle.
//
// File naming convention (one file per setting combination):
//   {index_mapping_dir}/
//     {data file name}_{N}ns_{L}msl_{seed}s_mapping.json
//
//   N    = max_num_samples
//   L    = max_seq_length - 2
//   seed = sampling seed
//
// The file also records how many records the index was built
// over. A cache whose record count no longer matches the data
// file (or that fails to parse) is rebuilt and overwritten.
//
// Reference: Rust Book §9 (Error Handling)
//            serde_json documentation

use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::data::sample_index::SampleIndex;
use crate::domain::error::Result;

/// What gets written to disk.
#[derive(Debug, Serialize, Deserialize)]
struct CachedMapping {
    num_records:     usize,
    max_num_samples: usize,
    seed:            u64,
    index:           SampleIndex,
}

/// Parameters that identify one sample index.
#[derive(Debug, Clone, Copy)]
pub struct MappingKey<'a> {
    /// File name of the data file (no directories)
    pub data_name:       &'a str,
    pub num_records:     usize,
    pub max_num_samples: usize,
    pub max_seq_length:  usize,
    pub seed:            u64,
}

impl MappingKey<'_> {
    pub fn file_name(&self) -> String {
        format!(
            "{}_{}ns_{}msl_{}s_mapping.json",
            self.data_name,
            self.max_num_samples,
            self.max_seq_length.saturating_sub(2),
            self.seed
        )
    }
}

/// Loads sample indices from, and saves them to, one directory.
pub struct MappingStore {
    dir: PathBuf,
}

impl MappingStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Load a cached index for `key`, or build and save a new one.
    pub fn load_or_build(&self, key: MappingKey<'_>) -> Result<SampleIndex> {
        let path = self.dir.join(key.file_name());

        if path.exists() {
            match self.load(&path, &key) {
                Some(index) => {
                    tracing::debug!("Loaded sample index from '{}'", path.display());
                    return Ok(index);
                }
                None => tracing::warn!(
                    "Sample index '{}' is stale or unreadable, rebuilding",
                    path.display()
                ),
            }
        }

        let index = SampleIndex::build(key.num_records, key.max_num_samples, key.seed);

        fs::create_dir_all(&self.dir)?;
        let cached = CachedMapping {
            num_records:     key.num_records,
            max_num_samples: key.max_num_samples,
            seed:            key.seed,
            index,
        };
        fs::write(&path, serde_json::to_string(&cached)?)?;
        tracing::info!(
            "Saved sample index ({} samples) to '{}'",
            cached.index.len(),
            path.display()
        );

        Ok(cached.index)
    }

    fn load(&self, path: &Path, key: &MappingKey<'_>) -> Option<SampleIndex> {
        let json   = fs::read_to_string(path).ok()?;
        let cached = serde_json::from_str::<CachedMapping>(&json).ok()?;

        let consistent = cached.num_records == key.num_records
            && cached.max_num_samples == key.max_num_samples
            && cached.seed == key.seed
            && (cached.index.len() == key.max_num_samples || key.num_records == 0)
            && cached.index.max_record_offset().map_or(true, |m| m < key.num_records);

        consistent.then_some(cached.index)
    }
}
