// ============================================================
// Layer 4 — Sample Index
// ============================================================
// Maps a virtual dataset ordinal to a record offset.
//
// Without max_num_samples the mapping is the identity and no
// SampleIndex exists. With it, the dataset is resized to exactly
// max_num_samples by concatenating shuffled passes (epochs) over
// all record offsets and cutting the tail:
//
//   records:        0 1 2 3          (4 records)
//   max_num_samples = 10, seed = s
//   epoch 1:        2 0 3 1
//   epoch 2:        1 3 0 2
//   epoch 3:        0 2 | 3 1        (cut at 10)
//   index:          2 0 3 1 1 3 0 2 0 2
//
// Every record appears once per full epoch, so oversampling is
// uniform. The same seed always gives the same index.
//
// Each entry also keeps a (start, end) span. Records are single
// documents here, so the span is always (0, 1).
//
// Reference: rand crate documentation (SeedableRng, SliceRandom)

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::error::{DatasetError, Result};

/// One virtual sample: which record, and which span of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleEntry {
    pub record_offset: usize,
    pub start: usize,
    pub end: usize,
}

/// Result of turning a requested ordinal into a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexResolution {
    /// A plain in-range ordinal
    Resolved(usize),
    /// A negative ordinal counted back from the end, requested by
    /// upstream batch padding
    Wrapped(usize),
}

impl IndexResolution {
    pub fn position(self) -> usize {
        match self {
            IndexResolution::Resolved(p) | IndexResolution::Wrapped(p) => p,
        }
    }

    pub fn is_wrapped(self) -> bool {
        matches!(self, IndexResolution::Wrapped(_))
    }
}

/// Resolve `ordinal` against a dataset of length `len`.
///
/// Negative ordinals wrap once (`-1` is the last item). Anything
/// still outside `0..len` is an IndexOutOfRange fault.
pub fn resolve_ordinal(ordinal: i64, len: usize) -> Result<IndexResolution> {
    let fault = || DatasetError::IndexOutOfRange { ordinal, len };

    if ordinal >= 0 {
        let pos = usize::try_from(ordinal).map_err(|_| fault())?;
        if pos < len {
            Ok(IndexResolution::Resolved(pos))
        } else {
            Err(fault())
        }
    } else {
        let back = usize::try_from(ordinal.unsigned_abs()).map_err(|_| fault())?;
        len.checked_sub(back)
            .map(IndexResolution::Wrapped)
            .ok_or_else(fault)
    }
}

// ─── SampleIndex ──────────────────────────────────────────────────────────────
/// Precomputed virtual-ordinal → record mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleIndex {
    entries: Vec<SampleEntry>,
}

impl SampleIndex {
    /// Build `max_num_samples` entries from seeded shuffled epochs.
    pub fn build(num_records: usize, max_num_samples: usize, seed: u64) -> Self {
        if num_records == 0 {
            tracing::warn!("Building a sample index over an empty record source");
            return Self { entries: Vec::new() };
        }

        let mut rng     = StdRng::seed_from_u64(seed);
        let mut entries = Vec::with_capacity(max_num_samples);
        let mut order: Vec<usize> = (0..num_records).collect();
        let mut epochs  = 0usize;

        while entries.len() < max_num_samples {
            order.shuffle(&mut rng);
            let take = (max_num_samples - entries.len()).min(num_records);
            entries.extend(order[..take].iter().map(|&record_offset| SampleEntry {
                record_offset,
                start: 0,
                end: 1,
            }));
            epochs += 1;
        }

        tracing::debug!(
            "Built sample index: {} samples over {} records ({} epochs)",
            entries.len(),
            num_records,
            epochs
        );

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<SampleEntry> {
        self.entries.get(position).copied()
    }

    pub fn entries(&self) -> &[SampleEntry] {
        &self.entries
    }

    /// Largest record offset referenced, used to check a cached
    /// index still fits the file it was built for
    pub fn max_record_offset(&self) -> Option<usize> {
        self.entries.iter().map(|e| e.record_offset).max()
    }
}
